use std::path::PathBuf;
use std::process::ExitCode;

use angles::error::{AnglesError, Result};
use angles::interface::{Session, Settings};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

fn usage() -> &'static str {
    "usage: angles [<timeline.json> <document.json>]\n\
     Paths may also come from angles.toml (`timeline`, `document`) or ANGLES_TIMELINE / ANGLES_DOCUMENT."
}

fn run() -> Result<()> {
    let mut settings = Settings::load()?;
    let mut args = std::env::args().skip(1);
    if let Some(timeline) = args.next() {
        settings.timeline = Some(PathBuf::from(timeline));
    }
    if let Some(document) = args.next() {
        settings.document = Some(PathBuf::from(document));
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let (Some(timeline), Some(document)) = (&settings.timeline, &settings.document) else {
        return Err(AnglesError::Config(usage().into()));
    };
    let session = Session::from_path(timeline)?;
    info!(rows = session.timeline().rows().len(), path = %timeline.display(), "timeline loaded");
    let resolution = session.resolve_document(&std::fs::read_to_string(document)?)?;
    info!(
        resolved = resolution.values.len(),
        skipped = resolution.skipped.len(),
        "document resolved"
    );
    let output = if settings.pretty {
        serde_json::to_string_pretty(&resolution)?
    } else {
        serde_json::to_string(&resolution)?
    };
    println!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "angles failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
