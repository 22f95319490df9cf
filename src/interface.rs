//! Synchronous session interface over a loaded timeline.
//!
//! A [`Session`] owns one timeline for the duration of a query session and
//! resolves variables documents against it on the caller's thread. Since
//! later variables may depend on earlier ones, documents are never split
//! across threads.
use serde::Deserialize;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::construct::Timeline;
use crate::error::Result;
use crate::index::Indexer;
use crate::resolve::{Resolution, Resolver, VariablesDocument};

/// Settings for the `angles` binary, read from an optional `angles.*` file
/// and `ANGLES_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub timeline: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub log: String,
    pub pretty: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("log", "info")?
            .set_default("pretty", true)?
            .add_source(config::File::with_name("angles").required(false))
            .add_source(config::Environment::with_prefix("ANGLES"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

pub struct Session {
    timeline: Timeline,
}

impl Session {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(Timeline::from_json(json)?))
    }
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(Self::new(Timeline::from_reader(reader)?))
    }
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }
    pub fn indexer(&self) -> Indexer<'_> {
        Indexer::new(&self.timeline)
    }
    pub fn resolve(&self, document: &VariablesDocument) -> Resolution {
        Resolver::new(&self.timeline).resolve(document)
    }
    /// Parses and resolves a variables document. Only a document that cannot
    /// be read at all is an error; individual entries fail on their own.
    pub fn resolve_document(&self, json: &str) -> Result<Resolution> {
        Resolver::new(&self.timeline).resolve_json(json)
    }
}
