
use thiserror::Error;

use crate::expression::Rule;

#[derive(Error, Debug)]
pub enum AnglesError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("JSON error: {0}")]
    Json(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Variable {name} is not numeric")]
    NotNumeric { name: String },
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Invalid entry {name}: {message}")]
    InvalidEntry { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, AnglesError>;

// Helper conversions
impl From<serde_json::Error> for AnglesError {
    fn from(e: serde_json::Error) -> Self { Self::Json(e.to_string()) }
}
impl From<std::io::Error> for AnglesError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<config::ConfigError> for AnglesError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<pest::error::Error<Rule>> for AnglesError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        Self::Parse { message: e.variant.message().to_string(), line: Some(line), col: Some(col) }
    }
}
