use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors surfaced by the catalog core.
///
/// `Clone` is required because one in-flight fetch result is handed to every
/// caller that joined it.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum PokedexError {
    #[error("catalog unavailable: {0}")]
    #[diagnostic(help("check your network connection and try again"))]
    Unavailable(String),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("invalid navigation link: {0}")]
    InvalidNavigation(String),

    #[error("record not found: {0}")]
    RecordNotFound(u32),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    ConfigInvalid(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl PokedexError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
