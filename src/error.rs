use std::path::PathBuf;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DexError {
    #[error("invalid pokemon id or name: {0}")]
    InvalidItemKey(String),

    #[error("invalid theme: {0} (expected dark or light)")]
    InvalidTheme(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    ConfigValue(String),

    #[error("PokeAPI request failed: {0}")]
    Http(String),

    #[error("PokeAPI returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed PokeAPI payload: {0}")]
    Parse(String),

    #[error("missing reference in PokeAPI payload: {0}")]
    MissingLink(String),

    #[error("could not load details for {key}")]
    DetailUnavailable { key: String, kind: ErrorKind },

    #[error("preferences error: {0}")]
    Preferences(String),

    #[error("terminal error: {0}")]
    Terminal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    NotFound,
    Status,
    Parse,
    MissingLink,
    Local,
}

impl DexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DexError::Http(_) => ErrorKind::Transport,
            DexError::Status { status: 404, .. } => ErrorKind::NotFound,
            DexError::Status { .. } => ErrorKind::Status,
            DexError::Parse(_) => ErrorKind::Parse,
            DexError::MissingLink(_) => ErrorKind::MissingLink,
            DexError::DetailUnavailable { kind, .. } => *kind,
            _ => ErrorKind::Local,
        }
    }
}
