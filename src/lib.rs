//! Picmirror: a mirroring tool for public photo galleries
//!
//! This crate discovers galleries and the pictures they contain by following
//! the cross-references embedded in gallery metadata, and persists every
//! discovered resource's metadata and payload to local storage exactly once.

pub mod config;
pub mod crawler;
pub mod diagnostics;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Picmirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed reference: {0}")]
    MalformedReference(#[from] ReferenceError),

    #[error("Error fetching {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Error fetching {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Error accessing {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Metadata parse error for {}: {message}", path.display())]
    MetadataParse { path: PathBuf, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Admission gate closed")]
    AdmissionClosed,

    #[error("Diagnostics server error: {0}")]
    Diagnostics(String),
}

impl MirrorError {
    /// Returns true if this error must halt the whole run
    ///
    /// Malformed references and invariant violations mean the remote format
    /// is not what we understand, so they are fatal in every mode. Transport,
    /// persistence and metadata errors only stop the affected branch when
    /// `continue_on_error` is set.
    pub fn is_fatal(&self, continue_on_error: bool) -> bool {
        match self {
            Self::MalformedReference(_)
            | Self::InvariantViolation(_)
            | Self::AdmissionClosed
            | Self::HttpClient(_)
            | Self::Config(_) => true,
            Self::Transport { .. }
            | Self::HttpStatus { .. }
            | Self::Persistence { .. }
            | Self::MetadataParse { .. }
            | Self::Diagnostics(_) => !continue_on_error,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Identifier extraction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Failed to parse: {0}")]
    NoMatch(String),
}

/// Result type alias for Picmirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::Mirror;
pub use crate::output::MirrorSummary;
pub use crate::state::{Gallery, MediaItem};
pub use crate::url::{find_key, EntityKind, Identifier};
