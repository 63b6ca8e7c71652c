//! Configuration module for Picmirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use picmirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Up to {} concurrent requests", config.mirror.max_network_ops);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiagnosticsConfig, MirrorConfig, UserAgentConfig, DEFAULT_DRAIN_POLL_INTERVAL,
    DEFAULT_MAX_LOCAL_OPS, DEFAULT_MAX_NETWORK_OPS,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
