//! State module for tracking what a mirror run has discovered
//!
//! # Components
//!
//! - `Registry`: at-most-once admission of gallery and picture keys
//! - `ErrorLog`: append-only record of failures
//! - `Gallery`, `MediaItem`: the entity records themselves

mod entities;
mod error_log;
mod registry;

// Re-export main types
pub use entities::{Digest, FileInfo, Gallery, MediaItem, MediaRecord};
pub use error_log::{ErrorEntry, ErrorLog};
pub use registry::Registry;
