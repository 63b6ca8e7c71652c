//! Storage module for persisting mirrored artifacts
//!
//! This module handles all local filesystem work for the mirror:
//! - Composing backup file names under the destination root
//! - Probing existing files for the skip-if-present check
//! - Atomic, owner-only whole-file writes

mod files;
mod layout;

pub use files::{existing_len, is_complete, write_atomic};
pub use layout::{extension_for_mime, BackupLayout};

use crate::MirrorError;
use std::path::Path;

/// Creates the destination root (and any parents) if it does not exist
///
/// # Arguments
///
/// * `root` - The destination directory
///
/// # Returns
///
/// * `Ok(())` - The directory exists
/// * `Err(MirrorError)` - The directory could not be created
pub async fn prepare_root(root: &Path) -> Result<(), MirrorError> {
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|source| MirrorError::Persistence {
            path: root.to_path_buf(),
            source,
        })
}
