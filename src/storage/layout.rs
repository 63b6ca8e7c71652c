use crate::url::{EntityKind, Identifier};
use std::path::{Path, PathBuf};

/// Maps a picture MIME type to the file extension used for its payload
///
/// Unrecognized types map to an empty extension, which still leaves the
/// separating dot in the file name.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        _ => "",
    }
}

/// File naming under the destination root
///
/// Every artifact lives directly under the root as `<kind>-<key>.<ext>`:
/// metadata documents use `.xml`, picture payloads an extension derived from
/// their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLayout {
    root: PathBuf,
}

impl BackupLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the saved metadata document for an entity
    pub fn metadata_path(&self, kind: EntityKind, key: &Identifier) -> PathBuf {
        self.root.join(format!("{}-{}.xml", kind.as_str(), key))
    }

    /// Path of the saved payload for a picture
    pub fn blob_path(&self, key: &Identifier, mime: &str) -> PathBuf {
        self.root
            .join(format!("pic-{}.{}", key, extension_for_mime(mime)))
    }
}
