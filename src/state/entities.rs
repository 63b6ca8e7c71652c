//! Entity records for galleries and pictures

use crate::url::Identifier;

/// A gallery on the remote service
///
/// Galleries carry nothing but their key; everything else about them is read
/// from their metadata document at fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    pub key: Identifier,
}

impl Gallery {
    pub fn new(key: Identifier) -> Self {
        Self { key }
    }
}

/// Content digest declared for a picture payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    /// Digest algorithm, e.g. "md5"
    pub kind: String,
    /// Hex digest value
    pub value: String,
}

/// Description of a picture's binary payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub digest: Digest,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    /// Exact payload size in bytes, if declared
    pub bytes: Option<u64>,
    /// The raw payload URL as published
    pub url: String,
}

impl FileInfo {
    /// Returns the declared size if it is strictly positive
    pub fn known_size(&self) -> Option<u64> {
        self.bytes.filter(|&n| n > 0)
    }
}

/// A picture enumerated by a gallery's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub key: Identifier,
    pub title: String,
    pub description: String,
    /// URL of the picture's own metadata document
    pub info_url: String,
    pub file: FileInfo,
}

/// A picture record as parsed, before its key has been derived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRecord {
    pub title: String,
    pub description: String,
    pub info_url: String,
    pub file: FileInfo,
}

impl MediaRecord {
    /// Attaches the key derived from `info_url`
    pub fn with_key(self, key: Identifier) -> MediaItem {
        MediaItem {
            key,
            title: self.title,
            description: self.description,
            info_url: self.info_url,
            file: self.file,
        }
    }
}
