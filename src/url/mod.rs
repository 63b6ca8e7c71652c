//! URL handling module for Picmirror
//!
//! This module provides key extraction from references found in listings and
//! metadata, and builds the remote endpoints of the gallery service.

mod identifier;

pub use identifier::{find_all_keys, find_key, EntityKind, Identifier, KEY_LEN};

/// Remote endpoints of one user's gallery site
///
/// All URLs are derived from the base URL (e.g. `http://www.picpix.com/kelly`),
/// which is stored without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Creates endpoints rooted at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The base URL without trailing slash
    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of a listing page, alphabetically sorted, 1-based
    pub fn listing_page(&self, page: u32) -> String {
        format!("{}/?sort=alpha&page={}", self.base, page)
    }

    /// URL of the XML metadata document for an entity
    pub fn metadata(&self, kind: EntityKind, key: &Identifier) -> String {
        format!("{}/{}/{}.xml", self.base, kind.as_str(), key)
    }

    /// URL of a picture's binary payload
    pub fn pic_blob(&self, key: &Identifier) -> String {
        format!("{}/pic/{}", self.base, key)
    }
}
