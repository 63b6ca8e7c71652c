//! Dedup registry for discovered galleries and pictures
//!
//! The reference graph between galleries is cyclic, so the registry is what
//! terminates the crawl: each key is admitted for fetching at most once.

use crate::state::entities::{Gallery, MediaItem};
use crate::url::Identifier;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Key-to-entity maps guaranteeing at-most-once scheduling per key
///
/// Galleries and pictures have independent locks. Each lock is held only for
/// the check-and-insert, never across I/O.
#[derive(Debug, Default)]
pub struct Registry {
    galleries: Mutex<HashMap<Identifier, Arc<Gallery>>>,
    media: Mutex<HashMap<Identifier, Arc<MediaItem>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gallery key, returning the record and whether it is new
    ///
    /// When `is_new` is true the caller owns scheduling the gallery's fetch.
    /// Otherwise the discovery is a duplicate and must be dropped.
    pub fn register_gallery_if_new(&self, key: Identifier) -> (Arc<Gallery>, bool) {
        let mut galleries = self.galleries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = galleries.get(&key) {
            return (Arc::clone(existing), false);
        }
        let gallery = Arc::new(Gallery::new(key.clone()));
        galleries.insert(key, Arc::clone(&gallery));
        (gallery, true)
    }

    /// Registers a picture record, returning the stored record and whether it is new
    ///
    /// The first record registered for a key wins; later records for the same
    /// key are discarded.
    pub fn register_media_if_new(&self, item: MediaItem) -> (Arc<MediaItem>, bool) {
        let mut media = self.media.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = media.get(&item.key) {
            return (Arc::clone(existing), false);
        }
        let item = Arc::new(item);
        media.insert(item.key.clone(), Arc::clone(&item));
        (item, true)
    }

    /// Number of galleries known so far
    pub fn known_galleries(&self) -> usize {
        self.galleries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of pictures known so far
    pub fn known_media(&self) -> usize {
        self.media.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    fn has_gallery(&self, key: &Identifier) -> bool {
        self.galleries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    #[cfg(test)]
    fn has_media(&self, key: &Identifier) -> bool {
        self.media
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}
