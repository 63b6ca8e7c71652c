//! Per-entity fetchers
//!
//! A gallery fetch saves the gallery's metadata and hands it to a parse task,
//! which registers every linked gallery and contained picture. A picture
//! fetch saves the picture's metadata and then its payload. Pictures are
//! leaves of the reference graph.
//!
//! Fetchers are spawned fire-and-forget. The spawner counts each child as in
//! flight before spawning it; the child then waits for its own local slot and
//! gives it back when it returns.

use crate::crawler::coordinator::Mirror;
use crate::crawler::gate::{OpClass, OperationHandle, PendingOp};
use crate::crawler::parser::parse_media_set;
use crate::state::{Gallery, MediaItem};
use crate::url::{find_key, EntityKind, Identifier};
use crate::MirrorError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

/// A spawned fetcher task
///
/// Galleries spawn galleries, so the gallery fetcher's future is boxed to
/// give the recursion a nameable `Send` type.
type FetchTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

impl Mirror {
    /// Registers a gallery key and schedules its fetch if it is new
    ///
    /// Returns true if the gallery was new and its fetcher has been spawned.
    /// A known gallery is dropped silently.
    pub fn note_gallery(&self, key: Identifier) -> bool {
        let (gallery, is_new) = self.inner.registry.register_gallery_if_new(key);
        if !is_new {
            return false;
        }

        tracing::info!(
            "Gallery: {}",
            self.inner.endpoints.metadata(EntityKind::Gallery, &gallery.key)
        );

        // Counted here, before the spawner's own operation can be released.
        let pending = self.inner.gate.enter(OpClass::Local);
        tokio::spawn(self.clone().fetch_gallery(gallery, pending));
        true
    }

    /// Registers a picture and schedules its fetch if it is new
    pub fn note_media(&self, item: MediaItem) -> bool {
        let (item, is_new) = self.inner.registry.register_media_if_new(item);
        if !is_new {
            return false;
        }

        tracing::info!(
            "Photo: {}",
            self.inner.endpoints.metadata(EntityKind::Pic, &item.key)
        );

        let pending = self.inner.gate.enter(OpClass::Local);
        tokio::spawn(self.clone().fetch_media(item, pending));
        true
    }

    /// Waits for a pending operation's slot
    ///
    /// A failed admission is reported and the caller's branch ends.
    async fn admit(&self, pending: PendingOp) -> Option<OperationHandle> {
        match pending.admit().await {
            Ok(op) => Some(op),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    /// Saves a gallery's metadata, then parses it in a separate task
    ///
    /// If the metadata cannot be saved the branch ends here.
    fn fetch_gallery(self, gallery: Arc<Gallery>, pending: PendingOp) -> FetchTask {
        Box::pin(async move {
            let Some(_op) = self.admit(pending).await else {
                return;
            };

            let url = self
                .inner
                .endpoints
                .metadata(EntityKind::Gallery, &gallery.key);
            let path = self
                .inner
                .layout
                .metadata_path(EntityKind::Gallery, &gallery.key);

            if !self.fetch_to_file(&url, &path, None).await {
                return;
            }

            let pending = self.inner.gate.enter(OpClass::Local);
            tokio::spawn(self.clone().parse_gallery(path, pending));
        })
    }

    async fn parse_gallery(self, path: PathBuf, pending: PendingOp) {
        let Some(_op) = self.admit(pending).await else {
            return;
        };
        if let Err(e) = self.discover_from_metadata(&path).await {
            self.report(e);
        }
    }

    /// Registers everything a saved gallery metadata document references
    async fn discover_from_metadata(&self, path: &Path) -> Result<(), MirrorError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| MirrorError::Persistence {
                path: path.to_path_buf(),
                source,
            })?;
        let content = String::from_utf8_lossy(&content);

        let media_set = parse_media_set(&content).map_err(|message| MirrorError::MetadataParse {
            path: path.to_path_buf(),
            message,
        })?;

        for url in media_set.linked_galleries() {
            if self.is_halted() {
                return Ok(());
            }
            let key = find_key(url, EntityKind::Gallery)?;
            self.note_gallery(key);
        }

        for record in media_set.items {
            if self.is_halted() {
                return Ok(());
            }
            let key = find_key(&record.info_url, EntityKind::Pic)?;
            self.note_media(record.with_key(key));
        }

        Ok(())
    }

    /// Saves a picture's metadata and then its payload
    ///
    /// A picture without a strictly positive declared size is a fatal
    /// invariant violation: the skip check for payloads relies on exact size.
    async fn fetch_media(self, item: Arc<MediaItem>, pending: PendingOp) {
        let Some(_op) = self.admit(pending).await else {
            return;
        };

        let xml_url = self.inner.endpoints.metadata(EntityKind::Pic, &item.key);
        let xml_path = self.inner.layout.metadata_path(EntityKind::Pic, &item.key);
        if !self.fetch_to_file(&xml_url, &xml_path, None).await {
            return;
        }

        let Some(size) = item.file.known_size() else {
            self.report(MirrorError::InvariantViolation(format!(
                "expected picture {} to have some known file size",
                item.info_url
            )));
            return;
        };

        let blob_url = self.inner.endpoints.pic_blob(&item.key);
        let blob_path = self.inner.layout.blob_path(&item.key, &item.file.mime);
        self.fetch_to_file(&blob_url, &blob_path, Some(size)).await;
    }
}
