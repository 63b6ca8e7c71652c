//! Listing-page frontier
//!
//! Walks the site's alphabetical gallery listing one page at a time and seeds
//! the registry with every gallery it finds. The listing has no explicit last
//! page; enumeration stops at the first page after which the registry knows
//! no more galleries than before it.

use crate::crawler::coordinator::Mirror;
use crate::crawler::fetcher::fetch_text;
use crate::crawler::parser::parse_listing;
use crate::MirrorError;

impl Mirror {
    /// Enumerates listing pages 1, 2, 3, ... until one adds no galleries
    ///
    /// Pages are fetched sequentially. Any error fetching a listing page ends
    /// the whole run.
    ///
    /// # Returns
    ///
    /// * `Ok(u32)` - Number of listing pages fetched
    /// * `Err(MirrorError)` - A listing page failed, or a fetcher hit a fatal error
    pub async fn crawl_frontier(&self) -> Result<u32, MirrorError> {
        let mut page = 1;
        loop {
            if let Some(err) = self.take_fatal() {
                return Err(err);
            }

            let count_before = self.inner.registry.known_galleries();
            self.fetch_listing_page(page).await?;
            let count_after = self.inner.registry.known_galleries();

            tracing::info!("Galleries known: {}", count_after);
            if count_after == count_before {
                tracing::info!("No new galleries, stopping.");
                return Ok(page);
            }
            page += 1;
        }
    }

    async fn fetch_listing_page(&self, page: u32) -> Result<(), MirrorError> {
        tracing::info!("Fetching gallery page {}", page);

        let url = self.inner.endpoints.listing_page(page);
        let (final_url, html) = fetch_text(&self.inner.client, &url).await?;
        tracing::info!("Fetched page {}: {}", page, final_url);
        tracing::debug!("read {} bytes", html.len());

        for key in parse_listing(&html) {
            self.note_gallery(key);
        }
        Ok(())
    }
}
