//! Mirror coordinator - main crawl orchestration logic
//!
//! This module owns a mirror session and drives it end to end:
//! - Preparing the destination root
//! - Running the listing frontier until it stops producing new galleries
//! - Draining: waiting until every spawned fetcher has finished
//! - Deciding, in one place, whether a recorded error ends the run

use crate::config::{validate, Config, MirrorConfig};
use crate::crawler::fetcher::{build_http_client, fetch_to_file, FetchOutcome};
use crate::crawler::gate::AdmissionGate;
use crate::output::MirrorSummary;
use crate::state::{ErrorLog, Registry};
use crate::storage::{prepare_root, BackupLayout};
use crate::url::Endpoints;
use crate::MirrorError;
use reqwest::Client;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Shared state of one mirror session
pub(super) struct Inner {
    pub(super) config: MirrorConfig,
    pub(super) endpoints: Endpoints,
    pub(super) layout: BackupLayout,
    pub(super) client: Client,
    pub(super) gate: AdmissionGate,
    pub(super) registry: Registry,
    pub(super) errors: ErrorLog,
    /// First fatal error, handed back by `run`
    fatal: Mutex<Option<MirrorError>>,
    halted: AtomicBool,
}

/// A mirror session
///
/// Cloning is cheap; every spawned fetcher holds a clone. The registry, gate
/// and error log belong to the session, so independent sessions never share
/// state.
#[derive(Clone)]
pub struct Mirror {
    pub(super) inner: Arc<Inner>,
}

impl Mirror {
    /// Creates a new mirror session
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Mirror)` - Session ready to run
    /// * `Err(MirrorError)` - The configuration is invalid or the HTTP client
    ///   could not be built
    pub fn new(config: &Config) -> Result<Self, MirrorError> {
        validate(config)?;
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::with_client(config.mirror.clone(), client))
    }

    /// Creates a session around an existing HTTP client
    pub fn with_client(config: MirrorConfig, client: Client) -> Self {
        let gate = AdmissionGate::new(
            config.max_network_ops as usize,
            config.max_local_ops as usize,
        );

        Self {
            inner: Arc::new(Inner {
                endpoints: Endpoints::new(&config.base_url),
                layout: BackupLayout::new(&config.dest),
                client,
                gate,
                registry: Registry::new(),
                errors: ErrorLog::new(),
                fatal: Mutex::new(None),
                halted: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// Runs the whole mirror: frontier, then drain
    ///
    /// # Returns
    ///
    /// * `Ok(MirrorSummary)` - Every discovered resource was attempted
    /// * `Err(MirrorError)` - The first fatal error; the run was cut short
    ///
    /// # Example
    ///
    /// ```no_run
    /// use picmirror::{Config, Mirror};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config::new("http://www.picpix.com/kelly", "/backup/kelly");
    /// let summary = Mirror::new(&config)?.run().await?;
    /// println!("{} galleries", summary.galleries);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self) -> Result<MirrorSummary, MirrorError> {
        let start_time = Instant::now();
        prepare_root(self.inner.layout.root()).await?;

        tracing::info!("Starting mirror of {}", self.inner.endpoints.base());

        let pages = self.crawl_frontier().await?;
        self.drain().await?;

        let summary = MirrorSummary {
            pages,
            galleries: self.inner.registry.known_galleries(),
            pictures: self.inner.registry.known_media(),
            errors: self.inner.errors.entries(),
            elapsed: start_time.elapsed(),
        };
        tracing::info!("Done.");
        Ok(summary)
    }

    /// Waits until no admitted or waiting operation remains
    ///
    /// Only fetchers spawn fetchers, and a spawner admits the child before
    /// releasing itself, so once the frontier has stopped a zero reading means
    /// the crawl has quiesced.
    pub async fn drain(&self) -> Result<(), MirrorError> {
        let interval = self.inner.config.drain_poll_interval();
        loop {
            let n = self.inner.gate.in_flight();
            // Checked after reading the count: errors are reported before release.
            if let Some(err) = self.take_fatal() {
                return Err(err);
            }
            if n == 0 {
                return Ok(());
            }
            tracing::info!("{} operations in flight, waiting", n);
            tokio::time::sleep(interval).await;
        }
    }

    /// Records a failure and applies the termination policy
    ///
    /// Every error goes to the error log. A fatal one (per mode) is latched
    /// for `run` to return, halts all fetchers that have not yet started
    /// network work, and closes the gate so queued fetchers give up.
    pub(super) fn report(&self, err: MirrorError) {
        if matches!(err, MirrorError::AdmissionClosed) {
            // The gate is only closed after a fatal error has been latched.
            tracing::debug!("Dropping queued work after halt");
            return;
        }

        let fatal = err.is_fatal(self.inner.config.continue_on_error);
        tracing::error!("ERROR: {}", err);
        self.inner.errors.record(err.to_string());

        if fatal {
            self.inner.halted.store(true, Ordering::SeqCst);
            let mut slot = self
                .inner
                .fatal
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            }
            drop(slot);
            self.inner.gate.close();
        }
    }

    /// Returns true once a fatal error has been recorded
    pub fn is_halted(&self) -> bool {
        self.inner.halted.load(Ordering::SeqCst)
    }

    pub(super) fn take_fatal(&self) -> Option<MirrorError> {
        self.inner
            .fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Fetch primitive bound to this session
    ///
    /// Failures are reported rather than returned; the caller only learns
    /// whether the file is now present.
    pub(super) async fn fetch_to_file(
        &self,
        url: &str,
        path: &Path,
        expected_size: Option<u64>,
    ) -> bool {
        if self.is_halted() {
            return false;
        }

        match fetch_to_file(
            &self.inner.client,
            &self.inner.gate,
            url,
            path,
            expected_size,
        )
        .await
        {
            Ok(FetchOutcome::Skipped) => {
                tracing::debug!("Already have {}", path.display());
                true
            }
            Ok(FetchOutcome::Fetched { bytes }) => {
                tracing::debug!("Saved {} ({} bytes)", path.display(), bytes);
                true
            }
            Err(e) => {
                self.report(e);
                false
            }
        }
    }

    /// The session's admission gate
    pub fn gate(&self) -> &AdmissionGate {
        &self.inner.gate
    }

    /// The session's dedup registry
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The session's error log
    pub fn errors(&self) -> &ErrorLog {
        &self.inner.errors
    }

    /// The session's remote endpoints
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// The session's backup layout
    pub fn layout(&self) -> &BackupLayout {
        &self.inner.layout
    }
}

/// Runs a complete mirror operation
///
/// # Arguments
///
/// * `config` - The mirror configuration
///
/// # Returns
///
/// * `Ok(MirrorSummary)` - Mirror completed
/// * `Err(MirrorError)` - Mirror failed with a fatal error
pub async fn run_mirror(config: &Config) -> Result<MirrorSummary, MirrorError> {
    Mirror::new(config)?.run().await
}
