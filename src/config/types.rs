use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default cap on concurrent network requests
pub const DEFAULT_MAX_NETWORK_OPS: u32 = 20;

/// Default cap on concurrent local tasks; keep below `ulimit -n`
pub const DEFAULT_MAX_LOCAL_OPS: u32 = 10_000;

/// Default delay between drain polls (milliseconds)
pub const DEFAULT_DRAIN_POLL_INTERVAL: u64 = 5_000;

/// Main configuration structure for Picmirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mirror: MirrorConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the site and destination
    pub fn new(base_url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            mirror: MirrorConfig::new(base_url, dest),
            user_agent: UserAgentConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

/// Mirror behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// Base URL of the gallery site, e.g. `http://www.picpix.com/username`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Destination backup root
    pub dest: PathBuf,

    /// Maximum number of concurrent network requests
    #[serde(rename = "max-network-ops", default = "default_max_network_ops")]
    pub max_network_ops: u32,

    /// Maximum number of concurrent local tasks
    #[serde(rename = "max-local-ops", default = "default_max_local_ops")]
    pub max_local_ops: u32,

    /// Record errors and keep going instead of stopping at the first one
    #[serde(rename = "continue-on-error", default)]
    pub continue_on_error: bool,

    /// Delay between checks for outstanding work (milliseconds)
    #[serde(rename = "drain-poll-interval", default = "default_drain_poll_interval")]
    pub drain_poll_interval: u64,
}

impl MirrorConfig {
    pub fn new(base_url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            dest: dest.into(),
            max_network_ops: DEFAULT_MAX_NETWORK_OPS,
            max_local_ops: DEFAULT_MAX_LOCAL_OPS,
            continue_on_error: false,
            drain_poll_interval: DEFAULT_DRAIN_POLL_INTERVAL,
        }
    }

    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval)
    }
}

fn default_max_network_ops() -> u32 {
    DEFAULT_MAX_NETWORK_OPS
}

fn default_max_local_ops() -> u32 {
    DEFAULT_MAX_LOCAL_OPS
}

fn default_drain_poll_interval() -> u64 {
    DEFAULT_DRAIN_POLL_INTERVAL
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    ///
    /// The parenthesized part only lists the contact details that are set.
    pub fn header_value(&self) -> String {
        let mut contact = Vec::new();
        if let Some(url) = &self.contact_url {
            contact.push(format!("+{}", url));
        }
        if let Some(email) = &self.contact_email {
            contact.push(email.clone());
        }

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Diagnostic server configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticsConfig {
    /// Listen address for the status server; disabled when absent
    pub listen: Option<SocketAddr>,
}
