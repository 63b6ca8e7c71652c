use crate::config::types::{Config, MirrorConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_mirror_config(&config.mirror)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates mirror configuration
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;

    if config.dest.as_os_str().is_empty() {
        return Err(ConfigError::Validation("dest cannot be empty".to_string()));
    }

    if config.max_network_ops < 1 || config.max_network_ops > 100 {
        return Err(ConfigError::Validation(format!(
            "max_network_ops must be between 1 and 100, got {}",
            config.max_network_ops
        )));
    }

    if config.max_local_ops < 1 || config.max_local_ops > 1_000_000 {
        return Err(ConfigError::Validation(format!(
            "max_local_ops must be between 1 and 1000000, got {}",
            config.max_local_ops
        )));
    }

    if config.drain_poll_interval < 10 {
        return Err(ConfigError::Validation(format!(
            "drain_poll_interval must be >= 10ms, got {}ms",
            config.drain_poll_interval
        )));
    }

    Ok(())
}

/// Validates the base URL of the gallery site
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    if base_url.is_empty() {
        return Err(ConfigError::Missing("base-url"));
    }

    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' cannot carry a query or fragment",
            base_url
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
