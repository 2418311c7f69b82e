//! Configuration validation logic.

use url::Url;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Characters that may not appear in an output extension.
const ILLEGAL_EXTENSION_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '.', ' '];

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_url(&config.target.url)?;
    validate_counts(config.target.episodes, config.target.start)?;
    validate_extension(&config.download.extension)?;
    validate_marker(&config.capture.manifest_marker)?;
    validate_selectors(&config.browser.play_selectors)?;
    validate_timeouts(config)?;

    Ok(())
}

/// Validate the template player URL.
pub fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::MissingConfig("url".to_string()));
    }

    let parsed = Url::parse(url.trim())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::ConfigValidation {
            field: "url".to_string(),
            message: format!("URL must use http or https (got '{}')", other),
        }),
    }
}

/// Validate episode count and start.
pub fn validate_counts(episodes: u32, start: Option<u32>) -> Result<()> {
    if episodes == 0 {
        return Err(Error::ConfigValidation {
            field: "episodes".to_string(),
            message: "At least one episode must be requested".to_string(),
        });
    }

    if start == Some(0) {
        return Err(Error::ConfigValidation {
            field: "start".to_string(),
            message: "Episode numbers start at 1".to_string(),
        });
    }

    Ok(())
}

/// Validate the output extension.
pub fn validate_extension(extension: &str) -> Result<()> {
    if extension.is_empty() {
        return Err(Error::MissingConfig("extension".to_string()));
    }

    if extension.contains(ILLEGAL_EXTENSION_CHARS) {
        return Err(Error::ConfigValidation {
            field: "extension".to_string(),
            message: format!(
                "Extension '{}' must be a bare suffix such as 'mp4'",
                extension
            ),
        });
    }

    Ok(())
}

/// Validate the manifest marker.
pub fn validate_marker(marker: &str) -> Result<()> {
    if marker.trim().is_empty() {
        return Err(Error::MissingConfig("manifest_marker".to_string()));
    }
    Ok(())
}

/// Validate the play-control selector list.
pub fn validate_selectors(selectors: &[String]) -> Result<()> {
    if selectors.iter().all(|s| s.trim().is_empty()) {
        return Err(Error::ConfigValidation {
            field: "play_selectors".to_string(),
            message: "At least one non-empty selector is required".to_string(),
        });
    }
    Ok(())
}

fn validate_timeouts(config: &Config) -> Result<()> {
    let checks = [
        ("navigation_timeout_secs", config.browser.navigation_timeout_secs),
        ("click_timeout_secs", config.browser.click_timeout_secs),
        ("manifest_timeout_secs", config.capture.manifest_timeout_secs),
        ("poll_interval_ms", config.capture.poll_interval_ms),
        ("download_timeout_secs", config.download.download_timeout_secs),
    ];

    for (field, value) in checks {
        if value == 0 {
            return Err(Error::ConfigValidation {
                field: field.to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }
    }

    Ok(())
}
