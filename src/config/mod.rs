//! Configuration module for the episode-grabber.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument merging (see [`crate::cli`])
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{
    default_config_paths, BatchConfig, BrowserConfig, CaptureConfig, Config, DownloadConfig,
    TargetConfig,
};
pub use validation::validate_config;
