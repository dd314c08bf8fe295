//! Settings file support
//!
//! An optional TOML file supplies defaults for the command flags. A flag given
//! on the command line (or through its environment variable) always wins.

use anyhow::{bail, Context, Result};
use costlens_core::{DEFAULT_DAILY_THRESHOLD, DEFAULT_METRIC, DEFAULT_TOP_N};
use costlens_web::api::DEFAULT_WINDOW_DAYS;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 8080;

/// Longest analysis window accepted from flags or the settings file
pub const MAX_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub threshold: Option<f64>,
    pub top_n: Option<usize>,
    pub window_days: Option<u32>,
    pub metric: Option<String>,
    pub port: Option<u16>,
}

impl Settings {
    /// Load settings from `path`, or defaults when no file is configured
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let path = PathBuf::from(shellexpand::tilde(path).to_string());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        debug!(path = %path.display(), ?settings, "Loaded settings");
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.threshold {
            validate_threshold(threshold)?;
        }
        if self.top_n == Some(0) {
            bail!("top_n must be at least 1");
        }
        if let Some(window_days) = self.window_days {
            validate_window_days(window_days)?;
        }
        if matches!(&self.metric, Some(metric) if metric.trim().is_empty()) {
            bail!("metric must not be empty");
        }
        Ok(())
    }

    pub fn threshold(&self, flag: Option<f64>) -> Result<f64> {
        let threshold = flag.or(self.threshold).unwrap_or(DEFAULT_DAILY_THRESHOLD);
        validate_threshold(threshold)?;
        Ok(threshold)
    }

    pub fn top_n(&self, flag: Option<usize>) -> usize {
        flag.or(self.top_n).unwrap_or(DEFAULT_TOP_N).max(1)
    }

    pub fn window_days(&self, flag: Option<u32>) -> Result<u32> {
        let window_days = flag.or(self.window_days).unwrap_or(DEFAULT_WINDOW_DAYS);
        validate_window_days(window_days)?;
        Ok(window_days)
    }

    pub fn metric(&self) -> &str {
        self.metric.as_deref().unwrap_or(DEFAULT_METRIC)
    }

    pub fn port(&self, flag: Option<u16>) -> u16 {
        flag.or(self.port).unwrap_or(DEFAULT_PORT)
    }
}

fn validate_window_days(window_days: u32) -> Result<()> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        bail!(
            "window_days must be between 1 and {}, got {}",
            MAX_WINDOW_DAYS,
            window_days
        );
    }
    Ok(())
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        bail!("threshold must be a non-negative number, got {}", threshold);
    }
    Ok(())
}
