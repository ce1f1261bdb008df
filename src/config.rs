//! Configuration loading and validation

use anyhow::{bail, Context, Result};
use serde::Deserialize;

// Re-export component configs so callers only need one import path
pub use crate::history::etherscan::EtherscanConfig;
pub use crate::registry::RegistryOverrides;
pub use crate::scoring::ScoringConfig;
pub use crate::tracker::TrackerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub etherscan: EtherscanConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Environment variables use the `FUNDTRACE` prefix with `__` as the
    /// section separator, e.g. `FUNDTRACE__TRACKER__MAX_DEPTH=2`.
    pub fn load(path: &str) -> Result<Self> {
        // Defaults first; the etherscan ones honor the bare
        // ETHERSCAN_API_URL / ETHERSCAN_API_KEY variables
        let etherscan_defaults = EtherscanConfig::default();

        let settings = config::Config::builder()
            .set_default("etherscan.api_url", etherscan_defaults.api_url)?
            .set_default("etherscan.api_key", etherscan_defaults.api_key)?
            .set_default("tracker.max_depth", 3i64)?
            .set_default("tracker.max_funding_sources", 50i64)?
            // Layer on the config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Environment variables override everything
            .add_source(
                config::Environment::with_prefix("FUNDTRACE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;

        if self.etherscan.page_size == 0 {
            bail!("etherscan.page_size must be at least 1");
        }
        if self.etherscan.page_size > 10_000 {
            bail!("etherscan.page_size cannot exceed the API window of 10000");
        }
        if self.etherscan.timeout_secs == 0 {
            bail!("etherscan.timeout_secs must be at least 1");
        }

        Ok(())
    }

    /// Get masked configuration for display (hides secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Etherscan:
    API URL: {}
    API Key: {}
    Page Size: {}
    Timeout: {}s
  Tracker:
    Max Depth: {}
    Min Transfer Amount: {}
    Max Funding Sources: {}
    Max Pages Per Address: {}
  Scoring:
    Sanctioned Source: {} pts
    Mixer Source: {} pts
    Unknown Source (deep): {} pts
    Unknown Source (direct): {} pts
  Registry Overrides: {}"#,
            self.etherscan.api_url,
            mask_key(&self.etherscan.api_key),
            self.etherscan.page_size,
            self.etherscan.timeout_secs,
            self.tracker.max_depth,
            self.tracker.min_transfer_amount,
            self.tracker.max_funding_sources,
            self.tracker.max_pages_per_address,
            self.tracker.scoring.sanctioned_source_points,
            self.tracker.scoring.mixer_source_points,
            self.tracker.scoring.unknown_deep_source_points,
            self.tracker.scoring.unknown_source_points,
            self.tracker.registry.len(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            etherscan: EtherscanConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

/// Mask an API key for display
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else if key.len() <= 8 || !key.is_char_boundary(4) || !key.is_char_boundary(key.len() - 4) {
        "***".to_string()
    } else {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    }
}
