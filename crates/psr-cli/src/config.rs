//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use psr_core::{BillingPolicy, FloorLayout, Rates, Tariff};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Hourly rate per console type. PS5 must be priced above PS4.
    pub rates: Rates,

    /// Billing block and rounding step.
    pub billing: BillingPolicy,

    /// Tables and slots on the floor.
    pub floor: FloorLayout,

    /// Period of the console clock in milliseconds. One tick meters one second.
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rates: Rates::default(),
            billing: BillingPolicy::default(),
            floor: FloorLayout::default(),
            tick_interval_ms: 1_000,
        }
    }
}

/// Highest accepted hourly rate (Rp 100.000.000).
pub const MAX_HOURLY_RATE: u64 = 100_000_000;

/// Longest accepted billing block, one day.
pub const MAX_BLOCK_MINUTES: u64 = 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PSR_*, PSR_RATES__PS5=80000)
        figment = figment.merge(Env::prefixed("PSR_").split("__"));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make billing meaningless or overflow.
    ///
    /// The PS5 rate must be above the PS4 rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let Rates { ps4, ps5 } = self.rates;

        for (key, rate) in [("rates.ps4", ps4), ("rates.ps5", ps5)] {
            if rate.value() == 0 || rate.value() > MAX_HOURLY_RATE {
                return invalid(format!(
                    "{key} must be between 1 and {MAX_HOURLY_RATE}, got {}",
                    rate.value()
                ));
            }
        }
        if ps5 <= ps4 {
            return invalid(format!(
                "rates.ps5 ({}) must be higher than rates.ps4 ({})",
                ps5.value(),
                ps4.value()
            ));
        }
        if !(1..=MAX_BLOCK_MINUTES).contains(&self.billing.block_minutes) {
            return invalid(format!(
                "billing.block_minutes must be between 1 and {MAX_BLOCK_MINUTES}, got {}",
                self.billing.block_minutes
            ));
        }
        if !(1..=MAX_HOURLY_RATE).contains(&self.billing.rounding_step) {
            return invalid(format!(
                "billing.rounding_step must be between 1 and {MAX_HOURLY_RATE}, got {}",
                self.billing.rounding_step
            ));
        }
        if self.floor.tables_per_console == 0 || self.floor.slots == 0 {
            return invalid("floor.tables_per_console and floor.slots must be at least 1".into());
        }
        Ok(())
    }

    pub const fn tariff(&self) -> Tariff {
        Tariff {
            rates: self.rates,
            billing: self.billing,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Returns the platform-specific config directory for psr.
///
/// On Linux: `~/.config/psr`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("psr"))
}
