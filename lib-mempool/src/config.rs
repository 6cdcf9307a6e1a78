//! Mempool Configuration
//!
//! Relay fee rates, policy switches and limits for mempool admission.
//!
//! The configuration is a plain value passed into every admission call.
//! Changing it goes through [`crate::TxPool::reconfigure`], which drains
//! in-flight admissions and empties the pool, the same as a node restart.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use lib_types::{FeeRate, ParseFeeRateError, MAX_MONEY};
use lib_fees::DEFAULT_DUST_RELAY_FEE;

/// Default minimum relay fee: 1000 sat/kvB
pub const DEFAULT_MIN_RELAY_FEE: FeeRate = FeeRate::from_sat_per_kvb(1_000);

/// Largest standard transaction weight
pub const DEFAULT_MAX_TX_WEIGHT: u64 = 400_000;

/// Default in-pool ancestor/descendant chain limit (including the transaction itself)
pub const DEFAULT_CHAIN_LIMIT: usize = 25;

/// Configuration validation error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid fee rate for {field}: {source}")]
    InvalidFeeRate {
        field: &'static str,
        #[source]
        source: ParseFeeRateError,
    },

    #[error("Invalid limit {field}: {reason}")]
    InvalidLimit { field: &'static str, reason: String },

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] toml::de::Error),
}

/// Configuration for mempool admission checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolConfig {
    // =========================================================================
    // Fee Rates
    // =========================================================================
    /// Rate used to price dust; zero disables dust filtering
    pub dust_relay_fee: FeeRate,
    /// Minimum rate for transactions that pay a fee at all
    pub min_relay_fee: FeeRate,
    /// Package rate a dust sweep must reach together with its dust parent's
    /// ancestors; `None` leaves sweeps fee-agnostic
    pub sweep_min_package_fee_rate: Option<FeeRate>,

    // =========================================================================
    // Policy Switches
    // =========================================================================
    /// Admit zero-fee transactions that carry dust outputs
    pub permit_ephemeral_dust: bool,
    /// Relay bare multisig outputs
    pub permit_bare_multisig: bool,

    // =========================================================================
    // Limits
    // =========================================================================
    /// Maximum transaction weight
    pub max_tx_weight: u64,
    /// Maximum in-pool ancestors including the transaction itself
    pub max_ancestor_count: usize,
    /// Maximum in-pool descendants of any ancestor including itself
    pub max_descendant_count: usize,
    /// Maximum number of transactions in mempool
    pub max_tx_count: usize,
    /// Maximum total virtual bytes in mempool
    pub max_mempool_bytes: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            dust_relay_fee: DEFAULT_DUST_RELAY_FEE,
            min_relay_fee: DEFAULT_MIN_RELAY_FEE,
            sweep_min_package_fee_rate: None,

            permit_ephemeral_dust: true,
            permit_bare_multisig: true,

            max_tx_weight: DEFAULT_MAX_TX_WEIGHT,
            max_ancestor_count: DEFAULT_CHAIN_LIMIT,
            max_descendant_count: DEFAULT_CHAIN_LIMIT,
            max_tx_count: 50_000,
            max_mempool_bytes: 300_000_000,
        }
    }
}

impl MempoolConfig {
    /// Create a permissive config for testing
    pub fn for_testing() -> Self {
        Self {
            max_ancestor_count: usize::MAX,
            max_descendant_count: usize::MAX,
            max_tx_count: usize::MAX,
            max_mempool_bytes: u64::MAX,
            ..Self::default()
        }
    }

    /// Same config with a different dust relay fee
    pub fn with_dust_relay_fee(mut self, rate: FeeRate) -> Self {
        self.dust_relay_fee = rate;
        self
    }

    /// Check invariants the admission path relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("dust_relay_fee", Some(self.dust_relay_fee)),
            ("min_relay_fee", Some(self.min_relay_fee)),
            ("sweep_min_package_fee_rate", self.sweep_min_package_fee_rate),
        ];
        for (field, rate) in rates {
            if let Some(rate) = rate {
                if rate.sat_per_kvb() > MAX_MONEY {
                    return Err(ConfigError::InvalidFeeRate {
                        field,
                        source: ParseFeeRateError::OutOfRange(rate.to_string()),
                    });
                }
            }
        }

        if self.max_tx_weight == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_tx_weight",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_ancestor_count == 0 || self.max_descendant_count == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_ancestor_count/max_descendant_count",
                reason: "a chain limit of zero admits nothing".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: MempoolConfigFile = toml::from_str(text)?;
        file.resolve()
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading mempool config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("loading mempool config {}", path.display()))?;
        tracing::info!(
            "Mempool config loaded from {}: dust relay fee {}, min relay fee {}",
            path.display(),
            config.dust_relay_fee,
            config.min_relay_fee
        );
        Ok(config)
    }
}

// =============================================================================
// File format
// =============================================================================

/// A fee rate as written by an operator
///
/// - integer: smallest units per kvB (`3000`)
/// - string: decimal coins per kvB (`"0.00003"`)
/// - float: coins per kvB (`0.00003`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeRateSetting {
    Units(i64),
    Coins(String),
    CoinsFloat(f64),
}

impl FeeRateSetting {
    pub fn resolve(&self, field: &'static str) -> Result<FeeRate, ConfigError> {
        let invalid = |source| ConfigError::InvalidFeeRate { field, source };
        match self {
            FeeRateSetting::Units(units) => {
                if *units < 0 {
                    return Err(invalid(ParseFeeRateError::Negative(units.to_string())));
                }
                let units = *units as u64;
                if units > MAX_MONEY {
                    return Err(invalid(ParseFeeRateError::OutOfRange(units.to_string())));
                }
                Ok(FeeRate::from_sat_per_kvb(units))
            }
            FeeRateSetting::Coins(text) => FeeRate::from_coin_str(text).map_err(invalid),
            FeeRateSetting::CoinsFloat(value) => FeeRate::from_coin_f64(*value).map_err(invalid),
        }
    }
}

impl From<FeeRate> for FeeRateSetting {
    fn from(rate: FeeRate) -> Self {
        FeeRateSetting::Units(rate.sat_per_kvb() as i64)
    }
}

/// On-disk shape of [`MempoolConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MempoolConfigFile {
    pub dust_relay_fee: FeeRateSetting,
    pub min_relay_fee: FeeRateSetting,
    pub sweep_min_package_fee_rate: Option<FeeRateSetting>,
    pub permit_ephemeral_dust: bool,
    pub permit_bare_multisig: bool,
    pub max_tx_weight: u64,
    pub max_ancestor_count: usize,
    pub max_descendant_count: usize,
    pub max_tx_count: usize,
    pub max_mempool_bytes: u64,
}

impl Default for MempoolConfigFile {
    fn default() -> Self {
        let config = MempoolConfig::default();
        Self {
            dust_relay_fee: config.dust_relay_fee.into(),
            min_relay_fee: config.min_relay_fee.into(),
            sweep_min_package_fee_rate: config.sweep_min_package_fee_rate.map(Into::into),
            permit_ephemeral_dust: config.permit_ephemeral_dust,
            permit_bare_multisig: config.permit_bare_multisig,
            max_tx_weight: config.max_tx_weight,
            max_ancestor_count: config.max_ancestor_count,
            max_descendant_count: config.max_descendant_count,
            max_tx_count: config.max_tx_count,
            max_mempool_bytes: config.max_mempool_bytes,
        }
    }
}

impl MempoolConfigFile {
    /// Resolve fee-rate notations and validate
    pub fn resolve(&self) -> Result<MempoolConfig, ConfigError> {
        let config = MempoolConfig {
            dust_relay_fee: self.dust_relay_fee.resolve("dust_relay_fee")?,
            min_relay_fee: self.min_relay_fee.resolve("min_relay_fee")?,
            sweep_min_package_fee_rate: self
                .sweep_min_package_fee_rate
                .as_ref()
                .map(|setting| setting.resolve("sweep_min_package_fee_rate"))
                .transpose()?,
            permit_ephemeral_dust: self.permit_ephemeral_dust,
            permit_bare_multisig: self.permit_bare_multisig,
            max_tx_weight: self.max_tx_weight,
            max_ancestor_count: self.max_ancestor_count,
            max_descendant_count: self.max_descendant_count,
            max_tx_count: self.max_tx_count,
            max_mempool_bytes: self.max_mempool_bytes,
        };
        config.validate()?;
        Ok(config)
    }
}
