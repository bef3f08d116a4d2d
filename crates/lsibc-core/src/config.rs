//! # Engine Configuration
//!
//! Module accounts, transfer timeout and safety limits, loaded from
//! defaults or environment variables.

use crate::domain::Dec;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
    },

    /// Configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Local address of a module account.
pub fn module_address(module: &str) -> String {
    let digest = Sha256::digest(module.as_bytes());
    format!("lsibc1{}", hex::encode(&digest[..20]))
}

/// Liquid-stake engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidStakeConfig {
    /// Module pooling user deposits.
    pub deposit_module: String,
    /// Module receiving unbonded funds.
    pub undelegation_module: String,
    /// Relative timeout of outbound transfers, seconds.
    pub ibc_timeout_secs: u64,
    /// Epochs a validator may stay unbonding before it is force-unbonded.
    pub unbonding_state_epoch_limit: i64,
    /// Lowest acceptable C value.
    pub lower_c_value_limit: Dec,
    /// Highest acceptable C value.
    pub upper_c_value_limit: Dec,
}

impl Default for LiquidStakeConfig {
    fn default() -> Self {
        Self {
            deposit_module: "deposit".to_string(),
            undelegation_module: "undelegation".to_string(),
            ibc_timeout_secs: 30 * 60,
            unbonding_state_epoch_limit: 4,
            lower_c_value_limit: Dec::from_percent(85),
            upper_c_value_limit: Dec::ONE,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

impl LiquidStakeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LSIBC_DEPOSIT_MODULE`: deposit module name (default: deposit)
    /// - `LSIBC_UNDELEGATION_MODULE`: undelegation module name (default: undelegation)
    /// - `LSIBC_IBC_TIMEOUT_SECS`: transfer timeout (default: 1800)
    /// - `LSIBC_UNBONDING_STATE_EPOCH_LIMIT`: force-unbond threshold (default: 4)
    /// - `LSIBC_LOWER_C_VALUE_LIMIT` / `LSIBC_UPPER_C_VALUE_LIMIT` (default: 0.85 / 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            deposit_module: env::var("LSIBC_DEPOSIT_MODULE").unwrap_or(defaults.deposit_module),
            undelegation_module: env::var("LSIBC_UNDELEGATION_MODULE")
                .unwrap_or(defaults.undelegation_module),
            ibc_timeout_secs: parse_env("LSIBC_IBC_TIMEOUT_SECS", defaults.ibc_timeout_secs)?,
            unbonding_state_epoch_limit: parse_env(
                "LSIBC_UNBONDING_STATE_EPOCH_LIMIT",
                defaults.unbonding_state_epoch_limit,
            )?,
            lower_c_value_limit: parse_env(
                "LSIBC_LOWER_C_VALUE_LIMIT",
                defaults.lower_c_value_limit,
            )?,
            upper_c_value_limit: parse_env(
                "LSIBC_UPPER_C_VALUE_LIMIT",
                defaults.upper_c_value_limit,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deposit_module.is_empty() || self.undelegation_module.is_empty() {
            return Err(ConfigError::Invalid("module names must be set".to_string()));
        }
        if self.deposit_module == self.undelegation_module {
            return Err(ConfigError::Invalid(
                "deposit and undelegation modules must differ".to_string(),
            ));
        }
        if self.ibc_timeout_secs == 0 {
            return Err(ConfigError::Invalid("ibc timeout must be positive".to_string()));
        }
        if self.unbonding_state_epoch_limit <= 0 {
            return Err(ConfigError::Invalid(
                "unbonding state epoch limit must be positive".to_string(),
            ));
        }
        if self.lower_c_value_limit > self.upper_c_value_limit {
            return Err(ConfigError::Invalid(format!(
                "lower C value limit {} above upper limit {}",
                self.lower_c_value_limit, self.upper_c_value_limit
            )));
        }
        Ok(())
    }

    /// Address of the deposit module account.
    pub fn deposit_address(&self) -> String {
        module_address(&self.deposit_module)
    }

    /// Address of the undelegation module account.
    pub fn undelegation_address(&self) -> String {
        module_address(&self.undelegation_module)
    }
}
