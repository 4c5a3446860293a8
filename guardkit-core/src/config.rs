//! Process-wide configuration consumed by the Guard services.

use serde::{Deserialize, Serialize};

use crate::error::GuardError;

/// Default cooldown, in seconds, between confirmation-list requests.
pub const DEFAULT_CONFIRMATIONS_LIMITER_DELAY: u8 = 10;

/// Knobs shared by every account in the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Cooldown, in whole seconds, between confirmation-list requests across
    /// the entire fleet. Zero disables throttling.
    pub confirmations_limiter_delay: u8,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            confirmations_limiter_delay: DEFAULT_CONFIRMATIONS_LIMITER_DELAY,
        }
    }
}

impl GuardConfig {
    /// Parses a configuration blob, filling omitted fields with defaults.
    ///
    /// # Errors
    /// Returns [`GuardError::InvalidConfig`] when `raw` is not valid JSON.
    pub fn from_json(raw: &str) -> Result<Self, GuardError> {
        serde_json::from_str(raw).map_err(|error| GuardError::InvalidConfig(error.to_string()))
    }
}
