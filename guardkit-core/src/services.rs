//! Process-wide services shared by every account.

use crate::clock::ClockSync;
use crate::config::GuardConfig;
use crate::gate::ConfirmationGate;

/// Clock synchronization and confirmation throttling, constructed once per
/// process and injected into every authenticator.
///
/// Both services reflect properties of the upstream service as a whole, so
/// every account must observe the same instance; constructing them
/// explicitly (instead of hiding them behind statics) is what makes isolated
/// test instances possible.
pub struct GuardServices {
    clock: ClockSync,
    gate: ConfirmationGate,
}

impl GuardServices {
    /// Builds the shared services from the process configuration.
    #[must_use]
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            clock: ClockSync::new(),
            gate: ConfirmationGate::new(config.confirmations_limiter_delay),
        }
    }

    /// Shared clock-synchronization service.
    #[must_use]
    pub const fn clock(&self) -> &ClockSync {
        &self.clock
    }

    /// Shared confirmation-list rate limiter.
    #[must_use]
    pub const fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    /// Forces the next time lookup to re-measure the server offset.
    pub fn reset_clock_sync(&self) {
        self.clock.reset();
    }
}

impl Default for GuardServices {
    fn default() -> Self {
        Self::new(&GuardConfig::default())
    }
}
