//! Process-wide throttle for confirmation-list requests.
//!
//! The upstream endpoint rate-limits by source address, not by account, so a
//! single gate is shared across the whole fleet.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

/// Capacity-1 permit with a configurable cooldown between grants.
pub struct ConfirmationGate {
    permit: Arc<Semaphore>,
    delay: Duration,
}

impl ConfirmationGate {
    /// Creates a gate that keeps `delay_seconds` between grants. Zero
    /// disables throttling entirely.
    #[must_use]
    pub fn new(delay_seconds: u8) -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
            delay: Duration::from_secs(u64::from(delay_seconds)),
        }
    }

    /// Waits for the shared permit, then schedules its release after the
    /// configured cooldown without holding the caller back.
    pub async fn acquire(&self) {
        if self.delay.is_zero() {
            return;
        }

        let Ok(permit) = Arc::clone(&self.permit).acquire_owned().await else {
            // The semaphore is never closed.
            return;
        };

        permit.forget();

        let permit = Arc::clone(&self.permit);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            permit.add_permits(1);
        });
    }
}
