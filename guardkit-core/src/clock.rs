//! Process-wide estimate of the offset between local and server time.
//!
//! Codes and signatures are time-windowed, so every account needs the
//! server's notion of "now". The offset is a property of the upstream
//! service as a whole and is therefore measured once and shared by the
//! entire fleet.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::rpc::GuardRpc;

/// How long a measured offset is trusted before it is re-measured.
const OFFSET_TTL: Duration = Duration::from_secs(15 * 60);

/// A measured local/server offset and when it was captured.
#[derive(Clone, Copy)]
struct ClockOffset {
    offset_seconds: i64,
    captured_at: Instant,
}

impl ClockOffset {
    fn is_fresh(&self) -> bool {
        self.captured_at.elapsed() < OFFSET_TTL
    }

    // Skew is assumed small; the cast round-trips through two's complement,
    // so wrapping addition applies negative offsets correctly.
    #[allow(clippy::cast_sign_loss)]
    const fn apply(&self, local: u64) -> u64 {
        local.wrapping_add(self.offset_seconds as u64)
    }
}

/// Shared clock-synchronization service.
///
/// Construct one instance per process and inject it into every account; all
/// accounts observe the same offset by design.
pub struct ClockSync {
    offset: RwLock<Option<ClockOffset>>,
    refresh: Mutex<()>,
}

impl ClockSync {
    /// Creates an unsynchronized instance; the first [`ClockSync::now`] call
    /// measures the offset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offset: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Current unix time adjusted by the measured server offset.
    ///
    /// A fresh offset is read without touching the refresh lock, so fleet
    /// time lookups never serialize behind an in-flight refresh RPC. A stale
    /// offset is re-measured by at most one caller at a time. When the
    /// server reports its time as unknown (`0`), the cached state is left
    /// untouched and the unadjusted local time is returned for this call
    /// only.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn now(&self, rpc: &dyn GuardRpc) -> u64 {
        if let Some(offset) = self.snapshot() {
            return offset.apply(unix_time());
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(offset) = self.snapshot() {
            return offset.apply(unix_time());
        }

        let server_time = rpc.server_time().await;

        if server_time == 0 {
            tracing::warn!("server reported unknown time, using unadjusted local clock");

            return unix_time();
        }

        let local = unix_time();
        let offset = ClockOffset {
            // Wrapping keeps the subtraction well-defined when the local
            // clock runs ahead of the server.
            offset_seconds: server_time.wrapping_sub(local) as i64,
            captured_at: Instant::now(),
        };

        *self.offset.write().unwrap_or_else(PoisonError::into_inner) = Some(offset);

        offset.apply(local)
    }

    /// Forgets the measured offset so the next [`ClockSync::now`] call
    /// re-measures it.
    ///
    /// Idempotent, and a no-op while a refresh is already in progress.
    pub fn reset(&self) {
        if let Ok(_refresh) = self.refresh.try_lock() {
            *self.offset.write().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    fn snapshot(&self) -> Option<ClockOffset> {
        let offset = *self.offset.read().unwrap_or_else(PoisonError::into_inner);

        offset.filter(ClockOffset::is_fresh)
    }
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
