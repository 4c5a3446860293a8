//! Single-value cache with an injected async resolver.
//!
//! Used for values that are expensive or unreliable to resolve, such as the
//! per-account device identifier. Concurrent callers share one in-flight
//! resolution instead of issuing duplicates, and the read-time fallback
//! policy decides what a failed resolution returns.

use std::future::Future;

use tokio::sync::Mutex;

/// What [`CachedValue::get`] returns when a resolution attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFallback {
    /// Propagate the failure; never serve stale data.
    AlwaysFresh,
    /// Fall back to the most recent successfully resolved value.
    SuccessPreviously,
    /// Fall back to the most recent value seen from any resolution outcome,
    /// including a partial value carried by a failed attempt.
    AnyValuePreviously,
}

struct CacheState<T> {
    /// Most recent value carried by any resolution, successful or not.
    last_value: Option<T>,
    /// Most recent successfully resolved value.
    last_success: Option<T>,
    /// Whether the most recent resolution succeeded.
    last_ok: bool,
    /// Bumped after every completed resolution and every reset; lets callers
    /// that queued behind an in-flight resolution adopt a success that
    /// landed while they waited.
    epoch: u64,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            last_value: None,
            last_success: None,
            last_ok: false,
            epoch: 0,
        }
    }
}

/// Process-safe single-value cache with single-flight resolution.
///
/// The resolver is supplied at the call site rather than stored, because it
/// typically borrows state the cache must not own (the bound account).
pub struct CachedValue<T> {
    state: Mutex<CacheState<T>>,
    resolving: Mutex<()>,
}

impl<T: Clone> CachedValue<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            resolving: Mutex::new(()),
        }
    }

    /// Resolves the value, sharing one in-flight resolution between
    /// concurrent callers.
    ///
    /// The resolver reports `(success, value)`; a failed resolution may
    /// still carry a partial value, which only [`CacheFallback::AnyValuePreviously`]
    /// readers will ever see again. A successful resolution replaces the
    /// cached value, is returned as `(true, value)`, and is adopted by every
    /// caller that queued behind it; a failure or an intervening
    /// [`CachedValue::reset`] leaves queued callers to resolve for
    /// themselves.
    pub async fn get<F, Fut>(&self, fallback: CacheFallback, resolve: F) -> (bool, Option<T>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (bool, Option<T>)>,
    {
        let epoch_before = self.state.lock().await.epoch;

        let _resolution = self.resolving.lock().await;

        {
            let state = self.state.lock().await;

            // Adopt a resolution that succeeded while we waited instead of
            // issuing a duplicate request. Anything else that moved the
            // epoch (a failed resolution, a reset) left nothing trustworthy
            // behind, so fall through and resolve.
            if state.epoch != epoch_before && state.last_ok {
                return (true, state.last_success.clone());
            }
        }

        let (ok, value) = resolve().await;
        let ok = ok && value.is_some();

        let mut state = self.state.lock().await;
        state.epoch = state.epoch.wrapping_add(1);
        state.last_ok = ok;

        if let Some(value) = &value {
            state.last_value = Some(value.clone());

            if ok {
                state.last_success = Some(value.clone());
            }
        }

        if ok {
            (true, value)
        } else {
            Self::fall_back(&state, fallback)
        }
    }

    /// Clears every cached value and outcome.
    pub async fn reset(&self) {
        let _resolution = self.resolving.lock().await;
        let mut state = self.state.lock().await;

        *state = CacheState {
            epoch: state.epoch.wrapping_add(1),
            ..CacheState::default()
        };
    }

    fn fall_back(state: &CacheState<T>, fallback: CacheFallback) -> (bool, Option<T>) {
        let value = match fallback {
            CacheFallback::AlwaysFresh => None,
            CacheFallback::SuccessPreviously => state.last_success.clone(),
            CacheFallback::AnyValuePreviously => state.last_value.clone(),
        };

        (value.is_some(), value)
    }
}

impl<T: Clone> Default for CachedValue<T> {
    fn default() -> Self {
        Self::new()
    }
}
