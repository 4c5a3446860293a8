//! The black-box RPC surface this subsystem consumes.
//!
//! Wire format and transport are out of scope; the hosting process supplies
//! an implementation bound to each account's session. Every method is a
//! suspension point and may interleave arbitrarily across accounts.

use async_trait::async_trait;

/// Raw confirmation record as reported by the list endpoint.
#[derive(Debug, Clone)]
pub struct ConfirmationEntry {
    /// Confirmation identifier.
    pub id: u64,
    /// Per-confirmation nonce required when acting on it.
    pub key: u64,
    /// Identifier of the object that created the confirmation, e.g. a trade
    /// offer or market listing.
    pub creator_id: u64,
    /// Raw numeric confirmation type, passed through unvalidated.
    pub kind: u8,
}

/// Response of the list-confirmations endpoint.
#[derive(Debug, Clone)]
pub struct ConfirmationPage {
    /// Whether the endpoint reported overall success.
    pub success: bool,
    /// Pending confirmations; may be empty.
    pub entries: Vec<ConfirmationEntry>,
}

/// Calls this subsystem issues against the platform.
///
/// `None` from the submit endpoints means the request timed out. Timeouts
/// are treated exactly like explicit failures: no caller-visible state is
/// mutated on either.
#[async_trait]
pub trait GuardRpc: Send + Sync {
    /// Authoritative server time; `0` when unknown.
    async fn server_time(&self) -> u64;

    /// Stable device identifier for `account_id`. `None` (or an empty
    /// string) means the lookup failed.
    async fn device_identifier(&self, account_id: u64) -> Option<String>;

    /// Lists pending confirmations; `None` on transport failure.
    async fn fetch_confirmations(
        &self,
        device_id: &str,
        confirmation_hash: &str,
        time: u64,
    ) -> Option<ConfirmationPage>;

    /// Applies one decision to a whole batch of confirmations. `Some(flag)`
    /// is the reported outcome, `None` a timeout.
    async fn send_confirmations(
        &self,
        device_id: &str,
        confirmation_hash: &str,
        time: u64,
        ids: &[u64],
        accept: bool,
    ) -> Option<bool>;

    /// Applies one decision to a single confirmation; `None` on timeout.
    async fn send_confirmation(
        &self,
        device_id: &str,
        confirmation_hash: &str,
        time: u64,
        id: u64,
        key: u64,
        accept: bool,
    ) -> Option<bool>;
}
