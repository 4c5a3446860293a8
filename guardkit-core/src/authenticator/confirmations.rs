//! Confirmation workflow: fetching pending confirmations and applying
//! accept/decline decisions with batch-then-fallback retry.

use std::collections::HashSet;
use std::sync::Arc;

use super::{Authenticator, Bound};
use crate::cache::CacheFallback;
use crate::confirmation::{Confirmation, ConfirmationType};
use crate::signing;

/// Tag signed into every confirmation request.
const CONFIRMATION_TAG: &str = "conf";

impl Authenticator {
    /// Fetches the set of pending confirmations.
    ///
    /// Returns `None` when the device identifier cannot be resolved, the
    /// request cannot be signed, the transport fails, or the endpoint
    /// returns a malformed record. Confirmations of unrecognized type are
    /// logged and still included.
    ///
    /// # Panics
    /// Panics when called before [`Authenticator::init`].
    pub async fn get_confirmations(&self) -> Option<HashSet<Confirmation>> {
        let bound = self.bound();
        let account = bound.account.name.as_str();

        let device_id = self.resolve_device_id(bound).await?;

        // Throttled fleet-wide; the endpoint rate-limits by source.
        bound.services.gate().acquire().await;

        let time = bound.services.clock().now(bound.account.rpc.as_ref()).await;

        let Some(confirmation_hash) =
            signing::confirmation_hash(self.identity_secret(), time, Some(CONFIRMATION_TAG))
        else {
            tracing::error!(account, "failed to sign confirmation request");

            return None;
        };

        let page = bound
            .account
            .rpc
            .fetch_confirmations(&device_id, &confirmation_hash, time)
            .await?;

        if !page.success {
            tracing::warn!(account, "list confirmations endpoint reported failure");

            return None;
        }

        let mut result = HashSet::with_capacity(page.entries.len());

        for entry in page.entries {
            let kind = ConfirmationType::from_wire(entry.kind);

            match Confirmation::new(entry.id, entry.key, entry.creator_id, kind) {
                Ok(confirmation) => {
                    result.insert(confirmation);
                }
                Err(error) => {
                    tracing::error!(account, %error, "received malformed confirmation record");

                    return None;
                }
            }
        }

        Some(result)
    }

    /// Applies one accept/decline decision to every confirmation given.
    ///
    /// A failed batch call falls back to submitting each confirmation
    /// individually and synchronously, in input order; the upstream cannot
    /// reliably handle parallel per-item calls. A reported per-item failure
    /// is logged and ignored, since per-item failure reporting is itself
    /// unreliable — only a timeout aborts the workflow. Returns `true` once
    /// every confirmation has been attempted without a timeout.
    ///
    /// # Panics
    /// Panics when `confirmations` is empty or the authenticator is unbound;
    /// both are caller bugs.
    pub async fn handle_confirmations(
        &self,
        confirmations: &[Confirmation],
        accept: bool,
    ) -> bool {
        assert!(!confirmations.is_empty(), "confirmations must be non-empty");

        let bound = self.bound();
        let account = bound.account.name.as_str();

        let Some(device_id) = self.resolve_device_id(bound).await else {
            return false;
        };

        let time = bound.services.clock().now(bound.account.rpc.as_ref()).await;

        let Some(confirmation_hash) =
            signing::confirmation_hash(self.identity_secret(), time, Some(CONFIRMATION_TAG))
        else {
            tracing::error!(account, "failed to sign confirmation request");

            return false;
        };

        let ids: Vec<u64> = confirmations.iter().map(Confirmation::id).collect();
        let rpc = bound.account.rpc.as_ref();

        match rpc
            .send_confirmations(&device_id, &confirmation_hash, time, &ids, accept)
            .await
        {
            None => {
                tracing::warn!(account, "batch confirmation request timed out");

                false
            }
            Some(true) => true,
            Some(false) => {
                // The batch endpoint fails non-deterministically; apply the
                // decision one confirmation at a time instead.
                tracing::debug!(
                    account,
                    "batch confirmation failed, falling back to per-item requests"
                );

                for confirmation in confirmations {
                    match rpc
                        .send_confirmation(
                            &device_id,
                            &confirmation_hash,
                            time,
                            confirmation.id(),
                            confirmation.key(),
                            accept,
                        )
                        .await
                    {
                        None => {
                            tracing::warn!(
                                account,
                                id = confirmation.id(),
                                "confirmation request timed out"
                            );

                            return false;
                        }
                        Some(false) => {
                            tracing::debug!(
                                account,
                                id = confirmation.id(),
                                "confirmation reported failure, ignoring"
                            );
                        }
                        Some(true) => {}
                    }
                }

                true
            }
        }
    }

    async fn resolve_device_id(&self, bound: &Bound) -> Option<String> {
        let account = bound.account.name.as_str();
        let account_id = bound.account.id;
        let rpc = Arc::clone(&bound.account.rpc);

        let (success, device_id) = self
            .device_id_cache()
            .get(CacheFallback::SuccessPreviously, || async move {
                match rpc.device_identifier(account_id).await {
                    Some(id) if !id.is_empty() => (true, Some(id)),
                    _ => (false, None),
                }
            })
            .await;

        match device_id {
            Some(id) if success && !id.is_empty() => Some(id),
            _ => {
                tracing::error!(account, "failed to resolve device identifier");

                None
            }
        }
    }
}
