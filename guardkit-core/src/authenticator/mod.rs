//! Per-account Guard authenticator.
//!
//! Owns the two-factor secrets, the cached device identifier, and the
//! confirmation workflow. Constructed during account deserialization with
//! secrets only; [`Authenticator::init`] binds it to its account before use.

mod confirmations;

use std::sync::{Arc, OnceLock};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::cache::CachedValue;
use crate::code;
use crate::rpc::GuardRpc;
use crate::services::GuardServices;

/// Identifies the owning account to the authenticator.
///
/// A plain handle set once by [`Authenticator::init`]; the account owns the
/// authenticator, so no ownership cycle exists.
pub struct AccountHandle {
    /// Platform identifier of the account.
    pub id: u64,
    /// Human-readable account name, used in log output.
    pub name: String,
    /// Session-bound RPC surface for this account.
    pub rpc: Arc<dyn GuardRpc>,
}

pub(crate) struct Bound {
    pub(crate) account: AccountHandle,
    pub(crate) services: Arc<GuardServices>,
}

/// Per-account Guard two-factor engine.
///
/// Secrets are immutable after construction and are never validated at
/// load: a malformed secret fails at first use with a log entry, so a
/// partially configured account does not block startup.
#[derive(Deserialize)]
pub struct Authenticator {
    /// Base64 key driving one-time code generation.
    #[serde(deserialize_with = "deserialize_secret")]
    shared_secret: SecretString,
    /// Base64 key driving confirmation request signing.
    #[serde(deserialize_with = "deserialize_secret")]
    identity_secret: SecretString,
    #[serde(skip)]
    bound: OnceLock<Bound>,
    #[serde(skip)]
    device_id: Arc<CachedValue<String>>,
}

impl Authenticator {
    /// Creates an authenticator directly from its base64 secrets.
    #[must_use]
    pub fn new(shared_secret: SecretString, identity_secret: SecretString) -> Self {
        Self {
            shared_secret,
            identity_secret,
            bound: OnceLock::new(),
            device_id: Arc::new(CachedValue::new()),
        }
    }

    /// Binds the authenticator to its owning account and the process-wide
    /// services. Must be called exactly once, before any other operation.
    ///
    /// # Panics
    /// Panics when the authenticator is already bound.
    pub fn init(&self, account: AccountHandle, services: Arc<GuardServices>) {
        assert!(
            self.bound.set(Bound { account, services }).is_ok(),
            "authenticator is already bound to an account"
        );
    }

    /// Reports whether both stored secrets decode as base64, for callers
    /// that want to surface a misconfigured account ahead of first use.
    #[must_use]
    pub fn has_valid_secrets(&self) -> bool {
        BASE64.decode(self.shared_secret.expose_secret()).is_ok()
            && BASE64.decode(self.identity_secret.expose_secret()).is_ok()
    }

    /// Generates the one-time login code for the current (server-adjusted)
    /// time.
    ///
    /// Returns `None` when the shared secret is malformed (logged, never
    /// raised).
    ///
    /// # Panics
    /// Panics when called before [`Authenticator::init`].
    pub async fn generate_token(&self) -> Option<String> {
        let bound = self.bound();
        let time = bound.services.clock().now(bound.account.rpc.as_ref()).await;

        self.generate_token_for_time(time)
    }

    /// Generates the one-time login code for an explicit timestamp.
    ///
    /// Returns `None` when the shared secret is malformed.
    ///
    /// # Panics
    /// Panics when `time` is zero or the authenticator is unbound; both are
    /// caller bugs.
    #[must_use]
    pub fn generate_token_for_time(&self, time: u64) -> Option<String> {
        self.bound();

        code::generate_code(self.shared_secret.expose_secret(), time)
    }

    /// Hook invoked when the account's session is freshly (re)established.
    ///
    /// Discards the cached device identifier in the background: the reset is
    /// deliberately fire-and-forget and is never awaited by the caller.
    ///
    /// # Panics
    /// Panics when called before [`Authenticator::init`].
    pub fn on_init_modules(&self) {
        let account = self.bound().account.name.clone();
        let device_id = Arc::clone(&self.device_id);

        tokio::spawn(async move {
            device_id.reset().await;
            tracing::debug!(account, "device identifier cache reset");
        });
    }

    pub(crate) fn bound(&self) -> &Bound {
        self.bound
            .get()
            .expect("authenticator used before init()")
    }

    pub(crate) fn identity_secret(&self) -> &str {
        self.identity_secret.expose_secret()
    }

    pub(crate) fn device_id_cache(&self) -> &CachedValue<String> {
        &self.device_id
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::GuardConfig;
    use crate::rpc::ConfirmationPage;

    struct NullRpc;

    #[async_trait]
    impl GuardRpc for NullRpc {
        async fn server_time(&self) -> u64 {
            1_700_000_000
        }

        async fn device_identifier(&self, _account_id: u64) -> Option<String> {
            None
        }

        async fn fetch_confirmations(
            &self,
            _device_id: &str,
            _confirmation_hash: &str,
            _time: u64,
        ) -> Option<ConfirmationPage> {
            None
        }

        async fn send_confirmations(
            &self,
            _device_id: &str,
            _confirmation_hash: &str,
            _time: u64,
            _ids: &[u64],
            _accept: bool,
        ) -> Option<bool> {
            None
        }

        async fn send_confirmation(
            &self,
            _device_id: &str,
            _confirmation_hash: &str,
            _time: u64,
            _id: u64,
            _key: u64,
            _accept: bool,
        ) -> Option<bool> {
            None
        }
    }

    fn valid_authenticator() -> Authenticator {
        Authenticator::new(
            SecretString::from(BASE64.encode(b"shared secret bytes.")),
            SecretString::from(BASE64.encode(b"identity secret byte")),
        )
    }

    fn handle() -> AccountHandle {
        AccountHandle {
            id: 42,
            name: "tester".to_string(),
            rpc: Arc::new(NullRpc),
        }
    }

    #[test]
    fn deserializes_from_the_account_blob() {
        let blob = format!(
            r#"{{"shared_secret": "{}", "identity_secret": "{}"}}"#,
            BASE64.encode(b"shared secret bytes."),
            BASE64.encode(b"identity secret byte"),
        );

        let authenticator: Authenticator = serde_json::from_str(&blob).unwrap();
        assert!(authenticator.has_valid_secrets());
    }

    #[test]
    fn secrets_are_required_fields() {
        let result: Result<Authenticator, _> =
            serde_json::from_str(r#"{"shared_secret": "AAAA"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_secrets_are_accepted_at_load() {
        let blob = r#"{"shared_secret": "!!!", "identity_secret": "???"}"#;

        let authenticator: Authenticator = serde_json::from_str(blob).unwrap();
        assert!(!authenticator.has_valid_secrets());
    }

    #[tokio::test]
    async fn generates_a_well_formed_token() {
        let authenticator = valid_authenticator();
        authenticator.init(handle(), Arc::new(GuardServices::new(&GuardConfig::default())));

        let token = authenticator.generate_token().await.unwrap();
        assert_eq!(token.len(), code::CODE_DIGITS);

        let explicit = authenticator.generate_token_for_time(1_700_000_000).unwrap();
        assert_eq!(
            Some(explicit),
            code::generate_code(&BASE64.encode(b"shared secret bytes."), 1_700_000_000)
        );
    }

    #[tokio::test]
    async fn malformed_shared_secret_yields_none() {
        let authenticator = Authenticator::new(
            SecretString::from("not base64!!!".to_string()),
            SecretString::from(BASE64.encode(b"identity secret byte")),
        );
        authenticator.init(handle(), Arc::new(GuardServices::default()));

        assert_eq!(authenticator.generate_token().await, None);
    }

    #[test]
    #[should_panic(expected = "used before init()")]
    fn token_before_init_is_a_caller_bug() {
        let _ = valid_authenticator().generate_token_for_time(30);
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn double_init_is_a_caller_bug() {
        let authenticator = valid_authenticator();
        let services = Arc::new(GuardServices::default());

        authenticator.init(handle(), Arc::clone(&services));
        authenticator.init(handle(), services);
    }

    #[tokio::test]
    async fn on_init_modules_resets_in_the_background() {
        let authenticator = valid_authenticator();
        authenticator.init(handle(), Arc::new(GuardServices::default()));

        // Seed the cache, fire the detached reset, then observe that the
        // cached value is gone once the background task has run.
        let cache = Arc::clone(&authenticator.device_id);
        cache
            .get(crate::cache::CacheFallback::SuccessPreviously, || async {
                (true, Some("device-1".to_string()))
            })
            .await;

        authenticator.on_init_modules();
        tokio::task::yield_now().await;

        let (ok, value) = cache
            .get(crate::cache::CacheFallback::SuccessPreviously, || async {
                (false, None)
            })
            .await;
        assert!(!ok);
        assert_eq!(value, None);
    }
}
