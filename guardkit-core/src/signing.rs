//! Signed tokens for the confirmation endpoints.
//!
//! Every confirmation call carries an HMAC-SHA1 over the request time and a
//! short tag, keyed by the per-account identity secret. The platform rejects
//! requests whose signature does not match the device identifier and time.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::Zeroizing;

type HmacSha1 = Hmac<Sha1>;

/// Longest tag prefix that participates in the signature.
const MAX_TAG_BYTES: usize = 32;

/// Signs a confirmation request issued at `time` with an optional `tag`.
///
/// The signed buffer is the 8-byte big-endian time followed by at most 32
/// UTF-8 bytes of the tag. Returns the base64 digest, or `None` when
/// `identity_secret` is not valid base64 (logged, never raised).
///
/// # Panics
/// Panics when `time` is zero, which always indicates a caller bug.
#[must_use]
pub fn confirmation_hash(
    identity_secret: &str,
    time: u64,
    tag: Option<&str>,
) -> Option<String> {
    assert!(time != 0, "time must be non-zero");

    let secret = match BASE64.decode(identity_secret) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(error) => {
            tracing::error!(%error, "identity secret is not valid base64");
            return None;
        }
    };

    let mut buffer = Vec::with_capacity(8 + MAX_TAG_BYTES);
    buffer.extend_from_slice(&time.to_be_bytes());

    if let Some(tag) = tag {
        let raw = tag.as_bytes();
        buffer.extend_from_slice(&raw[..raw.len().min(MAX_TAG_BYTES)]);
    }

    let mut mac = HmacSha1::new_from_slice(&secret).ok()?;
    mac.update(&buffer);

    Some(BASE64.encode(mac.finalize().into_bytes()))
}
