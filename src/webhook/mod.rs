//! Webhook authentication
//!
//! Inbound board change notifications are signed with an HMAC-SHA1 digest of
//! the raw request body concatenated with the callback URL, keyed by a shared
//! secret and base64-encoded. A failed check must short-circuit all further
//! event handling.

pub mod event;

pub use event::WebhookEvent;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Compute the expected signature for a payload.
///
/// Exposed so that clients and tests can produce valid signatures; the digest
/// covers `raw_body || callback_url`.
pub fn sign(callback_url: &str, secret: &str, raw_body: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(raw_body);
    mac.update(callback_url.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Verify an inbound webhook signature.
///
/// Returns `false` for a missing, empty, undecodable or mismatched signature.
/// The digest comparison is constant-time.
pub fn verify_signature(
    callback_url: &str,
    secret: &str,
    header_signature: &str,
    raw_body: &[u8],
) -> bool {
    if header_signature.is_empty() {
        return false;
    }

    let expected = match BASE64.decode(header_signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(raw_body);
    mac.update(callback_url.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
