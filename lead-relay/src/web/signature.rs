//! Meta webhook signature verification.
//!
//! Meta signs each delivery with HMAC-SHA256 over the raw request body, keyed
//! by the app secret, and sends it as `X-Hub-Signature-256: sha256=<hex>`.
//! Reference: https://developers.facebook.com/docs/graph-api/webhooks/getting-started#validate-payloads

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::config::SignaturePolicy;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a Meta webhook signature.
///
/// # Arguments
///
/// * `app_secret` - The configured app secret, if any
/// * `body` - The raw request body, exactly as received
/// * `signature` - The `X-Hub-Signature-256` header value, if present
/// * `policy` - How to treat requests that cannot be checked
///
/// # Returns
///
/// `true` if the signature matches. Under [`SignaturePolicy::Permissive`] a
/// missing header, missing secret or empty body also returns `true`; this
/// keeps unconfigured deployments working and is not a security guarantee.
pub fn verify_meta_signature(
    app_secret: Option<&str>,
    body: &[u8],
    signature: Option<&str>,
    policy: SignaturePolicy,
) -> bool {
    let secret = app_secret.filter(|s| !s.trim().is_empty());

    let (secret, signature) = match (secret, signature, body.is_empty()) {
        (Some(secret), Some(signature), false) => (secret, signature),
        _ => {
            let allowed = policy == SignaturePolicy::Permissive;
            warn!(
                has_secret = secret.is_some(),
                has_signature = signature.is_some(),
                body_length = body.len(),
                allowed = allowed,
                "meta_signature_not_checked"
            );
            return allowed;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("meta_signature_invalid_key");
            return false;
        }
    };
    mac.update(body);

    let expected = format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()));

    // Byte-for-byte match, so uppercase hex or a missing prefix is rejected
    let valid = constant_time_compare(&expected, signature);

    if !valid {
        warn!(
            body_length = body.len(),
            expected_length = expected.len(),
            actual_length = signature.len(),
            "meta_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Compute the header value Meta would send for `body`.
#[cfg(test)]
pub(crate) fn sign_body(app_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}
