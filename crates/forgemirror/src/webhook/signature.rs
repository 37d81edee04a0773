//! HMAC-SHA256 verification of webhook request bodies.
//!
//! The host signs each delivery with the shared secret and sends the digest
//! in the `X-Hub-Signature-256` header as `sha256=<hex>`. Verification runs
//! against the raw body bytes before anything is parsed; a request that fails
//! here is discarded without touching the payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a delivery failed authentication.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No signature header was sent.
    #[error("missing signature header")]
    Missing,

    /// The header is present but not `sha256=<hex digest>`.
    #[error("malformed signature header")]
    Malformed,

    /// The digest does not match the body under the configured secret.
    #[error("signature mismatch")]
    Mismatch,
}

/// Check a raw request body against its `X-Hub-Signature-256` header.
///
/// The comparison is constant time. Nothing about the body is parsed or
/// trusted before this passes.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let digest = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::Malformed)?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Produce the signature header value the host would send for `body`.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}
