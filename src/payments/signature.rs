use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew for timestamps from the future.
const FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingHeader,

    #[error("invalid signature format")]
    MalformedHeader,

    #[error("timestamp outside the tolerance zone")]
    StaleTimestamp,

    #[error("no signatures found matching the expected signature for payload")]
    Mismatch,
}

/// Verifies a `t=<unix>,v1=<hex>` signature header over `"<t>.<body>"`.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(sig) = part.strip_prefix("v1=") {
            candidates.push(sig);
        }
    }

    let timestamp_str = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    let timestamp: i64 = timestamp_str
        .parse()
        .map_err(|_| SignatureError::MalformedHeader)?;

    let age = now - timestamp;
    if age > tolerance_secs || age < -FUTURE_SKEW_SECS {
        tracing::warn!(age, tolerance_secs, "webhook timestamp rejected");
        return Err(SignatureError::StaleTimestamp);
    }

    let expected = sign_payload(payload, secret, timestamp_str);
    let matched = candidates.iter().any(|candidate| {
        candidate.len() == expected.len()
            && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
