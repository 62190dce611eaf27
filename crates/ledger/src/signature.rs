//! Webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::error::{LedgerError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the hex HMAC-SHA512 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Hex-encoded HMAC-SHA512 of `body` keyed with `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a webhook signature against the raw body.
///
/// A missing signature is a mismatch. Comparison is constant time and
/// ignores the case of the supplied hex digits.
pub fn verify_signature(body: &[u8], signature: Option<&str>, secret: &str) -> Result<()> {
    let provided = signature
        .map(|s| s.trim().to_ascii_lowercase())
        .ok_or(LedgerError::SignatureMismatch)?;
    let expected = sign(body, secret);

    if expected.is_empty() || !bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        return Err(LedgerError::SignatureMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "sk_test_secret";

    #[test]
    fn test_valid_signature() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign(body, SECRET);
        assert_eq!(signature.len(), 128);
        assert!(verify_signature(body, Some(&signature), SECRET).is_ok());
        assert!(verify_signature(body, Some(&signature.to_uppercase()), SECRET).is_ok());
    }

    #[test]
    fn test_tampered_body() {
        let signature = sign(br#"{"amount":5000}"#, SECRET);
        let result = verify_signature(br#"{"amount":9000}"#, Some(&signature), SECRET);
        assert!(matches!(result, Err(LedgerError::SignatureMismatch)));
    }

    #[test]
    fn test_missing_or_wrong_secret() {
        let body = b"{}";
        assert!(verify_signature(body, None, SECRET).is_err());
        assert!(verify_signature(body, Some(""), SECRET).is_err());

        let signature = sign(body, "another-secret");
        assert!(verify_signature(body, Some(&signature), SECRET).is_err());
    }
}
