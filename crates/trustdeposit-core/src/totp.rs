//! Time-based one-time codes for the two-factor login step.
//!
//! Codes follow RFC 6238 with the parameters authenticator apps use by
//! default: HMAC-SHA1, six digits, thirty second steps.

use crate::{Error, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use totp_rs::{Algorithm, Secret, TOTP};

pub const CODE_DIGITS: usize = 6;
pub const STEP_SECONDS: u64 = 30;

/// A generated code and how long it stays valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpCode {
    pub code: String,
    pub seconds_remaining: u64,
}

/// Generate the code for the current 30-second window
pub fn generate_code(secret: &str) -> Result<TotpCode> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::InvalidSecret(format!("system clock before epoch: {}", e)))?
        .as_secs();

    generate_code_at(secret, now)
}

/// Generate the code for the window containing `unix_seconds`
pub fn generate_code_at(secret: &str, unix_seconds: u64) -> Result<TotpCode> {
    let totp = build(secret)?;

    Ok(TotpCode {
        code: totp.generate(unix_seconds),
        seconds_remaining: STEP_SECONDS - (unix_seconds % STEP_SECONDS),
    })
}

/// Check that a secret decodes, without generating anything
pub fn validate_secret(secret: &str) -> Result<()> {
    decode_secret(secret).map(|_| ())
}

fn build(secret: &str) -> Result<TOTP> {
    let bytes = decode_secret(secret)?;

    // Authenticator apps commonly issue 80-bit secrets, below the
    // 128-bit minimum that TOTP::new enforces.
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        CODE_DIGITS,
        1,
        STEP_SECONDS,
        bytes,
    ))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_end_matches('=')
        .to_ascii_uppercase();

    if normalized.is_empty() {
        return Err(Error::InvalidSecret("secret is empty".to_string()));
    }

    let bytes = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|e| Error::InvalidSecret(format!("not valid base32: {:?}", e)))?;

    if bytes.is_empty() {
        return Err(Error::InvalidSecret("secret decodes to zero bytes".to_string()));
    }

    Ok(bytes)
}
