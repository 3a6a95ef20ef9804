//! One-time code generation: RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! Codes are 6 digits, HMAC-SHA1, with a 30-second TOTP step, which is
//! what authenticator apps assume when a provisioning URI carries no
//! `digits`/`period`/`algorithm` parameters.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::{OtpVaultError, Result};
use crate::vault::record::{decode_secret, OtpKind};

/// Number of digits in a generated code.
pub const DIGITS: u32 = 6;

/// TOTP time step in seconds.
pub const PERIOD: u64 = 30;

/// Computes the code for a token.  `counter` is only consulted for HOTP.
pub trait CodeGenerator {
    fn compute(&self, secret: &str, kind: OtpKind, counter: u64) -> Result<String>;
}

/// Standard generator.  Uses the system clock unless pinned with `at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGenerator {
    unix_time: Option<u64>,
}

impl StandardGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose TOTP clock is fixed at `unix_seconds`.
    pub fn at(unix_seconds: u64) -> Self {
        Self {
            unix_time: Some(unix_seconds),
        }
    }

    fn now(&self) -> u64 {
        self.unix_time.unwrap_or_else(current_unix_time)
    }
}

impl CodeGenerator for StandardGenerator {
    fn compute(&self, secret: &str, kind: OtpKind, counter: u64) -> Result<String> {
        match kind {
            OtpKind::Hotp => generate_hotp(secret, counter),
            OtpKind::Totp => generate_totp_at(secret, self.now()),
        }
    }
}

/// HOTP code for a base32 secret and counter.
pub fn generate_hotp(secret_b32: &str, counter: u64) -> Result<String> {
    let key = decode_secret(secret_b32)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| OtpVaultError::InvalidSecret("secret is not valid base32".into()))?;
    hotp_raw(&key, counter)
}

/// TOTP code for a base32 secret at an explicit unix timestamp.
pub fn generate_totp_at(secret_b32: &str, unix_seconds: u64) -> Result<String> {
    generate_hotp(secret_b32, unix_seconds / PERIOD)
}

/// Seconds until the current TOTP code expires.
pub fn seconds_remaining() -> u64 {
    PERIOD - current_unix_time() % PERIOD
}

fn hotp_raw(key: &[u8], counter: u64) -> Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| OtpVaultError::InvalidSecret(format!("unusable key: {e}")))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(truncate(&digest))
}

/// Dynamic truncation per RFC 4226 §5.3.
fn truncate(digest: &[u8]) -> String {
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset]) & 0x7f) << 24
        | u32::from(digest[offset + 1]) << 16
        | u32::from(digest[offset + 2]) << 8
        | u32::from(digest[offset + 3]);
    let code = binary % 10u32.pow(DIGITS);
    format!("{code:0>width$}", width = DIGITS as usize)
}

fn current_unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
