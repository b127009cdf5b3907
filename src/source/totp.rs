// src/source/totp.rs
//! RFC 6238 time-based one-time codes (HMAC-SHA1, 30 s step, 6 digits)
//! for the Instagram two-factor login.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const STEP_SECS: u64 = 30;
const DIGITS: u32 = 6;

/// Code for the current 30 s window of a base32 seed.
pub fn current_code(secret_b32: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    code_at(secret_b32, now)
}

pub fn code_at(secret_b32: &str, unix_secs: u64) -> Result<String> {
    let key = base32_decode(secret_b32).ok_or_else(|| anyhow!("TOTP seed is not valid base32"))?;
    if key.is_empty() {
        return Err(anyhow!("TOTP seed is empty"));
    }
    hotp(&key, unix_secs / STEP_SECS)
}

fn hotp(key: &[u8], counter: u64) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|e| anyhow!("invalid HMAC key: {e}"))?;
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    // dynamic truncation, RFC 4226 §5.3
    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let bin = u32::from_be_bytes([
        hash[offset] & 0x7f,
        hash[offset + 1],
        hash[offset + 2],
        hash[offset + 3],
    ]);

    Ok(format!(
        "{:0width$}",
        bin % 10u32.pow(DIGITS),
        width = DIGITS as usize
    ))
}

/// RFC 4648 base32. Authenticator apps hand out seeds in lowercase and grouped
/// with spaces, so both are tolerated.
fn base32_decode(data: &str) -> Option<Vec<u8>> {
    let mut buffer = 0u32;
    let mut bits = 0u32;
    let mut out = Vec::new();

    for ch in data.chars().filter(|c| !c.is_whitespace() && *c != '-') {
        if ch == '=' {
            break;
        }
        let value = match ch.to_ascii_uppercase() {
            c @ 'A'..='Z' => c as u32 - 'A' as u32,
            c @ '2'..='7' => c as u32 - '2' as u32 + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }

    Some(out)
}
