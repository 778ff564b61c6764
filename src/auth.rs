//! Credential primitives: password hashing and opaque bearer tokens.
//!
//! Passwords are stored as `hex(salt)$hex(sha256(salt || password))`
//! with a per-user random salt. Tokens are random bytes handed to the
//! client base64-encoded; only their SHA-256 digest is persisted.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    format!(
        "{}${}",
        hex_encode(&salt),
        hex_encode(&salted_digest(&salt, password))
    )
}

/// Check a password against a stored hash. Malformed stored values
/// simply fail the check.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = hex_decode(salt_hex) else {
        return false;
    };
    hex_encode(&salted_digest(&salt, password)) == digest_hex
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Mint an opaque bearer token for the client.
pub fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest of a token as stored in the database.
pub fn token_hash(token: &str) -> String {
    hex_encode(&Sha256::digest(token.as_bytes()))
}

/// Extract the token from an Authorization header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
