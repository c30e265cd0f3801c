//! Cryptographic Utilities
//!
//! Fast, deterministic hashing for high-entropy secrets (OTPs, reset and
//! refresh tokens) plus secret generation. Secrets are stored only as
//! hex-encoded SHA-256 digests and compared in constant time.

use base64::{Engine, engine::general_purpose};
use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Digest a raw secret for at-rest storage (hex-encoded SHA-256)
pub fn hash_secret(raw: &str) -> String {
    hex_encode(&sha256(raw.as_bytes()))
}

/// Compare a raw secret against a stored digest in constant time
pub fn secret_matches(raw: &str, digest: &str) -> bool {
    constant_time_eq(hash_secret(raw).as_bytes(), digest.as_bytes())
}

/// Generate a numeric one-time code of the given length
///
/// Codes are short and human-typable; the single-active-record throttle
/// upstream limits guessing attempts.
pub fn generate_numeric_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}

/// Generate a high-entropy URL-safe token (for reset links and refresh tokens)
pub fn generate_url_safe_token(entropy_bytes: usize) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes(entropy_bytes))
}

/// Encode bytes as lowercase hex string
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
