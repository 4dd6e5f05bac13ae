// src/auth/token.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Session tokens issued to browsers.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Prefix tokens on stored upload names. 12 bytes encode to exactly 16 chars.
pub const UPLOAD_TOKEN_BYTES: usize = 12;
pub const UPLOAD_TOKEN_LEN: usize = 16;

/// Generate a secure random token using the OS RNG.
pub fn generate_token_default() -> String {
    generate_token(&mut OsRng, SESSION_TOKEN_BYTES)
}

/// Short random token used to make stored upload names unique.
pub fn generate_upload_token() -> String {
    generate_token(&mut OsRng, UPLOAD_TOKEN_BYTES)
}

/// Generate a URL-safe token from random bytes.
/// - Uses Base64 URL-safe, no padding.
pub fn generate_token<R: RngCore>(rng: &mut R, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buf)
}

/// True for characters produced by `generate_token`.
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Hash a token using SHA-256.
/// Store this output in DB (BLOB), never the raw token.
pub fn hash_token(token: &str) -> [u8; 32] {
    let out = Sha256::digest(token.as_bytes());
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
