//! PKCE and CSRF state helpers for the authorization request

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

fn random_token<const N: usize>() -> String {
    let mut bytes = [0_u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Random PKCE code verifier, 64 URL-safe characters (RFC 7636 allows 43-128).
pub fn generate_code_verifier() -> String {
    random_token::<48>()
}

/// S256 code challenge: `BASE64URL(SHA256(verifier))`.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random `state` parameter, 22 URL-safe characters.
pub fn generate_state() -> String {
    random_token::<16>()
}
