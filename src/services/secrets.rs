use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure opaque token: 32 random bytes,
/// hex-encoded to 64 characters. Used for email-verification tokens and
/// session ids.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

/// SHA-256 digest, hex-encoded. Session tokens are stored hashed so a
/// leaked sessions table cannot be replayed.
pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
