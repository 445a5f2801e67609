use sha2::{Digest, Sha256};

/// Length of a stored password digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of the password's UTF-8 bytes, lower-case hex.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
