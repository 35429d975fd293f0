/// Opaque one-time and bearer tokens
///
/// Session tokens, email-verification codes and invitation codes all share
/// one format: 32 random base62 characters (about 190 bits of entropy).
/// The plaintext token goes to the client (cookie, link); only its SHA-256
/// digest is persisted, so a database leak does not leak usable tokens.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::token::{generate_token, hash_token, validate_token_format};
///
/// let (token, hash) = generate_token();
/// assert_eq!(token.len(), 32);
/// assert!(validate_token_format(&token));
/// assert_eq!(hash, hash_token(&token));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a token in characters
pub const TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a fresh token and its storage hash
///
/// Returns `(plaintext_token, sha256_hex)`.
pub fn generate_token() -> (String, String) {
    let mut rng = rand::thread_rng();

    let token: String = (0..TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let hash = hash_token(&token);

    (token, hash)
}

/// Hashes a token for storage or lookup (hex SHA-256, 64 chars)
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks that a presented token has the expected shape
///
/// Rejecting malformed input early keeps garbage out of database lookups.
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
