use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind every opaque token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate a URL-safe opaque token from `TOKEN_BYTES` of OS randomness.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage so that a dump of the store does not leak
/// usable credentials.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `start + ttl`, saturating at the latest representable instant so a huge
/// configured TTL means "never" instead of overflowing.
pub fn expiry_after(start: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    start
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
