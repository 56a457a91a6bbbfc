//! Single-use opaque tokens for email verification and password reset.

use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};

pub const VERIFICATION_TTL: Duration = Duration::hours(24);
pub const RESET_TTL: Duration = Duration::hours(1);

/// 32 random bytes, hex encoded.
pub fn generate() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A fresh token together with its expiry.
pub fn issue(ttl: Duration) -> (String, OffsetDateTime) {
    (generate(), OffsetDateTime::now_utc() + ttl)
}
