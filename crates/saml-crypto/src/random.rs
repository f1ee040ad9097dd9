//! Cryptographically secure random generation.
//!
//! Provides the random source for SAML message identifiers. The thread-local
//! generator is cryptographically secure and safe to share across threads
//! processing independent messages.

use rand::{Rng, RngCore};

/// Generates `len` cryptographically secure random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generates a SAML message identifier with the given prefix.
///
/// The identifier is the prefix followed by 32 lowercase hex characters
/// (128 bits of entropy). With a prefix starting in a letter or underscore
/// the result is always a valid XML `NCName`.
#[must_use]
pub fn id_with_prefix(prefix: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + 32);
    id.push_str(prefix);
    for byte in random_bytes(16) {
        use std::fmt::Write;
        // infallible for String
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Generates a SAML message identifier with the standard `ID_` prefix.
#[must_use]
pub fn message_id() -> String {
    id_with_prefix("ID_")
}

/// Generates a cryptographically secure random number in `[min, max)`.
///
/// # Panics
///
/// Panics if `min >= max`.
#[must_use]
pub fn random_range(min: u64, max: u64) -> u64 {
    assert!(min < max, "min must be less than max");
    rand::thread_rng().gen_range(min..max)
}
