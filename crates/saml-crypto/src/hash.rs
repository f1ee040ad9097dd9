//! Digest functions used for XML-Signature references.

use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Computes a SHA-1 digest of the input data.
///
/// SHA-1 is the historical SAML 2.0 default digest and is kept for
/// interoperability with legacy peers.
#[must_use]
pub fn sha1(data: &[u8]) -> Vec<u8> {
    Sha1::digest(data).to_vec()
}

/// Computes a SHA-256 digest of the input data.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}
