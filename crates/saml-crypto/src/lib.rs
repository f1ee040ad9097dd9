//! # saml-crypto
//!
//! Cryptographic primitives for the SAML 2.0 protocol core:
//!
//! - [`hash`]: SHA-1 (the SAML legacy default) and SHA-256 digests
//! - [`keys`]: RSA, DSA and ECDSA P-256 key pairs, generation and import
//! - [`signature`]: raw byte-level signing and verification in the wire
//!   forms XML-DSig expects (PKCS#1 v1.5 for RSA, IEEE P1363 `r || s`
//!   for DSA and ECDSA)
//! - [`random`]: secure random bytes and SAML message identifiers
//!
//! The XML layer lives in `saml-core`; this crate never sees XML.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod hash;
pub mod keys;
pub mod random;
pub mod signature;

pub use hash::{sha1, sha256};
pub use keys::{KeyPair, PublicKey};
pub use random::{message_id, random_bytes};
pub use signature::{sign_bytes, verify_bytes, CryptoError, SigningAlgorithm};
