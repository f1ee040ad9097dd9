//! Byte-level signing and verification.
//!
//! These functions operate on raw octets; the XML-Signature layer in the
//! core crate canonicalizes first and then hands the result here. Signature
//! values use the wire forms XML-DSig mandates: PKCS#1 v1.5 for RSA and the
//! fixed-width IEEE P1363 `r || s` concatenation for DSA and ECDSA.

use rsa::Pkcs1v15Sign;
use signature::{DigestSigner, DigestVerifier, Signer, Verifier};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use thiserror::Error;

use crate::keys::{KeyFamily, KeyPair, PublicKey};

/// Byte length of each half of a DSA-SHA1 P1363 signature.
const DSA_COMPONENT_LEN: usize = 20;

/// Errors from key handling and signing.
///
/// Verification mismatches are not errors: a signature that fails to
/// verify, for whatever cryptographic reason, yields `Ok(false)`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key pair generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Producing a signature failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Key material could not be parsed or constructed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The requested algorithm is not supported here.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signing key does not match the requested algorithm.
    #[error("{algorithm} requires a {expected:?} key, got {actual:?}")]
    KeyMismatch {
        /// Requested algorithm name.
        algorithm: &'static str,
        /// Key family the algorithm needs.
        expected: KeyFamily,
        /// Key family that was supplied.
        actual: KeyFamily,
    },
}

/// Signature algorithms supported for SAML messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// DSA with SHA-1.
    DsaSha1,
    /// RSA PKCS#1 v1.5 with SHA-1.
    RsaSha1,
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256,
    /// ECDSA on P-256 with SHA-256.
    EcdsaSha256,
}

impl SigningAlgorithm {
    /// Short display name of the algorithm.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DsaSha1 => "DSA-SHA1",
            Self::RsaSha1 => "RSA-SHA1",
            Self::RsaSha256 => "RSA-SHA256",
            Self::EcdsaSha256 => "ECDSA-SHA256",
        }
    }

    /// The key family this algorithm signs with.
    #[must_use]
    pub const fn key_family(self) -> KeyFamily {
        match self {
            Self::DsaSha1 => KeyFamily::Dsa,
            Self::RsaSha1 | Self::RsaSha256 => KeyFamily::Rsa,
            Self::EcdsaSha256 => KeyFamily::EcdsaP256,
        }
    }
}

/// Signs `data` with the given key and algorithm.
///
/// Fails if the key family does not match the algorithm.
pub fn sign_bytes(
    key: &KeyPair,
    data: &[u8],
    algorithm: SigningAlgorithm,
) -> Result<Vec<u8>, CryptoError> {
    match (algorithm, key) {
        (SigningAlgorithm::RsaSha1, KeyPair::Rsa(key)) => key
            .sign(Pkcs1v15Sign::new::<Sha1>(), &crate::hash::sha1(data))
            .map_err(|e| CryptoError::Signing(e.to_string())),
        (SigningAlgorithm::RsaSha256, KeyPair::Rsa(key)) => key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &crate::hash::sha256(data))
            .map_err(|e| CryptoError::Signing(e.to_string())),
        (SigningAlgorithm::DsaSha1, KeyPair::Dsa(key)) => {
            let signature: dsa::Signature = key
                .try_sign_digest(Sha1::new_with_prefix(data))
                .map_err(|e| CryptoError::Signing(e.to_string()))?;
            Ok(dsa_to_p1363(&signature))
        }
        (SigningAlgorithm::EcdsaSha256, KeyPair::EcdsaP256(key)) => {
            let signature: p256::ecdsa::Signature = key.sign(data);
            Ok(signature.to_bytes().to_vec())
        }
        (algorithm, key) => Err(CryptoError::KeyMismatch {
            algorithm: algorithm.name(),
            expected: algorithm.key_family(),
            actual: key.family(),
        }),
    }
}

/// Verifies `signature` over `data` with the given key and algorithm.
///
/// Returns `Ok(false)` for any cryptographic mismatch, including a key
/// whose family does not match the algorithm. Only operational failures
/// surface as errors.
pub fn verify_bytes(
    key: &PublicKey,
    data: &[u8],
    signature: &[u8],
    algorithm: SigningAlgorithm,
) -> Result<bool, CryptoError> {
    let verified = match (algorithm, key) {
        (SigningAlgorithm::RsaSha1, PublicKey::Rsa(key)) => key
            .verify(Pkcs1v15Sign::new::<Sha1>(), &crate::hash::sha1(data), signature)
            .is_ok(),
        (SigningAlgorithm::RsaSha256, PublicKey::Rsa(key)) => key
            .verify(
                Pkcs1v15Sign::new::<Sha256>(),
                &crate::hash::sha256(data),
                signature,
            )
            .is_ok(),
        (SigningAlgorithm::DsaSha1, PublicKey::Dsa(key)) => match dsa_from_p1363(signature) {
            Some(signature) => key
                .verify_digest(Sha1::new_with_prefix(data), &signature)
                .is_ok(),
            None => false,
        },
        (SigningAlgorithm::EcdsaSha256, PublicKey::EcdsaP256(key)) => {
            match p256::ecdsa::Signature::from_slice(signature) {
                Ok(signature) => key.verify(data, &signature).is_ok(),
                Err(_) => false,
            }
        }
        _ => false,
    };
    Ok(verified)
}

/// Encodes a DSA signature as the 40-byte P1363 `r || s` form.
fn dsa_to_p1363(signature: &dsa::Signature) -> Vec<u8> {
    let mut out = vec![0u8; 2 * DSA_COMPONENT_LEN];
    let r = signature.r().to_bytes_be();
    let s = signature.s().to_bytes_be();
    out[DSA_COMPONENT_LEN - r.len()..DSA_COMPONENT_LEN].copy_from_slice(&r);
    out[2 * DSA_COMPONENT_LEN - s.len()..].copy_from_slice(&s);
    out
}

/// Decodes a 40-byte P1363 `r || s` DSA signature.
fn dsa_from_p1363(bytes: &[u8]) -> Option<dsa::Signature> {
    if bytes.len() != 2 * DSA_COMPONENT_LEN {
        return None;
    }
    let r = num_bigint_dig::BigUint::from_bytes_be(&bytes[..DSA_COMPONENT_LEN]);
    let s = num_bigint_dig::BigUint::from_bytes_be(&bytes[DSA_COMPONENT_LEN..]);
    dsa::Signature::from_components(r, s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = b"I am A String";

    #[test]
    fn dsa_sha1_sign_and_verify() {
        let pair = KeyPair::generate_dsa();
        let signature = sign_bytes(&pair, MESSAGE, SigningAlgorithm::DsaSha1).unwrap();
        assert_eq!(signature.len(), 40);
        let public = pair.public_key();
        assert!(verify_bytes(&public, MESSAGE, &signature, SigningAlgorithm::DsaSha1).unwrap());
    }

    #[test]
    fn rsa_sha256_sign_and_verify() {
        let pair = KeyPair::generate_rsa().unwrap();
        let signature = sign_bytes(&pair, MESSAGE, SigningAlgorithm::RsaSha256).unwrap();
        let public = pair.public_key();
        assert!(verify_bytes(&public, MESSAGE, &signature, SigningAlgorithm::RsaSha256).unwrap());
    }

    #[test]
    fn ecdsa_sha256_sign_and_verify() {
        let pair = KeyPair::generate_p256();
        let signature = sign_bytes(&pair, MESSAGE, SigningAlgorithm::EcdsaSha256).unwrap();
        assert_eq!(signature.len(), 64);
        let public = pair.public_key();
        assert!(verify_bytes(&public, MESSAGE, &signature, SigningAlgorithm::EcdsaSha256).unwrap());
    }

    #[test]
    fn tampered_data_does_not_verify() {
        let pair = KeyPair::generate_dsa();
        let signature = sign_bytes(&pair, MESSAGE, SigningAlgorithm::DsaSha1).unwrap();
        let public = pair.public_key();
        assert!(!verify_bytes(&public, b"I am a String", &signature, SigningAlgorithm::DsaSha1)
            .unwrap());
    }

    #[test]
    fn wrong_key_does_not_verify() {
        let pair = KeyPair::generate_rsa().unwrap();
        let other = KeyPair::generate_rsa().unwrap();
        let signature = sign_bytes(&pair, MESSAGE, SigningAlgorithm::RsaSha1).unwrap();
        let public = other.public_key();
        assert!(!verify_bytes(&public, MESSAGE, &signature, SigningAlgorithm::RsaSha1).unwrap());
    }

    #[test]
    fn mismatched_key_family_verifies_false() {
        let pair = KeyPair::generate_rsa().unwrap();
        let signature = sign_bytes(&pair, MESSAGE, SigningAlgorithm::RsaSha1).unwrap();
        let public = KeyPair::generate_dsa().public_key();
        assert!(!verify_bytes(&public, MESSAGE, &signature, SigningAlgorithm::RsaSha1).unwrap());
        assert!(!verify_bytes(
            &pair.public_key(),
            MESSAGE,
            &signature,
            SigningAlgorithm::DsaSha1
        )
        .unwrap());
    }

    #[test]
    fn mismatched_key_family_fails_signing() {
        let pair = KeyPair::generate_dsa();
        let err = sign_bytes(&pair, MESSAGE, SigningAlgorithm::RsaSha256).unwrap_err();
        assert!(matches!(err, CryptoError::KeyMismatch { .. }));
    }

    #[test]
    fn garbage_signature_verifies_false() {
        let pair = KeyPair::generate_dsa();
        let public = pair.public_key();
        assert!(!verify_bytes(&public, MESSAGE, &[0u8; 7], SigningAlgorithm::DsaSha1).unwrap());
    }
}
