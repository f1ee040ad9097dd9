//! Key material for SAML signing and validation.
//!
//! The core never loads keys itself; callers hand it opaque key material.
//! This module models that material: private key pairs for signing, public
//! keys for validation, and extraction of public keys from X.509
//! certificates carried in metadata or `KeyInfo`.

use num_bigint_dig::BigUint;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::signature::CryptoError;

/// RSA modulus size used when generating fresh key pairs.
const RSA_KEY_BITS: usize = 2048;

/// The algorithm family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// RSA keys.
    Rsa,
    /// DSA keys (SAML legacy interop).
    Dsa,
    /// ECDSA keys on P-256.
    EcdsaP256,
}

/// A private signing key with its public half.
#[derive(Debug, Clone)]
pub enum KeyPair {
    /// RSA private key.
    Rsa(RsaPrivateKey),
    /// DSA private key.
    Dsa(dsa::SigningKey),
    /// ECDSA P-256 private key.
    EcdsaP256(p256::ecdsa::SigningKey),
}

impl KeyPair {
    /// Generates a fresh 2048-bit RSA key pair.
    pub fn generate_rsa() -> Result<Self, CryptoError> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self::Rsa(key))
    }

    /// Generates a fresh 1024-bit DSA key pair.
    ///
    /// 1024/160 is the parameter set legacy SAML peers interoperate with;
    /// do not use it outside that context.
    #[must_use]
    pub fn generate_dsa() -> Self {
        let mut rng = rand::thread_rng();
        let components = dsa::Components::generate(&mut rng, dsa::KeySize::DSA_1024_160);
        Self::Dsa(dsa::SigningKey::generate(&mut rng, components))
    }

    /// Generates a fresh ECDSA P-256 key pair.
    #[must_use]
    pub fn generate_p256() -> Self {
        Self::EcdsaP256(p256::ecdsa::SigningKey::random(&mut rand::thread_rng()))
    }

    /// Loads a key pair from a PKCS#8 PEM document.
    ///
    /// RSA, DSA and P-256 keys are recognized; PKCS#1 RSA PEM
    /// (`RSA PRIVATE KEY`) is accepted as a fallback.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(Self::Rsa(key));
        }
        if let Ok(key) = p256::ecdsa::SigningKey::from_pkcs8_pem(pem) {
            return Ok(Self::EcdsaP256(key));
        }
        if let Ok(key) = dsa::SigningKey::from_pkcs8_pem(pem) {
            return Ok(Self::Dsa(key));
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
            return Ok(Self::Rsa(key));
        }
        Err(CryptoError::InvalidKey(
            "unrecognized private key PEM".to_string(),
        ))
    }

    /// Returns the algorithm family of this key.
    #[must_use]
    pub const fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::Dsa(_) => KeyFamily::Dsa,
            Self::EcdsaP256(_) => KeyFamily::EcdsaP256,
        }
    }

    /// Returns the public half of this key pair.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            Self::Dsa(key) => PublicKey::Dsa(key.verifying_key().clone()),
            Self::EcdsaP256(key) => PublicKey::EcdsaP256(*key.verifying_key()),
        }
    }
}

/// A public key used for signature validation.
#[derive(Debug, Clone)]
pub enum PublicKey {
    /// RSA public key.
    Rsa(RsaPublicKey),
    /// DSA public key.
    Dsa(dsa::VerifyingKey),
    /// ECDSA P-256 public key.
    EcdsaP256(p256::ecdsa::VerifyingKey),
}

impl PublicKey {
    /// Extracts the public key from a DER-encoded X.509 certificate.
    ///
    /// SAML metadata distributes certificates rather than bare keys; this
    /// is the bridge from a trusted certificate to a validation key.
    pub fn from_certificate_der(der: &[u8]) -> Result<Self, CryptoError> {
        use x509_parser::prelude::*;

        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CryptoError::InvalidKey(format!("certificate parse failed: {e}")))?;
        let parsed = cert
            .public_key()
            .parsed()
            .map_err(|e| CryptoError::InvalidKey(format!("certificate key parse failed: {e}")))?;

        match parsed {
            x509_parser::public_key::PublicKey::RSA(key) => {
                let n = BigUint::from_bytes_be(key.modulus);
                let e = BigUint::from_bytes_be(key.exponent);
                let key = RsaPublicKey::new(n, e)
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
                Ok(Self::Rsa(key))
            }
            x509_parser::public_key::PublicKey::EC(point) => {
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point.data())
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
                Ok(Self::EcdsaP256(key))
            }
            other => Err(CryptoError::UnsupportedAlgorithm(format!(
                "certificate key type {other:?} not supported"
            ))),
        }
    }

    /// Returns the algorithm family of this key.
    #[must_use]
    pub const fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::Dsa(_) => KeyFamily::Dsa,
            Self::EcdsaP256(_) => KeyFamily::EcdsaP256,
        }
    }

    /// Returns the raw components serialized into `KeyValue` elements.
    #[must_use]
    pub fn key_value_components(&self) -> KeyValueComponents {
        match self {
            Self::Rsa(key) => KeyValueComponents::Rsa {
                modulus: key.n().to_bytes_be(),
                exponent: key.e().to_bytes_be(),
            },
            Self::Dsa(key) => {
                let components = key.components();
                KeyValueComponents::Dsa {
                    p: components.p().to_bytes_be(),
                    q: components.q().to_bytes_be(),
                    g: components.g().to_bytes_be(),
                    y: key.y().to_bytes_be(),
                }
            }
            Self::EcdsaP256(key) => KeyValueComponents::Ec {
                point: key.to_encoded_point(false).as_bytes().to_vec(),
            },
        }
    }
}

/// Big-endian public key components, as carried in XML-DSig `KeyValue`.
#[derive(Debug, Clone)]
pub enum KeyValueComponents {
    /// RSA modulus and public exponent (`RSAKeyValue`).
    Rsa {
        /// Modulus `n`.
        modulus: Vec<u8>,
        /// Public exponent `e`.
        exponent: Vec<u8>,
    },
    /// DSA domain parameters and public value (`DSAKeyValue`).
    Dsa {
        /// Prime modulus.
        p: Vec<u8>,
        /// Subgroup order.
        q: Vec<u8>,
        /// Generator.
        g: Vec<u8>,
        /// Public value.
        y: Vec<u8>,
    },
    /// SEC1 uncompressed point for an EC key.
    Ec {
        /// Uncompressed point bytes.
        point: Vec<u8>,
    },
}
