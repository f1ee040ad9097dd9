//! Enveloped XML-Signature creation and validation.
//!
//! Implements the strict subset of XML-DSig SAML interop needs: enveloped
//! signatures whose transforms are exactly enveloped-signature plus
//! Exclusive C14N. Signing produces a `ds:Signature` spliced into the
//! schema-mandated position; validation checks every signature in the
//! document and is hardened against signature wrapping.

mod signer;
mod validator;

pub use signer::XmlSigner;
pub use validator::{validate, validate_with_certificate};

use saml_crypto::SigningAlgorithm;

use crate::error::{SamlError, SamlResult, SignatureError};
use crate::types::constants::dsig;

/// Signature methods supported for SAML messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SignatureMethod {
    /// DSA with SHA-1.
    DsaSha1 = 0,
    /// RSA PKCS#1 v1.5 with SHA-1.
    RsaSha1 = 1,
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256 = 2,
    /// ECDSA on P-256 with SHA-256.
    EcdsaSha256 = 3,
}

impl SignatureMethod {
    /// Returns the XML-DSig algorithm URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::DsaSha1 => dsig::DSA_SHA1,
            Self::RsaSha1 => dsig::RSA_SHA1,
            Self::RsaSha256 => dsig::RSA_SHA256,
            Self::EcdsaSha256 => dsig::ECDSA_SHA256,
        }
    }

    /// Looks a method up by algorithm URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            dsig::DSA_SHA1 => Some(Self::DsaSha1),
            dsig::RSA_SHA1 => Some(Self::RsaSha1),
            dsig::RSA_SHA256 => Some(Self::RsaSha256),
            dsig::ECDSA_SHA256 => Some(Self::EcdsaSha256),
            _ => None,
        }
    }

    /// Maps to the byte-level signing algorithm.
    #[must_use]
    pub const fn signing_algorithm(self) -> SigningAlgorithm {
        match self {
            Self::DsaSha1 => SigningAlgorithm::DsaSha1,
            Self::RsaSha1 => SigningAlgorithm::RsaSha1,
            Self::RsaSha256 => SigningAlgorithm::RsaSha256,
            Self::EcdsaSha256 => SigningAlgorithm::EcdsaSha256,
        }
    }

    /// The digest conventionally paired with this signature method.
    #[must_use]
    pub const fn paired_digest(self) -> DigestAlgorithm {
        match self {
            Self::DsaSha1 | Self::RsaSha1 => DigestAlgorithm::Sha1,
            Self::RsaSha256 | Self::EcdsaSha256 => DigestAlgorithm::Sha256,
        }
    }

    pub(crate) fn from_discriminant(value: u8) -> Self {
        match value {
            0 => Self::DsaSha1,
            1 => Self::RsaSha1,
            3 => Self::EcdsaSha256,
            _ => Self::RsaSha256,
        }
    }
}

/// Reference digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-1, the SAML legacy default.
    #[default]
    Sha1,
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the XML-DSig digest URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Sha1 => dsig::SHA1,
            Self::Sha256 => dsig::SHA256,
        }
    }

    /// Looks a digest algorithm up by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            dsig::SHA1 => Some(Self::Sha1),
            dsig::SHA256 => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Computes the digest of `data`.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => saml_crypto::sha1(data),
            Self::Sha256 => saml_crypto::sha256(data),
        }
    }
}

/// Checks that a canonicalization URI names Exclusive C14N.
///
/// Other canonicalization algorithms are outside the supported subset.
pub(crate) fn require_exclusive_c14n(uri: &str) -> SamlResult<()> {
    if uri == dsig::EXCLUSIVE_C14N || uri == dsig::EXCLUSIVE_C14N_WITH_COMMENTS {
        Ok(())
    } else {
        Err(SamlError::Crypto(format!(
            "unsupported canonicalization algorithm {uri}"
        )))
    }
}

/// Checks a transform URI against the supported pair.
pub(crate) fn check_transform(uri: &str) -> SamlResult<()> {
    if uri == dsig::ENVELOPED_SIGNATURE || uri == dsig::EXCLUSIVE_C14N {
        Ok(())
    } else {
        Err(SignatureError::KeyNotSupported(format!("transform {uri}")).into())
    }
}

/// Per-operation signing configuration.
///
/// `Default` pulls the process-wide settings from [`crate::config`].
#[derive(Debug, Clone)]
pub struct SignatureConfig {
    /// Signature method.
    pub method: SignatureMethod,
    /// Reference digest algorithm.
    pub digest: DigestAlgorithm,
    /// Whether to emit a `KeyInfo` element.
    pub include_key_info: bool,
    /// Same-document reference (`#id`); the document element when absent.
    pub reference_uri: Option<String>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        let method = crate::config::default_signature_method();
        Self {
            method,
            digest: method.paired_digest(),
            include_key_info: crate::config::include_key_info(),
            reference_uri: None,
        }
    }
}

impl SignatureConfig {
    /// Creates a configuration for a method with its conventional digest.
    #[must_use]
    pub fn for_method(method: SignatureMethod) -> Self {
        Self {
            method,
            digest: method.paired_digest(),
            include_key_info: crate::config::include_key_info(),
            reference_uri: None,
        }
    }

    /// Sets the same-document reference URI (`#id` form).
    #[must_use]
    pub fn with_reference_uri(mut self, uri: impl Into<String>) -> Self {
        self.reference_uri = Some(uri.into());
        self
    }

    /// Sets whether `KeyInfo` is emitted.
    #[must_use]
    pub const fn with_key_info(mut self, include: bool) -> Self {
        self.include_key_info = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_uri_round_trip() {
        for method in [
            SignatureMethod::DsaSha1,
            SignatureMethod::RsaSha1,
            SignatureMethod::RsaSha256,
            SignatureMethod::EcdsaSha256,
        ] {
            assert_eq!(SignatureMethod::from_uri(method.uri()), Some(method));
            assert_eq!(SignatureMethod::from_discriminant(method as u8), method);
        }
    }

    #[test]
    fn digest_pairing() {
        assert_eq!(SignatureMethod::DsaSha1.paired_digest(), DigestAlgorithm::Sha1);
        assert_eq!(
            SignatureMethod::EcdsaSha256.paired_digest(),
            DigestAlgorithm::Sha256
        );
    }

    #[test]
    fn only_exclusive_c14n_is_accepted() {
        assert!(require_exclusive_c14n(dsig::EXCLUSIVE_C14N).is_ok());
        assert!(require_exclusive_c14n("http://www.w3.org/TR/2001/REC-xml-c14n-20010315").is_err());
    }

    #[test]
    fn unknown_transform_is_rejected() {
        assert!(check_transform(dsig::ENVELOPED_SIGNATURE).is_ok());
        assert!(check_transform("http://www.w3.org/TR/1999/REC-xpath-19991116").is_err());
    }
}
