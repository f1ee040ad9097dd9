//! SAML error types.
//!
//! Parsers, writers and the signature subsystem all report through
//! [`SamlError`]. Cryptographic verification mismatches are not errors
//! (validation returns `false` for those); only structural and operational
//! failures surface here.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol core errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// XML is not well-formed, or a required attribute is missing.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// An unexpected child element appeared in a strict position.
    #[error("unknown element <{element}> at byte offset {location}")]
    UnknownElement {
        /// Local name of the offending element.
        element: String,
        /// Byte offset of the element in the input.
        location: u64,
    },

    /// An attribute value is outside its allowed lexical space.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A writer was asked to serialize an object missing a required field.
    #[error("incomplete message: missing {0}")]
    IncompleteMessage(String),

    /// Structural signature failure.
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Underlying cryptographic primitive failure.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Factory inputs are inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural XML-Signature failures.
///
/// Digest and signature-value mismatches on otherwise well-formed
/// signatures are reported as a `false` validation outcome, not as
/// errors. These variants cover the cases where the signature cannot
/// even be evaluated.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// A computed reference digest did not match the stored `DigestValue`.
    #[error("reference digest mismatch for URI {0}")]
    DigestMismatch(String),

    /// The `SignatureValue` did not verify against `SignedInfo`.
    #[error("signature value mismatch")]
    SignatureValueMismatch,

    /// The key or algorithm is not supported by the validator.
    #[error("key not supported: {0}")]
    KeyNotSupported(String),

    /// A same-document reference resolved to more than one element.
    #[error("ambiguous reference: duplicate ID {0}")]
    AmbiguousReference(String),

    /// A reference URI resolved to no element, or `Signature` structure
    /// is missing a mandatory part.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl SamlError {
    /// Returns the SAML second-level status code to report for this error.
    #[must_use]
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_)
            | Self::UnknownElement { .. }
            | Self::SchemaViolation(_)
            | Self::Signature(_) => "urn:oasis:names:tc:SAML:2.0:status:Requester",
            Self::IncompleteMessage(_)
            | Self::Crypto(_)
            | Self::Configuration(_)
            | Self::Io(_) => "urn:oasis:names:tc:SAML:2.0:status:Responder",
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::MalformedMessage(format!("base64 decode error: {err}"))
    }
}

impl From<saml_crypto::CryptoError> for SamlError {
    fn from(err: saml_crypto::CryptoError) -> Self {
        Self::Crypto(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        let err = SamlError::MalformedMessage("bad".to_string());
        assert_eq!(err.status_code(), "urn:oasis:names:tc:SAML:2.0:status:Requester");

        let err = SamlError::IncompleteMessage("Status".to_string());
        assert_eq!(err.status_code(), "urn:oasis:names:tc:SAML:2.0:status:Responder");
    }

    #[test]
    fn unknown_element_reports_location() {
        let err = SamlError::UnknownElement {
            element: "Bogus".to_string(),
            location: 42,
        };
        let text = err.to_string();
        assert!(text.contains("Bogus"));
        assert!(text.contains("42"));
    }
}
