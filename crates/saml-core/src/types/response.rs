//! Response and artifact message types.

use serde::{Deserialize, Serialize};

use super::{Assertion, MessageHeader, SamlMessage, Status};
use crate::xml::Element;

/// SAML `Response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Common response header.
    pub header: MessageHeader,

    /// Outcome of the request.
    pub status: Status,

    /// Assertions and encrypted assertions, in document order.
    #[serde(default)]
    pub items: Vec<ResponseItem>,
}

impl Response {
    /// Creates a response with no assertions.
    #[must_use]
    pub const fn new(header: MessageHeader, status: Status) -> Self {
        Self {
            header,
            status,
            items: Vec::new(),
        }
    }

    /// Appends an assertion.
    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.items.push(ResponseItem::Assertion(assertion));
        self
    }

    /// Appends an opaque encrypted assertion.
    #[must_use]
    pub fn with_encrypted_assertion(mut self, fragment: Element) -> Self {
        self.items.push(ResponseItem::Encrypted(fragment));
        self
    }

    /// Iterates over the plain assertions.
    pub fn assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.items.iter().filter_map(|item| match item {
            ResponseItem::Assertion(assertion) => Some(assertion),
            ResponseItem::Encrypted(_) => None,
        })
    }
}

/// One assertion slot of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseItem {
    /// A plain assertion.
    Assertion(Assertion),
    /// An `EncryptedAssertion` fragment, kept opaque.
    Encrypted(Element),
}

/// SAML `ArtifactResolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactResolve {
    /// Common request header.
    pub header: MessageHeader,

    /// The artifact to dereference.
    pub artifact: String,
}

impl ArtifactResolve {
    /// Creates an artifact resolution request.
    #[must_use]
    pub fn new(header: MessageHeader, artifact: impl Into<String>) -> Self {
        Self {
            header,
            artifact: artifact.into(),
        }
    }
}

/// SAML `ArtifactResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactResponse {
    /// Common response header.
    pub header: MessageHeader,

    /// Outcome of the resolution.
    pub status: Status,

    /// The dereferenced message, if resolution succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<SamlMessage>>,
}

impl ArtifactResponse {
    /// Creates an artifact response carrying a message.
    #[must_use]
    pub fn new(header: MessageHeader, status: Status, message: Option<SamlMessage>) -> Self {
        Self {
            header,
            status,
            message: message.map(Box::new),
        }
    }
}
