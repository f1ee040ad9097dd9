//! Protocol status types.

use serde::{Deserialize, Serialize};

use super::status_codes;
use crate::xml::Element;

/// SAML protocol `Status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// The status code.
    pub status_code: StatusCode,

    /// Human-readable status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    /// `StatusDetail` fragment, kept opaque: its schema allows arbitrary
    /// children, which are re-emitted verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<Element>,
}

impl Status {
    /// Creates a status from a code URI.
    #[must_use]
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::new(code),
            status_message: None,
            status_detail: None,
        }
    }

    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self::from_code(status_codes::SUCCESS)
    }

    /// Creates a requester error status.
    #[must_use]
    pub fn requester_error(message: impl Into<String>) -> Self {
        Self::from_code(status_codes::REQUESTER).with_message(message)
    }

    /// Creates a responder error status.
    #[must_use]
    pub fn responder_error(message: impl Into<String>) -> Self {
        Self::from_code(status_codes::RESPONDER).with_message(message)
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.value == status_codes::SUCCESS
    }

    /// Sets the status message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// SAML `StatusCode`, optionally nesting a second-level code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    /// The status code URI.
    pub value: String,

    /// Nested second-level code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a status code.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// Adds a second-level code.
    #[must_use]
    pub fn with_sub_status(mut self, sub: StatusCode) -> Self {
        self.status_code = Some(Box::new(sub));
        self
    }

    /// Returns the second-level code value, if present.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_ref().map(|s| s.value.as_str())
    }
}
