//! Single logout message types.

use serde::{Deserialize, Serialize};

use super::{MessageHeader, NameId, Status};
use crate::time::Instant;
use crate::xml::Element;

/// SAML `LogoutRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Common request header.
    pub header: MessageHeader,

    /// Principal being logged out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Encrypted principal identifier, kept opaque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_id: Option<Element>,

    /// Sessions to terminate.
    #[serde(default)]
    pub session_indexes: Vec<String>,

    /// Reason URI for the logout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Instant after which the request is void, exclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<Instant>,
}

impl LogoutRequest {
    /// Creates a logout request for a principal.
    #[must_use]
    pub fn new(header: MessageHeader, name_id: NameId) -> Self {
        Self {
            header,
            name_id: Some(name_id),
            encrypted_id: None,
            session_indexes: Vec::new(),
            reason: None,
            not_on_or_after: None,
        }
    }

    /// Adds a session index.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_indexes.push(index.into());
        self
    }
}

/// SAML `LogoutResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Common response header.
    pub header: MessageHeader,

    /// Outcome of the logout.
    pub status: Status,
}

impl LogoutResponse {
    /// Creates a logout response.
    #[must_use]
    pub const fn new(header: MessageHeader, status: Status) -> Self {
        Self { header, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logout_request_sessions() {
        let request = LogoutRequest::new(
            MessageHeader::new("ID_lo"),
            NameId::persistent("user-123"),
        )
        .with_session_index("sess-1")
        .with_session_index("sess-2");

        assert_eq!(request.session_indexes, vec!["sess-1", "sess-2"]);
    }

    #[test]
    fn logout_response_status() {
        let response = LogoutResponse::new(MessageHeader::new("ID_lr"), Status::success());
        assert!(response.status.is_success());
    }
}
