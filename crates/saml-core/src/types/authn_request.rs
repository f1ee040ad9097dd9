//! Authentication request types.

use serde::{Deserialize, Serialize};

use super::{MessageHeader, NameIdPolicy, Subject};

/// SAML `AuthnRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Common request header.
    pub header: MessageHeader,

    /// Endpoint the response should be delivered to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_consumer_service_url: Option<String>,

    /// Requested response binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_binding: Option<String>,

    /// Human-readable requester name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,

    /// Force re-authentication even with an existing session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_authn: Option<bool>,

    /// Forbid visible interaction with the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_passive: Option<bool>,

    /// Requested subject, if the SP already knows who it expects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Constraints on the returned name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_policy: Option<NameIdPolicy>,

    /// Requested authentication context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_authn_context: Option<RequestedAuthnContext>,
}

impl AuthnRequest {
    /// Creates a request with the given header and no protocol-specific
    /// content.
    #[must_use]
    pub const fn new(header: MessageHeader) -> Self {
        Self {
            header,
            assertion_consumer_service_url: None,
            protocol_binding: None,
            provider_name: None,
            force_authn: None,
            is_passive: None,
            subject: None,
            name_id_policy: None,
            requested_authn_context: None,
        }
    }
}

/// SAML `RequestedAuthnContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedAuthnContext {
    /// Comparison rule: `exact`, `minimum`, `maximum` or `better`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,

    /// Acceptable context class reference URIs.
    #[serde(default)]
    pub class_refs: Vec<String>,

    /// Acceptable context declaration reference URIs.
    #[serde(default)]
    pub decl_refs: Vec<String>,
}
