//! Core SAML types and data structures.
//!
//! The model mirrors the SAML 2.0 schema. Protocol messages share a
//! [`MessageHeader`] carrying the attributes and children common to every
//! request and response; [`SamlMessage`] is the top-level discriminator
//! the parser dispatches into. `Signature`, `Extensions` and encrypted
//! content are kept as opaque DOM fragments so their canonical byte form
//! survives a round-trip.

pub mod assertion;
pub mod authn_request;
pub mod constants;
pub mod logout;
pub mod name_id;
pub mod response;
pub mod status;
pub mod subject;

pub use assertion::{
    Assertion, AttributeStatement, AudienceRestriction, AuthnStatement, AuthzDecisionStatement,
    Conditions, SamlAttribute, Statement,
};
pub use authn_request::{AuthnRequest, RequestedAuthnContext};
pub use constants::{name_id_formats, status_codes, SAMLP_NS, SAML_NS, XMLDSIG_NS, XMLENC_NS};
pub use logout::{LogoutRequest, LogoutResponse};
pub use name_id::{NameId, NameIdPolicy};
pub use response::{ArtifactResolve, ArtifactResponse, Response, ResponseItem};
pub use status::{Status, StatusCode};
pub use subject::{Subject, SubjectConfirmation, SubjectConfirmationData};

use serde::{Deserialize, Serialize};

use crate::time::Instant;
use crate::xml::Element;

/// Well-known name identifier formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NameIdFormat {
    /// Entity identifier, the default for issuers.
    Entity,
    /// Persistent pseudonymous identifier.
    Persistent,
    /// Transient identifier.
    Transient,
    /// Email address.
    Email,
    /// Unspecified format.
    #[default]
    Unspecified,
}

impl NameIdFormat {
    /// Returns the format URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Entity => name_id_formats::ENTITY,
            Self::Persistent => name_id_formats::PERSISTENT,
            Self::Transient => name_id_formats::TRANSIENT,
            Self::Email => name_id_formats::EMAIL,
            Self::Unspecified => name_id_formats::UNSPECIFIED,
        }
    }

    /// Looks a format up by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            name_id_formats::ENTITY => Some(Self::Entity),
            name_id_formats::PERSISTENT => Some(Self::Persistent),
            name_id_formats::TRANSIENT => Some(Self::Transient),
            name_id_formats::EMAIL => Some(Self::Email),
            name_id_formats::UNSPECIFIED => Some(Self::Unspecified),
            _ => None,
        }
    }
}

/// Attributes and children common to every protocol request and response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Message identifier, an XML `NCName` unique within the trust domain.
    pub id: String,

    /// Time of issue, UTC with millisecond precision.
    pub issue_instant: Instant,

    /// Intended receiver endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Consent URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<String>,

    /// Identifier of the request this message answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Message issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<NameId>,

    /// Enveloped signature, kept as an opaque fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Element>,

    /// Extensions, kept as an opaque fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Element>,
}

impl MessageHeader {
    /// Creates a header with a given ID and the current instant.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issue_instant: crate::time::now(),
            destination: None,
            consent: None,
            in_response_to: None,
            issuer: None,
            signature: None,
            extensions: None,
        }
    }

    /// Sets the destination endpoint.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Sets the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: NameId) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Sets the request ID this message answers.
    #[must_use]
    pub fn with_in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }
}

/// A parsed top-level SAML message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SamlMessage {
    /// `samlp:AuthnRequest`
    AuthnRequest(AuthnRequest),
    /// `samlp:ArtifactResolve`
    ArtifactResolve(ArtifactResolve),
    /// `samlp:LogoutRequest`
    LogoutRequest(LogoutRequest),
    /// `samlp:Response`
    Response(Response),
    /// `samlp:ArtifactResponse`
    ArtifactResponse(ArtifactResponse),
    /// `samlp:LogoutResponse`
    LogoutResponse(LogoutResponse),
    /// A standalone `saml:Assertion`
    Assertion(Assertion),
}

impl SamlMessage {
    /// Returns the message identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AuthnRequest(m) => &m.header.id,
            Self::ArtifactResolve(m) => &m.header.id,
            Self::LogoutRequest(m) => &m.header.id,
            Self::Response(m) => &m.header.id,
            Self::ArtifactResponse(m) => &m.header.id,
            Self::LogoutResponse(m) => &m.header.id,
            Self::Assertion(m) => &m.id,
        }
    }

    /// Returns the issue instant.
    #[must_use]
    pub fn issue_instant(&self) -> Instant {
        match self {
            Self::AuthnRequest(m) => m.header.issue_instant,
            Self::ArtifactResolve(m) => m.header.issue_instant,
            Self::LogoutRequest(m) => m.header.issue_instant,
            Self::Response(m) => m.header.issue_instant,
            Self::ArtifactResponse(m) => m.header.issue_instant,
            Self::LogoutResponse(m) => m.header.issue_instant,
            Self::Assertion(m) => m.issue_instant,
        }
    }

    /// Returns the issuer, if present.
    #[must_use]
    pub fn issuer(&self) -> Option<&NameId> {
        match self {
            Self::AuthnRequest(m) => m.header.issuer.as_ref(),
            Self::ArtifactResolve(m) => m.header.issuer.as_ref(),
            Self::LogoutRequest(m) => m.header.issuer.as_ref(),
            Self::Response(m) => m.header.issuer.as_ref(),
            Self::ArtifactResponse(m) => m.header.issuer.as_ref(),
            Self::LogoutResponse(m) => m.header.issuer.as_ref(),
            Self::Assertion(m) => Some(&m.issuer),
        }
    }
}
