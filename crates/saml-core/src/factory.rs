//! Message factories.
//!
//! Builders for the messages an identity or service provider issues most
//! often, with identifiers, instants and validity windows filled in from
//! [`crate::config`]. The factories return the typed model; callers pass
//! the result through [`crate::writers::write`] and the signer.

use saml_crypto::message_id;

use crate::config;
use crate::error::{SamlError, SamlResult};
use crate::time;
use crate::types::constants::confirmation_methods;
use crate::types::{
    Assertion, AudienceRestriction, AuthnRequest, AuthnStatement, Conditions, MessageHeader,
    NameId, Response, Statement, Status, StatusCode, Subject, SubjectConfirmation,
    SubjectConfirmationData,
};
use crate::xml::Element;

/// Facts about the service provider a response is addressed to.
#[derive(Debug, Clone)]
pub struct SpInfo {
    /// Endpoint the response is delivered to.
    pub assertion_consumer_url: String,
    /// ID of the `AuthnRequest` being answered, if any.
    pub request_id: Option<String>,
    /// Audience URI for the assertion's audience restriction.
    pub audience: Option<String>,
}

/// Facts about the authenticated principal at the identity provider.
#[derive(Debug, Clone)]
pub struct IdpInfo {
    /// Identifier of the authenticated subject.
    pub subject_name_id: NameId,
    /// Subject confirmation method URI; bearer when unset.
    pub confirmation_method: Option<String>,
    /// Authentication context class the principal satisfied.
    pub authn_context_class_ref: Option<String>,
}

/// Facts about the party issuing the response.
#[derive(Debug, Clone)]
pub struct IssuerInfo {
    /// Issuer identifier.
    pub issuer: NameId,
    /// First-level status code URI for the response.
    pub status_code: Option<String>,
}

/// Creates an `AuthnRequest` with a fresh identifier and the current
/// issue instant.
#[must_use]
pub fn create_authn_request(
    issuer: impl Into<String>,
    assertion_consumer_url: impl Into<String>,
    destination: impl Into<String>,
) -> AuthnRequest {
    let header = MessageHeader::new(message_id())
        .with_destination(destination)
        .with_issuer(NameId::entity(issuer));
    let mut request = AuthnRequest::new(header);
    request.assertion_consumer_service_url = Some(assertion_consumer_url.into());
    request
}

/// Creates a `Status` from a code URI, failing on an empty code.
pub fn create_status(code: &str) -> SamlResult<Status> {
    if code.is_empty() {
        return Err(SamlError::Configuration(
            "status code must not be empty".to_string(),
        ));
    }
    Ok(Status {
        status_code: StatusCode::new(code),
        status_message: None,
        status_detail: None,
    })
}

/// Creates a `Response` carrying one freshly issued assertion.
///
/// The assertion gets a bearer subject confirmation addressed to the
/// service provider's consumer endpoint, answers the original request ID
/// and expires after the configured assertion validity window.
pub fn create_response(sp: &SpInfo, idp: &IdpInfo, issuer: &IssuerInfo) -> SamlResult<Response> {
    let response = empty_response(sp, issuer)?;
    let assertion = create_assertion(sp, idp, &issuer.issuer);
    Ok(response.with_assertion(assertion))
}

/// Creates a `Response` carrying an already encrypted assertion fragment.
pub fn create_response_with_encrypted_assertion(
    sp: &SpInfo,
    issuer: &IssuerInfo,
    encrypted_assertion: Element,
) -> SamlResult<Response> {
    let response = empty_response(sp, issuer)?;
    Ok(response.with_encrypted_assertion(encrypted_assertion))
}

fn empty_response(sp: &SpInfo, issuer: &IssuerInfo) -> SamlResult<Response> {
    let code = issuer.status_code.as_deref().ok_or_else(|| {
        SamlError::Configuration("issuer info carries no status code".to_string())
    })?;
    let status = create_status(code)?;

    let mut header = MessageHeader::new(message_id())
        .with_destination(sp.assertion_consumer_url.clone())
        .with_issuer(issuer.issuer.clone());
    if let Some(request_id) = &sp.request_id {
        header = header.with_in_response_to(request_id.clone());
    }
    Ok(Response::new(header, status))
}

fn create_assertion(sp: &SpInfo, idp: &IdpInfo, issuer: &NameId) -> Assertion {
    let now = time::now();
    let not_on_or_after = now + config::assertion_validity();

    let method = idp
        .confirmation_method
        .clone()
        .unwrap_or_else(|| confirmation_methods::BEARER.to_string());
    let confirmation = SubjectConfirmation {
        method,
        name_id: None,
        data: Some(SubjectConfirmationData {
            recipient: Some(sp.assertion_consumer_url.clone()),
            in_response_to: sp.request_id.clone(),
            not_before: None,
            not_on_or_after: Some(not_on_or_after),
            address: None,
        }),
    };
    let subject = Subject::new(idp.subject_name_id.clone()).with_confirmation(confirmation);

    let conditions = Conditions {
        not_before: Some(now),
        not_on_or_after: Some(not_on_or_after),
        audience_restrictions: sp
            .audience
            .iter()
            .map(|audience| AudienceRestriction {
                audiences: vec![audience.clone()],
            })
            .collect(),
    };

    let mut assertion = Assertion::new(message_id(), issuer.clone())
        .with_subject(subject)
        .with_conditions(conditions);
    if let Some(class_ref) = &idp.authn_context_class_ref {
        assertion = assertion.with_statement(Statement::Authn(
            AuthnStatement::new(class_ref.clone()),
        ));
    }
    assertion
}
