//! Write/parse round trips for every message kind.
//!
//! Each test builds a typed message, serializes it and parses the bytes
//! back, expecting the exact same model including millisecond instants.

use saml_core::types::constants::{authn_contexts, bindings};
use saml_core::types::{
    ArtifactResolve, ArtifactResponse, Assertion, AttributeStatement, AudienceRestriction,
    AuthnRequest, AuthnStatement, AuthzDecisionStatement, Conditions, LogoutRequest,
    LogoutResponse, MessageHeader, NameId, NameIdPolicy, Response, SamlAttribute, SamlMessage,
    Statement, Status, Subject, SubjectConfirmation, SubjectConfirmationData,
};
use saml_core::{parse_bytes, writers};

fn round_trip(message: SamlMessage) {
    let doc = writers::write(&message).unwrap();
    let parsed = parse_bytes(&doc.to_bytes()).unwrap();
    assert_eq!(parsed, message);
}

#[test]
fn authn_request() {
    let mut request = AuthnRequest::new(
        MessageHeader::new("ID_req")
            .with_destination("http://idp/sso")
            .with_issuer(NameId::entity("http://sp")),
    );
    request.assertion_consumer_service_url = Some("http://sp/acs".to_string());
    request.protocol_binding = Some(bindings::HTTP_POST.to_string());
    request.provider_name = Some("Example SP".to_string());
    request.force_authn = Some(true);
    request.is_passive = Some(false);
    request.name_id_policy = Some(
        NameIdPolicy::with_format(saml_core::types::NameIdFormat::Persistent).allow_create(true),
    );
    round_trip(SamlMessage::AuthnRequest(request));
}

#[test]
fn logout_request() {
    let mut request = LogoutRequest::new(
        MessageHeader::new("ID_lo").with_issuer(NameId::entity("http://sp")),
        NameId::persistent("user-1").with_sp_name_qualifier("http://sp"),
    )
    .with_session_index("s1")
    .with_session_index("s2");
    request.reason = Some("urn:oasis:names:tc:SAML:2.0:logout:user".to_string());
    request.not_on_or_after = Some(saml_core::time::now());
    round_trip(SamlMessage::LogoutRequest(request));
}

#[test]
fn logout_response() {
    let response = LogoutResponse::new(
        MessageHeader::new("ID_lr")
            .with_issuer(NameId::entity("http://idp"))
            .with_in_response_to("ID_lo"),
        Status::success(),
    );
    round_trip(SamlMessage::LogoutResponse(response));
}

#[test]
fn artifact_resolve() {
    let resolve = ArtifactResolve::new(
        MessageHeader::new("ID_ar").with_issuer(NameId::entity("http://sp")),
        "AAQAADWNEw5VT47wcO4zX/iEzMmFQvGknDfws2ZtqSGdkNSbsW1cmVR0bzU=",
    );
    round_trip(SamlMessage::ArtifactResolve(resolve));
}

#[test]
fn artifact_response_with_embedded_message() {
    let inner = SamlMessage::LogoutResponse(LogoutResponse::new(
        MessageHeader::new("ID_inner").with_in_response_to("ID_lo"),
        Status::success(),
    ));
    let response = ArtifactResponse::new(
        MessageHeader::new("ID_aresp").with_in_response_to("ID_ar"),
        Status::success(),
        Some(inner),
    );
    round_trip(SamlMessage::ArtifactResponse(response));
}

#[test]
fn response_with_full_assertion() {
    let now = saml_core::time::now();
    let assertion = Assertion::new("ID_a1", NameId::entity("http://idp"))
        .with_subject(
            Subject::new(NameId::persistent("user-1")).with_confirmation(
                SubjectConfirmation::bearer().with_data(SubjectConfirmationData {
                    recipient: Some("http://sp/acs".to_string()),
                    in_response_to: Some("ID_req".to_string()),
                    not_before: None,
                    not_on_or_after: Some(now + chrono::Duration::minutes(5)),
                    address: None,
                }),
            ),
        )
        .with_conditions(Conditions {
            not_before: Some(now),
            not_on_or_after: Some(now + chrono::Duration::minutes(5)),
            audience_restrictions: vec![AudienceRestriction {
                audiences: vec!["http://sp".to_string()],
            }],
        })
        .with_statement(Statement::Authn(
            AuthnStatement::new(authn_contexts::PASSWORD_PROTECTED_TRANSPORT)
                .with_session_index("sess-1"),
        ))
        .with_statement(Statement::Attribute(AttributeStatement {
            attributes: vec![SamlAttribute::new("mail", "user@example.com")],
        }))
        .with_statement(Statement::AuthzDecision(AuthzDecisionStatement {
            resource: "http://sp/resource".to_string(),
            decision: "Permit".to_string(),
            actions: vec!["GET".to_string()],
        }));

    let response = Response::new(
        MessageHeader::new("ID_resp")
            .with_issuer(NameId::entity("http://idp"))
            .with_in_response_to("ID_req"),
        Status::success(),
    )
    .with_assertion(assertion);
    round_trip(SamlMessage::Response(response));
}

#[test]
fn standalone_assertion() {
    let assertion = Assertion::new("ID_a", NameId::entity("http://idp"))
        .with_subject(Subject::new(NameId::transient("anon-42")));
    round_trip(SamlMessage::Assertion(assertion));
}

#[test]
fn instants_keep_millisecond_precision() {
    let header = MessageHeader::new("ID_t");
    let millis = header.issue_instant.timestamp_subsec_millis();
    let request = LogoutResponse::new(header, Status::success());

    let doc = writers::write(&SamlMessage::LogoutResponse(request)).unwrap();
    let parsed = parse_bytes(&doc.to_bytes()).unwrap();
    assert_eq!(parsed.issue_instant().timestamp_subsec_millis(), millis);
}

#[test]
fn surrounding_whitespace_in_text_content_survives() {
    let request = AuthnRequest::new(
        MessageHeader::new("ID_ws").with_issuer(NameId::entity(" http://sp ")),
    );
    round_trip(SamlMessage::AuthnRequest(request));
}

#[test]
fn escaped_content_survives() {
    let mut request = AuthnRequest::new(
        MessageHeader::new("ID_esc").with_issuer(NameId::entity("http://sp?a=1&b=<2>")),
    );
    request.provider_name = Some(r#"Quotes " and & angles <>"#.to_string());
    round_trip(SamlMessage::AuthnRequest(request));
}
