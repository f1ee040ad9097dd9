//! End-to-end signing flows: issue a message, sign the serialized
//! document, push it through the wire form and validate the result.

use saml_core::factory::{self, IdpInfo, IssuerInfo, SpInfo};
use saml_core::signature::{SignatureConfig, SignatureMethod};
use saml_core::types::constants::authn_contexts;
use saml_core::types::{NameId, Statement};
use saml_core::xml::Document;
use saml_core::{parse_bytes, validate, writers, SamlMessage, XmlSigner};
use saml_crypto::KeyPair;

fn sample_sp() -> SpInfo {
    SpInfo {
        assertion_consumer_url: "http://sp.example.com/acs".to_string(),
        request_id: Some("ID_req".to_string()),
        audience: Some("http://sp.example.com".to_string()),
    }
}

fn sample_idp() -> IdpInfo {
    IdpInfo {
        subject_name_id: NameId::persistent("user-1"),
        confirmation_method: None,
        authn_context_class_ref: Some(authn_contexts::PASSWORD_PROTECTED_TRANSPORT.to_string()),
    }
}

fn sample_issuer() -> IssuerInfo {
    IssuerInfo {
        issuer: NameId::entity("http://idp.example.com"),
        status_code: Some("urn:oasis:names:tc:SAML:2.0:status:Success".to_string()),
    }
}

#[test]
fn dsa_signed_authn_request_survives_the_wire() {
    let key = KeyPair::generate_dsa();
    let request = factory::create_authn_request(
        "http://sp.example.com",
        "http://sp.example.com/acs",
        "http://idp.example.com/sso",
    );
    let mut doc = writers::write(&SamlMessage::AuthnRequest(request)).unwrap();
    XmlSigner::new(&key).sign(&mut doc).unwrap();

    let bytes = doc.to_bytes();
    let reparsed = Document::from_bytes(&bytes).unwrap();
    assert!(validate(&reparsed, &key.public_key()).unwrap());

    // the signed bytes still parse into the typed model
    let SamlMessage::AuthnRequest(parsed) = parse_bytes(&bytes).unwrap() else {
        panic!("wrong message kind");
    };
    assert!(parsed.header.signature.is_some());
    assert_eq!(
        parsed.header.destination.as_deref(),
        Some("http://idp.example.com/sso")
    );
}

#[test]
fn key_info_can_be_omitted() {
    let key = KeyPair::generate_dsa();
    let request = factory::create_authn_request(
        "http://sp.example.com",
        "http://sp.example.com/acs",
        "http://idp.example.com/sso",
    );
    let mut doc = writers::write(&SamlMessage::AuthnRequest(request)).unwrap();
    XmlSigner::new(&key)
        .with_config(SignatureConfig::for_method(SignatureMethod::DsaSha1).with_key_info(false))
        .sign(&mut doc)
        .unwrap();

    let text = String::from_utf8(doc.to_bytes()).unwrap();
    assert!(!text.contains("KeyInfo"));

    let reparsed = Document::from_bytes(text.as_bytes()).unwrap();
    assert!(validate(&reparsed, &key.public_key()).unwrap());
}

#[test]
fn issued_response_signs_and_validates_with_rsa() {
    let key = KeyPair::generate_rsa().unwrap();
    let response = factory::create_response(&sample_sp(), &sample_idp(), &sample_issuer()).unwrap();
    let mut doc = writers::write(&SamlMessage::Response(response)).unwrap();
    XmlSigner::new(&key).sign(&mut doc).unwrap();

    let bytes = doc.to_bytes();
    let reparsed = Document::from_bytes(&bytes).unwrap();
    assert!(validate(&reparsed, &key.public_key()).unwrap());

    let SamlMessage::Response(parsed) = parse_bytes(&bytes).unwrap() else {
        panic!("wrong message kind");
    };
    assert!(parsed.status.is_success());
    let assertion = parsed.assertions().next().unwrap();
    let Statement::Authn(authn) = &assertion.statements[0] else {
        panic!("expected authn statement");
    };
    assert_eq!(
        authn.context_class_ref.as_deref(),
        Some(authn_contexts::PASSWORD_PROTECTED_TRANSPORT)
    );
    let confirmation = &assertion.subject.as_ref().unwrap().confirmations[0];
    assert_eq!(
        confirmation.data.as_ref().unwrap().in_response_to.as_deref(),
        Some("ID_req")
    );
}

#[test]
fn second_assertion_can_be_signed_and_extracted() {
    let key = KeyPair::generate_p256();
    let response = factory::create_response(&sample_sp(), &sample_idp(), &sample_issuer())
        .unwrap()
        .with_assertion(
            factory::create_response(&sample_sp(), &sample_idp(), &sample_issuer())
                .unwrap()
                .assertions()
                .next()
                .unwrap()
                .clone(),
        );
    let first_id = response.assertions().next().unwrap().id.clone();
    let second_id = response.assertions().nth(1).unwrap().id.clone();
    assert_ne!(first_id, second_id);

    let mut doc = writers::write(&SamlMessage::Response(response)).unwrap();
    XmlSigner::new(&key)
        .with_config(
            SignatureConfig::for_method(SignatureMethod::EcdsaSha256)
                .with_reference_uri(format!("#{second_id}")),
        )
        .sign(&mut doc)
        .unwrap();

    // round-trip through bytes, then lift the signed assertion out
    let reparsed = Document::from_bytes(&doc.to_bytes()).unwrap();
    let standalone = reparsed.extract_subtree(&second_id).unwrap();
    assert!(validate(&standalone, &key.public_key()).unwrap());

    // the other assertion carries no signature
    let first = reparsed.resolve_id(&first_id).unwrap();
    assert!(first
        .child_elements()
        .all(|child| child.name.local != "Signature"));
}

#[test]
fn tampered_response_fails_validation() {
    let key = KeyPair::generate_p256();
    let response = factory::create_response(&sample_sp(), &sample_idp(), &sample_issuer()).unwrap();
    let mut doc = writers::write(&SamlMessage::Response(response)).unwrap();
    XmlSigner::new(&key).sign(&mut doc).unwrap();

    let text = String::from_utf8(doc.to_bytes()).unwrap();
    let tampered = text.replace("user-1", "admin-1");
    assert_ne!(text, tampered);

    let reparsed = Document::from_bytes(tampered.as_bytes()).unwrap();
    assert!(!validate(&reparsed, &key.public_key()).unwrap());
}

#[test]
fn certificate_free_validation_requires_a_key() {
    // an EC signer embeds no KeyInfo, so certificate-based validation
    // must fail while key-based validation succeeds
    let key = KeyPair::generate_p256();
    let request = factory::create_authn_request(
        "http://sp.example.com",
        "http://sp.example.com/acs",
        "http://idp.example.com/sso",
    );
    let mut doc = writers::write(&SamlMessage::AuthnRequest(request)).unwrap();
    XmlSigner::new(&key).sign(&mut doc).unwrap();

    assert!(validate(&doc, &key.public_key()).unwrap());
    assert!(saml_core::validate_with_certificate(&doc).is_err());
}
