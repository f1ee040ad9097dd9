//! Writers turning typed messages back into XML documents.
//!
//! Output uses the conventional `samlp`/`saml` prefixes and declares both
//! namespaces on the document element. Optional fields that are absent
//! produce no output at all, so a parse/write round trip is stable.

pub mod artifact;
pub mod assertion;
pub mod authn_request;
pub mod logout;
pub mod response;

use crate::error::{SamlError, SamlResult};
use crate::time::{self, Instant};
use crate::types::constants::{prefixes, SAMLP_NS, SAML_NS, SAML_VERSION};
use crate::types::{MessageHeader, NameId, SamlMessage, Status, StatusCode};
use crate::xml::{Document, Element};

/// Serializes a message into a document ready for signing or transport.
pub fn write(message: &SamlMessage) -> SamlResult<Document> {
    Ok(Document::new(message_element(message)?))
}

/// Builds the document element for any message kind.
pub(crate) fn message_element(message: &SamlMessage) -> SamlResult<Element> {
    match message {
        SamlMessage::AuthnRequest(m) => authn_request::write(m),
        SamlMessage::ArtifactResolve(m) => artifact::write_resolve(m),
        SamlMessage::LogoutRequest(m) => logout::write_request(m),
        SamlMessage::Response(m) => response::write(m),
        SamlMessage::ArtifactResponse(m) => artifact::write_response(m),
        SamlMessage::LogoutResponse(m) => logout::write_response(m),
        SamlMessage::Assertion(m) => assertion::assertion_element(m),
    }
}

pub(crate) fn saml_element(local: &str) -> Element {
    Element::new(Some(prefixes::SAML), local, Some(SAML_NS))
}

pub(crate) fn samlp_element(local: &str) -> Element {
    Element::new(Some(prefixes::SAMLP), local, Some(SAMLP_NS))
}

pub(crate) fn saml_text_element(local: &str, text: &str) -> Element {
    let mut el = saml_element(local);
    el.add_text(text);
    el
}

/// Builds a protocol document element with the shared header applied:
/// attributes first, then `Issuer`, `Signature` and `Extensions` children.
pub(crate) fn protocol_root(local: &str, header: &MessageHeader) -> SamlResult<Element> {
    if header.id.is_empty() {
        return Err(SamlError::IncompleteMessage(format!(
            "{local} without an ID"
        )));
    }
    let mut root = samlp_element(local);
    root.declare_namespace(Some(prefixes::SAMLP), SAMLP_NS);
    root.declare_namespace(Some(prefixes::SAML), SAML_NS);
    root.set_attribute("ID", &header.id);
    root.set_attribute("Version", SAML_VERSION);
    root.set_attribute("IssueInstant", &time::format_instant(header.issue_instant));
    set_attr(&mut root, "Destination", header.destination.as_deref());
    set_attr(&mut root, "Consent", header.consent.as_deref());
    set_attr(&mut root, "InResponseTo", header.in_response_to.as_deref());

    if let Some(issuer) = &header.issuer {
        root.add_child(name_id_element("Issuer", issuer));
    }
    if let Some(signature) = &header.signature {
        root.add_child(signature.clone());
    }
    if let Some(extensions) = &header.extensions {
        root.add_child(extensions.clone());
    }
    Ok(root)
}

pub(crate) fn name_id_element(local: &str, name_id: &NameId) -> Element {
    let mut el = saml_element(local);
    set_attr(&mut el, "Format", name_id.format.as_deref());
    set_attr(&mut el, "NameQualifier", name_id.name_qualifier.as_deref());
    set_attr(
        &mut el,
        "SPNameQualifier",
        name_id.sp_name_qualifier.as_deref(),
    );
    el.add_text(&name_id.value);
    el
}

pub(crate) fn status_element(status: &Status) -> Element {
    let mut el = samlp_element("Status");
    el.add_child(status_code_element(&status.status_code));
    if let Some(message) = &status.status_message {
        let mut child = samlp_element("StatusMessage");
        child.add_text(message);
        el.add_child(child);
    }
    if let Some(detail) = &status.status_detail {
        el.add_child(detail.clone());
    }
    el
}

fn status_code_element(code: &StatusCode) -> Element {
    let mut el = samlp_element("StatusCode");
    el.set_attribute("Value", &code.value);
    if let Some(sub) = &code.status_code {
        el.add_child(status_code_element(sub));
    }
    el
}

pub(crate) fn set_attr(el: &mut Element, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        el.set_attribute(name, value);
    }
}

pub(crate) fn set_bool_attr(el: &mut Element, name: &str, value: Option<bool>) {
    if let Some(flag) = value {
        el.set_attribute(name, if flag { "true" } else { "false" });
    }
}

pub(crate) fn set_instant_attr(el: &mut Element, name: &str, value: Option<Instant>) {
    if let Some(instant) = value {
        el.set_attribute(name, &time::format_instant(instant));
    }
}
