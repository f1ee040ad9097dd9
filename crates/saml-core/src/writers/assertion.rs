//! `Assertion` writer.

use super::{
    name_id_element, saml_element, saml_text_element, set_attr, set_instant_attr,
};
use crate::error::{SamlError, SamlResult};
use crate::time;
use crate::types::constants::{prefixes, SAML_NS, SAML_VERSION};
use crate::types::{Assertion, Conditions, Statement, Subject};
use crate::xml::Element;

/// Builds a `saml:Assertion` element.
///
/// The assertion declares the assertion namespace on itself so the
/// subtree stays self-contained when extracted from a response.
pub(crate) fn assertion_element(assertion: &Assertion) -> SamlResult<Element> {
    if assertion.id.is_empty() {
        return Err(SamlError::IncompleteMessage(
            "Assertion without an ID".to_string(),
        ));
    }
    let mut root = saml_element("Assertion");
    root.declare_namespace(Some(prefixes::SAML), SAML_NS);
    root.set_attribute("ID", &assertion.id);
    root.set_attribute("Version", SAML_VERSION);
    root.set_attribute(
        "IssueInstant",
        &time::format_instant(assertion.issue_instant),
    );

    // signatures over assertions land before Issuer, matching the signer
    if let Some(signature) = &assertion.signature {
        root.add_child(signature.clone());
    }
    root.add_child(name_id_element("Issuer", &assertion.issuer));
    if let Some(subject) = &assertion.subject {
        root.add_child(subject_element(subject));
    }
    if let Some(conditions) = &assertion.conditions {
        root.add_child(conditions_element(conditions));
    }
    for statement in &assertion.statements {
        root.add_child(statement_element(statement));
    }
    Ok(root)
}

pub(crate) fn subject_element(subject: &Subject) -> Element {
    let mut el = saml_element("Subject");
    if let Some(name_id) = &subject.name_id {
        el.add_child(name_id_element("NameID", name_id));
    }
    if let Some(encrypted) = &subject.encrypted_id {
        el.add_child(encrypted.clone());
    }
    for confirmation in &subject.confirmations {
        let mut conf = saml_element("SubjectConfirmation");
        conf.set_attribute("Method", &confirmation.method);
        if let Some(name_id) = &confirmation.name_id {
            conf.add_child(name_id_element("NameID", name_id));
        }
        if let Some(data) = &confirmation.data {
            let mut d = saml_element("SubjectConfirmationData");
            set_attr(&mut d, "Recipient", data.recipient.as_deref());
            set_attr(&mut d, "InResponseTo", data.in_response_to.as_deref());
            set_instant_attr(&mut d, "NotBefore", data.not_before);
            set_instant_attr(&mut d, "NotOnOrAfter", data.not_on_or_after);
            set_attr(&mut d, "Address", data.address.as_deref());
            conf.add_child(d);
        }
        el.add_child(conf);
    }
    el
}

fn conditions_element(conditions: &Conditions) -> Element {
    let mut el = saml_element("Conditions");
    set_instant_attr(&mut el, "NotBefore", conditions.not_before);
    set_instant_attr(&mut el, "NotOnOrAfter", conditions.not_on_or_after);
    for restriction in &conditions.audience_restrictions {
        let mut r = saml_element("AudienceRestriction");
        for audience in &restriction.audiences {
            r.add_child(saml_text_element("Audience", audience));
        }
        el.add_child(r);
    }
    el
}

fn statement_element(statement: &Statement) -> Element {
    match statement {
        Statement::Authn(authn) => {
            let mut el = saml_element("AuthnStatement");
            el.set_attribute("AuthnInstant", &time::format_instant(authn.authn_instant));
            set_attr(&mut el, "SessionIndex", authn.session_index.as_deref());
            set_instant_attr(
                &mut el,
                "SessionNotOnOrAfter",
                authn.session_not_on_or_after,
            );
            if authn.context_class_ref.is_some() || authn.context_decl_ref.is_some() {
                let mut context = saml_element("AuthnContext");
                if let Some(class_ref) = &authn.context_class_ref {
                    context.add_child(saml_text_element("AuthnContextClassRef", class_ref));
                }
                if let Some(decl_ref) = &authn.context_decl_ref {
                    context.add_child(saml_text_element("AuthnContextDeclRef", decl_ref));
                }
                el.add_child(context);
            }
            el
        }
        Statement::Attribute(statement) => {
            let mut el = saml_element("AttributeStatement");
            for attribute in &statement.attributes {
                let mut attr = saml_element("Attribute");
                attr.set_attribute("Name", &attribute.name);
                set_attr(&mut attr, "NameFormat", attribute.name_format.as_deref());
                set_attr(
                    &mut attr,
                    "FriendlyName",
                    attribute.friendly_name.as_deref(),
                );
                for value in &attribute.values {
                    attr.add_child(saml_text_element("AttributeValue", value));
                }
                el.add_child(attr);
            }
            el
        }
        Statement::AuthzDecision(decision) => {
            let mut el = saml_element("AuthzDecisionStatement");
            el.set_attribute("Resource", &decision.resource);
            el.set_attribute("Decision", &decision.decision);
            for action in &decision.actions {
                el.add_child(saml_text_element("Action", action));
            }
            el
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::constants::authn_contexts;
    use crate::types::{AuthnStatement, NameId, SamlAttribute, SubjectConfirmation};

    #[test]
    fn assertion_children_are_ordered() {
        let assertion = Assertion::new("ID_a", NameId::entity("http://idp"))
            .with_subject(Subject::new(NameId::persistent("u1")))
            .with_statement(Statement::Authn(AuthnStatement::new(
                authn_contexts::PASSWORD_PROTECTED_TRANSPORT,
            )));

        let el = assertion_element(&assertion).unwrap();
        let names: Vec<_> = el.child_elements().map(|c| c.name.local.as_str()).collect();
        assert_eq!(names, ["Issuer", "Subject", "AuthnStatement"]);
        assert_eq!(el.attribute("ID"), Some("ID_a"));
    }

    #[test]
    fn bearer_confirmation_round_trips_attributes() {
        let subject = Subject::new(NameId::persistent("u1"))
            .with_confirmation(SubjectConfirmation::bearer());
        let el = subject_element(&subject);
        let conf = el.find_child("SubjectConfirmation", SAML_NS).unwrap();
        assert_eq!(
            conf.attribute("Method"),
            Some("urn:oasis:names:tc:SAML:2.0:cm:bearer")
        );
    }

    #[test]
    fn attribute_statement_values() {
        let statement = Statement::Attribute(crate::types::AttributeStatement {
            attributes: vec![SamlAttribute::new("mail", "user@example.com")],
        });
        let el = statement_element(&statement);
        let attr = el.find_child("Attribute", SAML_NS).unwrap();
        assert_eq!(attr.attribute("Name"), Some("mail"));
        assert_eq!(
            attr.find_child("AttributeValue", SAML_NS).unwrap().text(),
            "user@example.com"
        );
    }
}
