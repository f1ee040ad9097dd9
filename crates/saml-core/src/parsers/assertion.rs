//! `Assertion` parser, including subject, conditions and statements.

use super::{parse_name_id, peek_child};
use crate::error::{SamlError, SamlResult};
use crate::time;
use crate::types::constants::{SAML_NS, SAML_VERSION, XMLDSIG_NS, XMLENC_NS};
use crate::types::{
    Assertion, AttributeStatement, AudienceRestriction, AuthnStatement, AuthzDecisionStatement,
    Conditions, SamlAttribute, Statement, Subject, SubjectConfirmation, SubjectConfirmationData,
};
use crate::xml::{StartTag, XmlReader};

/// Parses an `Assertion` whose start tag is consumed.
pub(crate) fn parse(reader: &mut XmlReader, start: &StartTag) -> SamlResult<Assertion> {
    let id = start.required_attribute("ID")?.to_string();
    let version = start.required_attribute("Version")?;
    if version != SAML_VERSION {
        return Err(SamlError::SchemaViolation(format!(
            "unsupported SAML version {version:?}"
        )));
    }
    let issue_instant = time::parse_instant(start.required_attribute("IssueInstant")?)?;

    let mut issuer = None;
    let mut signature = None;
    let mut subject = None;
    let mut conditions = None;
    let mut statements = Vec::new();

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "Issuer") => {
                let tag = reader.next_start()?;
                issuer = Some(parse_name_id(reader, &tag)?);
            }
            (Some(XMLDSIG_NS), "Signature") => {
                let tag = reader.next_start()?;
                signature = Some(reader.capture_subtree(tag)?);
            }
            (Some(SAML_NS), "Subject") => {
                let tag = reader.next_start()?;
                subject = Some(parse_subject(reader, &tag)?);
            }
            (Some(SAML_NS), "Conditions") => {
                let tag = reader.next_start()?;
                conditions = Some(parse_conditions(reader, &tag)?);
            }
            (Some(SAML_NS), "AuthnStatement") => {
                let tag = reader.next_start()?;
                statements.push(Statement::Authn(parse_authn_statement(reader, &tag)?));
            }
            (Some(SAML_NS), "AttributeStatement") => {
                reader.next_start()?;
                statements.push(Statement::Attribute(parse_attribute_statement(reader)?));
            }
            (Some(SAML_NS), "AuthzDecisionStatement") => {
                let tag = reader.next_start()?;
                statements.push(Statement::AuthzDecision(parse_authz_statement(
                    reader, &tag,
                )?));
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("Assertion")?;

    Ok(Assertion {
        id,
        issue_instant,
        issuer: issuer
            .ok_or_else(|| SamlError::MalformedMessage("Assertion without Issuer".to_string()))?,
        signature,
        subject,
        conditions,
        statements,
    })
}

/// Parses a `Subject` whose start tag is consumed.
pub(crate) fn parse_subject(reader: &mut XmlReader, _start: &StartTag) -> SamlResult<Subject> {
    let mut subject = Subject::default();

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "NameID") => {
                let tag = reader.next_start()?;
                subject.name_id = Some(parse_name_id(reader, &tag)?);
            }
            (Some(SAML_NS), "EncryptedID") | (Some(XMLENC_NS), "EncryptedID") => {
                let tag = reader.next_start()?;
                subject.encrypted_id = Some(reader.capture_subtree(tag)?);
            }
            (Some(SAML_NS), "SubjectConfirmation") => {
                let tag = reader.next_start()?;
                subject
                    .confirmations
                    .push(parse_subject_confirmation(reader, &tag)?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("Subject")?;
    Ok(subject)
}

fn parse_subject_confirmation(
    reader: &mut XmlReader,
    start: &StartTag,
) -> SamlResult<SubjectConfirmation> {
    let mut confirmation = SubjectConfirmation {
        method: start.required_attribute("Method")?.to_string(),
        name_id: None,
        data: None,
    };

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "NameID") => {
                let tag = reader.next_start()?;
                confirmation.name_id = Some(parse_name_id(reader, &tag)?);
            }
            (Some(SAML_NS), "SubjectConfirmationData") => {
                let tag = reader.next_start()?;
                confirmation.data = Some(parse_confirmation_data(reader, &tag)?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("SubjectConfirmation")?;
    Ok(confirmation)
}

fn parse_confirmation_data(
    reader: &mut XmlReader,
    start: &StartTag,
) -> SamlResult<SubjectConfirmationData> {
    let data = SubjectConfirmationData {
        recipient: start.attribute("Recipient").map(str::to_string),
        in_response_to: start.attribute("InResponseTo").map(str::to_string),
        not_before: start
            .attribute("NotBefore")
            .map(time::parse_instant)
            .transpose()?,
        not_on_or_after: start
            .attribute("NotOnOrAfter")
            .map(time::parse_instant)
            .transpose()?,
        address: start.attribute("Address").map(str::to_string),
    };
    reader.end_element("SubjectConfirmationData")?;
    Ok(data)
}

fn parse_conditions(reader: &mut XmlReader, start: &StartTag) -> SamlResult<Conditions> {
    let mut conditions = Conditions {
        not_before: start
            .attribute("NotBefore")
            .map(time::parse_instant)
            .transpose()?,
        not_on_or_after: start
            .attribute("NotOnOrAfter")
            .map(time::parse_instant)
            .transpose()?,
        audience_restrictions: Vec::new(),
    };

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "AudienceRestriction") => {
                reader.next_start()?;
                let mut restriction = AudienceRestriction::default();
                while let Some((ns, local)) = peek_child(reader)? {
                    if ns.as_deref() == Some(SAML_NS) && local == "Audience" {
                        reader.next_start()?;
                        restriction.audiences.push(reader.element_text()?);
                    } else {
                        let tag = reader.next_start()?;
                        return Err(tag.unknown());
                    }
                }
                reader.end_element("AudienceRestriction")?;
                conditions.audience_restrictions.push(restriction);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("Conditions")?;
    Ok(conditions)
}

fn parse_authn_statement(reader: &mut XmlReader, start: &StartTag) -> SamlResult<AuthnStatement> {
    let mut statement = AuthnStatement {
        authn_instant: time::parse_instant(start.required_attribute("AuthnInstant")?)?,
        session_index: start.attribute("SessionIndex").map(str::to_string),
        session_not_on_or_after: start
            .attribute("SessionNotOnOrAfter")
            .map(time::parse_instant)
            .transpose()?,
        context_class_ref: None,
        context_decl_ref: None,
    };

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "AuthnContext") => {
                reader.next_start()?;
                while let Some((ns, local)) = peek_child(reader)? {
                    match (ns.as_deref(), local.as_str()) {
                        (Some(SAML_NS), "AuthnContextClassRef") => {
                            reader.next_start()?;
                            statement.context_class_ref = Some(reader.element_text()?);
                        }
                        (Some(SAML_NS), "AuthnContextDeclRef") => {
                            reader.next_start()?;
                            statement.context_decl_ref = Some(reader.element_text()?);
                        }
                        _ => {
                            let tag = reader.next_start()?;
                            return Err(tag.unknown());
                        }
                    }
                }
                reader.end_element("AuthnContext")?;
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("AuthnStatement")?;
    Ok(statement)
}

fn parse_attribute_statement(reader: &mut XmlReader) -> SamlResult<AttributeStatement> {
    let mut statement = AttributeStatement::default();

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "Attribute") => {
                let tag = reader.next_start()?;
                let mut attribute = SamlAttribute {
                    name: tag.required_attribute("Name")?.to_string(),
                    name_format: tag.attribute("NameFormat").map(str::to_string),
                    friendly_name: tag.attribute("FriendlyName").map(str::to_string),
                    values: Vec::new(),
                };
                while let Some((ns, local)) = peek_child(reader)? {
                    if ns.as_deref() == Some(SAML_NS) && local == "AttributeValue" {
                        reader.next_start()?;
                        attribute.values.push(reader.element_text()?);
                    } else {
                        let tag = reader.next_start()?;
                        return Err(tag.unknown());
                    }
                }
                reader.end_element("Attribute")?;
                statement.attributes.push(attribute);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("AttributeStatement")?;
    Ok(statement)
}

fn parse_authz_statement(
    reader: &mut XmlReader,
    start: &StartTag,
) -> SamlResult<AuthzDecisionStatement> {
    let mut statement = AuthzDecisionStatement {
        resource: start.required_attribute("Resource")?.to_string(),
        decision: start.required_attribute("Decision")?.to_string(),
        actions: Vec::new(),
    };

    while let Some((ns, local)) = peek_child(reader)? {
        if ns.as_deref() == Some(SAML_NS) && local == "Action" {
            reader.next_start()?;
            statement.actions.push(reader.element_text()?);
        } else {
            let tag = reader.next_start()?;
            return Err(tag.unknown());
        }
    }
    reader.end_element("AuthzDecisionStatement")?;
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use crate::parsers::parse_bytes;
    use crate::types::{SamlMessage, Statement};

    const SAMPLE: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="ID_a1" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z"><saml:Issuer Format="urn:oasis:names:tc:SAML:2.0:nameid-format:entity">http://idp</saml:Issuer><saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent">user-1</saml:NameID><saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer"><saml:SubjectConfirmationData Recipient="http://sp/acs" InResponseTo="ID_req" NotOnOrAfter="2024-05-01T12:05:00.000Z"/></saml:SubjectConfirmation></saml:Subject><saml:Conditions NotBefore="2024-05-01T11:59:00.000Z" NotOnOrAfter="2024-05-01T12:05:00.000Z"><saml:AudienceRestriction><saml:Audience>http://sp</saml:Audience></saml:AudienceRestriction></saml:Conditions><saml:AuthnStatement AuthnInstant="2024-05-01T12:00:00.000Z" SessionIndex="s1"><saml:AuthnContext><saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport</saml:AuthnContextClassRef></saml:AuthnContext></saml:AuthnStatement><saml:AttributeStatement><saml:Attribute Name="mail"><saml:AttributeValue>user@example.com</saml:AttributeValue></saml:Attribute></saml:AttributeStatement></saml:Assertion>"#;

    #[test]
    fn parses_full_assertion() {
        let SamlMessage::Assertion(assertion) = parse_bytes(SAMPLE.as_bytes()).unwrap() else {
            panic!("wrong message kind");
        };

        assert_eq!(assertion.id, "ID_a1");
        assert_eq!(assertion.issuer.value, "http://idp");

        let subject = assertion.subject.as_ref().unwrap();
        assert_eq!(
            subject.name_id.as_ref().map(|n| n.value.as_str()),
            Some("user-1")
        );
        let data = subject.confirmations[0].data.as_ref().unwrap();
        assert_eq!(data.in_response_to.as_deref(), Some("ID_req"));

        let conditions = assertion.conditions.as_ref().unwrap();
        assert_eq!(conditions.audience_restrictions[0].audiences[0], "http://sp");

        assert_eq!(assertion.statements.len(), 2);
        let Statement::Authn(authn) = &assertion.statements[0] else {
            panic!("expected authn statement");
        };
        assert_eq!(authn.session_index.as_deref(), Some("s1"));
        assert!(authn
            .context_class_ref
            .as_deref()
            .unwrap()
            .ends_with("PasswordProtectedTransport"));

        let Statement::Attribute(attrs) = &assertion.statements[1] else {
            panic!("expected attribute statement");
        };
        assert_eq!(attrs.attributes[0].values[0], "user@example.com");
    }

    #[test]
    fn assertion_without_issuer_is_malformed() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="ID_a" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z"/>"#;
        let err = parse_bytes(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, crate::error::SamlError::MalformedMessage(_)));
    }
}
