//! `LogoutRequest` and `LogoutResponse` parsers.

use super::{parse_header, parse_name_id, parse_status, peek_child, try_common_child};
use crate::error::{SamlError, SamlResult};
use crate::time;
use crate::types::constants::{SAMLP_NS, SAML_NS, XMLENC_NS};
use crate::types::{LogoutRequest, LogoutResponse};
use crate::xml::{StartTag, XmlReader};

/// Parses a `LogoutRequest` whose start tag is consumed.
pub(crate) fn parse_request(reader: &mut XmlReader, start: &StartTag) -> SamlResult<LogoutRequest> {
    let mut request = LogoutRequest {
        header: parse_header(start)?,
        name_id: None,
        encrypted_id: None,
        session_indexes: Vec::new(),
        reason: start.attribute("Reason").map(str::to_string),
        not_on_or_after: start
            .attribute("NotOnOrAfter")
            .map(time::parse_instant)
            .transpose()?,
    };

    loop {
        if try_common_child(reader, &mut request.header)? {
            continue;
        }
        let Some((ns, local)) = peek_child(reader)? else {
            break;
        };
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "NameID") => {
                let tag = reader.next_start()?;
                request.name_id = Some(parse_name_id(reader, &tag)?);
            }
            (Some(SAML_NS), "EncryptedID") | (Some(XMLENC_NS), "EncryptedID") => {
                let tag = reader.next_start()?;
                request.encrypted_id = Some(reader.capture_subtree(tag)?);
            }
            (Some(SAMLP_NS), "SessionIndex") => {
                reader.next_start()?;
                request.session_indexes.push(reader.element_text()?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("LogoutRequest")?;

    if request.name_id.is_none() && request.encrypted_id.is_none() {
        return Err(SamlError::MalformedMessage(
            "LogoutRequest without NameID or EncryptedID".to_string(),
        ));
    }
    Ok(request)
}

/// Parses a `LogoutResponse` whose start tag is consumed.
pub(crate) fn parse_response(
    reader: &mut XmlReader,
    start: &StartTag,
) -> SamlResult<LogoutResponse> {
    let mut header = parse_header(start)?;
    let mut status = None;

    loop {
        if try_common_child(reader, &mut header)? {
            continue;
        }
        let Some((ns, local)) = peek_child(reader)? else {
            break;
        };
        match (ns.as_deref(), local.as_str()) {
            (Some(SAMLP_NS), "Status") => {
                reader.next_start()?;
                status = Some(parse_status(reader)?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("LogoutResponse")?;

    let status = status.ok_or_else(|| {
        SamlError::MalformedMessage("LogoutResponse without Status".to_string())
    })?;
    Ok(LogoutResponse::new(header, status))
}

#[cfg(test)]
mod tests {
    use crate::parsers::parse_bytes;
    use crate::types::constants::status_codes;
    use crate::types::SamlMessage;

    #[test]
    fn parses_logout_request() {
        let xml = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="ID_lo" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z" Reason="urn:oasis:names:tc:SAML:2.0:logout:user" NotOnOrAfter="2024-05-01T12:10:00.000Z"><saml:Issuer>http://sp</saml:Issuer><saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent">user-1</saml:NameID><samlp:SessionIndex>s1</samlp:SessionIndex><samlp:SessionIndex>s2</samlp:SessionIndex></samlp:LogoutRequest>"#;
        let SamlMessage::LogoutRequest(request) = parse_bytes(xml.as_bytes()).unwrap() else {
            panic!("wrong message kind");
        };
        assert_eq!(
            request.name_id.as_ref().map(|n| n.value.as_str()),
            Some("user-1")
        );
        assert_eq!(request.session_indexes, vec!["s1", "s2"]);
        assert!(request.reason.as_deref().unwrap().ends_with(":user"));
        assert!(request.not_on_or_after.is_some());
    }

    #[test]
    fn logout_request_requires_a_principal() {
        let xml = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="ID_lo" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z"/>"#;
        assert!(matches!(
            parse_bytes(xml.as_bytes()),
            Err(crate::error::SamlError::MalformedMessage(_))
        ));
    }

    #[test]
    fn parses_logout_response_status() {
        let xml = r#"<samlp:LogoutResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="ID_lr" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z" InResponseTo="ID_lo"><samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status></samlp:LogoutResponse>"#;
        let SamlMessage::LogoutResponse(response) = parse_bytes(xml.as_bytes()).unwrap() else {
            panic!("wrong message kind");
        };
        assert_eq!(response.status.status_code.value, status_codes::SUCCESS);
        assert_eq!(response.header.in_response_to.as_deref(), Some("ID_lo"));
    }
}
