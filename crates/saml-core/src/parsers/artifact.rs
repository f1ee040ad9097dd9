//! `ArtifactResolve` and `ArtifactResponse` parsers.

use super::{parse_header, parse_message, parse_status, peek_child, try_common_child};
use crate::error::{SamlError, SamlResult};
use crate::types::constants::SAMLP_NS;
use crate::types::{ArtifactResolve, ArtifactResponse};
use crate::xml::{StartTag, XmlReader};

/// Parses an `ArtifactResolve` whose start tag is consumed.
pub(crate) fn parse_resolve(reader: &mut XmlReader, start: &StartTag) -> SamlResult<ArtifactResolve> {
    let header = parse_header(start)?;
    let mut resolve = ArtifactResolve {
        header,
        artifact: String::new(),
    };
    let mut seen_artifact = false;

    loop {
        if try_common_child(reader, &mut resolve.header)? {
            continue;
        }
        let Some((ns, local)) = peek_child(reader)? else {
            break;
        };
        match (ns.as_deref(), local.as_str()) {
            (Some(SAMLP_NS), "Artifact") => {
                reader.next_start()?;
                resolve.artifact = reader.element_text()?;
                seen_artifact = true;
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("ArtifactResolve")?;

    if !seen_artifact {
        return Err(SamlError::MalformedMessage(
            "ArtifactResolve without Artifact".to_string(),
        ));
    }
    Ok(resolve)
}

/// Parses an `ArtifactResponse` whose start tag is consumed.
///
/// Any non-status child in the protocol namespace is treated as the
/// embedded message and parsed recursively.
pub(crate) fn parse_response(
    reader: &mut XmlReader,
    start: &StartTag,
) -> SamlResult<ArtifactResponse> {
    let mut header = parse_header(start)?;
    let mut status = None;
    let mut message = None;

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
                message = Some(Box::new(parse_message(reader, tag)?));
            }
        }
    }
    reader.end_element("ArtifactResponse")?;

    let status = status.ok_or_else(|| {
        SamlError::MalformedMessage("ArtifactResponse without Status".to_string())
    })?;
    Ok(ArtifactResponse {
        header,
        status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use crate::parsers::parse_bytes;
    use crate::types::constants::status_codes;
    use crate::types::SamlMessage;

    #[test]
    fn resolves_artifact_value() {
        let xml = r#"<samlp:ArtifactResolve xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="ID_ar" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z"><saml:Issuer>http://sp</saml:Issuer><samlp:Artifact>AAQAADWN</samlp:Artifact></samlp:ArtifactResolve>"#;
        let SamlMessage::ArtifactResolve(resolve) = parse_bytes(xml.as_bytes()).unwrap() else {
            panic!("wrong message kind");
        };
        assert_eq!(resolve.artifact, "AAQAADWN");
        assert_eq!(
            resolve.header.issuer.as_ref().map(|i| i.value.as_str()),
            Some("http://sp")
        );
    }

    #[test]
    fn missing_artifact_is_malformed() {
        let xml = r#"<samlp:ArtifactResolve xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="ID_ar" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z"/>"#;
        assert!(matches!(
            parse_bytes(xml.as_bytes()),
            Err(crate::error::SamlError::MalformedMessage(_))
        ));
    }

    #[test]
    fn embedded_message_is_parsed_recursively() {
        let xml = r#"<samlp:ArtifactResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="ID_resp" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z" InResponseTo="ID_ar"><samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status><samlp:LogoutResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="ID_lo" Version="2.0" IssueInstant="2024-05-01T12:00:00.000Z"><samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status></samlp:LogoutResponse></samlp:ArtifactResponse>"#;
        let SamlMessage::ArtifactResponse(response) = parse_bytes(xml.as_bytes()).unwrap() else {
            panic!("wrong message kind");
        };
        assert_eq!(response.status.status_code.value, status_codes::SUCCESS);
        let inner = response.message.unwrap();
        assert!(matches!(*inner, SamlMessage::LogoutResponse(ref lo) if lo.header.id == "ID_lo"));
    }
}
