//! Streaming parsers for top-level SAML elements.
//!
//! The dispatcher inspects the first start element's qualified name and
//! hands off to the matching message parser. Parsing is single-pass with
//! one start element of lookahead. Required attributes missing or
//! malformed fail with `MalformedMessage`; an unexpected child in a
//! strict position fails with `UnknownElement` carrying its location.

pub mod assertion;
pub mod artifact;
pub mod authn_request;
pub mod logout;
pub mod response;

use std::io::Read;

use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::time;
use crate::types::constants::{SAMLP_NS, SAML_NS, SAML_VERSION, XMLDSIG_NS};
use crate::types::{MessageHeader, NameId, SamlMessage, Status, StatusCode};
use crate::xml::{StartTag, XmlReader};

/// Parses a SAML message from an input stream.
pub fn parse(mut input: impl Read) -> SamlResult<SamlMessage> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    parse_bytes(&bytes)
}

/// Parses a SAML message from in-memory bytes.
pub fn parse_bytes(bytes: &[u8]) -> SamlResult<SamlMessage> {
    let mut reader = XmlReader::new(bytes);
    let start = reader.next_start()?;
    parse_message(&mut reader, start)
}

/// Dispatches on a consumed start element.
pub(crate) fn parse_message(reader: &mut XmlReader, start: StartTag) -> SamlResult<SamlMessage> {
    debug!(element = %start.local, "parsing message");
    match (start.namespace.as_deref(), start.local.as_str()) {
        (Some(SAMLP_NS), "AuthnRequest") => {
            Ok(SamlMessage::AuthnRequest(authn_request::parse(reader, &start)?))
        }
        (Some(SAMLP_NS), "ArtifactResolve") => {
            Ok(SamlMessage::ArtifactResolve(artifact::parse_resolve(reader, &start)?))
        }
        (Some(SAMLP_NS), "LogoutRequest") => {
            Ok(SamlMessage::LogoutRequest(logout::parse_request(reader, &start)?))
        }
        (Some(SAMLP_NS), "Response") => {
            Ok(SamlMessage::Response(response::parse(reader, &start)?))
        }
        (Some(SAMLP_NS), "ArtifactResponse") => {
            Ok(SamlMessage::ArtifactResponse(artifact::parse_response(reader, &start)?))
        }
        (Some(SAMLP_NS), "LogoutResponse") => {
            Ok(SamlMessage::LogoutResponse(logout::parse_response(reader, &start)?))
        }
        (Some(SAML_NS), "Assertion") => {
            Ok(SamlMessage::Assertion(assertion::parse(reader, &start)?))
        }
        _ => Err(start.unknown()),
    }
}

/// Reads the attributes every request and response shares.
pub(crate) fn parse_header(start: &StartTag) -> SamlResult<MessageHeader> {
    let id = start.required_attribute("ID")?.to_string();
    let version = start.required_attribute("Version")?;
    if version != SAML_VERSION {
        return Err(SamlError::SchemaViolation(format!(
            "unsupported SAML version {version:?}"
        )));
    }
    let issue_instant = time::parse_instant(start.required_attribute("IssueInstant")?)?;

    Ok(MessageHeader {
        id,
        issue_instant,
        destination: start.attribute("Destination").map(str::to_string),
        consent: start.attribute("Consent").map(str::to_string),
        in_response_to: start.attribute("InResponseTo").map(str::to_string),
        issuer: None,
        signature: None,
        extensions: None,
    })
}

/// Peeked child info, cloned out of the reader so dispatch can consume.
pub(crate) fn peek_child(reader: &mut XmlReader) -> SamlResult<Option<(Option<String>, String)>> {
    Ok(reader
        .peek_start()?
        .map(|tag| (tag.namespace.clone(), tag.local.clone())))
}

/// Consumes `Issuer`, `Signature` or `Extensions` into the header.
///
/// These may legally appear once each ahead of the element-specific
/// children; repeated occurrences are consumed last-wins, mirroring the
/// lenient handling peers rely on.
pub(crate) fn try_common_child(
    reader: &mut XmlReader,
    header: &mut MessageHeader,
) -> SamlResult<bool> {
    let Some((ns, local)) = peek_child(reader)? else {
        return Ok(false);
    };
    match (ns.as_deref(), local.as_str()) {
        (Some(SAML_NS), "Issuer") => {
            let start = reader.next_start()?;
            header.issuer = Some(parse_name_id(reader, &start)?);
            Ok(true)
        }
        (Some(XMLDSIG_NS), "Signature") => {
            let start = reader.next_start()?;
            header.signature = Some(reader.capture_subtree(start)?);
            Ok(true)
        }
        (Some(SAMLP_NS), "Extensions") => {
            let start = reader.next_start()?;
            header.extensions = Some(reader.capture_subtree(start)?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Parses a `NameID`-shaped element whose start tag is consumed.
pub(crate) fn parse_name_id(reader: &mut XmlReader, start: &StartTag) -> SamlResult<NameId> {
    let mut name_id = NameId::new(String::new());
    name_id.format = start.attribute("Format").map(str::to_string);
    name_id.name_qualifier = start.attribute("NameQualifier").map(str::to_string);
    name_id.sp_name_qualifier = start.attribute("SPNameQualifier").map(str::to_string);
    name_id.value = reader.element_text()?;
    Ok(name_id)
}

/// Parses `Status` after its start tag has been consumed.
pub(crate) fn parse_status(reader: &mut XmlReader) -> SamlResult<Status> {
    let mut status_code: Option<StatusCode> = None;
    let mut status_message = None;
    let mut status_detail = None;

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAMLP_NS), "StatusCode") => {
                let start = reader.next_start()?;
                status_code = Some(parse_status_code(reader, &start)?);
            }
            (Some(SAMLP_NS), "StatusMessage") => {
                reader.next_start()?;
                status_message = Some(reader.element_text()?);
            }
            (Some(SAMLP_NS), "StatusDetail") => {
                let start = reader.next_start()?;
                status_detail = Some(reader.capture_subtree(start)?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("Status")?;

    Ok(Status {
        status_code: status_code
            .ok_or_else(|| SamlError::MalformedMessage("Status without StatusCode".to_string()))?,
        status_message,
        status_detail,
    })
}

fn parse_status_code(reader: &mut XmlReader, start: &StartTag) -> SamlResult<StatusCode> {
    let mut code = StatusCode::new(start.required_attribute("Value")?);

    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAMLP_NS), "StatusCode") => {
                let nested = reader.next_start()?;
                code.status_code = Some(Box::new(parse_status_code(reader, &nested)?));
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("StatusCode")?;
    Ok(code)
}

/// Parses an `xs:boolean` lexical value.
pub(crate) fn parse_bool(value: &str) -> SamlResult<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(SamlError::SchemaViolation(format!(
            "bad boolean {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_rejects_unknown_root() {
        let err = parse_bytes(b"<Bogus/>").unwrap_err();
        assert!(matches!(err, SamlError::UnknownElement { .. }));
    }

    #[test]
    fn missing_required_attribute_is_malformed() {
        let xml = br#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" Version="2.0"/>"#;
        let err = parse_bytes(xml).unwrap_err();
        assert!(matches!(err, SamlError::MalformedMessage(_)));
    }

    #[test]
    fn wrong_version_is_a_schema_violation() {
        let xml = br#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="ID_1" Version="1.1" IssueInstant="2024-05-01T00:00:00.000Z"/>"#;
        let err = parse_bytes(xml).unwrap_err();
        assert!(matches!(err, SamlError::SchemaViolation(_)));
    }

    #[test]
    fn bool_lexical_space() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(parse_bool("TRUE").is_err());
    }
}
