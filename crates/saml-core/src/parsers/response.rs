//! `Response` parser.

use super::{assertion, parse_header, parse_status, peek_child, try_common_child};
use crate::error::{SamlError, SamlResult};
use crate::types::constants::{SAMLP_NS, SAML_NS};
use crate::types::{Response, ResponseItem};
use crate::xml::{StartTag, XmlReader};

/// Parses a `Response` whose start tag is consumed.
///
/// Assertions and encrypted assertions are collected in document order so
/// the response can be re-serialized without reordering them.
pub(crate) fn parse(reader: &mut XmlReader, start: &StartTag) -> SamlResult<Response> {
    let mut header = parse_header(start)?;
    let mut status = None;
    let mut items = Vec::new();

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
            (Some(SAML_NS), "Assertion") => {
                let tag = reader.next_start()?;
                items.push(ResponseItem::Assertion(assertion::parse(reader, &tag)?));
            }
            (Some(SAML_NS), "EncryptedAssertion") => {
                let tag = reader.next_start()?;
                items.push(ResponseItem::Encrypted(reader.capture_subtree(tag)?));
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("Response")?;

    let status = status.ok_or_else(|| {
        SamlError::MalformedMessage("Response without Status".to_string())
    })?;
    Ok(Response {
        header,
        status,
        items,
    })
}
