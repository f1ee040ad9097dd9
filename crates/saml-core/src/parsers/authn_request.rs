//! `AuthnRequest` parser.

use super::{parse_bool, parse_header, peek_child, try_common_child};
use crate::error::SamlResult;
use crate::parsers::assertion::parse_subject;
use crate::types::constants::{SAMLP_NS, SAML_NS};
use crate::types::{AuthnRequest, NameIdPolicy, RequestedAuthnContext};
use crate::xml::{StartTag, XmlReader};

/// Parses an `AuthnRequest` whose start tag is consumed.
pub(crate) fn parse(reader: &mut XmlReader, start: &StartTag) -> SamlResult<AuthnRequest> {
    let mut request = AuthnRequest::new(parse_header(start)?);
    request.assertion_consumer_service_url = start
        .attribute("AssertionConsumerServiceURL")
        .map(str::to_string);
    request.protocol_binding = start.attribute("ProtocolBinding").map(str::to_string);
    request.provider_name = start.attribute("ProviderName").map(str::to_string);
    request.force_authn = start
        .attribute("ForceAuthn")
        .map(parse_bool)
        .transpose()?;
    request.is_passive = start.attribute("IsPassive").map(parse_bool).transpose()?;

    loop {
        if try_common_child(reader, &mut request.header)? {
            continue;
        }
        let Some((ns, local)) = peek_child(reader)? else {
            break;
        };
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "Subject") => {
                let tag = reader.next_start()?;
                request.subject = Some(parse_subject(reader, &tag)?);
            }
            (Some(SAMLP_NS), "NameIDPolicy") => {
                let tag = reader.next_start()?;
                request.name_id_policy = Some(parse_name_id_policy(reader, &tag)?);
            }
            (Some(SAMLP_NS), "RequestedAuthnContext") => {
                let tag = reader.next_start()?;
                request.requested_authn_context = Some(parse_requested_context(reader, &tag)?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("AuthnRequest")?;
    Ok(request)
}

fn parse_name_id_policy(reader: &mut XmlReader, start: &StartTag) -> SamlResult<NameIdPolicy> {
    let policy = NameIdPolicy {
        format: start.attribute("Format").map(str::to_string),
        sp_name_qualifier: start.attribute("SPNameQualifier").map(str::to_string),
        allow_create: start
            .attribute("AllowCreate")
            .map(parse_bool)
            .transpose()?,
    };
    reader.end_element("NameIDPolicy")?;
    Ok(policy)
}

fn parse_requested_context(
    reader: &mut XmlReader,
    start: &StartTag,
) -> SamlResult<RequestedAuthnContext> {
    let mut context = RequestedAuthnContext {
        comparison: start.attribute("Comparison").map(str::to_string),
        ..RequestedAuthnContext::default()
    };
    while let Some((ns, local)) = peek_child(reader)? {
        match (ns.as_deref(), local.as_str()) {
            (Some(SAML_NS), "AuthnContextClassRef") => {
                reader.next_start()?;
                context.class_refs.push(reader.element_text()?);
            }
            (Some(SAML_NS), "AuthnContextDeclRef") => {
                reader.next_start()?;
                context.decl_refs.push(reader.element_text()?);
            }
            _ => {
                let tag = reader.next_start()?;
                return Err(tag.unknown());
            }
        }
    }
    reader.end_element("RequestedAuthnContext")?;
    Ok(context)
}
