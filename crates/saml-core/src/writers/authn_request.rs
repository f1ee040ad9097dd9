//! `AuthnRequest` writer.

use super::{
    assertion::subject_element, protocol_root, saml_text_element, samlp_element, set_attr,
    set_bool_attr,
};
use crate::error::SamlResult;
use crate::types::AuthnRequest;
use crate::xml::Element;

pub(crate) fn write(request: &AuthnRequest) -> SamlResult<Element> {
    let mut root = protocol_root("AuthnRequest", &request.header)?;
    set_attr(
        &mut root,
        "AssertionConsumerServiceURL",
        request.assertion_consumer_service_url.as_deref(),
    );
    set_attr(
        &mut root,
        "ProtocolBinding",
        request.protocol_binding.as_deref(),
    );
    set_attr(&mut root, "ProviderName", request.provider_name.as_deref());
    set_bool_attr(&mut root, "ForceAuthn", request.force_authn);
    set_bool_attr(&mut root, "IsPassive", request.is_passive);

    if let Some(subject) = &request.subject {
        root.add_child(subject_element(subject));
    }
    if let Some(policy) = &request.name_id_policy {
        let mut el = samlp_element("NameIDPolicy");
        set_attr(&mut el, "Format", policy.format.as_deref());
        set_attr(
            &mut el,
            "SPNameQualifier",
            policy.sp_name_qualifier.as_deref(),
        );
        set_bool_attr(&mut el, "AllowCreate", policy.allow_create);
        root.add_child(el);
    }
    if let Some(context) = &request.requested_authn_context {
        let mut el = samlp_element("RequestedAuthnContext");
        set_attr(&mut el, "Comparison", context.comparison.as_deref());
        for class_ref in &context.class_refs {
            el.add_child(saml_text_element("AuthnContextClassRef", class_ref));
        }
        for decl_ref in &context.decl_refs {
            el.add_child(saml_text_element("AuthnContextDeclRef", decl_ref));
        }
        root.add_child(el);
    }
    Ok(root)
}
