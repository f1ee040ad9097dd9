//! `Response` writer.

use super::{assertion::assertion_element, protocol_root, status_element};
use crate::error::SamlResult;
use crate::types::{Response, ResponseItem};
use crate::xml::Element;

pub(crate) fn write(response: &Response) -> SamlResult<Element> {
    let mut root = protocol_root("Response", &response.header)?;
    root.add_child(status_element(&response.status));
    for item in &response.items {
        match item {
            ResponseItem::Assertion(assertion) => root.add_child(assertion_element(assertion)?),
            ResponseItem::Encrypted(fragment) => root.add_child(fragment.clone()),
        }
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use crate::types::constants::SAML_NS;
    use crate::types::{
        Assertion, MessageHeader, NameId, Response, SamlMessage, Status,
    };
    use crate::writers::write;
    use crate::xml::Element;

    #[test]
    fn items_keep_document_order() {
        let response = Response::new(
            MessageHeader::new("ID_resp").with_issuer(NameId::entity("http://idp")),
            Status::success(),
        )
        .with_assertion(Assertion::new("ID_a1", NameId::entity("http://idp")))
        .with_encrypted_assertion(Element::new(
            Some("saml"),
            "EncryptedAssertion",
            Some(SAML_NS),
        ))
        .with_assertion(Assertion::new("ID_a2", NameId::entity("http://idp")));

        let doc = write(&SamlMessage::Response(response)).unwrap();
        let names: Vec<_> = doc
            .root
            .child_elements()
            .map(|c| c.name.local.as_str())
            .collect();
        assert_eq!(
            names,
            ["Issuer", "Status", "Assertion", "EncryptedAssertion", "Assertion"]
        );
    }
}
