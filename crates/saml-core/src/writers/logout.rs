//! `LogoutRequest` and `LogoutResponse` writers.

use super::{
    name_id_element, protocol_root, samlp_element, set_attr, set_instant_attr, status_element,
};
use crate::error::{SamlError, SamlResult};
use crate::types::{LogoutRequest, LogoutResponse};
use crate::xml::Element;

pub(crate) fn write_request(request: &LogoutRequest) -> SamlResult<Element> {
    if request.name_id.is_none() && request.encrypted_id.is_none() {
        return Err(SamlError::IncompleteMessage(
            "LogoutRequest without NameID or EncryptedID".to_string(),
        ));
    }
    let mut root = protocol_root("LogoutRequest", &request.header)?;
    set_attr(&mut root, "Reason", request.reason.as_deref());
    set_instant_attr(&mut root, "NotOnOrAfter", request.not_on_or_after);

    if let Some(name_id) = &request.name_id {
        root.add_child(name_id_element("NameID", name_id));
    }
    if let Some(encrypted) = &request.encrypted_id {
        root.add_child(encrypted.clone());
    }
    for index in &request.session_indexes {
        let mut el = samlp_element("SessionIndex");
        el.add_text(index);
        root.add_child(el);
    }
    Ok(root)
}

pub(crate) fn write_response(response: &LogoutResponse) -> SamlResult<Element> {
    let mut root = protocol_root("LogoutResponse", &response.header)?;
    root.add_child(status_element(&response.status));
    Ok(root)
}

#[cfg(test)]
mod tests {
    use crate::error::SamlError;
    use crate::types::{LogoutRequest, MessageHeader, NameId, SamlMessage};
    use crate::writers::write;

    #[test]
    fn session_indexes_are_written() {
        let request = LogoutRequest::new(
            MessageHeader::new("ID_lo").with_issuer(NameId::entity("http://sp")),
            NameId::persistent("user-1"),
        )
        .with_session_index("s1")
        .with_session_index("s2");

        let doc = write(&SamlMessage::LogoutRequest(request)).unwrap();
        let text = String::from_utf8(doc.to_bytes()).unwrap();
        assert!(text.contains("<samlp:SessionIndex>s1</samlp:SessionIndex>"));
        assert!(text.contains("<samlp:SessionIndex>s2</samlp:SessionIndex>"));
    }

    #[test]
    fn principal_is_required() {
        let mut request =
            LogoutRequest::new(MessageHeader::new("ID_lo"), NameId::persistent("u1"));
        request.name_id = None;
        assert!(matches!(
            write(&SamlMessage::LogoutRequest(request)),
            Err(SamlError::IncompleteMessage(_))
        ));
    }
}
