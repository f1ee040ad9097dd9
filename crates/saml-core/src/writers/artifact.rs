//! `ArtifactResolve` and `ArtifactResponse` writers.

use super::{message_element, protocol_root, samlp_element, status_element};
use crate::error::{SamlError, SamlResult};
use crate::types::{ArtifactResolve, ArtifactResponse};
use crate::xml::Element;

pub(crate) fn write_resolve(resolve: &ArtifactResolve) -> SamlResult<Element> {
    if resolve.artifact.is_empty() {
        return Err(SamlError::IncompleteMessage(
            "ArtifactResolve without an artifact".to_string(),
        ));
    }
    let mut root = protocol_root("ArtifactResolve", &resolve.header)?;
    let mut artifact = samlp_element("Artifact");
    artifact.add_text(&resolve.artifact);
    root.add_child(artifact);
    Ok(root)
}

pub(crate) fn write_response(response: &ArtifactResponse) -> SamlResult<Element> {
    let mut root = protocol_root("ArtifactResponse", &response.header)?;
    root.add_child(status_element(&response.status));
    if let Some(message) = &response.message {
        root.add_child(message_element(message)?);
    }
    Ok(root)
}
