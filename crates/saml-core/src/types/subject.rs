//! Subject and subject confirmation types.

use serde::{Deserialize, Serialize};

use super::constants::confirmation_methods;
use super::NameId;
use crate::time::Instant;
use crate::xml::Element;

/// SAML `Subject`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Encrypted identifier, kept opaque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_id: Option<Element>,

    /// Subject confirmations.
    #[serde(default)]
    pub confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Creates a subject identified by a name ID.
    #[must_use]
    pub fn new(name_id: NameId) -> Self {
        Self {
            name_id: Some(name_id),
            encrypted_id: None,
            confirmations: Vec::new(),
        }
    }

    /// Adds a confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.confirmations.push(confirmation);
        self
    }
}

/// SAML `SubjectConfirmation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// Confirmation method URI.
    pub method: String,

    /// Confirming entity identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Confirmation constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer() -> Self {
        Self {
            method: confirmation_methods::BEARER.to_string(),
            name_id: None,
            data: None,
        }
    }

    /// Sets the confirmation data.
    #[must_use]
    pub fn with_data(mut self, data: SubjectConfirmationData) -> Self {
        self.data = Some(data);
        self
    }
}

/// SAML `SubjectConfirmationData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// Endpoint the assertion may be delivered to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// ID of the request the assertion answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Earliest valid instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<Instant>,

    /// Expiry instant, exclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<Instant>,

    /// Network address the subject is expected at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_confirmation() {
        let confirmation = SubjectConfirmation::bearer();
        assert_eq!(confirmation.method, confirmation_methods::BEARER);
        assert!(confirmation.data.is_none());
    }

    #[test]
    fn subject_with_confirmation() {
        let subject = Subject::new(NameId::persistent("u1")).with_confirmation(
            SubjectConfirmation::bearer().with_data(SubjectConfirmationData {
                recipient: Some("http://sp/acs".to_string()),
                in_response_to: Some("ID_req".to_string()),
                ..SubjectConfirmationData::default()
            }),
        );
        assert_eq!(subject.confirmations.len(), 1);
        let data = subject.confirmations[0].data.as_ref().unwrap();
        assert_eq!(data.recipient.as_deref(), Some("http://sp/acs"));
    }
}
