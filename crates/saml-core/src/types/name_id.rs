//! SAML name identifier types.

use serde::{Deserialize, Serialize};

use super::NameIdFormat;

/// SAML `NameID`, used both for issuers and for subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The identifier value.
    pub value: String,

    /// Format URI of the identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The security or administrative domain that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// The service provider's entity ID that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a name ID with no format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Creates an entity-format name ID, the conventional issuer form.
    #[must_use]
    pub fn entity(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Entity)
    }

    /// Creates a persistent name ID.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Persistent)
    }

    /// Creates a transient name ID.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Transient)
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: NameIdFormat) -> Self {
        self.format = Some(format.uri().to_string());
        self
    }

    /// Sets the name qualifier.
    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    /// Sets the SP name qualifier.
    #[must_use]
    pub fn with_sp_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(qualifier.into());
        self
    }

    /// Returns the parsed format, defaulting to unspecified.
    #[must_use]
    pub fn parsed_format(&self) -> NameIdFormat {
        self.format
            .as_deref()
            .and_then(NameIdFormat::from_uri)
            .unwrap_or_default()
    }
}

/// `NameIDPolicy` constraints carried by an authentication request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameIdPolicy {
    /// Requested name ID format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// SP name qualifier for the returned identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,

    /// Whether the IdP may create a new identifier.
    #[serde(default)]
    pub allow_create: Option<bool>,
}

impl NameIdPolicy {
    /// Creates a policy requesting a specific format.
    #[must_use]
    pub fn with_format(format: NameIdFormat) -> Self {
        Self {
            format: Some(format.uri().to_string()),
            sp_name_qualifier: None,
            allow_create: None,
        }
    }

    /// Sets whether new identifiers can be created.
    #[must_use]
    pub const fn allow_create(mut self, allow: bool) -> Self {
        self.allow_create = Some(allow);
        self
    }
}
