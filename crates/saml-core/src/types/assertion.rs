//! Assertion and statement types.

use serde::{Deserialize, Serialize};

use super::{NameId, Subject};
use crate::time::Instant;
use crate::xml::Element;

/// SAML `Assertion`.
///
/// Mutable until signed; once an enveloped signature has been produced
/// over the serialized form, any further mutation invalidates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion identifier.
    pub id: String,

    /// Time of issue.
    pub issue_instant: Instant,

    /// Asserting party.
    pub issuer: NameId,

    /// Enveloped signature, kept as an opaque fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Element>,

    /// The subject the statements apply to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Validity conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Statements in document order.
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl Assertion {
    /// Creates an assertion with the current issue instant.
    #[must_use]
    pub fn new(id: impl Into<String>, issuer: NameId) -> Self {
        Self {
            id: id.into(),
            issue_instant: crate::time::now(),
            issuer,
            signature: None,
            subject: None,
            conditions: None,
            statements: Vec::new(),
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Appends a statement.
    #[must_use]
    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Checks the issue instant against a clock, allowing the configured
    /// skew. An assertion issued in the future beyond the skew is suspect.
    #[must_use]
    pub fn issued_plausibly_at(&self, now: Instant) -> bool {
        self.issue_instant <= now + crate::config::clock_skew()
    }

    /// Checks the conditions window at the given instant, allowing the
    /// configured skew. `NotOnOrAfter` is exclusive.
    #[must_use]
    pub fn valid_at(&self, now: Instant) -> bool {
        let skew = crate::config::clock_skew();
        match &self.conditions {
            None => true,
            Some(conditions) => {
                let after_start = conditions
                    .not_before
                    .map_or(true, |not_before| not_before <= now + skew);
                let before_end = conditions
                    .not_on_or_after
                    .map_or(true, |limit| now - skew < limit);
                after_start && before_end
            }
        }
    }
}

/// SAML `Conditions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    /// Earliest valid instant, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<Instant>,

    /// Expiry instant, exclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<Instant>,

    /// Audience restrictions; each restriction lists acceptable audiences.
    #[serde(default)]
    pub audience_restrictions: Vec<AudienceRestriction>,
}

/// A set of acceptable audience URIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudienceRestriction {
    /// Audience URIs.
    pub audiences: Vec<String>,
}

/// An assertion statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// An authentication statement.
    Authn(AuthnStatement),
    /// An attribute statement.
    Attribute(AttributeStatement),
    /// An authorization decision statement.
    AuthzDecision(AuthzDecisionStatement),
}

/// SAML `AuthnStatement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// When authentication took place.
    pub authn_instant: Instant,

    /// Session index at the IdP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Session expiry, exclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_not_on_or_after: Option<Instant>,

    /// Authentication context class reference URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_class_ref: Option<String>,

    /// Authentication context declaration reference URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_decl_ref: Option<String>,
}

impl AuthnStatement {
    /// Creates a statement authenticated now with a context class.
    #[must_use]
    pub fn new(context_class_ref: impl Into<String>) -> Self {
        Self {
            authn_instant: crate::time::now(),
            session_index: None,
            session_not_on_or_after: None,
            context_class_ref: Some(context_class_ref.into()),
            context_decl_ref: None,
        }
    }

    /// Sets the session index.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_index = Some(index.into());
        self
    }
}

/// SAML `AttributeStatement`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// Attributes in document order.
    pub attributes: Vec<SamlAttribute>,
}

/// SAML `Attribute` with its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamlAttribute {
    /// Attribute name.
    pub name: String,

    /// Name format URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    /// Friendly name for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// Attribute values as text.
    #[serde(default)]
    pub values: Vec<String>,
}

impl SamlAttribute {
    /// Creates an attribute with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values: vec![value.into()],
        }
    }
}

/// SAML `AuthzDecisionStatement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthzDecisionStatement {
    /// Resource the decision applies to.
    pub resource: String,

    /// Decision: `Permit`, `Deny` or `Indeterminate`.
    pub decision: String,

    /// Actions the decision covers.
    #[serde(default)]
    pub actions: Vec<String>,
}
