//! Time handling for SAML instants.
//!
//! All SAML timestamps are UTC with millisecond precision, serialized as
//! ISO-8601 `xsd:dateTime`. The formatter and parser here are the single
//! source of truth so instants round-trip exactly across write and parse.

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::{SamlError, SamlResult};

/// A SAML timestamp: UTC with millisecond precision.
pub type Instant = DateTime<Utc>;

/// Returns the current instant, truncated to millisecond precision.
#[must_use]
pub fn now() -> Instant {
    Utc::now().trunc_subsecs(3)
}

/// Formats an instant as `YYYY-MM-DDThh:mm:ss.sssZ`.
#[must_use]
pub fn format_instant(instant: Instant) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses an `xsd:dateTime` value into a UTC instant.
///
/// Accepts any RFC 3339 offset and normalizes to UTC; sub-millisecond
/// digits are truncated.
pub fn parse_instant(value: &str) -> SamlResult<Instant> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc).trunc_subsecs(3))
        .map_err(|e| SamlError::SchemaViolation(format!("bad dateTime {value:?}: {e}")))
}
