//! Process-wide configuration.
//!
//! These flags are intended to be set once at startup and read during
//! message processing. Every setter returns the previous value so tests
//! that toggle a flag can restore it on exit.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};

use chrono::Duration;

use crate::signature::SignatureMethod;

static INCLUDE_KEY_INFO: AtomicBool = AtomicBool::new(true);
static DEFAULT_SIGNATURE_METHOD: AtomicU8 = AtomicU8::new(SignatureMethod::RsaSha256 as u8);
static ASSERTION_VALIDITY_SECS: AtomicI64 = AtomicI64::new(300);
static CLOCK_SKEW_SECS: AtomicI64 = AtomicI64::new(60);

/// Whether signatures carry a `KeyInfo` element by default.
#[must_use]
pub fn include_key_info() -> bool {
    INCLUDE_KEY_INFO.load(Ordering::Relaxed)
}

/// Sets the `KeyInfo` default; returns the previous value.
pub fn set_include_key_info(value: bool) -> bool {
    INCLUDE_KEY_INFO.swap(value, Ordering::Relaxed)
}

/// The signature method used when none is requested explicitly.
#[must_use]
pub fn default_signature_method() -> SignatureMethod {
    SignatureMethod::from_discriminant(DEFAULT_SIGNATURE_METHOD.load(Ordering::Relaxed))
}

/// Sets the default signature method; returns the previous value.
pub fn set_default_signature_method(method: SignatureMethod) -> SignatureMethod {
    SignatureMethod::from_discriminant(
        DEFAULT_SIGNATURE_METHOD.swap(method as u8, Ordering::Relaxed),
    )
}

/// Validity window applied to factory-issued assertions.
#[must_use]
pub fn assertion_validity() -> Duration {
    Duration::seconds(ASSERTION_VALIDITY_SECS.load(Ordering::Relaxed))
}

/// Sets the assertion validity window; returns the previous value.
pub fn set_assertion_validity(validity: Duration) -> Duration {
    Duration::seconds(ASSERTION_VALIDITY_SECS.swap(validity.num_seconds(), Ordering::Relaxed))
}

/// Permitted clock skew when comparing instants.
#[must_use]
pub fn clock_skew() -> Duration {
    Duration::seconds(CLOCK_SKEW_SECS.load(Ordering::Relaxed))
}

/// Sets the permitted clock skew; returns the previous value.
pub fn set_clock_skew(skew: Duration) -> Duration {
    Duration::seconds(CLOCK_SKEW_SECS.swap(skew.num_seconds(), Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_return_previous_value() {
        let previous = set_include_key_info(false);
        assert!(!include_key_info());
        set_include_key_info(previous);
        assert!(include_key_info());
    }

    #[test]
    fn validity_window_round_trips() {
        let previous = set_assertion_validity(Duration::seconds(120));
        assert_eq!(assertion_validity(), Duration::seconds(120));
        set_assertion_validity(previous);
        assert_eq!(assertion_validity(), previous);
    }

    #[test]
    fn signature_method_default_round_trips() {
        let previous = set_default_signature_method(SignatureMethod::DsaSha1);
        assert_eq!(default_signature_method(), SignatureMethod::DsaSha1);
        set_default_signature_method(previous);
    }
}
