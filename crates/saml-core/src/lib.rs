//! # saml-core
//!
//! SAML 2.0 protocol core: typed message model, streaming parsers,
//! writers, message factories and enveloped XML signatures.
//!
//! The crate turns protocol XML into the typed [`types::SamlMessage`]
//! model and back:
//!
//! - [`parse`] / [`parse_bytes`] read a message from the wire
//! - [`write`] serializes a message into an XML [`xml::Document`]
//! - [`factory`] builds the common request and response shapes
//! - [`XmlSigner`] and [`validate`] produce and check enveloped
//!   XML-DSig signatures over Exclusive C14N
//!
//! Signing operates on serialized documents, not the typed model, so the
//! canonical byte form a signature covers is exactly what goes on the
//! wire:
//!
//! ```
//! use saml_core::{factory, writers, SamlMessage, XmlSigner};
//! use saml_crypto::KeyPair;
//!
//! # fn main() -> Result<(), saml_core::SamlError> {
//! let request = factory::create_authn_request("http://sp", "http://sp/acs", "http://idp/sso");
//! let mut doc = writers::write(&SamlMessage::AuthnRequest(request))?;
//!
//! let key = KeyPair::generate_p256();
//! XmlSigner::new(&key).sign(&mut doc)?;
//!
//! let verified = saml_core::validate(&doc, &key.public_key())?;
//! assert!(verified);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod factory;
pub mod parsers;
pub mod signature;
pub mod time;
pub mod types;
pub mod writers;
pub mod xml;

pub use error::{SamlError, SamlResult, SignatureError};
pub use parsers::{parse, parse_bytes};
pub use signature::{validate, validate_with_certificate, XmlSigner};
pub use types::SamlMessage;
pub use writers::write;
