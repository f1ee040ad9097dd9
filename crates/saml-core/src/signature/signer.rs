//! Enveloped signature creation.

use base64::{engine::general_purpose, Engine as _};
use saml_crypto::keys::{KeyFamily, KeyValueComponents};
use saml_crypto::KeyPair;
use tracing::debug;

use super::{SignatureConfig, SignatureMethod};
use crate::error::{SamlError, SamlResult};
use crate::types::constants::{dsig, XMLDSIG_NS};
use crate::xml::{canonicalize, Document, Element, Node};

/// Signs documents with enveloped XML signatures.
pub struct XmlSigner<'a> {
    key_pair: &'a KeyPair,
    certificate_der: Option<Vec<u8>>,
    config: SignatureConfig,
}

impl<'a> XmlSigner<'a> {
    /// Creates a signer for a key pair, picking the signature method that
    /// matches the key family (the configured default for RSA keys).
    #[must_use]
    pub fn new(key_pair: &'a KeyPair) -> Self {
        let method = match key_pair.family() {
            KeyFamily::Dsa => SignatureMethod::DsaSha1,
            KeyFamily::EcdsaP256 => SignatureMethod::EcdsaSha256,
            KeyFamily::Rsa => {
                let configured = crate::config::default_signature_method();
                if configured.signing_algorithm().key_family() == KeyFamily::Rsa {
                    configured
                } else {
                    SignatureMethod::RsaSha256
                }
            }
        };
        Self {
            key_pair,
            certificate_der: None,
            config: SignatureConfig::for_method(method),
        }
    }

    /// Replaces the signing configuration.
    #[must_use]
    pub fn with_config(mut self, config: SignatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a DER certificate to embed in `KeyInfo`.
    #[must_use]
    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.certificate_der = Some(der);
        self
    }

    /// Signs the document in place.
    ///
    /// The reference target is the element named by the configured
    /// reference URI, or the document element. The produced `Signature`
    /// is inserted as the first child for assertions and after `Issuer`
    /// for protocol messages.
    pub fn sign(&self, doc: &mut Document) -> SamlResult<()> {
        let id = match &self.config.reference_uri {
            Some(uri) => uri
                .strip_prefix('#')
                .ok_or_else(|| {
                    SamlError::SchemaViolation(format!(
                        "reference URI {uri:?} is not a same-document reference"
                    ))
                })?
                .to_string(),
            None => doc
                .root
                .id()
                .ok_or_else(|| SamlError::IncompleteMessage("ID on document element".to_string()))?
                .to_string(),
        };

        // digest over the canonicalized target; the signature element does
        // not exist yet, which matches the enveloped transform on validation
        let digest_value = {
            let target = doc.resolve_id(&id)?;
            let canonical = canonicalize(doc, target, None)?;
            general_purpose::STANDARD.encode(self.config.digest.digest(&canonical))
        };

        let mut signature = self.build_signature(&id, &digest_value)?;
        self.append_signature_value(&mut signature)?;
        if self.config.include_key_info {
            if let Some(key_info) = self.build_key_info() {
                signature.add_child(key_info);
            }
        }

        debug!(reference = %id, method = ?self.config.method, "signing document");
        let target = doc.resolve_id_mut(&id)?;
        insert_signature(target, signature);
        Ok(())
    }

    fn build_signature(&self, id: &str, digest_value: &str) -> SamlResult<Element> {
        let mut signature = ds_element("Signature");
        signature.declare_namespace(Some("ds"), XMLDSIG_NS);

        let mut signed_info = ds_element("SignedInfo");

        let mut c14n_method = ds_element("CanonicalizationMethod");
        c14n_method.set_attribute("Algorithm", dsig::EXCLUSIVE_C14N);
        signed_info.add_child(c14n_method);

        let mut sig_method = ds_element("SignatureMethod");
        sig_method.set_attribute("Algorithm", self.config.method.uri());
        signed_info.add_child(sig_method);

        let mut reference = ds_element("Reference");
        reference.set_attribute("URI", &format!("#{id}"));

        let mut transforms = ds_element("Transforms");
        for algorithm in [dsig::ENVELOPED_SIGNATURE, dsig::EXCLUSIVE_C14N] {
            let mut transform = ds_element("Transform");
            transform.set_attribute("Algorithm", algorithm);
            transforms.add_child(transform);
        }
        reference.add_child(transforms);

        let mut digest_method = ds_element("DigestMethod");
        digest_method.set_attribute("Algorithm", self.config.digest.uri());
        reference.add_child(digest_method);

        let mut digest = ds_element("DigestValue");
        digest.add_text(digest_value);
        reference.add_child(digest);

        signed_info.add_child(reference);
        signature.add_child(signed_info);
        Ok(signature)
    }

    /// Canonicalizes `SignedInfo` in its signature context, signs it and
    /// appends the `SignatureValue`.
    fn append_signature_value(&self, signature: &mut Element) -> SamlResult<()> {
        let canonical = {
            let context = Document::new(signature.clone());
            let signed_info = context
                .root
                .find_child("SignedInfo", XMLDSIG_NS)
                .ok_or_else(|| SamlError::Crypto("SignedInfo not built".to_string()))?;
            canonicalize(&context, signed_info, None)?
        };

        let raw = saml_crypto::sign_bytes(
            self.key_pair,
            &canonical,
            self.config.method.signing_algorithm(),
        )?;

        let mut value = ds_element("SignatureValue");
        value.add_text(&general_purpose::STANDARD.encode(raw));
        signature.add_child(value);
        Ok(())
    }

    fn build_key_info(&self) -> Option<Element> {
        let mut key_info = ds_element("KeyInfo");

        if let Some(der) = &self.certificate_der {
            let mut data = ds_element("X509Data");
            let mut cert = ds_element("X509Certificate");
            cert.add_text(&general_purpose::STANDARD.encode(der));
            data.add_child(cert);
            key_info.add_child(data);
            return Some(key_info);
        }

        let components = self.key_pair.public_key().key_value_components();
        let mut key_value = ds_element("KeyValue");
        match components {
            KeyValueComponents::Rsa { modulus, exponent } => {
                let mut rsa = ds_element("RSAKeyValue");
                rsa.add_child(b64_element("Modulus", &modulus));
                rsa.add_child(b64_element("Exponent", &exponent));
                key_value.add_child(rsa);
            }
            KeyValueComponents::Dsa { p, q, g, y } => {
                let mut dsa = ds_element("DSAKeyValue");
                dsa.add_child(b64_element("P", &p));
                dsa.add_child(b64_element("Q", &q));
                dsa.add_child(b64_element("G", &g));
                dsa.add_child(b64_element("Y", &y));
                key_value.add_child(dsa);
            }
            // bare EC keys have no classic KeyValue form; certificates
            // are the supported carrier
            KeyValueComponents::Ec { .. } => return None,
        }
        key_info.add_child(key_value);
        Some(key_info)
    }
}

fn ds_element(local: &str) -> Element {
    Element::new(Some("ds"), local, Some(XMLDSIG_NS))
}

fn b64_element(local: &str, bytes: &[u8]) -> Element {
    let mut el = ds_element(local);
    el.add_text(&general_purpose::STANDARD.encode(bytes));
    el
}

/// Splices the signature into the schema-mandated position: first child
/// for assertions, directly after `Issuer` for protocol messages.
fn insert_signature(target: &mut Element, signature: Element) {
    let index = if target.name.local == "Assertion" {
        0
    } else {
        target
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if el.name.local == "Issuer"))
            .map_or(0, |issuer| issuer + 1)
    };
    target.children.insert(index, Node::Element(signature));
}
