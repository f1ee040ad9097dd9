//! Enveloped signature validation.
//!
//! Every `Signature` element in the document must validate for the
//! document to be accepted. Cryptographic mismatches (digest or signature
//! value) yield `Ok(false)`; structural problems, ambiguous or missing
//! references, and unsupported algorithms are errors.

use base64::{engine::general_purpose, Engine as _};
use saml_crypto::PublicKey;
use tracing::debug;

use super::{check_transform, require_exclusive_c14n, SignatureMethod};
use crate::error::{SamlResult, SignatureError};
use crate::types::constants::{dsig, XMLDSIG_NS};
use crate::xml::{canonicalize, Document, Element};

/// Validates every signature in the document with the supplied public key.
///
/// Returns `Ok(false)` on any digest or signature-value mismatch. Fails
/// if the document contains no signature at all.
pub fn validate(doc: &Document, key: &PublicKey) -> SamlResult<bool> {
    let signatures = find_signatures(doc);
    if signatures.is_empty() {
        return Err(SignatureError::MissingReference("no Signature element".to_string()).into());
    }
    for signature in signatures {
        if !validate_one(doc, signature, key)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Validates every signature using the X.509 certificate embedded in its
/// own `KeyInfo`.
///
/// The caller is responsible for deciding whether those certificates are
/// trusted; this only proves internal consistency.
pub fn validate_with_certificate(doc: &Document) -> SamlResult<bool> {
    let signatures = find_signatures(doc);
    if signatures.is_empty() {
        return Err(SignatureError::MissingReference("no Signature element".to_string()).into());
    }
    for signature in signatures {
        let der = embedded_certificate(signature)?;
        let key = PublicKey::from_certificate_der(&der)
            .map_err(|e| SignatureError::KeyNotSupported(e.to_string()))?;
        if !validate_one(doc, signature, &key)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn find_signatures(doc: &Document) -> Vec<&Element> {
    doc.find_all(|el| {
        el.name.local == "Signature" && el.namespace.as_deref() == Some(XMLDSIG_NS)
    })
}

fn validate_one(doc: &Document, signature: &Element, key: &PublicKey) -> SamlResult<bool> {
    let signed_info = signature
        .find_child("SignedInfo", XMLDSIG_NS)
        .ok_or_else(|| SignatureError::MissingReference("SignedInfo".to_string()))?;

    let c14n_method = signed_info
        .find_child("CanonicalizationMethod", XMLDSIG_NS)
        .and_then(|el| el.attribute("Algorithm"))
        .ok_or_else(|| SignatureError::MissingReference("CanonicalizationMethod".to_string()))?;
    require_exclusive_c14n(c14n_method)?;

    let method_uri = signed_info
        .find_child("SignatureMethod", XMLDSIG_NS)
        .and_then(|el| el.attribute("Algorithm"))
        .ok_or_else(|| SignatureError::MissingReference("SignatureMethod".to_string()))?;
    let method = SignatureMethod::from_uri(method_uri)
        .ok_or_else(|| SignatureError::KeyNotSupported(method_uri.to_string()))?;

    let references: Vec<&Element> = signed_info
        .child_elements()
        .filter(|el| el.name.local == "Reference" && el.namespace.as_deref() == Some(XMLDSIG_NS))
        .collect();
    if references.is_empty() {
        return Err(SignatureError::MissingReference("Reference".to_string()).into());
    }

    for reference in references {
        if !check_reference(doc, signature, reference)? {
            return Ok(false);
        }
    }

    let canonical = canonicalize(doc, signed_info, None)?;
    let signature_value = signature
        .find_child("SignatureValue", XMLDSIG_NS)
        .ok_or_else(|| SignatureError::MissingReference("SignatureValue".to_string()))?;
    let raw = decode_b64(&signature_value.text())?;

    let verified =
        saml_crypto::verify_bytes(key, &canonical, &raw, method.signing_algorithm())?;
    if !verified {
        debug!("signature value did not verify");
    }
    Ok(verified)
}

/// Dereferences one `Reference`, applies its transforms and compares the
/// digest. Returns `Ok(false)` on digest mismatch.
fn check_reference(doc: &Document, signature: &Element, reference: &Element) -> SamlResult<bool> {
    let uri = reference
        .attribute("URI")
        .ok_or_else(|| SignatureError::MissingReference("Reference URI".to_string()))?;
    let id = uri
        .strip_prefix('#')
        .ok_or_else(|| SignatureError::KeyNotSupported(format!("reference URI {uri}")))?;

    let target = doc.resolve_id(id)?;
    check_not_wrapped(doc, signature, target)?;

    let mut enveloped = false;
    if let Some(transforms) = reference.find_child("Transforms", XMLDSIG_NS) {
        for transform in transforms.child_elements() {
            let algorithm = transform.attribute("Algorithm").ok_or_else(|| {
                SignatureError::MissingReference("Transform Algorithm".to_string())
            })?;
            check_transform(algorithm)?;
            if algorithm == dsig::ENVELOPED_SIGNATURE {
                enveloped = true;
            }
        }
    }

    let digest_uri = reference
        .find_child("DigestMethod", XMLDSIG_NS)
        .and_then(|el| el.attribute("Algorithm"))
        .ok_or_else(|| SignatureError::MissingReference("DigestMethod".to_string()))?;
    let digest_alg = super::DigestAlgorithm::from_uri(digest_uri)
        .ok_or_else(|| SignatureError::KeyNotSupported(digest_uri.to_string()))?;

    let stored = reference
        .find_child("DigestValue", XMLDSIG_NS)
        .ok_or_else(|| SignatureError::MissingReference("DigestValue".to_string()))?;
    let stored = decode_b64(&stored.text())?;

    let exclude = enveloped.then_some(signature);
    let canonical = canonicalize(doc, target, exclude)?;
    let computed = digest_alg.digest(&canonical);

    if computed != stored {
        debug!(reference = %id, "reference digest mismatch");
        return Ok(false);
    }
    Ok(true)
}

/// Signature-wrapping defense: the resolved target must live inside the
/// subtree rooted at the signature's parent.
fn check_not_wrapped(doc: &Document, signature: &Element, target: &Element) -> SamlResult<()> {
    fn contains(subtree: &Element, needle: &Element) -> bool {
        std::ptr::eq(subtree, needle) || subtree.child_elements().any(|c| contains(c, needle))
    }

    let path = doc
        .path_to(signature)
        .ok_or_else(|| SignatureError::MissingReference("Signature detached".to_string()))?;
    let parent = if path.len() >= 2 {
        path[path.len() - 2]
    } else {
        // a Signature document element envelops nothing
        return Err(SignatureError::MissingReference(
            "Signature has no parent element".to_string(),
        )
        .into());
    };

    if contains(parent, target) {
        Ok(())
    } else {
        Err(SignatureError::MissingReference(format!(
            "reference {} is outside the signed subtree",
            target.id().unwrap_or("?")
        ))
        .into())
    }
}

fn embedded_certificate(signature: &Element) -> SamlResult<Vec<u8>> {
    let cert = signature
        .find_child("KeyInfo", XMLDSIG_NS)
        .and_then(|ki| ki.find_child("X509Data", XMLDSIG_NS))
        .and_then(|data| data.find_child("X509Certificate", XMLDSIG_NS))
        .ok_or_else(|| SignatureError::MissingReference("X509Certificate".to_string()))?;
    decode_b64(&cert.text())
}

/// Decodes base64 tolerating the whitespace line wrapping XML producers use.
fn decode_b64(text: &str) -> SamlResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(general_purpose::STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamlError;
    use crate::signature::{SignatureConfig, SignatureMethod, XmlSigner};
    use saml_crypto::KeyPair;

    fn signed_doc(key: &KeyPair) -> Document {
        let mut doc = Document::from_bytes(
            br#"<m:Msg xmlns:m="urn:m" ID="ID_v"><m:Issuer>http://sp</m:Issuer><m:Body>payload</m:Body></m:Msg>"#,
        )
        .unwrap();
        XmlSigner::new(key).sign(&mut doc).unwrap();
        doc
    }

    #[test]
    fn valid_signature_verifies() {
        let key = KeyPair::generate_p256();
        let doc = signed_doc(&key);
        assert!(validate(&doc, &key.public_key()).unwrap());
    }

    #[test]
    fn round_trip_through_bytes_still_verifies() {
        let key = KeyPair::generate_p256();
        let doc = signed_doc(&key);
        let reparsed = Document::from_bytes(&doc.to_bytes()).unwrap();
        assert!(validate(&reparsed, &key.public_key()).unwrap());
    }

    #[test]
    fn tampered_content_fails() {
        let key = KeyPair::generate_p256();
        let mut doc = signed_doc(&key);
        // flip a character inside the signed element
        let body = doc
            .root
            .children
            .iter_mut()
            .find_map(|node| match node {
                crate::xml::Node::Element(el) if el.name.local == "Body" => Some(el),
                _ => None,
            })
            .unwrap();
        body.children.clear();
        body.add_text("Payload");
        assert!(!validate(&doc, &key.public_key()).unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let key = KeyPair::generate_p256();
        let other = KeyPair::generate_p256();
        let doc = signed_doc(&key);
        assert!(!validate(&doc, &other.public_key()).unwrap());
    }

    #[test]
    fn unsigned_document_is_an_error() {
        let key = KeyPair::generate_p256();
        let doc = Document::from_bytes(br#"<m ID="x">plain</m>"#).unwrap();
        assert!(matches!(
            validate(&doc, &key.public_key()),
            Err(SamlError::Signature(SignatureError::MissingReference(_)))
        ));
    }

    #[test]
    fn duplicate_reference_ids_are_ambiguous() {
        let key = KeyPair::generate_p256();
        let doc = signed_doc(&key);
        // clone the signed element next to itself inside a wrapper
        let text = String::from_utf8(doc.to_bytes()).unwrap();
        let body = text.split_once("?>").unwrap().1.to_string();
        let wrapped = format!("<wrap>{body}{body}</wrap>");
        let doc = Document::from_bytes(wrapped.as_bytes()).unwrap();
        assert!(matches!(
            validate(&doc, &key.public_key()),
            Err(SamlError::Signature(SignatureError::AmbiguousReference(_)))
        ));
    }

    #[test]
    fn cross_algorithm_key_mismatch_is_false() {
        let dsa = KeyPair::generate_dsa();
        let mut doc = Document::from_bytes(
            br#"<m:Msg xmlns:m="urn:m" ID="ID_x"><m:Body>payload</m:Body></m:Msg>"#,
        )
        .unwrap();
        XmlSigner::new(&dsa)
            .with_config(SignatureConfig::for_method(SignatureMethod::DsaSha1))
            .sign(&mut doc)
            .unwrap();

        let rsa_key = KeyPair::generate_p256().public_key();
        assert!(!validate(&doc, &rsa_key).unwrap());
    }
}
