//! Exclusive XML Canonicalization 1.0 (omitting comments).
//!
//! Produces the byte-stable form used as digest and signature input.
//! Only the exclusive variant is implemented; it is the only
//! canonicalization SAML signatures use here. The rules that matter:
//!
//! - namespace declarations are emitted only where visibly utilized and
//!   not already emitted by an output ancestor with the same value
//! - namespace declarations sort before attributes; attributes sort by
//!   (namespace URI, local name), unqualified attributes first
//! - no self-closing tags; text and attribute values use the fixed C14N
//!   escaping rules
//!
//! An element can be excluded together with its subtree, which is how the
//! enveloped-signature transform removes the `Signature` under digest.

use std::collections::BTreeMap;

use crate::error::{SamlError, SamlResult};
use crate::xml::dom::{escape_attribute, escape_text, Document, Element, Node};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Canonicalizes `target` (a descendant-or-self of the document root) into
/// exclusive C14N bytes, optionally excluding one element and its subtree.
pub fn canonicalize(
    doc: &Document,
    target: &Element,
    exclude: Option<&Element>,
) -> SamlResult<Vec<u8>> {
    let path = doc.path_to(target).ok_or_else(|| {
        SamlError::Crypto("canonicalization target is not in the document".to_string())
    })?;

    // namespace bindings in scope at the target's parent, outermost first;
    // render_element applies the target's own declarations itself
    let mut in_scope: BTreeMap<Option<String>, String> = BTreeMap::new();
    for ancestor in &path[..path.len() - 1] {
        apply_declarations(&mut in_scope, ancestor);
    }

    let mut out = Vec::with_capacity(512);
    let rendered = BTreeMap::new();
    render_element(target, &in_scope, &rendered, exclude, &mut out);
    Ok(out)
}

fn apply_declarations(scope: &mut BTreeMap<Option<String>, String>, element: &Element) {
    for (prefix, uri) in &element.ns_decls {
        scope.insert(prefix.clone(), uri.clone());
    }
}

fn render_element(
    element: &Element,
    parent_scope: &BTreeMap<Option<String>, String>,
    parent_rendered: &BTreeMap<Option<String>, String>,
    exclude: Option<&Element>,
    out: &mut Vec<u8>,
) {
    if let Some(excluded) = exclude {
        if std::ptr::eq(element, excluded) {
            return;
        }
    }

    let mut scope = parent_scope.clone();
    apply_declarations(&mut scope, element);

    // visibly utilized prefixes: the element's own, plus every prefixed
    // attribute; unqualified attributes never utilize a namespace
    let mut visible: Vec<Option<&str>> = vec![element.name.prefix.as_deref()];
    for attr in &element.attributes {
        if let Some(prefix) = attr.prefix.as_deref() {
            if prefix != "xml" && !visible.contains(&Some(prefix)) {
                visible.push(Some(prefix));
            }
        }
    }

    let mut rendered = parent_rendered.clone();
    let mut to_render: Vec<(Option<&str>, &str)> = Vec::new();
    for prefix in visible {
        let key = prefix.map(str::to_string);
        let Some(uri) = scope.get(&key) else {
            // unbound default prefix: element in no namespace
            continue;
        };
        // an un-declaration (xmlns="") is only rendered when it overrides
        // an ancestor's rendered default namespace
        if uri.is_empty() && !rendered.contains_key(&None) {
            continue;
        }
        if rendered.get(&key).map(String::as_str) != Some(uri.as_str()) {
            to_render.push((prefix, uri.as_str()));
            rendered.insert(key, uri.clone());
        }
    }
    // default namespace first, then prefixes lexicographically
    to_render.sort_by(|(a, _), (b, _)| a.cmp(b));

    out.push(b'<');
    out.extend_from_slice(element.name.qualified().as_bytes());

    for (prefix, uri) in to_render {
        match prefix {
            Some(prefix) => {
                out.extend_from_slice(b" xmlns:");
                out.extend_from_slice(prefix.as_bytes());
            }
            None => out.extend_from_slice(b" xmlns"),
        }
        out.extend_from_slice(b"=\"");
        escape_attribute(uri, out);
        out.push(b'"');
    }

    // attribute order: (namespace URI, local name), unqualified first
    let mut attrs: Vec<_> = element.attributes.iter().collect();
    attrs.sort_by_key(|attr| {
        let ns = match attr.prefix.as_deref() {
            None => String::new(),
            Some("xml") => XML_NAMESPACE.to_string(),
            Some(prefix) => scope
                .get(&Some(prefix.to_string()))
                .cloned()
                .unwrap_or_default(),
        };
        (ns, attr.local.clone())
    });
    for attr in attrs {
        out.push(b' ');
        if let Some(prefix) = &attr.prefix {
            out.extend_from_slice(prefix.as_bytes());
            out.push(b':');
        }
        out.extend_from_slice(attr.local.as_bytes());
        out.extend_from_slice(b"=\"");
        escape_attribute(&attr.value, out);
        out.push(b'"');
    }
    out.push(b'>');

    for node in &element.children {
        match node {
            Node::Element(child) => render_element(child, &scope, &rendered, exclude, out),
            Node::Text(text) => escape_text(text, out),
        }
    }

    out.extend_from_slice(b"</");
    out.extend_from_slice(element.name.qualified().as_bytes());
    out.push(b'>');
}
