//! Owned, namespace-aware XML document model.
//!
//! The signature subsystem operates on whole documents: it must locate
//! elements by ID attribute, canonicalize subtrees and splice `Signature`
//! elements into position. This module provides the small owned tree those
//! operations need. Parsed text content is stored unescaped; serialization
//! re-escapes using the same rules as Exclusive C14N so that a document
//! written and re-read canonicalizes to identical bytes.

use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult, SignatureError};

/// A qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QName {
    /// Namespace prefix, if any.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Renders the name as it appears in a tag.
    #[must_use]
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute with an optional prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Namespace prefix, if any.
    pub prefix: Option<String>,
    /// Local attribute name.
    pub local: String,
    /// Unescaped attribute value.
    pub value: String,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Unescaped character data.
    Text(String),
}

/// An XML element with resolved namespace information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Qualified name.
    pub name: QName,
    /// Resolved namespace URI of the element name.
    pub namespace: Option<String>,
    /// Attributes in document order, excluding namespace declarations.
    pub attributes: Vec<Attribute>,
    /// Namespace declarations on this element: `(prefix, uri)`,
    /// `None` prefix for the default namespace.
    pub ns_decls: Vec<(Option<String>, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

/// Attribute names treated as element identifiers for `#id` references.
const ID_ATTRIBUTES: [(Option<&str>, &str); 3] = [(None, "ID"), (None, "Id"), (Some("xml"), "id")];

impl Element {
    /// Creates an element with no attributes or children.
    #[must_use]
    pub fn new(prefix: Option<&str>, local: &str, namespace: Option<&str>) -> Self {
        Self {
            name: QName::new(prefix, local),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            ns_decls: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the value of an unprefixed attribute.
    #[must_use]
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.local == local)
            .map(|a| a.value.as_str())
    }

    /// Sets an unprefixed attribute, replacing any existing value.
    pub fn set_attribute(&mut self, local: &str, value: &str) {
        if let Some(attr) = self
            .attributes
            .iter_mut()
            .find(|a| a.prefix.is_none() && a.local == local)
        {
            attr.value = value.to_string();
        } else {
            self.attributes.push(Attribute {
                prefix: None,
                local: local.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Declares a namespace on this element.
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        let prefix = prefix.map(str::to_string);
        if !self.ns_decls.iter().any(|(p, _)| *p == prefix) {
            self.ns_decls.push((prefix, uri.to_string()));
        }
    }

    /// Appends a child element.
    pub fn add_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Appends a text node.
    pub fn add_text(&mut self, text: &str) {
        self.children.push(Node::Text(text.to_string()));
    }

    /// Iterates over child elements only.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Finds the first child element with the given local name and namespace.
    #[must_use]
    pub fn find_child(&self, local: &str, namespace: &str) -> Option<&Element> {
        self.child_elements()
            .find(|el| el.name.local == local && el.namespace.as_deref() == Some(namespace))
    }

    /// Returns the concatenated text content of direct child text nodes.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }

    /// Returns the ID value of this element, if one of the recognized
    /// ID-typed attributes is present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        for (prefix, local) in ID_ATTRIBUTES {
            if let Some(attr) = self
                .attributes
                .iter()
                .find(|a| a.prefix.as_deref() == prefix && a.local == local)
            {
                return Some(&attr.value);
            }
        }
        None
    }

    fn collect_by_id<'a>(&'a self, id: &str, out: &mut Vec<&'a Element>) {
        if self.id() == Some(id) {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_by_id(id, out);
        }
    }

    fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        for node in &mut self.children {
            if let Node::Element(el) = node {
                if let Some(found) = el.find_by_id_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn collect_matching<'a>(
        &'a self,
        pred: &impl Fn(&Element) -> bool,
        out: &mut Vec<&'a Element>,
    ) {
        if pred(self) {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_matching(pred, out);
        }
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(b'<');
        out.extend_from_slice(self.name.qualified().as_bytes());
        for (prefix, uri) in &self.ns_decls {
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
        for attr in &self.attributes {
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
        for node in &self.children {
            match node {
                Node::Element(el) => el.serialize_into(out),
                Node::Text(text) => escape_text(text, out),
            }
        }
        out.extend_from_slice(b"</");
        out.extend_from_slice(self.name.qualified().as_bytes());
        out.push(b'>');
    }
}

/// A complete XML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document element.
    pub root: Element,
}

impl Document {
    /// Wraps an element as a document root.
    #[must_use]
    pub const fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parses a document from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> SamlResult<Self> {
        let mut reader = crate::xml::reader::XmlReader::new(bytes);
        let start = reader.next_start()?;
        let root = reader.capture_subtree(start)?;
        Ok(Self { root })
    }

    /// Serializes the document with an XML declaration.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(512);
        out.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        self.root.serialize_into(&mut out);
        out
    }

    /// Finds every element whose ID attribute equals `id`.
    #[must_use]
    pub fn find_all_by_id(&self, id: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.root.collect_by_id(id, &mut out);
        out
    }

    /// Resolves a same-document `#id` reference to a unique element.
    ///
    /// Duplicate IDs are a signature-wrapping vector and are rejected.
    pub fn resolve_id(&self, id: &str) -> SamlResult<&Element> {
        let matches = self.find_all_by_id(id);
        match matches.len() {
            0 => Err(SignatureError::MissingReference(id.to_string()).into()),
            1 => Ok(matches[0]),
            _ => Err(SignatureError::AmbiguousReference(id.to_string()).into()),
        }
    }

    /// Mutable counterpart of [`Self::resolve_id`].
    pub fn resolve_id_mut(&mut self, id: &str) -> SamlResult<&mut Element> {
        match self.find_all_by_id(id).len() {
            0 => Err(SignatureError::MissingReference(id.to_string()).into()),
            1 => Ok(self
                .root
                .find_by_id_mut(id)
                .ok_or_else(|| SamlError::from(SignatureError::MissingReference(id.to_string())))?),
            _ => Err(SignatureError::AmbiguousReference(id.to_string()).into()),
        }
    }

    /// Finds every element matching a predicate, in document order.
    #[must_use]
    pub fn find_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<&Element> {
        let mut out = Vec::new();
        self.root.collect_matching(&pred, &mut out);
        out
    }

    /// Returns the ancestor path from the root down to `target`,
    /// compared by identity. `None` if `target` is not in this document.
    #[must_use]
    pub fn path_to<'a>(&'a self, target: &Element) -> Option<Vec<&'a Element>> {
        fn descend<'a>(current: &'a Element, target: &Element, path: &mut Vec<&'a Element>) -> bool {
            path.push(current);
            if std::ptr::eq(current, target) {
                return true;
            }
            for child in current.child_elements() {
                if descend(child, target, path) {
                    return true;
                }
            }
            path.pop();
            false
        }

        let mut path = Vec::new();
        descend(&self.root, target, &mut path).then_some(path)
    }

    /// Extracts the element with the given ID into a standalone document.
    ///
    /// Namespace declarations in scope at the element are grafted onto the
    /// new root so the extracted fragment stays namespace-well-formed and
    /// canonicalizes to the same bytes as in its original context.
    pub fn extract_subtree(&self, id: &str) -> SamlResult<Self> {
        let target = self.resolve_id(id)?;
        let path = self
            .path_to(target)
            .ok_or_else(|| SamlError::from(SignatureError::MissingReference(id.to_string())))?;

        let mut root = target.clone();
        for ancestor in path.iter().rev().skip(1) {
            for (prefix, uri) in &ancestor.ns_decls {
                if !root.ns_decls.iter().any(|(p, _)| p == prefix) {
                    root.ns_decls.push((prefix.clone(), uri.clone()));
                }
            }
        }
        Ok(Self { root })
    }
}

/// Escapes character data: `&`, `<`, `>` and carriage return.
pub fn escape_text(text: &str, out: &mut Vec<u8>) {
    for byte in text.bytes() {
        match byte {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'\r' => out.extend_from_slice(b"&#xD;"),
            other => out.push(other),
        }
    }
}

/// Escapes attribute values: `&`, `<`, `"` and whitespace characters.
pub fn escape_attribute(value: &str, out: &mut Vec<u8>) {
    for byte in value.bytes() {
        match byte {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'"' => out.extend_from_slice(b"&quot;"),
            b'\t' => out.extend_from_slice(b"&#x9;"),
            b'\n' => out.extend_from_slice(b"&#xA;"),
            b'\r' => out.extend_from_slice(b"&#xD;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_bytes(
            br#"<a:root xmlns:a="urn:a" ID="r1"><a:child Id="c1">text &amp; more</a:child><a:child xml:id="c2"/></a:root>"#,
        )
        .unwrap()
    }

    #[test]
    fn parse_resolves_namespaces() {
        let doc = sample();
        assert_eq!(doc.root.name.local, "root");
        assert_eq!(doc.root.namespace.as_deref(), Some("urn:a"));
        assert_eq!(doc.root.child_elements().count(), 2);
    }

    #[test]
    fn id_lookup_covers_all_id_attribute_forms() {
        let doc = sample();
        assert!(doc.resolve_id("r1").is_ok());
        assert!(doc.resolve_id("c1").is_ok());
        assert!(doc.resolve_id("c2").is_ok());
        assert!(matches!(
            doc.resolve_id("nope"),
            Err(SamlError::Signature(SignatureError::MissingReference(_)))
        ));
    }

    #[test]
    fn duplicate_ids_are_ambiguous() {
        let doc = Document::from_bytes(br#"<r ID="x"><c ID="x"></c></r>"#).unwrap();
        assert!(matches!(
            doc.resolve_id("x"),
            Err(SamlError::Signature(SignatureError::AmbiguousReference(_)))
        ));
    }

    #[test]
    fn text_is_unescaped_on_parse_and_escaped_on_write() {
        let doc = sample();
        let child = doc.resolve_id("c1").unwrap();
        assert_eq!(child.text(), "text & more");

        let bytes = doc.to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("text &amp; more"));
    }

    #[test]
    fn round_trip_is_stable() {
        let doc = sample();
        let once = doc.to_bytes();
        let again = Document::from_bytes(&once).unwrap().to_bytes();
        assert_eq!(once, again);
    }

    #[test]
    fn extract_subtree_grafts_in_scope_namespaces() {
        let doc = sample();
        let fragment = doc.extract_subtree("c1").unwrap();
        assert!(fragment
            .root
            .ns_decls
            .iter()
            .any(|(p, uri)| p.as_deref() == Some("a") && uri == "urn:a"));
        assert_eq!(fragment.root.namespace.as_deref(), Some("urn:a"));
    }

    #[test]
    fn path_to_finds_nested_elements() {
        let doc = sample();
        let child = doc.resolve_id("c2").unwrap();
        let path = doc.path_to(child).unwrap();
        assert_eq!(path.len(), 2);
        assert!(std::ptr::eq(path[0], &doc.root));
    }
}
