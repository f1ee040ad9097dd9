//! Streaming pull reader over `quick-xml`.
//!
//! Parsers consume SAML messages in a single pass with one start element of
//! lookahead. The reader resolves namespace prefixes as events are pulled,
//! skips comments and processing instructions, and can capture a whole
//! subtree into an owned [`Element`] for content kept opaque (signatures,
//! extensions, encrypted assertions).

use std::collections::VecDeque;

use quick_xml::events::Event;

use crate::error::{SamlError, SamlResult};
use crate::xml::dom::{Attribute, Element, Node, QName};

/// A resolved start tag.
#[derive(Debug, Clone)]
pub struct StartTag {
    /// Namespace prefix, if any.
    pub prefix: Option<String>,
    /// Local element name.
    pub local: String,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
    /// Attributes in document order, namespace declarations excluded.
    pub attributes: Vec<Attribute>,
    /// Namespace declarations appearing on this tag.
    pub ns_decls: Vec<(Option<String>, String)>,
    /// Byte offset of the tag in the input.
    pub offset: u64,
}

impl StartTag {
    /// Returns the value of an unprefixed attribute.
    #[must_use]
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.local == local)
            .map(|a| a.value.as_str())
    }

    /// Returns a required attribute, or a malformed-message error naming it.
    pub fn required_attribute(&self, local: &str) -> SamlResult<&str> {
        self.attribute(local).ok_or_else(|| {
            SamlError::MalformedMessage(format!(
                "<{}> is missing required attribute {local}",
                self.local
            ))
        })
    }

    /// Fails with [`SamlError::UnknownElement`] for this tag's position.
    #[must_use]
    pub fn unknown(&self) -> SamlError {
        SamlError::UnknownElement {
            element: self.local.clone(),
            location: self.offset,
        }
    }
}

#[derive(Debug)]
enum PulledEvent {
    Start(StartTag),
    End(String),
    Text(String),
    Eof,
}

/// Namespace-resolving pull reader.
pub struct XmlReader<'a> {
    inner: quick_xml::Reader<&'a [u8]>,
    buf: Vec<u8>,
    pending: VecDeque<PulledEvent>,
    // one frame of (prefix, uri) bindings per open element
    ns_stack: Vec<Vec<(Option<String>, String)>>,
}

impl<'a> XmlReader<'a> {
    /// Creates a reader over an in-memory document.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut inner = quick_xml::Reader::from_reader(bytes);
        inner.config_mut().expand_empty_elements = true;
        Self {
            inner,
            buf: Vec::new(),
            pending: VecDeque::new(),
            ns_stack: Vec::new(),
        }
    }

    fn resolve_prefix(&self, prefix: Option<&str>) -> Option<String> {
        for frame in self.ns_stack.iter().rev() {
            for (bound, uri) in frame.iter().rev() {
                if bound.as_deref() == prefix {
                    return Some(uri.clone());
                }
            }
        }
        match prefix {
            Some("xml") => Some("http://www.w3.org/XML/1998/namespace".to_string()),
            _ => None,
        }
    }

    /// Pulls one significant event from the underlying reader into `pending`.
    fn pull(&mut self) -> SamlResult<()> {
        loop {
            self.buf.clear();
            let offset = self.inner.buffer_position();
            match self.inner.read_event_into(&mut self.buf)? {
                Event::Start(start) => {
                    let name = start.name();
                    let local = String::from_utf8_lossy(name.local_name().as_ref()).into_owned();
                    let prefix = name
                        .prefix()
                        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());

                    let mut attributes = Vec::new();
                    let mut ns_decls: Vec<(Option<String>, String)> = Vec::new();
                    for attr in start.attributes() {
                        let attr = attr.map_err(|e| {
                            SamlError::MalformedMessage(format!("bad attribute: {e}"))
                        })?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| {
                                SamlError::MalformedMessage(format!("bad attribute value: {e}"))
                            })?
                            .into_owned();
                        let key = attr.key;
                        let key_local =
                            String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
                        let key_prefix = key
                            .prefix()
                            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
                        if key_prefix.is_none() && key_local == "xmlns" {
                            ns_decls.push((None, value));
                        } else if key_prefix.as_deref() == Some("xmlns") {
                            ns_decls.push((Some(key_local), value));
                        } else {
                            attributes.push(Attribute {
                                prefix: key_prefix,
                                local: key_local,
                                value,
                            });
                        }
                    }

                    self.ns_stack.push(ns_decls.clone());
                    let namespace = self.resolve_prefix(prefix.as_deref());
                    self.pending.push_back(PulledEvent::Start(StartTag {
                        prefix,
                        local,
                        namespace,
                        attributes,
                        ns_decls,
                        offset,
                    }));
                    return Ok(());
                }
                Event::End(end) => {
                    self.ns_stack.pop();
                    let local =
                        String::from_utf8_lossy(end.name().local_name().as_ref()).into_owned();
                    self.pending.push_back(PulledEvent::End(local));
                    return Ok(());
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| SamlError::MalformedMessage(format!("bad text: {e}")))?
                        .into_owned();
                    self.pending.push_back(PulledEvent::Text(text));
                    return Ok(());
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    self.pending.push_back(PulledEvent::Text(text));
                    return Ok(());
                }
                Event::Eof => {
                    self.pending.push_back(PulledEvent::Eof);
                    return Ok(());
                }
                // declarations, comments, PIs and doctype are ignorable
                _ => {}
            }
        }
    }

    fn front(&mut self) -> SamlResult<&PulledEvent> {
        if self.pending.is_empty() {
            // always queues at least one event, Eof included
            self.pull()?;
        }
        self.pending.front().ok_or_else(|| {
            SamlError::MalformedMessage("unexpected end of input".to_string())
        })
    }

    fn next_event(&mut self) -> SamlResult<PulledEvent> {
        if self.pending.is_empty() {
            self.pull()?;
        }
        Ok(self.pending.pop_front().unwrap_or(PulledEvent::Eof))
    }

    /// Peeks the next start element, skipping ignorable whitespace.
    ///
    /// Returns `None` when the next significant event is an end element or
    /// end of input, leaving it unconsumed.
    pub fn peek_start(&mut self) -> SamlResult<Option<&StartTag>> {
        loop {
            let ignorable =
                matches!(self.front()?, PulledEvent::Text(text) if text.trim().is_empty());
            if ignorable {
                self.pending.pop_front();
            } else {
                break;
            }
        }
        match self.front()? {
            PulledEvent::Start(_) => {}
            _ => return Ok(None),
        }
        // re-borrow for the caller
        match self.pending.front() {
            Some(PulledEvent::Start(tag)) => Ok(Some(tag)),
            _ => Ok(None),
        }
    }

    /// Consumes and returns the next start element.
    pub fn next_start(&mut self) -> SamlResult<StartTag> {
        if self.peek_start()?.is_none() {
            return Err(SamlError::MalformedMessage(
                "expected a start element".to_string(),
            ));
        }
        match self.next_event()? {
            PulledEvent::Start(tag) => Ok(tag),
            _ => Err(SamlError::MalformedMessage(
                "expected a start element".to_string(),
            )),
        }
    }

    /// Consumes the next start element and checks its local name.
    pub fn expect_start(&mut self, local: &str) -> SamlResult<StartTag> {
        let tag = self.next_start()?;
        if tag.local == local {
            Ok(tag)
        } else {
            Err(SamlError::MalformedMessage(format!(
                "expected <{local}>, found <{}>",
                tag.local
            )))
        }
    }

    /// Reads the text content of the current element and consumes its end tag.
    ///
    /// The element must contain character data only. Whitespace is kept:
    /// inside an element read for its text, all of it is significant.
    pub fn element_text(&mut self) -> SamlResult<String> {
        let mut out = String::new();
        loop {
            match self.next_event()? {
                PulledEvent::Text(text) => out.push_str(&text),
                PulledEvent::End(_) => return Ok(out),
                PulledEvent::Start(tag) => {
                    return Err(SamlError::MalformedMessage(format!(
                        "unexpected <{}> inside text-only element",
                        tag.local
                    )))
                }
                PulledEvent::Eof => {
                    return Err(SamlError::MalformedMessage(
                        "unexpected end of input".to_string(),
                    ))
                }
            }
        }
    }

    /// Consumes the end tag of the current element, which must contain no
    /// further child elements.
    pub fn end_element(&mut self, local: &str) -> SamlResult<()> {
        loop {
            match self.next_event()? {
                PulledEvent::Text(text) if text.trim().is_empty() => {}
                PulledEvent::End(name) if name == local => return Ok(()),
                PulledEvent::End(name) => {
                    return Err(SamlError::MalformedMessage(format!(
                        "expected </{local}>, found </{name}>"
                    )))
                }
                PulledEvent::Start(tag) => return Err(tag.unknown()),
                PulledEvent::Text(_) => {
                    return Err(SamlError::MalformedMessage(format!(
                        "unexpected character content inside <{local}>"
                    )))
                }
                PulledEvent::Eof => {
                    return Err(SamlError::MalformedMessage(
                        "unexpected end of input".to_string(),
                    ))
                }
            }
        }
    }

    /// Captures the element opened by `start` and its entire subtree into an
    /// owned tree, preserving all text content.
    ///
    /// Namespace bindings in scope at the start tag are grafted onto the
    /// captured root so the fragment canonicalizes identically out of
    /// context.
    pub fn capture_subtree(&mut self, start: StartTag) -> SamlResult<Element> {
        let mut root = self.element_from_tag(&start);
        // in-scope bindings, innermost shadowing outermost; the tag's own
        // frame is already on the stack at this point
        for frame in self.ns_stack.iter().rev() {
            for (prefix, uri) in frame {
                if !root.ns_decls.iter().any(|(p, _)| p == prefix) {
                    root.ns_decls.push((prefix.clone(), uri.clone()));
                }
            }
        }
        self.capture_children(&mut root)?;
        Ok(root)
    }

    fn element_from_tag(&self, tag: &StartTag) -> Element {
        Element {
            name: QName {
                prefix: tag.prefix.clone(),
                local: tag.local.clone(),
            },
            namespace: tag.namespace.clone(),
            attributes: tag.attributes.clone(),
            ns_decls: tag.ns_decls.clone(),
            children: Vec::new(),
        }
    }

    fn capture_children(&mut self, parent: &mut Element) -> SamlResult<()> {
        loop {
            match self.next_event()? {
                PulledEvent::Start(tag) => {
                    let mut child = self.element_from_tag(&tag);
                    self.capture_children(&mut child)?;
                    parent.children.push(Node::Element(child));
                }
                PulledEvent::Text(text) => parent.children.push(Node::Text(text)),
                PulledEvent::End(_) => return Ok(()),
                PulledEvent::Eof => {
                    return Err(SamlError::MalformedMessage(
                        "unexpected end of input".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_prefixed_and_default_namespaces() {
        let xml = br#"<p:a xmlns:p="urn:p" xmlns="urn:d"><b/></p:a>"#;
        let mut reader = XmlReader::new(xml);

        let a = reader.next_start().unwrap();
        assert_eq!(a.local, "a");
        assert_eq!(a.namespace.as_deref(), Some("urn:p"));

        let b = reader.next_start().unwrap();
        assert_eq!(b.local, "b");
        assert_eq!(b.namespace.as_deref(), Some("urn:d"));
    }

    #[test]
    fn peek_does_not_consume() {
        let xml = br#"<a><b/></a>"#;
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();

        assert_eq!(reader.peek_start().unwrap().unwrap().local, "b");
        assert_eq!(reader.peek_start().unwrap().unwrap().local, "b");
        assert_eq!(reader.next_start().unwrap().local, "b");
    }

    #[test]
    fn peek_returns_none_at_end_element() {
        let xml = br#"<a><b></b></a>"#;
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();
        let b = reader.next_start().unwrap();
        assert!(reader.peek_start().unwrap().is_none());
        drop(b);
    }

    #[test]
    fn element_text_unescapes() {
        let xml = br#"<a>one &amp; two</a>"#;
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();
        assert_eq!(reader.element_text().unwrap(), "one & two");
    }

    #[test]
    fn element_text_keeps_surrounding_whitespace() {
        let xml = b"<a> padded value </a>";
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();
        assert_eq!(reader.element_text().unwrap(), " padded value ");
    }

    #[test]
    fn end_element_rejects_character_content() {
        let xml = br#"<a>stray</a>"#;
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();
        let err = reader.end_element("a").unwrap_err();
        assert!(matches!(
            err,
            SamlError::MalformedMessage(ref m) if m.contains("character content")
        ));
    }

    #[test]
    fn unknown_element_carries_location() {
        let xml = br#"<a><b/></a>"#;
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();
        let err = reader.end_element("a").unwrap_err();
        assert!(matches!(err, SamlError::UnknownElement { ref element, .. } if element == "b"));
    }

    #[test]
    fn capture_grafts_outer_namespace_bindings() {
        let xml = br#"<a xmlns:x="urn:x"><x:inner attr="v">text</x:inner></a>"#;
        let mut reader = XmlReader::new(xml);
        reader.next_start().unwrap();
        let start = reader.next_start().unwrap();
        let captured = reader.capture_subtree(start).unwrap();

        assert_eq!(captured.name.local, "inner");
        assert_eq!(captured.namespace.as_deref(), Some("urn:x"));
        assert!(captured
            .ns_decls
            .iter()
            .any(|(p, uri)| p.as_deref() == Some("x") && uri == "urn:x"));
        assert_eq!(captured.text(), "text");
    }

    #[test]
    fn comments_and_pis_are_skipped() {
        let xml = br#"<?xml version="1.0"?><!-- hi --><a><?pi data?><b/></a>"#;
        let mut reader = XmlReader::new(xml);
        assert_eq!(reader.next_start().unwrap().local, "a");
        assert_eq!(reader.next_start().unwrap().local, "b");
    }
}
