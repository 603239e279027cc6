// crates/bankws-core/src/xml.rs
// ============================================================================
// Module: XML Element Tree
// Description: Namespace-aware owned element tree with bounded parsing.
// Purpose: Give the schema validator and message models one XML representation.
// Dependencies: quick-xml, thiserror
// ============================================================================

//! ## Overview
//! [`XmlElement`] is a small owned tree built with a namespace-resolving
//! `quick-xml` reader. Elements remember their namespace URI, local name,
//! attributes, child elements and concatenated text. Text is kept exactly as
//! written, so `xs:string` facets see the original characters; only the
//! whitespace-only text between child elements is dropped. Default namespace
//! declarations are consumed by resolution, while prefixed `xmlns:*`
//! declarations stay in the attribute list so prefixed attribute names and
//! QName values in foreign content keep their bindings on output.
//!
//! Invariants:
//! - Documents larger than [`MAX_DOCUMENT_BYTES`] are rejected before parsing.
//! - Nesting deeper than [`MAX_DEPTH`] is rejected.
//! - Serialization emits unprefixed names and declares a default namespace
//!   wherever an element's namespace differs from its parent's.
//!
//! Security posture: input documents arrive from the bank or from files and
//! are untrusted; all limits fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::name::Namespace;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted document size in bytes.
pub const MAX_DOCUMENT_BYTES: usize = 32 * 1024 * 1024;

/// Maximum element nesting depth.
pub const MAX_DEPTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// XML parse and write failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    /// Document exceeds [`MAX_DOCUMENT_BYTES`].
    #[error("xml document exceeds size limit ({size} > {limit} bytes)")]
    TooLarge {
        /// Actual document size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Element nesting exceeds [`MAX_DEPTH`].
    #[error("xml nesting exceeds depth limit {0}")]
    TooDeep(usize),
    /// Document is not well-formed.
    #[error("malformed xml: {0}")]
    Malformed(String),
    /// Serialization failed.
    #[error("xml write failed: {0}")]
    Write(String),
}

// ============================================================================
// SECTION: Element Tree
// ============================================================================

/// Owned XML element with resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Namespace URI, `None` when the element is unqualified.
    pub namespace: Option<String>,
    /// Local name without prefix.
    pub name: String,
    /// Attributes as written (qualified name, unescaped value), including
    /// prefixed `xmlns:*` declarations but not the default `xmlns`.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Self>,
    /// Concatenated text content as written; empty for element-only content
    /// separated by whitespace.
    pub text: String,
}

impl XmlElement {
    /// Creates an empty element in the given namespace.
    #[must_use]
    pub fn new(namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Sets the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Appends a child element.
    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Appends a text-only child in this element's namespace.
    pub fn push_leaf(&mut self, name: &str, text: impl Into<String>) {
        let child = Self::new(self.namespace.as_deref(), name).with_text(text);
        self.children.push(child);
    }

    /// Appends a text-only child when `text` is present.
    pub fn push_optional_leaf(&mut self, name: &str, text: Option<&str>) {
        if let Some(text) = text {
            self.push_leaf(name, text);
        }
    }

    /// Returns true when the element has the given namespace and local name.
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Returns the first child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns all children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns the text of the first child with the given local name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }

    /// Follows a path of local names through first-match children.
    #[must_use]
    pub fn path(&self, names: &[&str]) -> Option<&Self> {
        names.iter().try_fold(self, |current, name| current.child(name))
    }

    /// Returns the first descendant (depth-first, self excluded) with the local name.
    #[must_use]
    pub fn descendant(&self, name: &str) -> Option<&Self> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Returns an attribute value by its qualified name as written.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Parses a complete document into its root element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] when the document is oversized, too deep or malformed.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        if xml.len() > MAX_DOCUMENT_BYTES {
            return Err(XmlError::TooLarge {
                size: xml.len(),
                limit: MAX_DOCUMENT_BYTES,
            });
        }
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;
        loop {
            let (resolved, event) =
                reader.read_resolved_event().map_err(|err| XmlError::Malformed(err.to_string()))?;
            let namespace = owned_namespace(resolved)?;
            match event {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(XmlError::TooDeep(MAX_DEPTH));
                    }
                    stack.push(open_element(namespace, &start)?);
                }
                Event::Empty(start) => {
                    let element = open_element(namespace, &start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unbalanced end tag".to_string()))?;
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|err| XmlError::Malformed(err.to_string()))?;
                    append_text(&mut stack, &value)?;
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let value = std::str::from_utf8(&bytes)
                        .map_err(|_| XmlError::Malformed("cdata is not utf-8".to_string()))?;
                    append_text(&mut stack, value)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !stack.is_empty() {
            return Err(XmlError::Malformed("unclosed element at end of document".to_string()));
        }
        root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))
    }

    /// Serializes the element as a standalone UTF-8 document with declaration.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Write`] when serialization fails.
    pub fn to_document(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|err| XmlError::Write(err.to_string()))?;
        write_element(&mut writer, self, None)?;
        String::from_utf8(writer.into_inner()).map_err(|err| XmlError::Write(err.to_string()))
    }

    /// Serializes the element without an XML declaration.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Write`] when serialization fails.
    pub fn to_fragment(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self, None)?;
        String::from_utf8(writer.into_inner()).map_err(|err| XmlError::Write(err.to_string()))
    }
}

// ============================================================================
// SECTION: Parse Helpers
// ============================================================================

/// Converts a borrowed namespace resolution into an owned URI.
fn owned_namespace(resolved: ResolveResult<'_>) -> Result<Option<String>, XmlError> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(XmlError::Malformed(format!(
            "unbound namespace prefix: {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

/// Builds an element from a start tag.
fn open_element(namespace: Option<String>, start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = std::str::from_utf8(start.local_name().as_ref())
        .map_err(|_| XmlError::Malformed("element name is not utf-8".to_string()))?
        .to_string();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| XmlError::Malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        if key == "xmlns" {
            continue;
        }
        let value =
            attribute.unescape_value().map_err(|err| XmlError::Malformed(err.to_string()))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(XmlElement {
        namespace,
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Attaches a finished element to its parent or installs it as root.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::Malformed("multiple root elements".to_string()));
    }
    *root = Some(element);
    Ok(())
}

/// Appends text to the innermost open element.
fn append_text(stack: &mut [XmlElement], value: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.text.push_str(value);
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(XmlError::Malformed("text outside root element".to_string())),
    }
}

// ============================================================================
// SECTION: Write Helpers
// ============================================================================

/// Writes one element and its subtree.
fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
    parent_namespace: Option<&str>,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    let namespace = element.namespace.as_deref();
    if namespace != parent_namespace {
        start.push_attribute(("xmlns", namespace.unwrap_or("")));
    }
    for (key, value) in &element.attributes {
        if key == "xmlns" {
            continue;
        }
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() && element.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|err| XmlError::Write(err.to_string()));
    }
    writer.write_event(Event::Start(start)).map_err(|err| XmlError::Write(err.to_string()))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|err| XmlError::Write(err.to_string()))?;
    }
    for child in &element.children {
        write_element(writer, child, namespace)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|err| XmlError::Write(err.to_string()))
}
