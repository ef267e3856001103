//! Owned, namespace-aware XML element tree over `quick-xml`.
//!
//! Parsing resolves every element to its namespace URI so lookups can match on
//! `(namespace, local name)` regardless of the prefix used in the source text.
//! Serialization re-derives the `xmlns` declarations an element needs from the
//! bindings already in scope, so any subtree can be written out on its own.

use std::io::Cursor;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use discept_core::{Error, Result};

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

/// A single attribute, keyed by its qualified name as written (e.g. `xml:id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    /// Prefixed namespace bindings this element declares or relies on.
    pub prefixes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an unprefixed element in the given namespace.
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            prefixes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<(Element, Scope)> = Vec::new();
        let mut root: Option<Element> = None;
        let base = Scope::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| invalid(format!("{} at byte {}", e, reader.buffer_position())))?;
            match event {
                Event::Start(start) => {
                    let parent = stack.last().map(|(_, s)| s).unwrap_or(&base);
                    let (element, scope) = open_element(&start, parent)?;
                    stack.push((element, scope));
                }
                Event::Empty(start) => {
                    let parent = stack.last().map(|(_, s)| s).unwrap_or(&base);
                    let (element, _) = open_element(&start, parent)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let (element, _) = stack
                        .pop()
                        .ok_or_else(|| invalid("unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| invalid(e.to_string()))?;
                    match stack.last_mut() {
                        Some((parent, _)) => parent.push_text(text.as_ref()),
                        None if text.trim().is_empty() => {}
                        None => return Err(invalid("text outside of the root element")),
                    }
                }
                Event::CData(data) => {
                    let data = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| invalid(e.to_string()))?;
                    match stack.last_mut() {
                        Some((parent, _)) => parent.children.push(Node::CData(data)),
                        None => return Err(invalid("CDATA outside of the root element")),
                    }
                }
                Event::Comment(comment) => {
                    if let Some((parent, _)) = stack.last_mut() {
                        let comment = String::from_utf8_lossy(&comment).into_owned();
                        parent.children.push(Node::Comment(comment));
                    }
                }
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some((open, _)) = stack.last() {
            return Err(invalid(format!("unclosed element <{}>", open.qualified_name())));
        }
        root.ok_or_else(|| invalid("no root element"))
    }

    /// Serialize this element (and its subtree) without an XML declaration.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_element(&mut writer, self, &Scope::default())?;
        into_string(writer)
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_document(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        writer
            .write_event(Event::Text(BytesText::new("\n")))
            .map_err(write_error)?;
        write_element(&mut writer, self, &Scope::default())?;
        into_string(writer)
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }

    /// True if this element is `{namespace}local`.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    // ---------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("xml:id")
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    // ---------------------------------------------------------------
    // Children
    // ---------------------------------------------------------------

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Append text, merging with a trailing text node.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(text),
            _ => self.children.push(Node::Text(text.to_string())),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text);
        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.is(namespace, local))
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, local))
    }

    pub fn child_mut(&mut self, namespace: &str, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(namespace, local))
    }

    /// Follow a chain of child names, taking the first match at each step.
    pub fn path(&self, namespace: &str, steps: &[&str]) -> Option<&Element> {
        steps
            .iter()
            .try_fold(self, |current, step| current.child(namespace, step))
    }

    /// Like [`Element::path`], creating missing steps by appending them.
    pub fn ensure_path(&mut self, namespace: &str, steps: &[&str]) -> &mut Element {
        let mut current = self;
        for step in steps {
            let position = current
                .children
                .iter()
                .position(|n| matches!(n, Node::Element(e) if e.is(namespace, step)));
            let index = match position {
                Some(i) => i,
                None => {
                    current.push(Element::new(Some(namespace), *step));
                    current.children.len() - 1
                }
            };
            current = match &mut current.children[index] {
                Node::Element(e) => e,
                _ => unreachable!("index points at an element"),
            };
        }
        current
    }

    /// Remove every direct child element matching the name. Returns how many were removed.
    pub fn remove_children(&mut self, namespace: &str, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.is(namespace, local)));
        before - self.children.len()
    }

    /// Insert an element right after the first child element matching the name,
    /// or at the front when there is none.
    pub fn insert_after(&mut self, namespace: &str, local: &str, child: Element) {
        let position = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(namespace, local)))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.children.insert(position, Node::Element(child));
    }

    /// Pre-order traversal of this element and all its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Visit this element and all descendants mutably, pre-order.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in self.elements_mut() {
            child.walk_mut(visit);
        }
    }

    /// Concatenated text content of the subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Move an un-namespaced subtree into `namespace`. Elements that already
    /// carry a namespace (and their subtrees) are left alone.
    pub fn adopt_namespace(&mut self, namespace: &str) {
        if self.namespace.is_some() {
            return;
        }
        self.namespace = Some(namespace.to_string());
        for child in self.elements_mut() {
            child.adopt_namespace(namespace);
        }
    }

    /// Insert whitespace between element children so that the element-only
    /// parts of a tree read as indented markup. Elements with mixed or text
    /// content are left untouched, and so are subtrees for which `skip` is true.
    pub fn indent(&mut self, depth: usize, skip: &impl Fn(&Element) -> bool) {
        let element_only = self.children.iter().all(|n| match n {
            Node::Element(_) | Node::Comment(_) => true,
            Node::Text(t) => t.trim().is_empty(),
            Node::CData(_) => false,
        });
        if !element_only || self.children.is_empty() {
            return;
        }

        let inner = format!("\n{}", " ".repeat(depth + 1));
        let outer = format!("\n{}", " ".repeat(depth));
        let old = std::mem::take(&mut self.children);
        for node in old {
            match node {
                Node::Text(_) => {}
                Node::Element(mut e) => {
                    if !skip(&e) {
                        e.indent(depth + 1, skip);
                    }
                    self.children.push(Node::Text(inner.clone()));
                    self.children.push(Node::Element(e));
                }
                other => {
                    self.children.push(Node::Text(inner.clone()));
                    self.children.push(other);
                }
            }
        }
        self.children.push(Node::Text(outer));
    }
}

/// Iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let children: Vec<&Element> = current.elements().collect();
        self.stack.extend(children.into_iter().rev());
        Some(current)
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(t) | Node::CData(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
            Node::Comment(_) => {}
        }
    }
}

// ---------------------------------------------------------------
// Namespace scope
// ---------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Scope {
    default: Option<String>,
    prefixes: Vec<(String, String)>,
}

impl Scope {
    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.prefixes
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn bind(&mut self, prefix: &str, uri: &str) {
        self.prefixes.push((prefix.to_string(), uri.to_string()));
    }
}

fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn open_element(start: &BytesStart<'_>, parent: &Scope) -> Result<(Element, Scope)> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| invalid(e.to_string()))?
        .to_string();

    let mut scope = parent.clone();
    let mut declared: Vec<(String, String)> = Vec::new();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| invalid(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| invalid(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| invalid(e.to_string()))?
            .into_owned();

        if key == "xmlns" {
            scope.default = if value.is_empty() { None } else { Some(value) };
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.bind(prefix, &value);
            declared.push((prefix.to_string(), value));
        } else {
            attributes.push(Attribute { name: key, value });
        }
    }

    let (prefix, local) = split_name(&name);
    let namespace = match prefix {
        Some(p) => Some(
            scope
                .lookup(p)
                .ok_or_else(|| invalid(format!("undeclared namespace prefix '{}'", p)))?
                .to_string(),
        ),
        None => scope.default.clone(),
    };

    // Carry the bindings the element itself needs so that it survives being
    // serialized away from the ancestor that declared them.
    let mut prefixes = declared;
    let used = prefix
        .into_iter()
        .chain(attributes.iter().filter_map(|a| split_name(&a.name).0));
    for p in used {
        if p == "xml" || prefixes.iter().any(|(q, _)| q == p) {
            continue;
        }
        if let Some(uri) = scope.lookup(p) {
            prefixes.push((p.to_string(), uri.to_string()));
        }
    }

    let element = Element {
        prefix: prefix.map(str::to_string),
        local: local.to_string(),
        namespace,
        attributes,
        prefixes,
        children: Vec::new(),
    };
    Ok((element, scope))
}

fn attach(
    stack: &mut [(Element, Scope)],
    root: &mut Option<Element>,
    element: Element,
) -> Result<()> {
    match stack.last_mut() {
        Some((parent, _)) => {
            parent.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(invalid("more than one root element")),
    }
}

// ---------------------------------------------------------------
// Writing
// ---------------------------------------------------------------

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    element: &Element,
    parent: &Scope,
) -> Result<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_str());
    let mut scope = parent.clone();

    match &element.prefix {
        None => {
            if scope.default != element.namespace {
                start.push_attribute(("xmlns", element.namespace.as_deref().unwrap_or("")));
                scope.default = element.namespace.clone();
            }
        }
        Some(p) => {
            let needed = element.namespace.as_deref().unwrap_or("");
            if scope.lookup(p) != Some(needed) && !element.prefixes.iter().any(|(q, _)| q == p) {
                start.push_attribute((format!("xmlns:{}", p).as_str(), needed));
                scope.bind(p, needed);
            }
        }
    }
    for (p, uri) in &element.prefixes {
        if scope.lookup(p) != Some(uri.as_str()) {
            start.push_attribute((format!("xmlns:{}", p).as_str(), uri.as_str()));
            scope.bind(p, uri);
        }
    }
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for node in &element.children {
        match node {
            Node::Element(child) => write_element(writer, child, &scope)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?,
            Node::CData(data) => writer
                .write_event(Event::CData(BytesCData::new(data.as_str())))
                .map_err(write_error)?,
            Node::Comment(comment) => writer
                .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                .map_err(write_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_error)?;
    Ok(())
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> Result<String> {
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::Internal(format!("serialized XML is not UTF-8: {}", e)))
}

fn write_error(e: quick_xml::Error) -> Error {
    Error::Internal(format!("XML write failed: {}", e))
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidFormat(msg.into())
}
