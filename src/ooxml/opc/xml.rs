//! Owned XML tree for part content.
//!
//! Every XML-backed part owns its own tree; nothing is shared between
//! parts, so cloning a part yields an independent copy. Attribute values
//! and text are kept in their escaped (on-the-wire) form, which makes a
//! parse/serialize cycle byte-stable for everything but whitespace outside
//! the root element.

use crate::ooxml::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use smallvec::SmallVec;

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Escaped character data.
    Text(String),
    CData(String),
    Comment(String),
}

/// An element with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: SmallVec<[(String, String); 4]>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: SmallVec::new(),
            children: Vec::new(),
        }
    }

    /// Qualified name, e.g. "p:sldId".
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Raw (escaped) value of an attribute by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attributes in document order, values escaped.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute from an unescaped value, replacing any existing one.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let escaped = escape(value).into_owned();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = escaped,
            None => self.attributes.push((name.to_string(), escaped)),
        }
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert an element at a position in the child node list.
    pub fn insert_child(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Position in the child node list of the first child element with the
    /// given local name.
    pub fn position(&self, local_name: &str) -> Option<usize> {
        self.children.iter().position(|node| {
            matches!(node, XmlNode::Element(el) if el.local_name() == local_name)
        })
    }

    /// First child element with the given local name.
    pub fn find(&self, local_name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.local_name() == local_name)
    }

    pub fn find_mut(&mut self, local_name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) if el.local_name() == local_name => Some(el),
            _ => None,
        })
    }

    /// Elements reached by a `/`-separated path of local names relative to
    /// this element, e.g. `"sldIdLst/sldId"`. A `*` step matches any child.
    pub fn query(&self, path: &str) -> Vec<&XmlElement> {
        let mut current: Vec<&XmlElement> = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|el| el.elements())
                .filter(|el| step == "*" || el.local_name() == step)
                .collect();
        }
        current
    }

    /// Every element below this one, depth-first in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut stack: Vec<&XmlElement> = self.elements().collect();
        stack.reverse();
        while let Some(el) = stack.pop() {
            out.push(el);
            let mark = stack.len();
            stack.extend(el.elements());
            stack[mark..].reverse();
        }
        out
    }

    /// Unescaped concatenation of this element's direct text children.
    pub fn text(&self) -> Result<String> {
        let mut text = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(raw) => text.push_str(
                    &unescape(raw).map_err(|e| OpcError::XmlError(e.to_string()))?,
                ),
                XmlNode::CData(data) => text.push_str(data),
                _ => {},
            }
        }
        Ok(text)
    }

    /// Call `f` on every escaped text node in this subtree.
    pub fn visit_text_mut<F: FnMut(&mut String)>(&mut self, f: &mut F) {
        for node in &mut self.children {
            match node {
                XmlNode::Text(raw) => f(raw),
                XmlNode::Element(el) => el.visit_text_mut(f),
                _ => {},
            }
        }
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            // Values read from single-quoted attributes may hold a raw '"'.
            if value.contains('"') {
                out.push_str(&value.replace('"', "&quot;"));
            } else {
                out.push_str(value);
            }
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(el) => el.write_into(out),
                XmlNode::Text(raw) => out.push_str(raw),
                XmlNode::CData(data) => {
                    out.push_str("<![CDATA[");
                    out.push_str(data);
                    out.push_str("]]>");
                },
                XmlNode::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                },
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// A parsed XML part: optional declaration plus the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    declaration: Option<String>,
    root: XmlElement,
}

impl XmlDocument {
    /// A document with the standard OOXML declaration.
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Some(r#"xml version="1.0" encoding="UTF-8" standalone="yes""#.to_string()),
            root,
        }
    }

    /// Parse XML bytes into an owned tree.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut declaration = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Decl(decl)) => {
                    declaration = Some(std::str::from_utf8(&decl)?.to_string());
                },
                Ok(Event::Start(ref e)) => {
                    stack.push(Self::element_from(e)?);
                },
                Ok(Event::Empty(ref e)) => {
                    let element = Self::element_from(e)?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        OpcError::XmlError("Unbalanced end tag".to_string())
                    })?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Ok(Event::Text(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        Self::push_text(current, std::str::from_utf8(t)?);
                    }
                },
                Ok(Event::GeneralRef(ref r)) => {
                    if let Some(current) = stack.last_mut() {
                        let entity = format!("&{};", std::str::from_utf8(r)?);
                        Self::push_text(current, &entity);
                    }
                },
                Ok(Event::CData(ref c)) => {
                    if let Some(current) = stack.last_mut() {
                        let data = std::str::from_utf8(c)?.to_string();
                        current.children.push(XmlNode::CData(data));
                    }
                },
                Ok(Event::Comment(ref c)) => {
                    if let Some(current) = stack.last_mut() {
                        let comment = std::str::from_utf8(c)?.to_string();
                        current.children.push(XmlNode::Comment(comment));
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("XML parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OpcError::XmlError("Unclosed element at end of document".to_string()));
        }
        let root = root.ok_or_else(|| OpcError::XmlError("No root element found".to_string()))?;
        Ok(Self { declaration, root })
    }

    fn element_from(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement> {
        let mut element = XmlElement::new(std::str::from_utf8(e.name().as_ref())?);
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = std::str::from_utf8(&attr.value)?.to_string();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attach(
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
        element: XmlElement,
    ) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.push_child(element),
            None if root.is_none() => *root = Some(element),
            None => {
                return Err(OpcError::XmlError("Multiple root elements".to_string()));
            },
        }
        Ok(())
    }

    fn push_text(element: &mut XmlElement, raw: &str) {
        if let Some(XmlNode::Text(last)) = element.children.last_mut() {
            last.push_str(raw);
        } else {
            element.children.push(XmlNode::Text(raw.to_string()));
        }
    }

    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Evaluate a path query from the root, e.g. `"sldIdLst/sldId"`.
    pub fn query(&self, path: &str) -> Vec<&XmlElement> {
        self.root.query(path)
    }

    /// Serialize to UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        if let Some(decl) = &self.declaration {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>\r\n");
        }
        self.root.write_into(&mut out);
        out.into_bytes()
    }
}

fn local_part(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}
