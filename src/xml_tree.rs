use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::Geojson2WpmlError;

type Result<T> = std::result::Result<T, Geojson2WpmlError>;

/// One node in an owned XML tree. Element names and attribute keys keep
/// their qualified form exactly as written in the source document, so
/// namespace prefixes survive a parse/serialize round trip untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    CData(String),
    Comment(String),
}

/// An owned XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// First child element with the given qualified name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn push_element(&mut self, el: XmlElement) {
        self.children.push(XmlNode::Element(el));
    }

    /// Concatenated text content of this element, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out.trim().to_string()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }
}

/// Parse an XML string into its root element.
pub fn parse_document(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(element_from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let el = element_from_start(&e)?;
                close_element(el, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                if let Some(el) = stack.pop() {
                    close_element(el, &mut stack, &mut root);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    append_text(parent, raw);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    parent.children.push(XmlNode::CData(raw.to_string()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                // Character references (&#60; &#x3C;) and predefined entities
                let Some(parent) = stack.last_mut() else {
                    continue;
                };
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    append_text(parent, &ch.to_string());
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => append_text(parent, "&"),
                        "lt" => append_text(parent, "<"),
                        "gt" => append_text(parent, ">"),
                        "quot" => append_text(parent, "\""),
                        "apos" => append_text(parent, "'"),
                        _ => {} // Unknown entity, skip
                    }
                }
            }
            Ok(Event::Comment(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    parent.children.push(XmlNode::Comment(raw.to_string()));
                }
            }
            Ok(Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(Geojson2WpmlError::XmlParse(e)),
        }
    }

    root.ok_or(Geojson2WpmlError::EmptyXmlDocument)
}

/// Serialize an element tree back to text, with an XML declaration.
pub fn serialize_document(root: &XmlElement) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    write_element(&mut writer, root)?;

    String::from_utf8(writer.into_inner()).map_err(|e| Geojson2WpmlError::Utf8 {
        entry: "serialized document".to_string(),
        source: e.utf8_error(),
    })
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())
        .unwrap_or_default()
        .to_string();

    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Geojson2WpmlError::XmlParse(e.into()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .unwrap_or_default()
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Geojson2WpmlError::XmlParse(e.into()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Attach a finished element to its parent, or make it the root.
fn close_element(el: XmlElement, stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

/// Append text to the element, merging into a trailing text node if any.
fn append_text(el: &mut XmlElement, text: &str) {
    if let Some(XmlNode::Text(existing)) = el.children.last_mut() {
        existing.push_str(text);
    } else {
        el.children.push(XmlNode::Text(text.to_string()));
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &XmlElement) -> std::io::Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            XmlNode::Element(c) => write_element(writer, c)?,
            XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            XmlNode::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
            XmlNode::Comment(t) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))
}
