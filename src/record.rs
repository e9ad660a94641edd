//! Generic hierarchical record for VOC XML.
//!
//! A record is either a leaf string or a node mapping each child tag to the
//! ordered sequence of records found under that tag. Children are always
//! stored as sequences, so a single `<object>` and several `<object>`s are
//! read the same way through [`Record::get_all`].

use std::io::Read;
use xml::reader::{EventReader, XmlEvent};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent as WriterEvent};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Leaf(String),
    Node(Node),
}

/// Child tags in order of first appearance, each with its sequence of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    children: Vec<(String, Vec<Record>)>,
}

/// Root element of an XML document together with its parsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTree {
    pub tag: String,
    pub body: Record,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `tag`, after any existing values.
    pub fn push(&mut self, tag: &str, record: Record) {
        match self.children.iter_mut().find(|(t, _)| t == tag) {
            Some((_, values)) => values.push(record),
            None => self.children.push((tag.to_string(), vec![record])),
        }
    }

    /// Replace every value under `tag` with a single one.
    pub fn set(&mut self, tag: &str, record: Record) {
        self.set_all(tag, vec![record]);
    }

    /// Replace every value under `tag` with `records`.
    pub fn set_all(&mut self, tag: &str, records: Vec<Record>) {
        match self.children.iter_mut().find(|(t, _)| t == tag) {
            Some((_, values)) => *values = records,
            None => self.children.push((tag.to_string(), records)),
        }
    }

    pub fn get_all(&self, tag: &str) -> &[Record] {
        self.children
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.children
            .iter()
            .map(|(tag, values)| (tag.as_str(), values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Record {
    pub fn leaf(text: impl Into<String>) -> Self {
        Record::Leaf(text.into())
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Record::Leaf(text) => Some(text),
            Record::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Record::Node(node) => Some(node),
            Record::Leaf(_) => None,
        }
    }

    /// The first value under `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&Record> {
        self.get_all(tag).first()
    }

    /// Every value under `tag`; empty for leaves and absent tags.
    pub fn get_all(&self, tag: &str) -> &[Record] {
        match self {
            Record::Node(node) => node.get_all(tag),
            Record::Leaf(_) => &[],
        }
    }

    /// Follow a dotted path such as `size.width`, taking the first value at
    /// each step.
    pub fn lookup(&self, path: &str) -> Option<&Record> {
        path.split('.')
            .try_fold(self, |record, tag| record.get(tag))
    }
}

impl From<Node> for Record {
    fn from(node: Node) -> Self {
        Record::Node(node)
    }
}

struct Frame {
    tag: String,
    text: String,
    node: Node,
    has_children: bool,
}

impl Frame {
    fn new(tag: String) -> Self {
        Self {
            tag,
            text: String::new(),
            node: Node::new(),
            has_children: false,
        }
    }

    fn finish(self) -> (String, Record) {
        let record = if self.has_children {
            Record::Node(self.node)
        } else {
            Record::Leaf(self.text.trim().to_string())
        };
        (self.tag, record)
    }
}

/// Parse an XML document into a tree.
///
/// Parsing is permissive: any well-formed document is accepted and every
/// element is kept. Attributes, comments and the text of elements that have
/// child elements are dropped.
pub fn parse_xml(content: &str) -> Result<AnnotationTree> {
    parse_xml_reader(content.as_bytes())
}

pub fn parse_xml_reader<R: Read>(reader: R) -> Result<AnnotationTree> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut root = None;

    for event in EventReader::new(reader) {
        match event.map_err(|e| Error::parse(e.to_string()))? {
            XmlEvent::StartElement { name, .. } => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Frame::new(name.local_name));
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::parse("unbalanced end element"))?;
                let (tag, record) = frame.finish();
                match stack.last_mut() {
                    Some(parent) => parent.node.push(&tag, record),
                    None => root = Some(AnnotationTree { tag, body: record }),
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| Error::parse("document has no root element"))
}

/// Render a tree back to an indented XML document.
///
/// Sequences become repeated sibling elements in order, nodes become nested
/// elements and leaves become element text.
pub fn render_xml(tree: &AnnotationTree) -> Result<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .indent_string("\t")
            .create_writer(&mut buffer);
        write_element(&mut writer, &tree.tag, &tree.body)?;
    }
    String::from_utf8(buffer).map_err(|e| Error::parse(e.to_string()))
}

fn write_element<W: std::io::Write>(
    writer: &mut EventWriter<W>,
    tag: &str,
    record: &Record,
) -> Result<()> {
    writer.write(WriterEvent::start_element(tag))?;
    match record {
        Record::Leaf(text) => {
            if !text.is_empty() {
                writer.write(WriterEvent::characters(text))?;
            }
        }
        Record::Node(node) => {
            for (child_tag, values) in node.iter() {
                for value in values {
                    write_element(writer, child_tag, value)?;
                }
            }
        }
    }
    writer.write(WriterEvent::end_element())?;
    Ok(())
}
