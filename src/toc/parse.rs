//! Parse a manual's `toc.xml` into a [`TocNode`] tree.
//!
//! Named elements (`name` or `title` attribute) become nodes. A named
//! element with an `href`, `link` or `url` attribute is a leaf; any other
//! named element is a section. Unnamed elements are transparent: their
//! named descendants attach to the nearest named ancestor.

use super::{Children, TocNode};
use crate::error::TocError;
use crate::mirror::sanitize::sanitize;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

const NAME_ATTRS: [&str; 2] = ["name", "title"];
const REF_ATTRS: [&str; 3] = ["href", "link", "url"];

struct Frame {
    name: Option<String>,
    reference: Option<String>,
    children: Children,
}

impl Frame {
    fn root() -> Self {
        Self {
            name: None,
            reference: None,
            children: Children::new(),
        }
    }

    fn open(e: &BytesStart<'_>) -> Result<Self, TocError> {
        let mut name = None;
        let mut reference = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|err| TocError::Parse(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
            let value = attr
                .unescape_value()
                .map_err(|err| TocError::Parse(err.to_string()))?
                .trim()
                .to_string();
            if value.is_empty() {
                continue;
            }
            if name.is_none() && NAME_ATTRS.contains(&key.as_str()) {
                name = Some(value);
            } else if reference.is_none() && REF_ATTRS.contains(&key.as_str()) {
                reference = Some(value);
            }
        }
        Ok(Self {
            name,
            reference,
            children: Children::new(),
        })
    }
}

/// Parse ToC XML into the ordered children of the manual's root.
pub fn parse_toc(xml: &str) -> Result<Children, TocError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut stack = vec![Frame::root()];

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(Frame::open(&e)?),
            Ok(Event::Empty(e)) => {
                let frame = Frame::open(&e)?;
                close(&mut stack, frame)?;
            }
            Ok(Event::End(_)) => {
                if stack.len() <= 1 {
                    return Err(TocError::Parse("unbalanced closing tag".to_string()));
                }
                if let Some(frame) = stack.pop() {
                    close(&mut stack, frame)?;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TocError::Parse(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(TocError::Parse("unexpected end of document".to_string()));
    }
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn close(stack: &mut [Frame], frame: Frame) -> Result<(), TocError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| TocError::Parse("element outside document root".to_string()))?;

    match frame.name {
        Some(name) => {
            let node = match frame.reference {
                Some(reference) => TocNode::Leaf(reference),
                None => TocNode::Section(frame.children),
            };
            insert_unique(&mut parent.children, name, node);
        }
        None => {
            for (name, node) in frame.children.iter() {
                insert_unique(&mut parent.children, name.to_string(), node.clone());
            }
        }
    }
    Ok(())
}

/// Insert without clobbering a sibling that would land on the same path:
/// names are compared after sanitizing, and collisions get ` (2)`,
/// ` (3)`, ... appended.
fn insert_unique(children: &mut Children, name: String, node: TocNode) {
    if !collides(children, &name) {
        children.insert(name, node);
        return;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name} ({n})");
        if !collides(children, &candidate) {
            warn!("duplicate ToC entry {name:?} renamed to {candidate:?}");
            children.insert(candidate, node);
            return;
        }
        n += 1;
    }
}

fn collides(children: &Children, name: &str) -> bool {
    let target = sanitize(name);
    children.iter().any(|(existing, _)| sanitize(existing) == target)
}
