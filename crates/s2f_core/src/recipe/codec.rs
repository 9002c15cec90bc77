//! Recipe XML codec
//!
//! Parsing keeps element names, attribute order and values, nested elements
//! and non-blank text in document order, including text between child
//! elements. Comments and processing instructions are dropped, and text is
//! trimmed. Output is indented and carries a UTF-8 XML declaration.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{RecipeError, RecipeNode, RecipeTree};

/// Parse a recipe document held in memory.
pub fn parse_recipe(text: &str) -> Result<RecipeTree, RecipeError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<RecipeNode> = Vec::new();
    let mut root: Option<RecipeNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(node_from_start(&start)?),
            Event::Empty(start) => {
                let node = node_from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| RecipeError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&text);
                }
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(RecipeError::Malformed(format!(
            "element <{}> is never closed",
            open.tag()
        )));
    }

    let root = root.ok_or_else(|| RecipeError::Malformed("no root element".to_string()))?;
    Ok(RecipeTree::new(root))
}

/// Read and parse a recipe file.
pub fn read_recipe(path: &Path) -> Result<RecipeTree, RecipeError> {
    let text = fs::read_to_string(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = parse_recipe(&text)?;
    tracing::info!("Read recipe {} ({} nodes)", path.display(), tree.len());
    Ok(tree)
}

/// Serialize to an indented document with a UTF-8 XML declaration.
pub fn to_xml_string(tree: &RecipeTree) -> Result<String, RecipeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(&mut writer, tree.root())?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| RecipeError::Malformed(format!("serialized recipe is not UTF-8: {}", e)))?;
    xml.push('\n');
    Ok(xml)
}

/// Write the recipe to a new file.
///
/// Fails with [`RecipeError::OutputExists`] if `path` already exists. The
/// check happens before anything is written, and the file is opened with
/// create-new semantics.
pub fn write_recipe(tree: &RecipeTree, path: &Path) -> Result<(), RecipeError> {
    if path.exists() {
        return Err(RecipeError::OutputExists {
            path: path.to_path_buf(),
        });
    }

    let xml = to_xml_string(tree)?;
    let io_err = |source: std::io::Error| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => RecipeError::OutputExists {
                path: path.to_path_buf(),
            },
            _ => io_err(source),
        })?;
    file.write_all(xml.as_bytes()).map_err(io_err)?;

    tracing::info!("Wrote recipe {} ({} nodes)", path.display(), tree.len());
    Ok(())
}

fn node_from_start(start: &BytesStart) -> Result<RecipeNode, RecipeError> {
    let mut node = RecipeNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.set_attribute(key, value);
    }
    Ok(node)
}

fn attach(
    stack: &mut [RecipeNode],
    root: &mut Option<RecipeNode>,
    node: RecipeNode,
) -> Result<(), RecipeError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(node);
    } else if root.is_some() {
        return Err(RecipeError::Malformed(format!(
            "multiple root elements (second is <{}>)",
            node.tag()
        )));
    } else {
        *root = Some(node);
    }
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &RecipeNode) -> Result<(), RecipeError> {
    let mut start = BytesStart::new(node.tag());
    for (key, value) in node.attributes() {
        start.push_attribute((key, value));
    }

    if node.children().is_empty() && node.text().is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = node.text() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in node.children() {
        write_node(writer, child)?;
        if let Some(tail) = child.tail() {
            writer.write_event(Event::Text(BytesText::new(tail)))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag())))?;
    Ok(())
}
