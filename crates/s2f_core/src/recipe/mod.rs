//! Connectivity recipe tree
//!
//! The recipe is an XML document whose root element holds one rule element per
//! pathway, e.g.
//!
//! ```xml
//! <ConnectionRules>
//!   <rule from="L23_PC" to="L23_PC" bouton_reduction_factor="0.5" mean_syns_connection="3.2"/>
//! </ConnectionRules>
//! ```
//!
//! [`RecipeTree`] keeps the root element and addresses its direct children by
//! index. Attribute updates go through [`RecipeTree::set_attribute`].

pub mod codec;
pub mod mutate;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub use codec::{parse_recipe, read_recipe, to_xml_string, write_recipe};
pub use mutate::apply_scale;

/// Recipe attribute rescaled from bouton density validation.
pub const BOUTON_REDUCTION_FACTOR: &str = "bouton_reduction_factor";
/// Recipe attribute rescaled from synapses-per-connection validation.
pub const MEAN_SYNS_CONNECTION: &str = "mean_syns_connection";

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed recipe: {0}")]
    Malformed(String),

    #[error("Node {index}: attribute {attribute}='{value}' is not a finite number")]
    InvalidValue {
        index: usize,
        attribute: String,
        value: String,
    },

    #[error("Node index {index} out of range ({len} nodes)")]
    NodeIndex { index: usize, len: usize },

    #[error("{} already exists. Not overwriting!", path.display())]
    OutputExists { path: PathBuf },

    #[error("IO error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One element of the recipe document.
///
/// Text before the first child is `text`; text following a child element, up
/// to the next sibling or the parent's end tag, is that child's `tail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeNode {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<RecipeNode>,
    text: Option<String>,
    tail: Option<String>,
}

impl RecipeNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            tail: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_child(mut self, child: RecipeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overwrite an attribute in place, or append it when absent.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn children(&self) -> &[RecipeNode] {
        &self.children
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text that follows this element inside its parent
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub(crate) fn push_child(&mut self, child: RecipeNode) {
        self.children.push(child);
    }

    /// Append character data at the current end of this element's content.
    pub(crate) fn push_text(&mut self, text: &str) {
        let slot = match self.children.last_mut() {
            Some(child) => &mut child.tail,
            None => &mut self.text,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }
}

/// Parsed recipe: the root element and its direct children, addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeTree {
    root: RecipeNode,
}

impl RecipeTree {
    pub fn new(root: RecipeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &RecipeNode {
        &self.root
    }

    /// Direct children of the root in document order
    pub fn nodes(&self) -> &[RecipeNode] {
        &self.root.children
    }

    pub fn node(&self, index: usize) -> Option<&RecipeNode> {
        self.root.children.get(index)
    }

    pub fn len(&self) -> usize {
        self.root.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Update one attribute of the node at `index`.
    pub fn set_attribute(
        &mut self,
        index: usize,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), RecipeError> {
        let len = self.len();
        let node = self
            .root
            .children
            .get_mut(index)
            .ok_or(RecipeError::NodeIndex { index, len })?;
        node.set_attribute(key, value);
        Ok(())
    }
}

/// Which attribute a fitted scale factor applies to, and its legal range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentSpec {
    pub attribute_key: String,
    pub min_bound: f64,
    pub max_bound: f64,
}

impl AdjustmentSpec {
    pub fn new(attribute_key: impl Into<String>, min_bound: f64, max_bound: f64) -> Self {
        Self {
            attribute_key: attribute_key.into(),
            min_bound,
            max_bound,
        }
    }

    /// `bouton_reduction_factor` in [0, 1]
    pub fn bouton_reduction() -> Self {
        Self::new(BOUTON_REDUCTION_FACTOR, 0.0, 1.0)
    }

    /// `mean_syns_connection` in [1, 1e20]
    pub fn mean_syns_connection() -> Self {
        Self::new(MEAN_SYNS_CONNECTION, 1.0, 1e20)
    }

    /// `min(max_bound, max(min_bound, value))`, with negative zero folded to zero.
    pub fn clamp(&self, value: f64) -> f64 {
        let clamped = value.max(self.min_bound).min(self.max_bound);
        if clamped == 0.0 {
            0.0
        } else {
            clamped
        }
    }
}
