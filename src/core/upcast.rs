//! Upcast dispatcher
//!
//! Converts an owned markup tree into model nodes. The tree is first
//! normalized (whitespace collapsed, trimmed at block boundaries, ignored
//! elements dropped), then every element is handed to the first matching
//! upcast converter. Elements no converter claims are transparent: their
//! children are converted in their place.
//!
//! Converted nodes are inserted with [`UpcastContext::safe_insert`], which
//! wraps inline content in paragraphs where the schema wants blocks and drops
//! what cannot be placed at all.

use fxhash::FxHashSet;
use lazy_static::lazy_static;
use regex::Regex;

use super::conversion::Conversion;
use super::model::{NodeId, Writer};
use super::view::{ViewElement, ViewNode};
use crate::data::constants::{PARAGRAPH, VIEW_ROOT};
use crate::data::elements::{is_block_markup, is_ignored_markup};
use crate::utils::error::EditorResult;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"[ \t\n\r\x0C]+").unwrap();
}

pub struct UpcastContext<'a, 'w> {
    conversion: &'a Conversion,
    writer: &'a mut Writer<'w>,
    auto_paragraphs: FxHashSet<NodeId>,
}

impl<'a, 'w> UpcastContext<'a, 'w> {
    pub fn new(conversion: &'a Conversion, writer: &'a mut Writer<'w>) -> Self {
        Self {
            conversion,
            writer,
            auto_paragraphs: FxHashSet::default(),
        }
    }

    pub fn writer(&mut self) -> &mut Writer<'w> {
        self.writer
    }

    pub fn conversion(&self) -> &'a Conversion {
        self.conversion
    }

    /// Convert one markup node into detached model nodes
    pub fn convert_node(&mut self, node: &ViewNode) -> EditorResult<Vec<NodeId>> {
        match node {
            ViewNode::Text(text) if text.is_empty() => Ok(Vec::new()),
            ViewNode::Text(text) => Ok(vec![self.writer.create_text(text)]),
            ViewNode::Element(element) => self.convert_element(element),
        }
    }

    /// Dispatch an element to the first matching converter
    pub fn convert_element(&mut self, element: &ViewElement) -> EditorResult<Vec<NodeId>> {
        if is_ignored_markup(&element.name) {
            tracing::debug!(element = %element.name, "ignored markup element");
            return Ok(Vec::new());
        }
        match self.conversion.upcast_converter(element) {
            Some(converter) => {
                tracing::trace!(converter = converter.name, element = %element.name, "upcast");
                (converter.convert)(element, self)
            }
            None => {
                let mut nodes = Vec::new();
                for child in &element.children {
                    nodes.extend(self.convert_node(child)?);
                }
                Ok(nodes)
            }
        }
    }

    /// Convert the children of `element` and place them into `parent`
    pub fn convert_children(&mut self, element: &ViewElement, parent: NodeId) -> EditorResult<()> {
        for child in &element.children {
            for node in self.convert_node(child)? {
                self.safe_insert(node, parent)?;
            }
        }
        Ok(())
    }

    /// Append `node` to `parent`, auto-paragraphing or unwrapping it when the
    /// schema does not allow it there. Returns `false` when it was dropped.
    pub fn safe_insert(&mut self, node: NodeId, parent: NodeId) -> EditorResult<bool> {
        let schema = self.writer.schema();
        let doc = self.writer.document();
        let (Some(parent_name), Some(node_name)) = (doc.name(parent), doc.name(node)) else {
            return Ok(false);
        };

        if schema.check_child(parent_name, node_name) {
            self.writer.append(node, parent)?;
            return Ok(true);
        }

        if schema.check_child(parent_name, PARAGRAPH) && schema.check_child(PARAGRAPH, node_name) {
            let last = doc.children(parent).last().copied();
            let paragraph = match last {
                Some(p) if self.auto_paragraphs.contains(&p) => p,
                _ => {
                    let p = self.writer.create_element(PARAGRAPH, &[])?;
                    self.writer.append(p, parent)?;
                    self.auto_paragraphs.insert(p);
                    p
                }
            };
            self.writer.append(node, paragraph)?;
            return Ok(true);
        }

        if !doc.is_text(node) && doc.child_count(node) > 0 {
            tracing::debug!(element = node_name, parent = parent_name, "unwrapping disallowed element");
            let children = doc.children(node).to_vec();
            let mut placed = false;
            for child in children {
                self.writer.remove(child)?;
                placed |= self.safe_insert(child, parent)?;
            }
            return Ok(placed);
        }

        tracing::debug!(node = node_name, parent = parent_name, "dropped node the schema rejects");
        Ok(false)
    }
}

/// Upcast `nodes` and append the result to `parent`
pub fn upcast_into(
    conversion: &Conversion,
    writer: &mut Writer<'_>,
    nodes: &[ViewNode],
    parent: NodeId,
) -> EditorResult<()> {
    let mut root = ViewElement::new(VIEW_ROOT).with_children(nodes.to_vec());
    normalize_whitespace(&mut root);
    let mut context = UpcastContext::new(conversion, writer);
    context.convert_children(&root, parent)
}

// ============================================================================
// Whitespace Normalization
// ============================================================================

fn is_block_node(node: &ViewNode) -> bool {
    node.as_element().is_some_and(|el| is_block_markup(&el.name))
}

/// Collapse whitespace runs and trim text at block boundaries
pub fn normalize_whitespace(element: &mut ViewElement) {
    let block = element.name == VIEW_ROOT || is_block_markup(&element.name);
    let children = std::mem::take(&mut element.children);
    let count = children.len();
    let block_at: Vec<bool> = children.iter().map(is_block_node).collect();

    for (i, child) in children.into_iter().enumerate() {
        match child {
            ViewNode::Text(text) => {
                let mut text = WHITESPACE.replace_all(&text, " ").into_owned();
                let starts_line = if i == 0 { block } else { block_at[i - 1] };
                let ends_line = if i + 1 == count { block } else { block_at[i + 1] };
                if starts_line {
                    text = text.trim_start().to_string();
                }
                if ends_line {
                    text = text.trim_end().to_string();
                }
                if !text.is_empty() {
                    element.children.push(ViewNode::Text(text));
                }
            }
            ViewNode::Element(mut child) => {
                normalize_whitespace(&mut child);
                element.children.push(ViewNode::Element(child));
            }
        }
    }
}
