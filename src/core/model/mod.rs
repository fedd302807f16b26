//! Document model tree
//!
//! The model is an arena of nodes addressed by [`NodeId`]. Parents own their
//! children through ordered id lists; the `parent` link is a plain lookup and
//! never owns anything. Removed nodes stay in the arena, detached, so ids are
//! never reused and remain valid identities for the view mapper.
//!
//! # Module Structure
//!
//! - `writer`: the only way to mutate an attached tree (schema-checked, recorded)
//! - `selection`: caret and multi-cell selections

pub mod selection;
pub mod writer;

pub use selection::Selection;
pub use writer::Writer;

use std::collections::BTreeMap;
use std::fmt;

use crate::data::constants::{ROOT, TEXT};
use crate::utils::error::{EditorError, EditorResult};

/// Stable identity of a model node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw index into the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value of a model attribute
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
    Map(BTreeMap<String, String>),
}

impl AttributeValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(n) => Some(*n),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            AttributeValue::Map(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AttributeValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Map(m) => {
                let pairs: Vec<String> = m.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Integer(n)
    }
}

impl From<usize> for AttributeValue {
    fn from(n: usize) -> Self {
        AttributeValue::Integer(n as i64)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

/// Payload of a model node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element {
        name: String,
        attributes: BTreeMap<String, AttributeValue>,
    },
    Text(String),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The model document: an arena with a single `$root` element
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ModelNode>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = ModelNode {
            data: NodeData::Element {
                name: ROOT.to_string(),
                attributes: BTreeMap::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Element name, or `$text` for text nodes
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|node| match &node.data {
            NodeData::Element { name, .. } => name.as_str(),
            NodeData::Text(_) => TEXT,
        })
    }

    pub fn is_element(&self, id: NodeId, name: &str) -> bool {
        matches!(
            self.get(id).map(|n| &n.data),
            Some(NodeData::Element { name: n, .. }) if n == name
        )
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(NodeData::Text(_)))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> Option<&BTreeMap<String, AttributeValue>> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&AttributeValue> {
        self.attributes(id).and_then(|attrs| attrs.get(key))
    }

    pub fn has_attributes(&self, id: NodeId) -> bool {
        self.attributes(id).is_some_and(|attrs| !attrs.is_empty())
    }

    /// Integer attribute, or `default` when missing or not numeric
    pub fn int_attribute(&self, id: NodeId, key: &str, default: i64) -> i64 {
        self.attribute(id, key)
            .and_then(AttributeValue::as_integer)
            .unwrap_or(default)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Children with a given element name
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.is_element(child, name))
    }

    /// Offset of a node within its parent
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Closest element with `name`, starting at the node itself
    pub fn find_ancestor_or_self(&self, id: NodeId, name: &str) -> Option<NodeId> {
        if self.is_element(id, name) {
            return Some(id);
        }
        self.ancestors(id).find(|&a| self.is_element(a, name))
    }

    /// Whether `ancestor` contains `id` (or is it)
    pub fn is_inside(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Pre-order traversal of the subtree, the node itself first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Path of child offsets from the root, used to order nodes
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_of(current).unwrap_or(0));
            current = parent;
        }
        path.reverse();
        path
    }

    // ------------------------------------------------------------------------
    // Raw mutation. Only the writer calls these.
    // ------------------------------------------------------------------------

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ModelNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> EditorResult<()> {
        if !self.contains(parent) {
            return Err(EditorError::UnknownNode(parent));
        }
        if !self.contains(child) {
            return Err(EditorError::UnknownNode(child));
        }
        if self.parent(child).is_some() || child == self.root {
            return Err(EditorError::invalid_operation(format!(
                "node {} is already attached",
                child
            )));
        }
        if self.is_inside(parent, child) {
            return Err(EditorError::invalid_operation(format!(
                "cannot insert node {} into its own subtree",
                child
            )));
        }
        if self.is_text(parent) {
            return Err(EditorError::invalid_operation("text nodes cannot have children"));
        }
        let len = self.child_count(parent);
        if index > len {
            return Err(EditorError::invalid_operation(format!(
                "offset {} out of bounds for node {} with {} children",
                index, parent, len
            )));
        }
        self.nodes[parent.index()].children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: NodeId) -> EditorResult<(NodeId, usize)> {
        let parent = self
            .parent(id)
            .ok_or_else(|| EditorError::invalid_operation(format!("node {} is detached", id)))?;
        let index = self
            .index_of(id)
            .ok_or_else(|| EditorError::invalid_operation(format!("node {} is orphaned", id)))?;
        self.nodes[parent.index()].children.remove(index);
        self.nodes[id.index()].parent = None;
        Ok((parent, index))
    }

    pub(crate) fn set_attribute(
        &mut self,
        id: NodeId,
        key: &str,
        value: Option<AttributeValue>,
    ) -> EditorResult<Option<AttributeValue>> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(EditorError::UnknownNode(id))?;
        match &mut node.data {
            NodeData::Element { attributes, .. } => Ok(match value {
                Some(value) => attributes.insert(key.to_string(), value),
                None => attributes.remove(key),
            }),
            NodeData::Text(_) => Err(EditorError::invalid_operation(
                "text nodes do not carry attributes",
            )),
        }
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> NodeData {
        NodeData::Element {
            name: name.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_insert_and_detach() {
        let mut doc = Document::new();
        let p = doc.alloc(element("paragraph"));
        let t = doc.alloc(NodeData::Text("hi".to_string()));
        doc.insert_child(doc.root(), 0, p).unwrap();
        doc.insert_child(p, 0, t).unwrap();

        assert!(doc.is_attached(t));
        assert_eq!(doc.text_content(doc.root()), "hi");
        assert_eq!(doc.path(t), vec![0, 0]);

        let (parent, index) = doc.detach(p).unwrap();
        assert_eq!(parent, doc.root());
        assert_eq!(index, 0);
        assert!(!doc.is_attached(t));
        assert_eq!(doc.parent(t), Some(p));
    }

    #[test]
    fn test_insert_rejects_cycles_and_double_attach() {
        let mut doc = Document::new();
        let a = doc.alloc(element("a"));
        let b = doc.alloc(element("b"));
        doc.insert_child(a, 0, b).unwrap();
        assert!(doc.insert_child(b, 0, a).is_err());
        assert!(doc.insert_child(doc.root(), 0, b).is_err());
        assert!(doc.insert_child(doc.root(), 5, a).is_err());
    }

    #[test]
    fn test_attributes() {
        let mut doc = Document::new();
        let cell = doc.alloc(element("tableCell"));
        assert_eq!(doc.int_attribute(cell, "colspan", 1), 1);
        doc.set_attribute(cell, "colspan", Some(3usize.into())).unwrap();
        assert_eq!(doc.int_attribute(cell, "colspan", 1), 3);
        let old = doc.set_attribute(cell, "colspan", None).unwrap();
        assert_eq!(old, Some(AttributeValue::Integer(3)));
        assert!(!doc.has_attributes(cell));
    }

    #[test]
    fn test_ancestor_lookup() {
        let mut doc = Document::new();
        let table = doc.alloc(element("table"));
        let row = doc.alloc(element("tableRow"));
        let cell = doc.alloc(element("tableCell"));
        doc.insert_child(doc.root(), 0, table).unwrap();
        doc.insert_child(table, 0, row).unwrap();
        doc.insert_child(row, 0, cell).unwrap();

        assert_eq!(doc.find_ancestor_or_self(cell, "table"), Some(table));
        assert_eq!(doc.find_ancestor_or_self(cell, "tableCell"), Some(cell));
        assert!(doc.is_inside(cell, table));
        assert_eq!(doc.ancestors(cell).count(), 3);
    }
}
