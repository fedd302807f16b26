//! View trees and the model ↔ view mapper
//!
//! Two kinds of view trees exist:
//!
//! - [`ViewNode`] / [`ViewElement`]: owned trees. Parsed markup comes in as one
//!   (upcast input) and the data downcast produces one from scratch.
//! - [`ViewDocument`]: the editing view, an arena patched in place by the
//!   editing downcast. [`Mapper`] binds its nodes to model nodes by identity.

use std::collections::BTreeMap;
use std::fmt;

use fxhash::FxHashMap;

use super::model::NodeId;
use crate::data::constants::VIEW_ROOT;

// ============================================================================
// Owned View Trees
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ViewNode {
    Element(ViewElement),
    Text(String),
}

impl ViewNode {
    pub fn as_element(&self) -> Option<&ViewElement> {
        match self {
            ViewNode::Element(el) => Some(el),
            ViewNode::Text(_) => None,
        }
    }

    pub fn is_element(&self, name: &str) -> bool {
        self.as_element().is_some_and(|el| el.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ViewElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<ViewNode>,
}

impl ViewElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<ViewNode>) -> Self {
        self.children = children;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Element children only
    pub fn child_elements(&self) -> impl Iterator<Item = &ViewElement> {
        self.children.iter().filter_map(ViewNode::as_element)
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[ViewNode], out: &mut String) {
    for node in nodes {
        match node {
            ViewNode::Text(t) => out.push_str(t),
            ViewNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

// ============================================================================
// Editing View Arena
// ============================================================================

/// Identity of a node in the editing view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum ViewData {
    Element {
        name: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct ViewSlot {
    data: ViewData,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
}

/// The editing view, patched in place
#[derive(Debug, Clone)]
pub struct ViewDocument {
    nodes: Vec<ViewSlot>,
    root: ViewId,
}

impl Default for ViewDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewDocument {
    pub fn new() -> Self {
        Self {
            nodes: vec![ViewSlot {
                data: ViewData::Element {
                    name: VIEW_ROOT.to_string(),
                    attributes: BTreeMap::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            root: ViewId(0),
        }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    pub fn create_element(&mut self, name: &str) -> ViewId {
        self.alloc(ViewData::Element {
            name: name.to_string(),
            attributes: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> ViewId {
        self.alloc(ViewData::Text(text.to_string()))
    }

    fn alloc(&mut self, data: ViewData) -> ViewId {
        let id = ViewId(self.nodes.len() as u32);
        self.nodes.push(ViewSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn name(&self, id: ViewId) -> Option<&str> {
        match &self.nodes.get(id.0 as usize)?.data {
            ViewData::Element { name, .. } => Some(name),
            ViewData::Text(_) => None,
        }
    }

    pub fn is_element(&self, id: ViewId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn attribute(&self, id: ViewId, key: &str) -> Option<&str> {
        match &self.nodes.get(id.0 as usize)?.data {
            ViewData::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            ViewData::Text(_) => None,
        }
    }

    pub fn set_attribute(&mut self, id: ViewId, key: &str, value: &str) {
        if let Some(ViewSlot {
            data: ViewData::Element { attributes, .. },
            ..
        }) = self.nodes.get_mut(id.0 as usize)
        {
            attributes.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: ViewId, key: &str) {
        if let Some(ViewSlot {
            data: ViewData::Element { attributes, .. },
            ..
        }) = self.nodes.get_mut(id.0 as usize)
        {
            attributes.remove(key);
        }
    }

    /// Rename an element in place, keeping its identity and children
    pub fn rename(&mut self, id: ViewId, new_name: &str) {
        if let Some(ViewSlot {
            data: ViewData::Element { name, .. },
            ..
        }) = self.nodes.get_mut(id.0 as usize)
        {
            *name = new_name.to_string();
        }
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.nodes.get(id.0 as usize).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ViewId) -> &[ViewId] {
        self.nodes
            .get(id.0 as usize)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// First child element with a given name
    pub fn child_named(&self, id: ViewId, name: &str) -> Option<ViewId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.is_element(c, name))
    }

    pub fn insert(&mut self, parent: ViewId, index: usize, child: ViewId) {
        self.detach(child);
        let len = self.children(parent).len();
        let index = index.min(len);
        self.nodes[parent.0 as usize].children.insert(index, child);
        self.nodes[child.0 as usize].parent = Some(parent);
    }

    pub fn append(&mut self, parent: ViewId, child: ViewId) {
        let len = self.children(parent).len();
        self.insert(parent, len, child);
    }

    pub fn detach(&mut self, id: ViewId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0 as usize].children.retain(|&c| c != id);
            self.nodes[id.0 as usize].parent = None;
        }
    }

    /// Pre-order traversal of the subtree
    pub fn descendants(&self, id: ViewId) -> Vec<ViewId> {
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

    /// Snapshot a subtree as an owned tree
    pub fn to_node(&self, id: ViewId) -> ViewNode {
        match &self.nodes[id.0 as usize].data {
            ViewData::Text(t) => ViewNode::Text(t.clone()),
            ViewData::Element { name, attributes } => ViewNode::Element(ViewElement {
                name: name.clone(),
                attributes: attributes.clone(),
                children: self
                    .children(id)
                    .iter()
                    .map(|&c| self.to_node(c))
                    .collect(),
            }),
        }
    }

    /// Snapshot of the root's children
    pub fn to_fragment(&self) -> Vec<ViewNode> {
        self.children(self.root)
            .iter()
            .map(|&c| self.to_node(c))
            .collect()
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Bidirectional binding between model nodes and editing view nodes
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    model_to_view: FxHashMap<NodeId, ViewId>,
    view_to_model: FxHashMap<ViewId, NodeId>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, model: NodeId, view: ViewId) {
        if let Some(previous) = self.model_to_view.insert(model, view) {
            self.view_to_model.remove(&previous);
        }
        self.view_to_model.insert(view, model);
    }

    /// View node bound to a model node
    pub fn to_view(&self, model: NodeId) -> Option<ViewId> {
        self.model_to_view.get(&model).copied()
    }

    /// Model node bound to a view node
    pub fn to_model(&self, view: ViewId) -> Option<NodeId> {
        self.view_to_model.get(&view).copied()
    }

    /// Forget every binding inside a view subtree
    pub fn unbind_subtree(&mut self, view: &ViewDocument, root: ViewId) {
        for id in view.descendants(root) {
            if let Some(model) = self.view_to_model.remove(&id) {
                if self.model_to_view.get(&model) == Some(&id) {
                    self.model_to_view.remove(&model);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.model_to_view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model_to_view.is_empty()
    }
}
