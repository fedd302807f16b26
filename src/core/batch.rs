//! Mutation batches
//!
//! Two shapes of the same idea:
//!
//! - [`Operation`]: what the writer recorded while applying a batch. Post-fixers
//!   read it to find what changed; the editing downcast replays it into view
//!   patches.
//! - [`Mutation`]: an ordered list a host can submit in one go through
//!   `Editor::submit`. New content is described by owned [`Fragment`]s.

use indexmap::IndexSet;

use super::model::{AttributeValue, NodeId};

/// How much of the editing view an operation invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DirtyScope {
    /// The change maps onto a targeted view patch
    LocalPatch,
    /// The whole enclosing table must be converted again
    FullTableReconversion,
}

/// A recorded, already applied model change
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Insert {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
    Remove {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
    Attribute {
        node: NodeId,
        key: String,
        old: Option<AttributeValue>,
        new: Option<AttributeValue>,
    },
}

impl Operation {
    /// Node the operation is about
    pub fn node(&self) -> NodeId {
        match self {
            Operation::Insert { node, .. }
            | Operation::Remove { node, .. }
            | Operation::Attribute { node, .. } => *node,
        }
    }

    /// Parent touched by a structural operation
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Operation::Insert { parent, .. } | Operation::Remove { parent, .. } => Some(*parent),
            Operation::Attribute { .. } => None,
        }
    }
}

/// Everything a single change produced
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub operations: Vec<Operation>,
    /// Elements whose editing view must be rebuilt even though the model
    /// did not change shape
    pub refresh: IndexSet<NodeId>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.refresh.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

/// Owned description of model content to insert
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Element {
        name: String,
        attributes: Vec<(String, AttributeValue)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

impl Fragment {
    pub fn element(name: &str) -> Self {
        Fragment::Element {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Fragment::Text(text.to_string())
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        if let Fragment::Element { attributes, .. } = &mut self {
            attributes.push((key.to_string(), value.into()));
        }
        self
    }

    pub fn with_child(mut self, child: Fragment) -> Self {
        if let Fragment::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}

/// A structural mutation submitted by a host
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert {
        parent: NodeId,
        index: usize,
        fragment: Fragment,
    },
    Remove {
        node: NodeId,
    },
    Move {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
    SetAttribute {
        node: NodeId,
        key: String,
        value: Option<AttributeValue>,
    },
}
