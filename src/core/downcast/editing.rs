//! Editing downcast
//!
//! Keeps the editing view in step with the model. A committed [`Batch`] is
//! replayed as targeted patches in a fixed order:
//!
//! 1. removals: views of removed nodes are taken out and unbound,
//! 2. full reconversions: elements whose attribute change has the
//!    [`DirtyScope::FullTableReconversion`] scope are rebuilt,
//! 3. insertions: inserted nodes are converted in document order,
//! 4. attribute patches for the [`DirtyScope::LocalPatch`] changes,
//! 5. refresh requests from post-fixers.
//!
//! Steps 3 to 5 skip nodes whose ancestor was already rebuilt in this batch.

use fxhash::FxHashSet;

use crate::core::batch::{Batch, DirtyScope, Operation};
use crate::core::conversion::Conversion;
use crate::core::model::{Document, NodeId};
use crate::core::view::{Mapper, ViewDocument, ViewId, ViewNode};

/// The editing view together with its model mapping
#[derive(Debug, Clone, Default)]
pub struct EditingView {
    view: ViewDocument,
    mapper: Mapper,
}

impl EditingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a whole document from scratch
    pub fn convert_document(doc: &Document, conversion: &Conversion) -> Self {
        let mut editing = Self::new();
        let root_view = editing.view.root();
        editing.mapper.bind(doc.root(), root_view);
        let mut context = editing.context(doc, conversion);
        context.convert_children(doc.root());
        editing
    }

    pub fn view(&self) -> &ViewDocument {
        &self.view
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// View node bound to a model node
    pub fn to_view(&self, node: NodeId) -> Option<ViewId> {
        self.mapper.to_view(node)
    }

    /// Element name of the view bound to a model node
    pub fn view_name(&self, node: NodeId) -> Option<&str> {
        self.mapper.to_view(node).and_then(|v| self.view.name(v))
    }

    /// Owned snapshot of the editing view
    pub fn to_fragment(&self) -> Vec<ViewNode> {
        self.view.to_fragment()
    }

    fn context<'a>(&'a mut self, doc: &'a Document, conversion: &'a Conversion) -> EditingContext<'a> {
        EditingContext {
            doc,
            conversion,
            view: &mut self.view,
            mapper: &mut self.mapper,
        }
    }

    /// Replay a committed batch onto the view
    pub(crate) fn apply_batch(&mut self, doc: &Document, conversion: &Conversion, batch: &Batch) {
        if batch.is_empty() {
            return;
        }
        if self.mapper.to_view(doc.root()).is_none() {
            let root_view = self.view.root();
            self.mapper.bind(doc.root(), root_view);
        }
        let mut context = self.context(doc, conversion);
        let mut rebuilt: FxHashSet<NodeId> = FxHashSet::default();

        // 1. removals
        for op in &batch.operations {
            if let Operation::Remove { node, .. } = op {
                context.remove(*node);
            }
        }

        // 2. full reconversions
        let mut reconvert: Vec<NodeId> = Vec::new();
        for op in &batch.operations {
            if let Operation::Attribute { node, key, .. } = op {
                let Some(name) = doc.name(*node) else { continue };
                if doc.is_attached(*node)
                    && conversion.dirty_scope(name, key) == DirtyScope::FullTableReconversion
                    && !reconvert.contains(node)
                {
                    reconvert.push(*node);
                }
            }
        }
        for node in outermost(doc, reconvert) {
            if context.reconvert(node) {
                rebuilt.insert(node);
            }
        }

        // 3. insertions
        let mut inserted: Vec<NodeId> = Vec::new();
        for op in &batch.operations {
            if let Operation::Insert { node, .. } = op {
                if doc.is_attached(*node) && !inserted.contains(node) {
                    inserted.push(*node);
                }
            }
        }
        for node in outermost(doc, inserted) {
            if covered(doc, node, &rebuilt) {
                continue;
            }
            if context.mapper.to_view(node).is_some() {
                continue;
            }
            context.insert(node);
            rebuilt.insert(node);
        }

        // 4. attribute patches
        let mut patched: Vec<(NodeId, &str)> = Vec::new();
        for op in &batch.operations {
            if let Operation::Attribute { node, key, .. } = op {
                if !doc.is_attached(*node)
                    || covered(doc, *node, &rebuilt)
                    || patched.contains(&(*node, key.as_str()))
                {
                    continue;
                }
                patched.push((*node, key.as_str()));
                context.patch_attribute(*node, key);
            }
        }

        // 5. refresh requests
        for &node in &batch.refresh {
            if doc.is_attached(node) && !covered(doc, node, &rebuilt) && context.reconvert(node) {
                rebuilt.insert(node);
            }
        }
    }
}

/// Attached nodes in document order, without those nested in another one
fn outermost(doc: &Document, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort_by_key(|&n| doc.path(n));
    let set: FxHashSet<NodeId> = nodes.iter().copied().collect();
    nodes
        .into_iter()
        .filter(|&n| !doc.ancestors(n).any(|a| set.contains(&a)))
        .collect()
}

/// Whether the node or one of its ancestors is in `set`
fn covered(doc: &Document, node: NodeId, set: &FxHashSet<NodeId>) -> bool {
    set.contains(&node) || doc.ancestors(node).any(|a| set.contains(&a))
}

/// What editing converters work with
pub struct EditingContext<'a> {
    pub doc: &'a Document,
    pub conversion: &'a Conversion,
    pub view: &'a mut ViewDocument,
    pub mapper: &'a mut Mapper,
}

impl EditingContext<'_> {
    /// Convert a node and place it where its resolver says
    pub fn insert(&mut self, node: NodeId) -> Option<ViewId> {
        let (container, index) = self.resolve_position(node)?;
        self.convert_into(node, container, index)
    }

    /// Convert a node (with its subtree) into `container` at `index`
    pub fn convert_into(&mut self, node: NodeId, container: ViewId, index: usize) -> Option<ViewId> {
        let conversion = self.conversion;
        let Some(converter) = conversion.editing_converter(self.doc, node) else {
            tracing::trace!(node = %node, name = ?self.doc.name(node), "no editing converter");
            return None;
        };
        let view = (converter.convert)(self, node)?;
        self.view.insert(container, index, view);
        self.mapper.bind(node, view);
        self.convert_children(node);
        Some(view)
    }

    pub fn convert_children(&mut self, node: NodeId) {
        let doc = self.doc;
        for &child in doc.children(node) {
            self.insert(child);
        }
    }

    /// Rebuild the view of an already converted node in place
    pub fn reconvert(&mut self, node: NodeId) -> bool {
        let Some(old) = self.mapper.to_view(node) else {
            return false;
        };
        let Some(container) = self.view.parent(old) else {
            return false;
        };
        let index = self
            .view
            .children(container)
            .iter()
            .position(|&c| c == old)
            .unwrap_or(0);
        self.remove_view(old);
        tracing::trace!(node = %node, "reconverting view");
        self.convert_into(node, container, index).is_some()
    }

    /// Take the view of a removed node out
    pub fn remove(&mut self, node: NodeId) {
        let Some(view) = self.mapper.to_view(node) else {
            return;
        };
        if self.view.parent(view).is_none() {
            self.mapper.unbind_subtree(self.view, view);
            return;
        }
        match self.doc.name(node).and_then(|name| self.conversion.removal(name)) {
            Some(removal) => removal(self, node, view),
            None => self.remove_view(view),
        }
    }

    /// Detach a view subtree and forget its bindings
    pub fn remove_view(&mut self, view: ViewId) {
        self.mapper.unbind_subtree(self.view, view);
        self.view.detach(view);
    }

    fn patch_attribute(&mut self, node: NodeId, key: &str) {
        let (doc, conversion) = (self.doc, self.conversion);
        let Some(name) = doc.name(node) else { return };
        if let Some(patch) = conversion.attribute_patch(name, key) {
            patch(self, node, key);
            return;
        }
        let Some(mapping) = conversion.attribute_mapping(name, key) else {
            return;
        };
        let Some(view) = self.mapper.to_view(node) else {
            return;
        };
        match doc.attribute(node, key).and_then(mapping.to_view) {
            Some(value) => self.view.set_attribute(view, mapping.view_key, &value),
            None => self.view.remove_attribute(view, mapping.view_key),
        }
    }

    fn resolve_position(&mut self, node: NodeId) -> Option<(ViewId, usize)> {
        let resolver = self
            .doc
            .name(node)
            .and_then(|name| self.conversion.position_resolver(name));
        match resolver {
            Some(resolve) => resolve(self, node),
            None => self.default_position(node),
        }
    }

    /// Inside the parent's view, after the views of the preceding siblings
    pub fn default_position(&self, node: NodeId) -> Option<(ViewId, usize)> {
        let parent = self.doc.parent(node)?;
        let container = self.mapper.to_view(parent)?;
        let offset = self.doc.index_of(node)?;
        Some((container, self.preceding_in(parent, offset, container)))
    }

    /// How many of the first `offset` children of `parent` have their view
    /// directly inside `container`
    pub fn preceding_in(&self, parent: NodeId, offset: usize, container: ViewId) -> usize {
        self.doc.children(parent)[..offset]
            .iter()
            .filter(|&&sibling| {
                self.mapper
                    .to_view(sibling)
                    .is_some_and(|v| self.view.parent(v) == Some(container))
            })
            .count()
    }
}
