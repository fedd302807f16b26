//! Change engine
//!
//! [`Model`] owns the document, its schema, the selection and the registered
//! post-fixers. [`Model::change`] is the unit of atomicity: the callback and
//! every post-fixer run against a [`Writer`], and if anything fails the
//! document and selection are restored to their state before the change.
//!
//! A consistency fault additionally halts the object regions (tables) the
//! failed batch touched. Later writes into a halted region fail with
//! [`EditorError::Halted`] instead of compounding the corruption.

use fxhash::FxHashSet;

use super::batch::{Batch, Operation};
use super::downcast::editing::EditingView;
use super::model::{Document, NodeId, Selection, Writer};
use super::postfix::{run_post_fixers, PostFixer};
use super::schema::Schema;
use crate::data::constants::DEFAULT_POST_FIX_CAP;
use crate::utils::error::{EditorError, EditorResult};

pub struct Model {
    document: Document,
    schema: Schema,
    selection: Selection,
    post_fixers: Vec<Box<dyn PostFixer>>,
    post_fix_cap: usize,
    halted: FxHashSet<NodeId>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Schema::new())
    }
}

impl Model {
    pub fn new(schema: Schema) -> Self {
        Self {
            document: Document::new(),
            schema,
            selection: Selection::Empty,
            post_fixers: Vec::new(),
            post_fix_cap: DEFAULT_POST_FIX_CAP,
            halted: FxHashSet::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Post-fixers run in registration order
    pub fn add_post_fixer(&mut self, fixer: Box<dyn PostFixer>) {
        tracing::trace!(fixer = fixer.name(), "post-fixer registered");
        self.post_fixers.push(fixer);
    }

    pub fn post_fixer_names(&self) -> Vec<&'static str> {
        self.post_fixers.iter().map(|f| f.name()).collect()
    }

    pub fn set_post_fix_cap(&mut self, cap: usize) {
        self.post_fix_cap = cap.max(1);
    }

    pub fn post_fix_cap(&self) -> usize {
        self.post_fix_cap
    }

    /// Regions halted by earlier consistency faults
    pub fn halted(&self) -> &FxHashSet<NodeId> {
        &self.halted
    }

    pub(crate) fn clear_halted(&mut self) {
        self.halted.clear();
    }

    /// Replace the selection after validating it
    pub fn set_selection(&mut self, selection: Selection) -> EditorResult<()> {
        selection.validate(&self.document, &self.schema)?;
        self.selection = selection;
        Ok(())
    }

    /// Run `f` and the post-fixers as one atomic batch
    pub fn change<T>(
        &mut self,
        view: &EditingView,
        f: impl FnOnce(&mut Writer<'_>) -> EditorResult<T>,
    ) -> EditorResult<(T, Batch)> {
        let snapshot = (self.document.clone(), self.selection.clone());

        let outcome = {
            let mut writer = Writer::new(
                &mut self.document,
                &self.schema,
                &mut self.selection,
                &self.halted,
            );
            match f(&mut writer) {
                Ok(value) => {
                    match run_post_fixers(&self.post_fixers, &mut writer, view, self.post_fix_cap)
                    {
                        Ok(passes) => {
                            tracing::trace!(
                                passes,
                                operations = writer.operations().len(),
                                "batch committed"
                            );
                            Ok((value, writer.into_batch()))
                        }
                        Err(err) => Err((err, writer.into_batch().operations)),
                    }
                }
                Err(err) => Err((err, Vec::new())),
            }
        };

        match outcome {
            Ok((value, batch)) => {
                self.selection.prune(&self.document);
                Ok((value, batch))
            }
            Err((err, operations)) => {
                let (document, selection) = snapshot;
                self.document = document;
                self.selection = selection;

                if let EditorError::ConsistencyFault { passes, last_fixer } = &err {
                    let regions = affected_objects(&self.document, &self.schema, &operations);
                    tracing::error!(
                        passes = *passes,
                        last_fixer = *last_fixer,
                        regions = ?regions,
                        "post-fixers did not settle; batch rolled back and regions halted"
                    );
                    self.halted.extend(regions);
                } else {
                    tracing::debug!(error = %err, "batch rolled back");
                }
                Err(err)
            }
        }
    }
}

/// Closest attached object ancestors (tables) of the nodes a batch touched
fn affected_objects(doc: &Document, schema: &Schema, operations: &[Operation]) -> Vec<NodeId> {
    let mut seen = FxHashSet::default();
    let mut regions = Vec::new();
    let candidates = operations
        .iter()
        .flat_map(|op| std::iter::once(op.node()).chain(op.parent()));
    for node in candidates {
        if !doc.contains(node) || !doc.is_attached(node) {
            continue;
        }
        let object = std::iter::once(node)
            .chain(doc.ancestors(node))
            .find(|&n| doc.name(n).is_some_and(|name| schema.is_object(name)));
        if let Some(object) = object {
            if seen.insert(object) {
                regions.push(object);
            }
        }
    }
    regions
}
