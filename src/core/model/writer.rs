//! Model writer
//!
//! Every mutation of the document goes through a [`Writer`]. Each call is
//! checked against the schema before it touches the tree and is recorded as an
//! [`Operation`] so that post-fixers and the editing downcast can see what a
//! batch did. The writer never rolls anything back on its own: the engine
//! snapshots the document before a change and restores it when the change
//! fails.

use fxhash::FxHashSet;

use super::{AttributeValue, Document, NodeData, NodeId, Selection};
use crate::core::batch::{Batch, Fragment, Mutation, Operation};
use crate::core::schema::Schema;
use crate::utils::error::{EditorError, EditorResult};

pub struct Writer<'a> {
    doc: &'a mut Document,
    schema: &'a Schema,
    selection: &'a mut Selection,
    halted: &'a FxHashSet<NodeId>,
    batch: Batch,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(
        doc: &'a mut Document,
        schema: &'a Schema,
        selection: &'a mut Selection,
        halted: &'a FxHashSet<NodeId>,
    ) -> Self {
        Self {
            doc,
            schema,
            selection,
            halted,
            batch: Batch::new(),
        }
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn selection(&self) -> &Selection {
        self.selection
    }

    /// Operations recorded so far in this batch, including post-fixer ones
    pub fn operations(&self) -> &[Operation] {
        &self.batch.operations
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub(crate) fn into_batch(self) -> Batch {
        self.batch
    }

    // ------------------------------------------------------------------------
    // Node creation (detached nodes are invisible until inserted)
    // ------------------------------------------------------------------------

    pub fn create_element(
        &mut self,
        name: &str,
        attributes: &[(&str, AttributeValue)],
    ) -> EditorResult<NodeId> {
        if !self.schema.is_registered(name) {
            return Err(EditorError::invalid_operation(format!(
                "element '{}' is not registered in the schema",
                name
            )));
        }
        let mut map = std::collections::BTreeMap::new();
        for (key, value) in attributes {
            if !self.schema.check_attribute(name, key) {
                return Err(EditorError::attribute_not_allowed(name, *key));
            }
            map.insert(key.to_string(), value.clone());
        }
        Ok(self.doc.alloc(NodeData::Element {
            name: name.to_string(),
            attributes: map,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.doc.alloc(NodeData::Text(text.to_string()))
    }

    /// Build a detached subtree from a fragment
    pub fn create_fragment(&mut self, fragment: &Fragment) -> EditorResult<NodeId> {
        match fragment {
            Fragment::Text(text) => Ok(self.create_text(text)),
            Fragment::Element {
                name,
                attributes,
                children,
            } => {
                let attrs: Vec<(&str, AttributeValue)> = attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.clone()))
                    .collect();
                let element = self.create_element(name, &attrs)?;
                for child in children {
                    let child = self.create_fragment(child)?;
                    self.append(child, element)?;
                }
                Ok(element)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Structural changes
    // ------------------------------------------------------------------------

    pub fn insert(&mut self, node: NodeId, parent: NodeId, index: usize) -> EditorResult<()> {
        self.ensure_not_halted(parent)?;
        let parent_name = self
            .doc
            .name(parent)
            .ok_or(EditorError::UnknownNode(parent))?;
        let child_name = self.doc.name(node).ok_or(EditorError::UnknownNode(node))?;
        if !self.schema.check_child(parent_name, child_name) {
            return Err(EditorError::schema_violation(parent_name, child_name));
        }
        self.doc.insert_child(parent, index, node)?;
        self.batch.operations.push(Operation::Insert {
            node,
            parent,
            index,
        });
        Ok(())
    }

    pub fn append(&mut self, node: NodeId, parent: NodeId) -> EditorResult<()> {
        let index = self.doc.child_count(parent);
        self.insert(node, parent, index)
    }

    pub fn remove(&mut self, node: NodeId) -> EditorResult<()> {
        self.ensure_not_halted(node)?;
        if node == self.doc.root() {
            return Err(EditorError::invalid_operation("the root cannot be removed"));
        }
        let (parent, index) = self.doc.detach(node)?;
        self.batch.operations.push(Operation::Remove {
            node,
            parent,
            index,
        });
        Ok(())
    }

    /// Move an attached node; recorded as a removal followed by an insertion
    pub fn move_to(&mut self, node: NodeId, parent: NodeId, index: usize) -> EditorResult<()> {
        self.remove(node)?;
        self.insert(node, parent, index)
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> EditorResult<()> {
        self.write_attribute(node, key, Some(value.into()))
    }

    pub fn remove_attribute(&mut self, node: NodeId, key: &str) -> EditorResult<()> {
        self.write_attribute(node, key, None)
    }

    fn write_attribute(
        &mut self,
        node: NodeId,
        key: &str,
        value: Option<AttributeValue>,
    ) -> EditorResult<()> {
        self.ensure_not_halted(node)?;
        let name = self.doc.name(node).ok_or(EditorError::UnknownNode(node))?;
        if value.is_some() && !self.schema.check_attribute(name, key) {
            return Err(EditorError::attribute_not_allowed(name, key));
        }
        if self.doc.attribute(node, key) == value.as_ref() {
            return Ok(());
        }
        let old = self.doc.set_attribute(node, key, value.clone())?;
        self.batch.operations.push(Operation::Attribute {
            node,
            key: key.to_string(),
            old,
            new: value,
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Selection and view hints
    // ------------------------------------------------------------------------

    pub fn set_selection(&mut self, selection: Selection) {
        *self.selection = selection;
    }

    /// Ask the editing downcast to rebuild the view of `node`
    pub fn request_refresh(&mut self, node: NodeId) {
        self.batch.refresh.insert(node);
    }

    // ------------------------------------------------------------------------
    // Submitted mutations
    // ------------------------------------------------------------------------

    pub fn apply(&mut self, mutation: &Mutation) -> EditorResult<()> {
        match mutation {
            Mutation::Insert {
                parent,
                index,
                fragment,
            } => {
                let node = self.create_fragment(fragment)?;
                self.insert(node, *parent, *index)
            }
            Mutation::Remove { node } => self.remove(*node),
            Mutation::Move {
                node,
                parent,
                index,
            } => self.move_to(*node, *parent, *index),
            Mutation::SetAttribute { node, key, value } => {
                self.write_attribute(*node, key, value.clone())
            }
        }
    }

    fn ensure_not_halted(&self, node: NodeId) -> EditorResult<()> {
        if !self.doc.contains(node) {
            return Err(EditorError::UnknownNode(node));
        }
        match self
            .halted
            .iter()
            .find(|&&region| self.doc.is_inside(node, region))
        {
            Some(&region) => Err(EditorError::Halted(region)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::SchemaItemDefinition;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.register("$root", SchemaItemDefinition::new()).unwrap();
        schema
            .register("$block", SchemaItemDefinition::new().allow_in("$root"))
            .unwrap();
        schema
            .register("$text", SchemaItemDefinition::new().allow_in("$block"))
            .unwrap();
        schema
            .register(
                "paragraph",
                SchemaItemDefinition::new()
                    .inherit_all_from("$block")
                    .allow_attributes(&["alignment"]),
            )
            .unwrap();
        schema
    }

    #[test]
    fn test_operations_are_recorded() {
        let schema = schema();
        let mut doc = Document::new();
        let mut selection = Selection::Empty;
        let halted = FxHashSet::default();
        let mut writer = Writer::new(&mut doc, &schema, &mut selection, &halted);

        let p = writer.create_element("paragraph", &[]).unwrap();
        let t = writer.create_text("hello");
        writer.append(t, p).unwrap();
        let root = writer.document().root();
        writer.append(p, root).unwrap();
        writer.set_attribute(p, "alignment", "center").unwrap();
        // Setting the same value again records nothing
        writer.set_attribute(p, "alignment", "center").unwrap();

        let batch = writer.into_batch();
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.operations[2], Operation::Attribute { .. }));
        assert_eq!(doc.text_content(doc.root()), "hello");
    }

    #[test]
    fn test_schema_checks() {
        let schema = schema();
        let mut doc = Document::new();
        let mut selection = Selection::Empty;
        let halted = FxHashSet::default();
        let mut writer = Writer::new(&mut doc, &schema, &mut selection, &halted);

        let root = writer.document().root();
        let t = writer.create_text("loose");
        let err = writer.append(t, root).unwrap_err();
        assert!(err.is_validation());

        let p = writer.create_element("paragraph", &[]).unwrap();
        assert!(writer.set_attribute(p, "colspan", 2i64).is_err());
        assert!(writer.create_element("nonsense", &[]).is_err());
    }

    #[test]
    fn test_halted_region_refuses_changes() {
        let schema = schema();
        let mut doc = Document::new();
        let mut selection = Selection::Empty;
        let mut halted = FxHashSet::default();

        let p = {
            let mut writer = Writer::new(&mut doc, &schema, &mut selection, &halted);
            let p = writer.create_element("paragraph", &[]).unwrap();
            let root = writer.document().root();
            writer.append(p, root).unwrap();
            p
        };
        halted.insert(p);

        let mut writer = Writer::new(&mut doc, &schema, &mut selection, &halted);
        let t = writer.create_text("x");
        assert!(matches!(writer.append(t, p), Err(EditorError::Halted(_))));
        assert!(matches!(writer.remove(p), Err(EditorError::Halted(_))));
    }

    #[test]
    fn test_apply_fragment_mutation() {
        let schema = schema();
        let mut doc = Document::new();
        let mut selection = Selection::Empty;
        let halted = FxHashSet::default();
        let mut writer = Writer::new(&mut doc, &schema, &mut selection, &halted);
        let root = writer.document().root();

        writer
            .apply(&Mutation::Insert {
                parent: root,
                index: 0,
                fragment: Fragment::element("paragraph").with_child(Fragment::text("abc")),
            })
            .unwrap();
        assert_eq!(writer.document().text_content(root), "abc");
    }
}
