//! Model selection
//!
//! A selection is either empty, a caret inside some node, or a set of table
//! cells (multi-cell selection). Cell selections never cross a limit element:
//! every selected cell must share the same closest object ancestor.

use super::{Document, NodeId};
use crate::core::schema::Schema;
use crate::data::constants::TABLE_CELL;
use crate::utils::error::{EditorError, EditorResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Empty,
    /// Collapsed selection inside a node
    Caret(NodeId),
    /// Whole table cells, in the order they were selected
    Cells(Vec<NodeId>),
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    /// Table cells touched by the selection
    ///
    /// A caret yields the cell it is placed in, if any.
    pub fn selected_cells(&self, doc: &Document) -> Vec<NodeId> {
        match self {
            Selection::Empty => Vec::new(),
            Selection::Caret(node) => doc
                .find_ancestor_or_self(*node, TABLE_CELL)
                .into_iter()
                .collect(),
            Selection::Cells(cells) => cells
                .iter()
                .copied()
                .filter(|&c| doc.is_element(c, TABLE_CELL))
                .collect(),
        }
    }

    /// Node that anchors the selection (caret node or first cell)
    pub fn anchor(&self) -> Option<NodeId> {
        match self {
            Selection::Empty => None,
            Selection::Caret(node) => Some(*node),
            Selection::Cells(cells) => cells.first().copied(),
        }
    }

    /// Check the selection against the document and schema
    pub fn validate(&self, doc: &Document, schema: &Schema) -> EditorResult<()> {
        match self {
            Selection::Empty => Ok(()),
            Selection::Caret(node) => {
                if !doc.is_attached(*node) {
                    return Err(EditorError::invalid_selection(format!(
                        "caret node {} is not in the document",
                        node
                    )));
                }
                Ok(())
            }
            Selection::Cells(cells) => {
                if cells.is_empty() {
                    return Err(EditorError::invalid_selection("cell selection is empty"));
                }
                let mut limit = None;
                for &cell in cells {
                    if !doc.is_element(cell, TABLE_CELL) || !doc.is_attached(cell) {
                        return Err(EditorError::invalid_selection(format!(
                            "node {} is not a table cell in the document",
                            cell
                        )));
                    }
                    let object = object_ancestor(doc, schema, cell);
                    match limit {
                        None => limit = Some(object),
                        Some(existing) if existing != object => {
                            return Err(EditorError::invalid_selection(
                                "a cell selection cannot cross a table boundary",
                            ));
                        }
                        Some(_) => {}
                    }
                }
                Ok(())
            }
        }
    }

    /// Drop parts of the selection that left the document
    pub(crate) fn prune(&mut self, doc: &Document) {
        match self {
            Selection::Empty => {}
            Selection::Caret(node) => {
                if !doc.is_attached(*node) {
                    *self = Selection::Empty;
                }
            }
            Selection::Cells(cells) => {
                cells.retain(|&c| doc.is_attached(c));
                if cells.is_empty() {
                    *self = Selection::Empty;
                }
            }
        }
    }
}

/// Closest ancestor the schema marks as an object (a limit that is also a
/// selectable unit, e.g. a table)
fn object_ancestor(doc: &Document, schema: &Schema, node: NodeId) -> Option<NodeId> {
    doc.ancestors(node).find(|&a| {
        doc.name(a)
            .is_some_and(|name| schema.is_limit(name) && schema.is_object(name))
    })
}
