//! Table editing
//!
//! Model structure:
//!
//! ```text
//! table[headingRows, headingColumns]
//! └── tableRow
//!     └── tableCell[colspan, rowspan]
//!         └── paragraph | table | ...
//! ```
//!
//! Grid positions are derived by [`walker::TableMap`]. The post-fixers keep
//! every table rectangular and every cell non-empty; the commands only ever
//! compute batches and leave the repairs to them.
//!
//! # Module Structure
//!
//! - `walker`: grid map
//! - `utils`: span parsing and shared helpers
//! - `upcast` / `downcast`: converters
//! - `postfixers`: invariant repairs
//! - `commands`: the named table commands

pub mod commands;
pub mod downcast;
pub mod postfixers;
pub mod upcast;
pub mod utils;
pub mod walker;

pub use walker::{CellSlot, GridRect, TableMap};

use crate::core::editor::{Feature, Services};
use crate::core::model::{Document, NodeId};
use crate::core::schema::{Schema, SchemaItemDefinition};
use crate::data::constants::{
    BLOCK, COLSPAN, CONFIG_DEFAULT_HEADING_COLUMNS, CONFIG_DEFAULT_HEADING_ROWS, HEADING_COLUMNS,
    HEADING_ROWS, HTML_ATTRIBUTES, ROWSPAN, TABLE, TABLE_CAPTION, TABLE_CELL, TABLE_FIGURE,
    TABLE_ROW,
};
use crate::utils::error::EditorResult;

/// Tables, their converters, post-fixers and commands
pub struct TableEditing;

impl Feature for TableEditing {
    fn name(&self) -> &'static str {
        "table"
    }

    fn register(&self, services: &mut Services<'_>) -> EditorResult<()> {
        register_schema(services.schema())?;

        for converter in upcast::converters() {
            services.conversion.add_upcast(converter);
        }
        downcast::register(services.conversion);

        for fixer in postfixers::post_fixers() {
            services.add_post_fixer(fixer);
        }

        commands::register(services.commands);

        services.config.define(CONFIG_DEFAULT_HEADING_ROWS, 0i64);
        services.config.define(CONFIG_DEFAULT_HEADING_COLUMNS, 0i64);
        Ok(())
    }
}

/// Table schema items. Needs the paragraph schema (`$block`) in place.
pub fn register_schema(schema: &mut Schema) -> EditorResult<()> {
    schema.register(
        TABLE,
        SchemaItemDefinition::new()
            .allow_where(BLOCK)
            .allow_in(TABLE_FIGURE)
            .allow_attributes(&[HEADING_ROWS, HEADING_COLUMNS])
            .object()
            .block(),
    )?;
    schema.register(TABLE_ROW, SchemaItemDefinition::new().allow_in(TABLE).limit())?;
    schema.register(
        TABLE_CELL,
        SchemaItemDefinition::new()
            .allow_in(TABLE_ROW)
            .allow_children(BLOCK)
            .allow_attributes(&[COLSPAN, ROWSPAN])
            .limit()
            .selectable(),
    )?;
    schema.register(
        TABLE_FIGURE,
        SchemaItemDefinition::new()
            .allow_where(BLOCK)
            .allow_attributes(&[HTML_ATTRIBUTES])
            .object()
            .block(),
    )?;
    schema.register(
        TABLE_CAPTION,
        SchemaItemDefinition::new()
            .allow_in(TABLE_FIGURE)
            .allow_content_of(BLOCK)
            .limit(),
    )
}

/// Every table of the document in document order, nested ones included
pub fn tables(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&node| doc.is_element(node, TABLE))
        .collect()
}

/// Cell covering a grid slot of a table
pub fn cell_at(doc: &Document, table: NodeId, row: usize, column: usize) -> Option<NodeId> {
    TableMap::build(doc, table)
        .slot(row, column)
        .map(|slot| slot.cell)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use crate::core::model::{AttributeValue, Document, NodeData, NodeId};
    use crate::data::constants::{COLSPAN, PARAGRAPH, ROWSPAN, TABLE, TABLE_CELL, TABLE_ROW};

    fn element(name: &str, attributes: BTreeMap<String, AttributeValue>) -> NodeData {
        NodeData::Element {
            name: name.to_string(),
            attributes,
        }
    }

    /// Build a bare table from `(rowspan, colspan)` pairs, one slice per row
    pub(crate) fn build_table(rows: &[&[(usize, usize)]]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let table = doc.alloc(element(TABLE, BTreeMap::new()));
        doc.insert_child(doc.root(), 0, table).unwrap();
        for (r, cells) in rows.iter().enumerate() {
            let row = doc.alloc(element(TABLE_ROW, BTreeMap::new()));
            doc.insert_child(table, r, row).unwrap();
            for (c, &(rowspan, colspan)) in cells.iter().enumerate() {
                let mut attributes = BTreeMap::new();
                if rowspan > 1 {
                    attributes.insert(ROWSPAN.to_string(), AttributeValue::from(rowspan));
                }
                if colspan > 1 {
                    attributes.insert(COLSPAN.to_string(), AttributeValue::from(colspan));
                }
                let cell = doc.alloc(element(TABLE_CELL, attributes));
                doc.insert_child(row, c, cell).unwrap();
                let paragraph = doc.alloc(element(PARAGRAPH, BTreeMap::new()));
                doc.insert_child(cell, 0, paragraph).unwrap();
            }
        }
        (doc, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::constants::{PARAGRAPH, ROOT};
    use crate::features::paragraph;

    #[test]
    fn test_schema() {
        let mut schema = Schema::new();
        paragraph::register_schema(&mut schema).unwrap();
        register_schema(&mut schema).unwrap();

        assert!(schema.check_child(ROOT, TABLE));
        assert!(schema.check_child(TABLE, TABLE_ROW));
        assert!(schema.check_child(TABLE_ROW, TABLE_CELL));
        assert!(schema.check_child(TABLE_CELL, PARAGRAPH));
        assert!(schema.check_child(TABLE_CELL, TABLE));
        assert!(schema.check_child(TABLE_FIGURE, TABLE));
        assert!(schema.check_child(TABLE_FIGURE, TABLE_CAPTION));
        assert!(schema.check_child(TABLE_CAPTION, "$text"));
        assert!(!schema.check_child(TABLE, PARAGRAPH));
        assert!(!schema.check_child(TABLE_ROW, PARAGRAPH));
        assert!(!schema.check_child(ROOT, TABLE_CELL));
        assert!(schema.is_object(TABLE));
        assert!(schema.is_limit(TABLE_CELL));
    }

    #[test]
    fn test_cell_lookup() {
        let (doc, table) = test_support::build_table(&[&[(1, 2)], &[(1, 1), (1, 1)]]);
        assert_eq!(tables(&doc), vec![table]);
        assert_eq!(cell_at(&doc, table, 0, 0), cell_at(&doc, table, 0, 1));
        assert_ne!(cell_at(&doc, table, 1, 0), cell_at(&doc, table, 1, 1));
        assert_eq!(cell_at(&doc, table, 2, 0), None);
    }
}
