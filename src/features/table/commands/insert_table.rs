//! `insertTable`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::{Document, NodeId};
use crate::core::schema::Schema;
use crate::data::constants::{
    CONFIG_DEFAULT_HEADING_COLUMNS, CONFIG_DEFAULT_HEADING_ROWS, DEFAULT_TABLE_COLUMNS,
    DEFAULT_TABLE_ROWS, HEADING_COLUMNS, HEADING_ROWS, TABLE,
};
use crate::features::table::utils::{create_empty_row, update_heading};
use crate::utils::error::{EditorError, EditorResult};

use super::caret_in;

/// Insert a `rows` × `columns` table of empty cells after the block holding
/// the selection, or at the end of the document without one
pub struct InsertTableCommand;

impl Command for InsertTableCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        let doc = editor.document();
        insertion_point(doc, editor.schema(), editor.selection().anchor()).is_some()
    }

    fn execute(&self, editor: &mut Editor, params: &CommandParams) -> EditorResult<()> {
        let rows = params.rows.unwrap_or(DEFAULT_TABLE_ROWS);
        let columns = params.columns.unwrap_or(DEFAULT_TABLE_COLUMNS);
        if rows == 0 || columns == 0 {
            return Err(EditorError::invalid_operation(format!(
                "a table needs at least one row and one column, got {}x{}",
                rows, columns
            )));
        }
        let heading_rows = editor
            .config()
            .get_usize(CONFIG_DEFAULT_HEADING_ROWS, 0)?
            .min(rows);
        let heading_columns = editor
            .config()
            .get_usize(CONFIG_DEFAULT_HEADING_COLUMNS, 0)?
            .min(columns);
        let (parent, index) =
            insertion_point(editor.document(), editor.schema(), editor.selection().anchor())
                .ok_or_else(|| EditorError::invalid_selection("a table cannot be inserted here"))?;

        tracing::debug!(rows, columns, heading_rows, heading_columns, "inserting table");
        editor.change(|writer| {
            let table = writer.create_element(TABLE, &[])?;
            update_heading(writer, table, HEADING_ROWS, heading_rows)?;
            update_heading(writer, table, HEADING_COLUMNS, heading_columns)?;
            for _ in 0..rows {
                let row = create_empty_row(writer, columns)?;
                writer.append(row, table)?;
            }
            writer.insert(table, parent, index)?;

            let doc = writer.document();
            let first_cell = doc
                .children(table)
                .first()
                .and_then(|&row| doc.children(row).first().copied());
            if let Some(cell) = first_cell {
                let caret = caret_in(doc, cell);
                writer.set_selection(caret);
            }
            Ok(())
        })
    }
}

/// Parent and offset for a new table: right after the closest block around
/// `anchor` whose parent accepts a table
fn insertion_point(
    doc: &Document,
    schema: &Schema,
    anchor: Option<NodeId>,
) -> Option<(NodeId, usize)> {
    let root = doc.root();
    let Some(anchor) = anchor else {
        let accepts = doc.name(root).is_some_and(|name| schema.check_child(name, TABLE));
        return accepts.then(|| (root, doc.child_count(root)));
    };
    std::iter::once(anchor)
        .chain(doc.ancestors(anchor))
        .filter(|&node| doc.name(node).is_some_and(|name| schema.is_block(name)))
        .find_map(|block| {
            let parent = doc.parent(block)?;
            let parent_name = doc.name(parent)?;
            schema
                .check_child(parent_name, TABLE)
                .then(|| (parent, doc.index_of(block).unwrap_or(0) + 1))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Selection;
    use crate::data::constants::INSERT_TABLE;
    use crate::utils::config::Config;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_default_table() {
        let mut editor = Editor::table_editor().unwrap();
        editor.set_data("<p>a</p><p>b</p>").unwrap();
        let first = editor.document().children(editor.document().root())[0];
        editor.set_selection(Selection::Caret(first)).unwrap();

        let outcome = editor.execute(INSERT_TABLE, &CommandParams::new()).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(
            editor.get_data(),
            "<p>a</p><figure class=\"table\"><table><tbody>\
             <tr><td></td><td></td></tr>\
             <tr><td></td><td></td></tr>\
             </tbody></table></figure><p>b</p>"
        );
        assert_eq!(editor.editing_markup(), editor.fresh_editing_markup());
    }

    #[test]
    fn test_headings_from_config_are_clamped() {
        let mut config = Config::new();
        config.set(CONFIG_DEFAULT_HEADING_ROWS, 5i64);
        config.set(CONFIG_DEFAULT_HEADING_COLUMNS, 1i64);
        let mut editor = Editor::table_editor_with_config(config).unwrap();

        editor
            .execute(INSERT_TABLE, &CommandParams::with_size(2, 3))
            .unwrap();
        let doc = editor.document();
        let table = doc.children(doc.root())[0];
        assert_eq!(doc.int_attribute(table, HEADING_ROWS, 0), 2);
        assert_eq!(doc.int_attribute(table, HEADING_COLUMNS, 0), 1);
        assert!(matches!(editor.selection(), Selection::Caret(_)));
    }

    #[test]
    fn test_zero_size_is_refused() {
        let mut editor = Editor::table_editor().unwrap();
        let outcome = editor
            .execute(INSERT_TABLE, &CommandParams::with_size(0, 2))
            .unwrap();
        assert!(!outcome.is_applied());
        assert_eq!(editor.get_data(), "");
    }
}
