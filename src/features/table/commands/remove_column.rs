//! `removeTableColumn`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::Writer;
use crate::data::constants::{COLSPAN, HEADING_COLUMNS};
use crate::features::table::utils::{update_heading, update_span};
use crate::features::table::walker::{heading_count, TableMap};
use crate::utils::error::{EditorError, EditorResult};

use super::{caret_near, SelectedCells};

/// Remove the columns the selection covers
pub struct RemoveColumnCommand;

impl Command for RemoveColumnCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some_and(|selected| {
            selected.last_column() - selected.first_column() + 1 < selected.map.column_count()
        })
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let (first, last) = (selected.first_column(), selected.last_column());
        if last - first + 1 >= selected.map.column_count() {
            return Err(EditorError::invalid_operation(
                "removing every column would leave an empty table",
            ));
        }
        let row = selected.first_row();
        let heading_columns = heading_count(editor.document(), selected.table, HEADING_COLUMNS);

        tracing::debug!(first, last, "removing table columns");
        editor.change(|writer| {
            remove_columns(writer, &selected.map, first, last)?;
            if first < heading_columns {
                let removed = last.min(heading_columns - 1) - first + 1;
                update_heading(
                    writer,
                    selected.table,
                    HEADING_COLUMNS,
                    heading_columns - removed,
                )?;
            }
            let caret = caret_near(writer.document(), selected.table, row, first);
            writer.set_selection(caret);
            Ok(())
        })
    }
}

/// Remove columns `first..=last`
///
/// Cells lying entirely in the range go; cells reaching out of it shrink.
/// Rows left without cells are cleaned up by the layout post-fixer.
fn remove_columns(
    writer: &mut Writer<'_>,
    map: &TableMap,
    first: usize,
    last: usize,
) -> EditorResult<()> {
    for slot in map.cells_in_columns(first, last) {
        if slot.column >= first && slot.last_column() <= last {
            writer.remove(slot.cell)?;
        } else {
            let overlap = slot.last_column().min(last) - slot.column.max(first) + 1;
            update_span(writer, slot.cell, COLSPAN, slot.colspan - overlap)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Selection;
    use crate::data::constants::REMOVE_COLUMN;
    use crate::features::table::{cell_at, tables};
    use pretty_assertions::assert_eq;

    fn editor_at(markup: &str, row: usize, column: usize) -> Editor {
        let mut editor = Editor::table_editor().unwrap();
        editor.set_data(markup).unwrap();
        let doc = editor.document();
        let cell = cell_at(doc, tables(doc)[0], row, column).unwrap();
        editor.set_selection(Selection::Caret(cell)).unwrap();
        editor
    }

    #[test]
    fn test_wide_cells_shrink() {
        let mut editor = editor_at(
            "<table><tr><td colspan=\"2\">a</td><td>b</td></tr>\
             <tr><td>c</td><td>d</td><td>e</td></tr></table>",
            1,
            1,
        );
        editor.execute(REMOVE_COLUMN, &CommandParams::new()).unwrap();
        assert_eq!(
            editor.get_data(),
            "<figure class=\"table\"><table><tbody>\
             <tr><td>a</td><td>b</td></tr><tr><td>c</td><td>e</td></tr>\
             </tbody></table></figure>"
        );
        assert_eq!(editor.editing_markup(), editor.fresh_editing_markup());
    }

    #[test]
    fn test_heading_columns_shrink() {
        let mut editor = editor_at(
            "<table><tr><th>a</th><th>b</th><td>c</td></tr></table>",
            0,
            0,
        );
        editor.execute(REMOVE_COLUMN, &CommandParams::new()).unwrap();
        assert_eq!(
            editor.get_data(),
            "<figure class=\"table\"><table><tbody>\
             <tr><th>b</th><td>c</td></tr>\
             </tbody></table></figure>"
        );
    }

    #[test]
    fn test_last_column_cannot_be_removed() {
        let mut editor = editor_at("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>", 0, 0);
        assert!(!editor.is_enabled(REMOVE_COLUMN));
    }
}
