//! `insertTableColumnLeft` / `insertTableColumnRight`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::Writer;
use crate::data::constants::{COLSPAN, HEADING_COLUMNS};
use crate::features::table::utils::{create_empty_cell, update_heading, update_span};
use crate::features::table::walker::{heading_count, TableMap};
use crate::utils::error::EditorResult;

use super::SelectedCells;

/// Insert one column left of the first or right of the last selected column
pub struct InsertColumnCommand {
    pub right: bool,
}

impl Command for InsertColumnCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some()
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let at = if self.right {
            selected.last_column() + 1
        } else {
            selected.first_column()
        };
        let heading_columns = heading_count(editor.document(), selected.table, HEADING_COLUMNS);

        tracing::debug!(at, right = self.right, "inserting table column");
        editor.change(|writer| {
            insert_column(writer, &selected.map, at)?;
            if at < heading_columns {
                update_heading(writer, selected.table, HEADING_COLUMNS, heading_columns + 1)?;
            }
            Ok(())
        })
    }
}

/// Insert a column at grid column `at`
///
/// Every row gets a new cell there, except where a cell spans across the
/// insertion point: that cell grows by one column.
fn insert_column(writer: &mut Writer<'_>, map: &TableMap, at: usize) -> EditorResult<()> {
    if at == 0 || at >= map.column_count() {
        for &row in map.rows() {
            let cell = create_empty_cell(writer, 1, 1)?;
            let index = if at == 0 {
                0
            } else {
                writer.document().child_count(row)
            };
            writer.insert(cell, row, index)?;
        }
        return Ok(());
    }

    for (r, &row) in map.rows().iter().enumerate() {
        let Some(slot) = map.slot(r, at) else {
            continue;
        };
        if slot.column < at {
            if slot.row == r {
                update_span(writer, slot.cell, COLSPAN, slot.colspan + 1)?;
            }
            continue;
        }
        let cell = create_empty_cell(writer, 1, 1)?;
        writer.insert(cell, row, map.cell_index_for_column(r, at))?;
    }
    Ok(())
}
