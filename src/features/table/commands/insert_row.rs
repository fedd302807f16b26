//! `insertTableRowAbove` / `insertTableRowBelow`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::{NodeId, Writer};
use crate::data::constants::{HEADING_ROWS, ROWSPAN, TABLE_ROW};
use crate::features::table::utils::{create_empty_cell, update_heading, update_span};
use crate::features::table::walker::{heading_count, TableMap};
use crate::utils::error::EditorResult;

use super::SelectedCells;

/// Insert one row above the first or below the last selected row
pub struct InsertRowCommand {
    pub below: bool,
}

impl Command for InsertRowCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some()
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let at = if self.below {
            selected.last_row() + 1
        } else {
            selected.first_row()
        };
        // Copy the row the new one is inserted next to
        let reference = if self.below { at - 1 } else { at };
        let heading_rows = heading_count(editor.document(), selected.table, HEADING_ROWS);

        tracing::debug!(at, below = self.below, "inserting table row");
        editor.change(|writer| {
            insert_row(writer, &selected.map, at, reference)?;
            if at < heading_rows {
                update_heading(writer, selected.table, HEADING_ROWS, heading_rows + 1)?;
            }
            Ok(())
        })
    }
}

/// Insert a row at `at` shaped like the `reference` row
///
/// Cells spanning across the insertion point grow by one row instead of
/// getting a new cell below them. At the table edges nothing spans the
/// insertion point, so every reference cell gets a copy.
fn insert_row(writer: &mut Writer<'_>, map: &TableMap, at: usize, reference: usize) -> EditorResult<NodeId> {
    let table = map.table;
    let row = writer.create_element(TABLE_ROW, &[])?;
    let mut column = 0;
    while column < map.column_count() {
        let Some(slot) = map.slot(reference, column) else {
            column += 1;
            continue;
        };
        if slot.row < at && slot.last_row() >= at {
            if slot.column == column {
                update_span(writer, slot.cell, ROWSPAN, slot.rowspan + 1)?;
            }
        } else {
            let cell = create_empty_cell(writer, 1, slot.colspan)?;
            writer.append(cell, row)?;
        }
        column = slot.last_column() + 1;
    }
    writer.insert(row, table, at.min(map.row_count()))?;
    Ok(row)
}
