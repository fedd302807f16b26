//! `removeTableRow`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::Writer;
use crate::data::constants::{HEADING_ROWS, ROWSPAN};
use crate::features::table::utils::{update_heading, update_span};
use crate::features::table::walker::{heading_count, TableMap};
use crate::utils::error::{EditorError, EditorResult};

use super::{caret_near, SelectedCells};

/// Remove the rows the selection covers
pub struct RemoveRowCommand;

impl Command for RemoveRowCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some_and(|selected| {
            selected.last_row() - selected.first_row() + 1 < selected.map.row_count()
        })
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let (first, last) = (selected.first_row(), selected.last_row());
        if last - first + 1 >= selected.map.row_count() {
            return Err(EditorError::invalid_operation(
                "removing every row would leave an empty table",
            ));
        }
        let column = selected.first_column();
        let heading_rows = heading_count(editor.document(), selected.table, HEADING_ROWS);

        tracing::debug!(first, last, "removing table rows");
        editor.change(|writer| {
            remove_rows(writer, &selected.map, first, last)?;
            if first < heading_rows {
                let removed = last.min(heading_rows - 1) - first + 1;
                update_heading(writer, selected.table, HEADING_ROWS, heading_rows - removed)?;
            }
            let caret = caret_near(writer.document(), selected.table, first, column);
            writer.set_selection(caret);
            Ok(())
        })
    }
}

/// Remove rows `first..=last`
///
/// Cells spanning into the removed rows from above shrink. Cells anchored in
/// a removed row but reaching below it move down to the first kept row with
/// their content and the remaining height.
pub(crate) fn remove_rows(
    writer: &mut Writer<'_>,
    map: &TableMap,
    first: usize,
    last: usize,
) -> EditorResult<()> {
    let mut moved = Vec::new();
    for slot in map.cells_in_rows(first, last) {
        if slot.row < first {
            let overlap = slot.last_row().min(last) - first + 1;
            update_span(writer, slot.cell, ROWSPAN, slot.rowspan - overlap)?;
        } else if slot.last_row() > last {
            moved.push(slot);
        }
    }

    if let Some(target) = map.row(last + 1) {
        // Right to left keeps the computed offsets valid
        moved.sort_by(|a, b| b.column.cmp(&a.column));
        for slot in moved {
            let index = map.cell_index_for_column(last + 1, slot.column);
            update_span(writer, slot.cell, ROWSPAN, slot.last_row() - last)?;
            writer.move_to(slot.cell, target, index)?;
        }
    }

    for row in (first..=last).rev().filter_map(|r| map.row(r)) {
        writer.remove(row)?;
    }
    Ok(())
}
