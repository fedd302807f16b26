//! `mergeTableCells`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::{Document, NodeId, Writer};
use crate::data::constants::{COLSPAN, HEADING_COLUMNS, HEADING_ROWS, ROWSPAN};
use crate::features::table::utils::{is_cell_empty, update_span};
use crate::features::table::walker::{heading_count, GridRect};
use crate::utils::error::{EditorError, EditorResult};

use super::{caret_in, SelectedCells};

/// Merge a rectangular multi-cell selection into its top-left cell
pub struct MergeCellsCommand;

impl Command for MergeCellsCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor)
            .is_some_and(|selected| check_mergeable(editor.document(), &selected).is_ok())
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let rect = check_mergeable(editor.document(), &selected)?;
        let target = selected.first().cell;
        let others: Vec<NodeId> = selected.slots[1..].iter().map(|slot| slot.cell).collect();

        tracing::debug!(cells = selected.slots.len(), ?rect, "merging table cells");
        editor.change(|writer| {
            update_span(writer, target, ROWSPAN, rect.last_row - rect.first_row + 1)?;
            update_span(writer, target, COLSPAN, rect.last_column - rect.first_column + 1)?;
            for cell in others {
                merge_content(writer, cell, target)?;
                writer.remove(cell)?;
            }
            let caret = caret_in(writer.document(), target);
            writer.set_selection(caret);
            Ok(())
        })
    }
}

/// The rectangle to merge, or why the selection can not be merged
fn check_mergeable(doc: &Document, selected: &SelectedCells) -> EditorResult<GridRect> {
    if selected.is_single() {
        return Err(EditorError::invalid_selection("select at least two cells to merge"));
    }
    let rect = selected.rect();
    let area: usize = selected
        .slots
        .iter()
        .map(|slot| slot.rowspan * slot.colspan)
        .sum();
    if area != rect.area() || !selected.map.is_rectangle_filled(&rect) {
        return Err(EditorError::invalid_selection(
            "the selected cells do not form a rectangle",
        ));
    }
    let heading_rows = heading_count(doc, selected.table, HEADING_ROWS);
    let heading_columns = heading_count(doc, selected.table, HEADING_COLUMNS);
    if crosses(rect.first_row, rect.last_row, heading_rows)
        || crosses(rect.first_column, rect.last_column, heading_columns)
    {
        return Err(EditorError::invalid_selection(
            "cells of the heading and the body can not be merged",
        ));
    }
    Ok(rect)
}

/// Whether `first..=last` has indexes on both sides of a heading boundary
pub(super) fn crosses(first: usize, last: usize, boundary: usize) -> bool {
    first < boundary && last >= boundary
}

/// Move the content of `from` to the end of `into`, unless it is empty
///
/// An empty target is cleared first so that the merged cell does not start
/// with an empty paragraph.
pub(super) fn merge_content(writer: &mut Writer<'_>, from: NodeId, into: NodeId) -> EditorResult<()> {
    if is_cell_empty(writer.document(), from) {
        return Ok(());
    }
    if is_cell_empty(writer.document(), into) {
        for child in writer.document().children(into).to_vec() {
            writer.remove(child)?;
        }
    }
    for child in writer.document().children(from).to_vec() {
        let index = writer.document().child_count(into);
        writer.move_to(child, into, index)?;
    }
    Ok(())
}
