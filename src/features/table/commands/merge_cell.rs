//! `mergeTableCellRight` / `Left` / `Down` / `Up`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::data::constants::{COLSPAN, HEADING_COLUMNS, HEADING_ROWS, ROWSPAN};
use crate::features::table::utils::update_span;
use crate::features::table::walker::{heading_count, CellSlot};
use crate::utils::error::{EditorError, EditorResult};

use super::merge_cells::{crosses, merge_content};
use super::{caret_in, SelectedCells};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDirection {
    Right,
    Left,
    Down,
    Up,
}

impl MergeDirection {
    fn is_horizontal(self) -> bool {
        matches!(self, MergeDirection::Right | MergeDirection::Left)
    }
}

/// Merge the selected cell with its neighbour in one direction
///
/// The neighbour must line up with the cell: same rows for a horizontal
/// merge, same columns for a vertical one. The upper or left of the two
/// cells absorbs the other.
pub struct MergeCellCommand {
    pub direction: MergeDirection,
}

impl MergeCellCommand {
    /// `(absorbing, absorbed)` slots
    fn pair(&self, editor: &Editor) -> EditorResult<(CellSlot, CellSlot)> {
        let selected = SelectedCells::require(editor)?;
        if !selected.is_single() {
            return Err(EditorError::invalid_selection("select a single cell to merge"));
        }
        let slot = selected.first();
        let map = &selected.map;
        let neighbour = match self.direction {
            MergeDirection::Right => map.slot(slot.row, slot.last_column() + 1),
            MergeDirection::Left => slot.column.checked_sub(1).and_then(|c| map.slot(slot.row, c)),
            MergeDirection::Down => map.slot(slot.last_row() + 1, slot.column),
            MergeDirection::Up => slot.row.checked_sub(1).and_then(|r| map.slot(r, slot.column)),
        }
        .ok_or_else(|| EditorError::invalid_operation("there is no cell to merge with"))?;

        let aligned = if self.direction.is_horizontal() {
            neighbour.row == slot.row && neighbour.rowspan == slot.rowspan
        } else {
            neighbour.column == slot.column && neighbour.colspan == slot.colspan
        };
        if !aligned {
            return Err(EditorError::invalid_operation(
                "the neighbouring cell does not line up with the selected one",
            ));
        }

        let (first, second) = match self.direction {
            MergeDirection::Right | MergeDirection::Down => (slot.clone(), neighbour.clone()),
            MergeDirection::Left | MergeDirection::Up => (neighbour.clone(), slot.clone()),
        };
        let doc = editor.document();
        let crossing = if self.direction.is_horizontal() {
            crosses(
                first.column,
                second.last_column(),
                heading_count(doc, selected.table, HEADING_COLUMNS),
            )
        } else {
            crosses(
                first.row,
                second.last_row(),
                heading_count(doc, selected.table, HEADING_ROWS),
            )
        };
        if crossing {
            return Err(EditorError::invalid_operation(
                "cells of the heading and the body can not be merged",
            ));
        }
        Ok((first, second))
    }
}

impl Command for MergeCellCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        self.pair(editor).is_ok()
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let (first, second) = self.pair(editor)?;

        tracing::debug!(direction = ?self.direction, cell = %first.cell, "merging table cell");
        editor.change(|writer| {
            if self.direction.is_horizontal() {
                update_span(writer, first.cell, COLSPAN, first.colspan + second.colspan)?;
            } else {
                update_span(writer, first.cell, ROWSPAN, first.rowspan + second.rowspan)?;
            }
            merge_content(writer, second.cell, first.cell)?;
            writer.remove(second.cell)?;
            let caret = caret_in(writer.document(), first.cell);
            writer.set_selection(caret);
            Ok(())
        })
    }
}
