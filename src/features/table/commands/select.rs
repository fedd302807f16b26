//! `selectTableRow` / `selectTableColumn`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::core::model::{NodeId, Selection};
use crate::utils::error::EditorResult;

use super::SelectedCells;

/// Select every cell of the rows the selection covers
pub struct SelectRowCommand;

/// Select every cell of the columns the selection covers
pub struct SelectColumnCommand;

impl Command for SelectRowCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some()
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let cells = selected
            .map
            .cells_in_rows(selected.first_row(), selected.last_row())
            .into_iter()
            .map(|slot| slot.cell)
            .collect();
        select_cells(editor, cells)
    }
}

impl Command for SelectColumnCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some()
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        let cells = selected
            .map
            .cells_in_columns(selected.first_column(), selected.last_column())
            .into_iter()
            .map(|slot| slot.cell)
            .collect();
        select_cells(editor, cells)
    }
}

fn select_cells(editor: &mut Editor, cells: Vec<NodeId>) -> EditorResult<()> {
    tracing::debug!(cells = cells.len(), "selecting table cells");
    editor.set_selection(Selection::Cells(cells))
}
