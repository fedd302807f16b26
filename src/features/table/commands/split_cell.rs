//! `splitTableCellVertically` / `splitTableCellHorizontally`

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::data::constants::{COLSPAN, ROWSPAN};
use crate::features::table::utils::{create_empty_cell, update_span};
use crate::features::table::walker::CellSlot;
use crate::utils::error::{EditorError, EditorResult};

use super::SelectedCells;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    /// Into a left and a right cell (halves the colspan)
    Vertically,
    /// Into an upper and a lower cell (halves the rowspan)
    Horizontally,
}

/// Split one spanning cell in two
///
/// The original cell keeps the larger half and its content; the new empty
/// cell takes the rest.
pub struct SplitCellCommand {
    pub direction: SplitDirection,
}

impl SplitCellCommand {
    fn span(&self, slot: &CellSlot) -> usize {
        match self.direction {
            SplitDirection::Vertically => slot.colspan,
            SplitDirection::Horizontally => slot.rowspan,
        }
    }
}

impl Command for SplitCellCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor)
            .is_some_and(|selected| selected.is_single() && self.span(selected.first()) > 1)
    }

    fn execute(&self, editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        if !selected.is_single() {
            return Err(EditorError::invalid_selection("only a single cell can be split"));
        }
        let slot = selected.first().clone();
        let span = self.span(&slot);
        if span < 2 {
            return Err(EditorError::invalid_operation(format!(
                "a cell spanning {} can not be split",
                span
            )));
        }
        let kept = span.div_ceil(2);
        let rest = span - kept;

        tracing::debug!(direction = ?self.direction, span, kept, "splitting table cell");
        let map = &selected.map;
        editor.change(|writer| match self.direction {
            SplitDirection::Vertically => {
                update_span(writer, slot.cell, COLSPAN, kept)?;
                let cell = create_empty_cell(writer, slot.rowspan, rest)?;
                let row = map
                    .row(slot.row)
                    .ok_or_else(|| EditorError::invalid_operation("cell row is missing"))?;
                writer.insert(cell, row, slot.index_in_row + 1)
            }
            SplitDirection::Horizontally => {
                update_span(writer, slot.cell, ROWSPAN, kept)?;
                let cell = create_empty_cell(writer, rest, slot.colspan)?;
                let target = slot.row + kept;
                let row = map
                    .row(target)
                    .ok_or_else(|| EditorError::invalid_operation("cell row is missing"))?;
                writer.insert(cell, row, map.cell_index_for_column(target, slot.column))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Selection;
    use crate::data::constants::{SPLIT_CELL_HORIZONTALLY, SPLIT_CELL_VERTICALLY};
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
    fn test_split_colspan_in_halves() {
        let mut editor = editor_at(
            "<table><tr><td colspan=\"4\">a</td></tr>\
             <tr><td>1</td><td>2</td><td>3</td><td>4</td></tr></table>",
            0,
            0,
        );
        editor.execute(SPLIT_CELL_VERTICALLY, &CommandParams::new()).unwrap();
        assert_eq!(
            editor.get_data(),
            "<figure class=\"table\"><table><tbody>\
             <tr><td colspan=\"2\">a</td><td colspan=\"2\"></td></tr>\
             <tr><td>1</td><td>2</td><td>3</td><td>4</td></tr>\
             </tbody></table></figure>"
        );
        assert_eq!(editor.editing_markup(), editor.fresh_editing_markup());
    }

    #[test]
    fn test_split_odd_rowspan() {
        let mut editor = editor_at(
            "<table><tr><td rowspan=\"3\">a</td><td>b</td></tr>\
             <tr><td>c</td></tr><tr><td>d</td></tr></table>",
            0,
            0,
        );
        editor.execute(SPLIT_CELL_HORIZONTALLY, &CommandParams::new()).unwrap();
        assert_eq!(
            editor.get_data(),
            "<figure class=\"table\"><table><tbody>\
             <tr><td rowspan=\"2\">a</td><td>b</td></tr>\
             <tr><td>c</td></tr>\
             <tr><td></td><td>d</td></tr>\
             </tbody></table></figure>"
        );
    }

    #[test]
    fn test_plain_cell_cannot_be_split() {
        let mut editor = editor_at("<table><tr><td>a</td><td>b</td></tr></table>", 0, 0);
        assert!(!editor.is_enabled(SPLIT_CELL_VERTICALLY));
        let outcome = editor
            .execute(SPLIT_CELL_VERTICALLY, &CommandParams::new())
            .unwrap();
        assert!(!outcome.is_applied());
    }
}
