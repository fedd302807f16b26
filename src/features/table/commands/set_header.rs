//! `setTableRowHeader` / `setTableColumnHeader`
//!
//! The commands only move the heading boundary; cells left straddling it are
//! split by the heading post-fixer in the same batch.

use crate::core::commands::{Command, CommandParams};
use crate::core::editor::Editor;
use crate::data::constants::{HEADING_COLUMNS, HEADING_ROWS};
use crate::features::table::utils::update_heading;
use crate::features::table::walker::heading_count;
use crate::utils::error::EditorResult;

use super::SelectedCells;

/// Heading rows: everything up to and including the selected rows
pub struct SetHeaderRowCommand;

/// Heading columns: everything up to and including the selected columns
pub struct SetHeaderColumnCommand;

impl Command for SetHeaderRowCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some()
    }

    fn execute(&self, editor: &mut Editor, params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        set_heading(
            editor,
            &selected,
            HEADING_ROWS,
            (selected.first_row(), selected.last_row()),
            params.force_value,
        )
    }

    fn value(&self, editor: &Editor) -> Option<bool> {
        let selected = SelectedCells::of(editor)?;
        let heading = heading_count(editor.document(), selected.table, HEADING_ROWS);
        Some(selected.last_row() < heading)
    }
}

impl Command for SetHeaderColumnCommand {
    fn is_enabled(&self, editor: &Editor) -> bool {
        SelectedCells::of(editor).is_some()
    }

    fn execute(&self, editor: &mut Editor, params: &CommandParams) -> EditorResult<()> {
        let selected = SelectedCells::require(editor)?;
        set_heading(
            editor,
            &selected,
            HEADING_COLUMNS,
            (selected.first_column(), selected.last_column()),
            params.force_value,
        )
    }

    fn value(&self, editor: &Editor) -> Option<bool> {
        let selected = SelectedCells::of(editor)?;
        let heading = heading_count(editor.document(), selected.table, HEADING_COLUMNS);
        Some(selected.last_column() < heading)
    }
}

fn set_heading(
    editor: &mut Editor,
    selected: &SelectedCells,
    key: &'static str,
    (first, last): (usize, usize),
    force_value: Option<bool>,
) -> EditorResult<()> {
    let current = heading_count(editor.document(), selected.table, key);
    let count = next_heading_count(current, first, last, force_value);
    if count == current {
        return Ok(());
    }
    tracing::debug!(key, current, count, "moving table heading boundary");
    let table = selected.table;
    editor.change(|writer| update_heading(writer, table, key, count))
}

/// New heading count for a selection covering `first..=last`
///
/// Toggling sets the boundary right after the selection, or clears the
/// heading when it is already there. Forcing on does the former; forcing off
/// turns the selection and everything after it into body.
fn next_heading_count(current: usize, first: usize, last: usize, force_value: Option<bool>) -> usize {
    let after = last + 1;
    match force_value {
        None if current == after => 0,
        None | Some(true) => after,
        Some(false) => current.min(first),
    }
}
