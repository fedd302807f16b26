//! Table commands
//!
//! | Command                                         | Module         |
//! |-------------------------------------------------|----------------|
//! | `insertTable`                                   | `insert_table` |
//! | `insertTableRowAbove` / `Below`                 | `insert_row`   |
//! | `insertTableColumnLeft` / `Right`               | `insert_column`|
//! | `removeTableRow`                                | `remove_row`   |
//! | `removeTableColumn`                             | `remove_column`|
//! | `splitTableCellVertically` / `Horizontally`     | `split_cell`   |
//! | `mergeTableCells`                               | `merge_cells`  |
//! | `mergeTableCellRight` / `Left` / `Down` / `Up`  | `merge_cell`   |
//! | `setTableRowHeader` / `setTableColumnHeader`    | `set_header`   |
//! | `selectTableRow` / `selectTableColumn`          | `select`       |
//!
//! The rows (columns) a selection covers run from the first row (column) a
//! selected cell is anchored in to the last one a selected cell spans into.

pub mod insert_column;
pub mod insert_row;
pub mod insert_table;
pub mod merge_cell;
pub mod merge_cells;
pub mod remove_column;
pub mod remove_row;
pub mod select;
pub mod set_header;
pub mod split_cell;

pub use insert_column::InsertColumnCommand;
pub use insert_row::InsertRowCommand;
pub use insert_table::InsertTableCommand;
pub use merge_cell::{MergeCellCommand, MergeDirection};
pub use merge_cells::MergeCellsCommand;
pub use remove_column::RemoveColumnCommand;
pub use remove_row::RemoveRowCommand;
pub use select::{SelectColumnCommand, SelectRowCommand};
pub use set_header::{SetHeaderColumnCommand, SetHeaderRowCommand};
pub use split_cell::{SplitCellCommand, SplitDirection};

use crate::core::commands::CommandRegistry;
use crate::core::editor::Editor;
use crate::core::model::{Document, NodeId, Selection};
use crate::data::constants::{
    INSERT_COLUMN_LEFT, INSERT_COLUMN_RIGHT, INSERT_ROW_ABOVE, INSERT_ROW_BELOW, INSERT_TABLE,
    MERGE_CELLS, MERGE_CELL_DOWN, MERGE_CELL_LEFT, MERGE_CELL_RIGHT, MERGE_CELL_UP, REMOVE_COLUMN,
    REMOVE_ROW, SELECT_COLUMN, SELECT_ROW, SET_COLUMN_HEADER, SET_ROW_HEADER,
    SPLIT_CELL_HORIZONTALLY, SPLIT_CELL_VERTICALLY,
};
use crate::utils::error::{EditorError, EditorResult};

use super::utils::table_of;
use super::walker::{CellSlot, GridRect, TableMap};

/// Register every table command
pub fn register(registry: &mut CommandRegistry) {
    registry.add(INSERT_TABLE, InsertTableCommand);
    registry.add(INSERT_ROW_ABOVE, InsertRowCommand { below: false });
    registry.add(INSERT_ROW_BELOW, InsertRowCommand { below: true });
    registry.add(INSERT_COLUMN_LEFT, InsertColumnCommand { right: false });
    registry.add(INSERT_COLUMN_RIGHT, InsertColumnCommand { right: true });
    registry.add(REMOVE_ROW, RemoveRowCommand);
    registry.add(REMOVE_COLUMN, RemoveColumnCommand);
    registry.add(
        SPLIT_CELL_VERTICALLY,
        SplitCellCommand {
            direction: SplitDirection::Vertically,
        },
    );
    registry.add(
        SPLIT_CELL_HORIZONTALLY,
        SplitCellCommand {
            direction: SplitDirection::Horizontally,
        },
    );
    registry.add(MERGE_CELLS, MergeCellsCommand);
    for (name, direction) in [
        (MERGE_CELL_RIGHT, MergeDirection::Right),
        (MERGE_CELL_LEFT, MergeDirection::Left),
        (MERGE_CELL_DOWN, MergeDirection::Down),
        (MERGE_CELL_UP, MergeDirection::Up),
    ] {
        registry.add(name, MergeCellCommand { direction });
    }
    registry.add(SET_COLUMN_HEADER, SetHeaderColumnCommand);
    registry.add(SET_ROW_HEADER, SetHeaderRowCommand);
    registry.add(SELECT_ROW, SelectRowCommand);
    registry.add(SELECT_COLUMN, SelectColumnCommand);
}

/// The selected cells of one table, placed on its grid
#[derive(Debug, Clone)]
pub struct SelectedCells {
    pub table: NodeId,
    pub map: TableMap,
    /// In reading order
    pub slots: Vec<CellSlot>,
}

impl SelectedCells {
    /// Selected cells, or `None` when the selection is not in a table
    pub fn of(editor: &Editor) -> Option<Self> {
        let doc = editor.document();
        let cells = editor.selection().selected_cells(doc);
        let table = table_of(doc, *cells.first()?)?;
        let map = TableMap::build(doc, table);
        let mut slots: Vec<CellSlot> = cells
            .iter()
            .filter_map(|&cell| map.cell_slot(cell).cloned())
            .collect();
        if slots.is_empty() {
            return None;
        }
        slots.sort_by_key(|slot| (slot.row, slot.column));
        slots.dedup_by_key(|slot| slot.cell);
        Some(Self { table, map, slots })
    }

    /// Like [`SelectedCells::of`], as a validation error
    pub fn require(editor: &Editor) -> EditorResult<Self> {
        Self::of(editor).ok_or_else(|| EditorError::invalid_selection("the selection is not in a table"))
    }

    pub fn first(&self) -> &CellSlot {
        &self.slots[0]
    }

    pub fn is_single(&self) -> bool {
        self.slots.len() == 1
    }

    pub fn first_row(&self) -> usize {
        self.slots.iter().map(|s| s.row).min().unwrap_or(0)
    }

    pub fn last_row(&self) -> usize {
        self.slots.iter().map(CellSlot::last_row).max().unwrap_or(0)
    }

    pub fn first_column(&self) -> usize {
        self.slots.iter().map(|s| s.column).min().unwrap_or(0)
    }

    pub fn last_column(&self) -> usize {
        self.slots.iter().map(CellSlot::last_column).max().unwrap_or(0)
    }

    /// Bounding rectangle of the selected cells
    pub fn rect(&self) -> GridRect {
        GridRect {
            first_row: self.first_row(),
            last_row: self.last_row(),
            first_column: self.first_column(),
            last_column: self.last_column(),
        }
    }
}

/// Caret placed at the start of a cell's content
pub fn caret_in(doc: &Document, cell: NodeId) -> Selection {
    Selection::Caret(doc.children(cell).first().copied().unwrap_or(cell))
}

/// Caret in whatever cell now covers the slot closest to `(row, column)`
pub fn caret_near(doc: &Document, table: NodeId, row: usize, column: usize) -> Selection {
    let map = TableMap::build(doc, table);
    if map.row_count() == 0 || map.column_count() == 0 {
        return Selection::Empty;
    }
    let row = row.min(map.row_count() - 1);
    let column = column.min(map.column_count() - 1);
    match map.slot(row, column) {
        Some(slot) => caret_in(doc, slot.cell),
        None => Selection::Empty,
    }
}
