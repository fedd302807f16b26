//! Table grid map
//!
//! Grid positions are never stored in the model; they are derived here from
//! the row order and the span attributes. Cells are placed row by row at the
//! first column not already covered by a cell spanning from above, the same
//! way a browser lays out an HTML table.
//!
//! A declared span can be larger than what fits: a rowspan running past the
//! last row, or a colspan running into a cell that spans down from a previous
//! row. The map records both the declared and the effective span; the
//! layout post-fixer turns the effective spans into the model values.

use crate::core::model::{Document, NodeId};
use crate::data::constants::{
    COLSPAN, HEADING_COLUMNS, HEADING_ROWS, MAX_SPAN, ROWSPAN, TABLE_CELL, TABLE_ROW,
};

/// A placed cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSlot {
    pub cell: NodeId,
    /// Row the cell is anchored in
    pub row: usize,
    /// Column the cell is anchored in
    pub column: usize,
    /// Spans that fit the grid
    pub rowspan: usize,
    pub colspan: usize,
    /// Spans as written in the model
    pub declared_rowspan: usize,
    pub declared_colspan: usize,
    /// Offset of the cell within its row element
    pub index_in_row: usize,
}

impl CellSlot {
    pub fn last_row(&self) -> usize {
        self.row + self.rowspan - 1
    }

    pub fn last_column(&self) -> usize {
        self.column + self.colspan - 1
    }

    pub fn covers(&self, row: usize, column: usize) -> bool {
        (self.row..self.row + self.rowspan).contains(&row)
            && (self.column..self.column + self.colspan).contains(&column)
    }

    pub fn is_truncated(&self) -> bool {
        self.rowspan != self.declared_rowspan || self.colspan != self.declared_colspan
    }
}

/// Rectangle of grid slots, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub first_row: usize,
    pub last_row: usize,
    pub first_column: usize,
    pub last_column: usize,
}

impl GridRect {
    pub fn area(&self) -> usize {
        (self.last_row - self.first_row + 1) * (self.last_column - self.first_column + 1)
    }

    pub fn contains(&self, slot: &CellSlot) -> bool {
        slot.row >= self.first_row
            && slot.last_row() <= self.last_row
            && slot.column >= self.first_column
            && slot.last_column() <= self.last_column
    }
}

/// Derived grid of one table
#[derive(Debug, Clone)]
pub struct TableMap {
    pub table: NodeId,
    rows: Vec<NodeId>,
    cells: Vec<CellSlot>,
    /// `grid[row][column]` → index into `cells`
    grid: Vec<Vec<Option<usize>>>,
    column_count: usize,
}

impl TableMap {
    pub fn build(doc: &Document, table: NodeId) -> Self {
        let rows: Vec<NodeId> = doc.children_named(table, TABLE_ROW).collect();
        let row_count = rows.len();
        let mut grid: Vec<Vec<Option<usize>>> = vec![Vec::new(); row_count];
        let mut cells = Vec::new();

        for (r, &row) in rows.iter().enumerate() {
            let mut column = 0;
            for (index_in_row, cell) in doc.children_named(row, TABLE_CELL).enumerate() {
                while is_taken(&grid, r, column) {
                    column += 1;
                }

                let declared_rowspan = span_of(doc, cell, ROWSPAN);
                let declared_colspan = span_of(doc, cell, COLSPAN);
                let rowspan = declared_rowspan.min(row_count - r);
                let mut colspan = 1;
                while colspan < declared_colspan && !is_taken(&grid, r, column + colspan) {
                    colspan += 1;
                }

                let index = cells.len();
                for line in grid.iter_mut().skip(r).take(rowspan) {
                    if line.len() < column + colspan {
                        line.resize(column + colspan, None);
                    }
                    for slot in &mut line[column..column + colspan] {
                        slot.get_or_insert(index);
                    }
                }

                cells.push(CellSlot {
                    cell,
                    row: r,
                    column,
                    rowspan,
                    colspan,
                    declared_rowspan,
                    declared_colspan,
                    index_in_row,
                });
                column += colspan;
            }
        }

        let column_count = grid.iter().map(Vec::len).max().unwrap_or(0);
        TableMap {
            table,
            rows,
            cells,
            grid,
            column_count,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<NodeId> {
        self.rows.get(index).copied()
    }

    /// Every placed cell in reading order (row by row, left to right)
    pub fn cells(&self) -> &[CellSlot] {
        &self.cells
    }

    /// Cell covering a grid slot
    pub fn slot(&self, row: usize, column: usize) -> Option<&CellSlot> {
        let index = (*self.grid.get(row)?.get(column)?)?;
        self.cells.get(index)
    }

    /// Placement of a cell element
    pub fn cell_slot(&self, cell: NodeId) -> Option<&CellSlot> {
        self.cells.iter().find(|slot| slot.cell == cell)
    }

    /// Free slots in a row, up to the column count
    pub fn missing_slots(&self, row: usize) -> usize {
        let line = &self.grid[row];
        let filled = line.iter().filter(|slot| slot.is_some()).count();
        self.column_count - filled
    }

    /// Cells overlapping the given rows (inclusive)
    pub fn cells_in_rows(&self, first: usize, last: usize) -> Vec<&CellSlot> {
        self.cells
            .iter()
            .filter(|slot| slot.row <= last && slot.last_row() >= first)
            .collect()
    }

    /// Cells overlapping the given columns (inclusive)
    pub fn cells_in_columns(&self, first: usize, last: usize) -> Vec<&CellSlot> {
        self.cells
            .iter()
            .filter(|slot| slot.column <= last && slot.last_column() >= first)
            .collect()
    }

    /// Offset in the row element of `row` where a cell anchored at `column`
    /// belongs
    pub fn cell_index_for_column(&self, row: usize, column: usize) -> usize {
        self.cells
            .iter()
            .filter(|slot| slot.row == row && slot.column < column)
            .count()
    }

    /// Whether every slot of the rectangle is covered by a cell that lies
    /// entirely inside it
    pub fn is_rectangle_filled(&self, rect: &GridRect) -> bool {
        for row in rect.first_row..=rect.last_row {
            for column in rect.first_column..=rect.last_column {
                match self.slot(row, column) {
                    Some(slot) if rect.contains(slot) => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// Whether all rows have the same width and every slot is covered
    pub fn is_rectangular(&self) -> bool {
        self.grid
            .iter()
            .all(|line| line.len() == self.column_count && line.iter().all(Option::is_some))
    }

    /// Whether a cell renders as a header cell
    pub fn is_heading(&self, doc: &Document, slot: &CellSlot) -> bool {
        let heading_rows = heading_count(doc, self.table, HEADING_ROWS);
        let heading_columns = heading_count(doc, self.table, HEADING_COLUMNS);
        slot.row < heading_rows || slot.column < heading_columns
    }
}

fn is_taken(grid: &[Vec<Option<usize>>], row: usize, column: usize) -> bool {
    grid[row].get(column).is_some_and(Option::is_some)
}

/// A span attribute, between 1 and [`MAX_SPAN`]
pub fn span_of(doc: &Document, cell: NodeId, key: &str) -> usize {
    doc.int_attribute(cell, key, 1).clamp(1, MAX_SPAN as i64) as usize
}

/// A heading count attribute, at least 0
pub fn heading_count(doc: &Document, table: NodeId, key: &str) -> usize {
    doc.int_attribute(table, key, 0).max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::table::test_support::build_table;

    #[test]
    fn test_oversized_colspan_is_bounded() {
        let (doc, table) = build_table(&[&[(1, 2_000_000_000)], &[(1, 1)]]);
        let map = TableMap::build(&doc, table);
        assert_eq!(map.column_count(), MAX_SPAN);
        assert_eq!(map.slot(0, 0).unwrap().colspan, MAX_SPAN);
    }

    #[test]
    fn test_plain_grid() {
        let (doc, table) = build_table(&[&[(1, 1), (1, 1)], &[(1, 1), (1, 1)]]);
        let map = TableMap::build(&doc, table);
        assert_eq!(map.row_count(), 2);
        assert_eq!(map.column_count(), 2);
        assert!(map.is_rectangular());
        assert_eq!(map.slot(1, 1).unwrap().index_in_row, 1);
    }

    #[test]
    fn test_spans_shift_following_cells() {
        // +---+---+---+
        // | a     | b |
        // +---+---+   +
        // | c | d |   |
        // +---+---+---+
        let (doc, table) = build_table(&[&[(1, 2), (2, 1)], &[(1, 1), (1, 1)]]);
        let map = TableMap::build(&doc, table);
        assert_eq!(map.column_count(), 3);
        assert!(map.is_rectangular());
        let d = map.slot(1, 1).unwrap();
        assert_eq!((d.row, d.column), (1, 1));
        assert_eq!(map.slot(1, 2).unwrap().row, 0);
        assert_eq!(map.cell_index_for_column(1, 2), 2);
        assert_eq!(map.cells_in_columns(2, 2).len(), 1);
    }

    #[test]
    fn test_effective_spans_are_truncated() {
        // rowspan 3 in a 2-row table; colspan 2 running into the rowspan
        let (doc, table) = build_table(&[&[(1, 1), (3, 1)], &[(1, 2)]]);
        let map = TableMap::build(&doc, table);
        let tall = map.slot(0, 1).unwrap();
        assert_eq!((tall.rowspan, tall.declared_rowspan), (2, 3));
        let wide = map.slot(1, 0).unwrap();
        assert_eq!((wide.colspan, wide.declared_colspan), (1, 2));
        assert!(wide.is_truncated());
    }

    #[test]
    fn test_short_rows_have_missing_slots() {
        let (doc, table) = build_table(&[&[(1, 1), (1, 1), (1, 1)], &[(1, 1)]]);
        let map = TableMap::build(&doc, table);
        assert_eq!(map.missing_slots(0), 0);
        assert_eq!(map.missing_slots(1), 2);
        assert!(!map.is_rectangular());
    }

    #[test]
    fn test_rectangle_filled() {
        let (doc, table) = build_table(&[&[(1, 2), (1, 1)], &[(1, 1), (1, 1), (1, 1)]]);
        let map = TableMap::build(&doc, table);
        let whole_top = GridRect {
            first_row: 0,
            last_row: 0,
            first_column: 0,
            last_column: 1,
        };
        assert!(map.is_rectangle_filled(&whole_top));
        let cut = GridRect {
            first_row: 0,
            last_row: 1,
            first_column: 1,
            last_column: 2,
        };
        assert!(!map.is_rectangle_filled(&cut));
        assert_eq!(cut.area(), 4);
    }
}
