//! Heading section repair
//!
//! Keeps `headingRows`/`headingColumns` within the grid and splits cells that
//! span across a heading boundary, so that every cell is either entirely a
//! header cell or entirely a body cell.

use crate::core::downcast::EditingView;
use crate::core::model::{NodeId, Writer};
use crate::core::postfix::PostFixer;
use crate::data::constants::{COLSPAN, HEADING_COLUMNS, HEADING_ROWS, ROWSPAN};
use crate::features::table::utils::{
    affected_tables, create_empty_cell, update_heading, update_span,
};
use crate::features::table::walker::{heading_count, CellSlot, TableMap};
use crate::utils::error::EditorResult;

pub struct HeadingRowsFixer;

impl PostFixer for HeadingRowsFixer {
    fn name(&self) -> &'static str {
        "heading-rows-refresh"
    }

    fn fix(&self, writer: &mut Writer<'_>, _view: &EditingView) -> EditorResult<bool> {
        let mut changed = false;
        for table in affected_tables(writer.document(), writer.operations()) {
            changed |= fix_table(writer, table)?;
        }
        Ok(changed)
    }
}

fn fix_table(writer: &mut Writer<'_>, table: NodeId) -> EditorResult<bool> {
    let doc = writer.document();
    let map = TableMap::build(doc, table);
    let heading_rows = heading_count(doc, table, HEADING_ROWS);
    let heading_columns = heading_count(doc, table, HEADING_COLUMNS);

    let mut changed = false;
    if heading_rows > map.row_count() {
        tracing::debug!(table = %table, heading_rows, rows = map.row_count(), "clamping heading rows");
        update_heading(writer, table, HEADING_ROWS, map.row_count())?;
        changed = true;
    }
    if heading_columns > map.column_count() {
        tracing::debug!(
            table = %table,
            heading_columns,
            columns = map.column_count(),
            "clamping heading columns"
        );
        update_heading(writer, table, HEADING_COLUMNS, map.column_count())?;
        changed = true;
    }
    if changed {
        return Ok(true);
    }

    if split_at_row(writer, &map, heading_rows)? {
        return Ok(true);
    }
    split_at_column(writer, &map, heading_columns)
}

/// Split every cell spanning from above `boundary` into the rows below it
fn split_at_row(writer: &mut Writer<'_>, map: &TableMap, boundary: usize) -> EditorResult<bool> {
    if boundary == 0 || boundary >= map.row_count() {
        return Ok(false);
    }
    let Some(target_row) = map.row(boundary) else {
        return Ok(false);
    };
    let mut straddling: Vec<&CellSlot> = map
        .cells()
        .iter()
        .filter(|slot| slot.row < boundary && slot.last_row() >= boundary)
        .collect();
    // Right to left keeps the computed offsets valid
    straddling.sort_by(|a, b| b.column.cmp(&a.column));

    for slot in &straddling {
        tracing::debug!(cell = %slot.cell, boundary, "splitting cell at the heading row boundary");
        update_span(writer, slot.cell, ROWSPAN, boundary - slot.row)?;
        let cell = create_empty_cell(writer, slot.last_row() - boundary + 1, slot.colspan)?;
        let index = map.cell_index_for_column(boundary, slot.column);
        writer.insert(cell, target_row, index)?;
    }
    Ok(!straddling.is_empty())
}

/// Split every cell spanning from the left of `boundary` into the columns
/// right of it
fn split_at_column(writer: &mut Writer<'_>, map: &TableMap, boundary: usize) -> EditorResult<bool> {
    if boundary == 0 || boundary >= map.column_count() {
        return Ok(false);
    }
    let straddling: Vec<&CellSlot> = map
        .cells()
        .iter()
        .filter(|slot| slot.column < boundary && slot.last_column() >= boundary)
        .collect();

    for slot in &straddling {
        let Some(row) = map.row(slot.row) else {
            continue;
        };
        tracing::debug!(cell = %slot.cell, boundary, "splitting cell at the heading column boundary");
        update_span(writer, slot.cell, COLSPAN, boundary - slot.column)?;
        let cell = create_empty_cell(writer, slot.rowspan, slot.last_column() - boundary + 1)?;
        writer.insert(cell, row, slot.index_in_row + 1)?;
    }
    Ok(!straddling.is_empty())
}
