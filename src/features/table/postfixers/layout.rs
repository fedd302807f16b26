//! Table layout repair
//!
//! After this fixer settles, every touched table is a full rectangle:
//!
//! - a table without rows or columns is removed (with its figure),
//! - rows without cells are removed and the rowspans over them shrink,
//! - declared spans are cut to what fits the grid,
//! - short rows are padded with empty cells.

use crate::core::downcast::EditingView;
use crate::core::model::{NodeId, Writer};
use crate::core::postfix::PostFixer;
use crate::data::constants::{COLSPAN, HEADING_ROWS, ROWSPAN, TABLE_CELL, TABLE_FIGURE};
use crate::features::table::utils::{
    affected_tables, create_empty_cell, update_heading, update_span,
};
use crate::features::table::walker::{heading_count, TableMap};
use crate::utils::error::EditorResult;

pub struct TableLayoutFixer;

impl PostFixer for TableLayoutFixer {
    fn name(&self) -> &'static str {
        "table-layout"
    }

    fn fix(&self, writer: &mut Writer<'_>, _view: &EditingView) -> EditorResult<bool> {
        let mut changed = false;
        for table in affected_tables(writer.document(), writer.operations()) {
            // An earlier table in this pass may have removed this one
            if writer.document().is_attached(table) {
                changed |= fix_table(writer, table)?;
            }
        }
        Ok(changed)
    }
}

fn fix_table(writer: &mut Writer<'_>, table: NodeId) -> EditorResult<bool> {
    let map = TableMap::build(writer.document(), table);

    if map.row_count() == 0 || map.column_count() == 0 {
        let doc = writer.document();
        let target = doc
            .parent(table)
            .filter(|&parent| doc.is_element(parent, TABLE_FIGURE))
            .unwrap_or(table);
        tracing::debug!(table = %table, "removing table without cells");
        writer.remove(target)?;
        return Ok(true);
    }

    if remove_empty_rows(writer, &map)? {
        return Ok(true);
    }

    let mut changed = false;
    for slot in map.cells().iter().filter(|slot| slot.is_truncated()) {
        tracing::warn!(
            cell = %slot.cell,
            row = slot.row,
            column = slot.column,
            declared_rowspan = slot.declared_rowspan,
            declared_colspan = slot.declared_colspan,
            rowspan = slot.rowspan,
            colspan = slot.colspan,
            "cell span exceeds the table grid, truncating"
        );
        update_span(writer, slot.cell, ROWSPAN, slot.rowspan)?;
        update_span(writer, slot.cell, COLSPAN, slot.colspan)?;
        changed = true;
    }

    // Truncating to the effective spans leaves the grid as mapped
    for (index, &row) in map.rows().iter().enumerate() {
        let missing = map.missing_slots(index);
        if missing == 0 {
            continue;
        }
        tracing::debug!(table = %table, row = index, missing, "padding short table row");
        for _ in 0..missing {
            let cell = create_empty_cell(writer, 1, 1)?;
            writer.append(cell, row)?;
        }
        changed = true;
    }

    Ok(changed)
}

/// Remove rows holding no cell of their own
fn remove_empty_rows(writer: &mut Writer<'_>, map: &TableMap) -> EditorResult<bool> {
    let doc = writer.document();
    let empty: Vec<usize> = map
        .rows()
        .iter()
        .enumerate()
        .filter(|&(_, &row)| doc.children_named(row, TABLE_CELL).next().is_none())
        .map(|(index, _)| index)
        .collect();
    if empty.is_empty() {
        return Ok(false);
    }
    let heading_rows = heading_count(doc, map.table, HEADING_ROWS);

    for slot in map.cells() {
        let covered = empty
            .iter()
            .filter(|&&r| r > slot.row && r <= slot.last_row())
            .count();
        if covered > 0 {
            update_span(writer, slot.cell, ROWSPAN, slot.rowspan - covered)?;
        }
    }
    let removed_headings = empty.iter().filter(|&&r| r < heading_rows).count();
    if removed_headings > 0 {
        update_heading(writer, map.table, HEADING_ROWS, heading_rows - removed_headings)?;
    }
    for &index in empty.iter().rev() {
        if let Some(row) = map.row(index) {
            tracing::debug!(row = %row, "removing table row without cells");
            writer.remove(row)?;
        }
    }
    Ok(true)
}
