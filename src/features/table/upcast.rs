//! Table upcast converters
//!
//! - `figure.table` → bare `table`, or `tableFigure` when the figure has a
//!   caption or attributes of its own
//! - `table` → `table` with `headingRows`/`headingColumns` read from the
//!   sections and the leading `th` cells
//! - `td`/`th` → `tableCell`, content auto-paragraphed
//!
//! Rows without cells are skipped and span values are sanitized by the shared
//! attribute converters; both corrections are silent apart from a debug log.

use std::collections::BTreeMap;

use crate::core::conversion::{Priority, UpcastConverter};
use crate::core::model::{AttributeValue, NodeId};
use crate::core::upcast::UpcastContext;
use crate::core::view::ViewElement;
use crate::data::constants::{
    COLSPAN, HEADING_COLUMNS, HEADING_ROWS, HTML_ATTRIBUTES, PARAGRAPH, TABLE, TABLE_CAPTION,
    TABLE_CELL, TABLE_FIGURE, TABLE_ROW,
};
use crate::utils::error::EditorResult;

use super::utils::parse_span;

pub fn converters() -> Vec<UpcastConverter> {
    vec![
        UpcastConverter {
            name: "table-figure",
            priority: Priority::Normal,
            matches: is_table_figure,
            convert: upcast_table_figure,
        },
        UpcastConverter {
            name: "table",
            priority: Priority::Normal,
            matches: |el| el.name == "table",
            convert: upcast_table,
        },
        UpcastConverter {
            name: "table-cell",
            priority: Priority::Normal,
            matches: |el| el.name == "td" || el.name == "th",
            convert: upcast_cell,
        },
    ]
}

fn is_table_figure(el: &ViewElement) -> bool {
    el.name == "figure" && el.has_class("table") && el.child_elements().any(|c| c.name == "table")
}

// ============================================================================
// Figure
// ============================================================================

fn upcast_table_figure(
    el: &ViewElement,
    ctx: &mut UpcastContext<'_, '_>,
) -> EditorResult<Vec<NodeId>> {
    let caption = el.child_elements().find(|c| c.name == "figcaption");
    let extra_attributes: BTreeMap<String, String> = el
        .attributes
        .iter()
        .filter(|(key, value)| !(key.as_str() == "class" && value.trim() == "table"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut tables = Vec::new();
    for table in el.child_elements().filter(|c| c.name == "table") {
        tables.extend(ctx.convert_element(table)?);
    }

    if caption.is_none() && extra_attributes.is_empty() {
        return Ok(tables);
    }
    let Some(&table) = tables.first() else {
        return Ok(Vec::new());
    };

    let attributes = if el.attributes.is_empty() {
        Vec::new()
    } else {
        vec![(HTML_ATTRIBUTES, AttributeValue::Map(el.attributes.clone()))]
    };
    let figure = ctx.writer().create_element(TABLE_FIGURE, &attributes)?;
    ctx.writer().append(table, figure)?;
    if let Some(caption) = caption {
        let node = ctx.writer().create_element(TABLE_CAPTION, &[])?;
        ctx.convert_children(caption, node)?;
        ctx.writer().append(node, figure)?;
    }
    Ok(vec![figure])
}

// ============================================================================
// Table
// ============================================================================

/// Rows of a markup table and the heading counts derived from it
#[derive(Debug, Default)]
pub struct ScannedTable<'v> {
    pub rows: Vec<&'v ViewElement>,
    pub heading_rows: usize,
    pub heading_columns: usize,
}

/// Collect rows from the first `thead` (heading rows), the remaining
/// sections and bare `tr` children
pub fn scan_table(table: &ViewElement) -> ScannedTable<'_> {
    let mut scanned = ScannedTable::default();
    let mut body = Vec::new();
    let mut first_head_seen = false;

    for child in table.child_elements() {
        match child.name.as_str() {
            "thead" if !first_head_seen => {
                first_head_seen = true;
                for tr in child.child_elements().filter(|c| c.name == "tr") {
                    scanned.rows.push(tr);
                    scanned.heading_rows += 1;
                }
            }
            "thead" | "tbody" | "tfoot" => {
                body.extend(child.child_elements().filter(|c| c.name == "tr"));
            }
            "tr" => body.push(child),
            _ => {}
        }
    }

    for tr in &body {
        scanned.heading_columns = scanned.heading_columns.max(leading_heading_columns(tr));
    }
    scanned.rows.extend(body);
    scanned
}

/// Columns covered by the `th` cells a row starts with
fn leading_heading_columns(tr: &ViewElement) -> usize {
    tr.child_elements()
        .filter(|c| c.name == "td" || c.name == "th")
        .take_while(|c| c.name == "th")
        .map(|th| th.attribute(COLSPAN).and_then(parse_span).unwrap_or(1))
        .sum()
}

fn has_cells(tr: &ViewElement) -> bool {
    tr.child_elements().any(|c| c.name == "td" || c.name == "th")
}

fn upcast_table(el: &ViewElement, ctx: &mut UpcastContext<'_, '_>) -> EditorResult<Vec<NodeId>> {
    let scanned = scan_table(el);
    let rows: Vec<&ViewElement> = scanned
        .rows
        .iter()
        .copied()
        .filter(|tr| {
            let keep = has_cells(tr);
            if !keep {
                tracing::debug!("skipped table row without cells");
            }
            keep
        })
        .collect();
    if rows.is_empty() {
        tracing::debug!("skipped table without rows");
        return Ok(Vec::new());
    }

    let mut attributes = Vec::new();
    if scanned.heading_rows > 0 {
        attributes.push((HEADING_ROWS, AttributeValue::from(scanned.heading_rows)));
    }
    if scanned.heading_columns > 0 {
        attributes.push((HEADING_COLUMNS, AttributeValue::from(scanned.heading_columns)));
    }
    let table = ctx.writer().create_element(TABLE, &attributes)?;

    for tr in rows {
        let row = ctx.writer().create_element(TABLE_ROW, &[])?;
        for cell in tr.child_elements().filter(|c| c.name == "td" || c.name == "th") {
            for node in ctx.convert_element(cell)? {
                ctx.safe_insert(node, row)?;
            }
        }
        ctx.writer().append(row, table)?;
    }

    Ok(vec![table])
}

// ============================================================================
// Cell
// ============================================================================

fn upcast_cell(el: &ViewElement, ctx: &mut UpcastContext<'_, '_>) -> EditorResult<Vec<NodeId>> {
    let attributes = ctx.conversion().attributes_from_view(TABLE_CELL, el);
    let cell = ctx.writer().create_element(TABLE_CELL, &attributes)?;
    ctx.convert_children(el, cell)?;

    if ctx.writer().document().child_count(cell) == 0 {
        let paragraph = ctx.writer().create_element(PARAGRAPH, &[])?;
        ctx.writer().append(paragraph, cell)?;
    }
    Ok(vec![cell])
}
