//! Table helpers shared by converters, post-fixers and commands

use fxhash::FxHashSet;

use crate::core::batch::Operation;
use crate::core::model::{AttributeValue, Document, NodeId, Writer};
use crate::data::constants::{
    COLSPAN, HEADING_COLUMNS, HEADING_ROWS, MAX_SPAN, PARAGRAPH, ROWSPAN, TABLE, TABLE_CELL,
    TABLE_ROW,
};
use crate::utils::error::{EditorError, EditorResult};

use super::walker::{heading_count, TableMap};

// ============================================================================
// Span Parsing
// ============================================================================

/// Parse a span value the lenient way markup is parsed: leading integer,
/// anything after it ignored. Non-numeric and non-positive values give `None`;
/// values above [`MAX_SPAN`] are clamped to it.
pub fn parse_span(raw: &str) -> Option<usize> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = digits[..end].trim_start_matches('0');
    if end == 0 || negative || digits.is_empty() {
        return None;
    }
    match digits.parse::<usize>() {
        Ok(span) if span <= MAX_SPAN => Some(span),
        _ => {
            tracing::debug!(raw, max = MAX_SPAN, "clamped oversized span");
            Some(MAX_SPAN)
        }
    }
}

/// Upcast side of the span attribute converters: 1 is the default and is
/// not stored
pub fn span_to_model(raw: &str) -> Option<AttributeValue> {
    parse_span(raw)
        .filter(|&span| span > 1)
        .map(AttributeValue::from)
}

/// Downcast side of the span attribute converters
pub fn span_to_view(value: &AttributeValue) -> Option<String> {
    parse_span(&value.to_string())
        .filter(|&span| span > 1)
        .map(|span| span.to_string())
}

// ============================================================================
// Lookups
// ============================================================================

/// Table a node belongs to (or is)
pub fn table_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.find_ancestor_or_self(node, TABLE)
}

/// Tables touched by a batch: around the changed nodes and inside inserted
/// subtrees. Only attached tables are returned, in document order.
pub fn affected_tables(doc: &Document, operations: &[Operation]) -> Vec<NodeId> {
    let mut tables = FxHashSet::default();
    for op in operations {
        for node in std::iter::once(op.node()).chain(op.parent()) {
            if let Some(table) = table_of(doc, node) {
                tables.insert(table);
            }
        }
        if let Operation::Insert { node, .. } = op {
            for inner in doc.descendants(*node) {
                if doc.is_element(inner, TABLE) {
                    tables.insert(inner);
                }
            }
        }
    }
    let mut tables: Vec<NodeId> = tables
        .into_iter()
        .filter(|&t| doc.is_attached(t))
        .collect();
    tables.sort_by_key(|&t| doc.path(t));
    tables
}

/// Cells touched by a batch: cells whose children changed, cells holding a
/// changed paragraph, and cells inside inserted subtrees
pub fn affected_cells(doc: &Document, operations: &[Operation]) -> Vec<NodeId> {
    let mut cells = Vec::new();
    let push = |cell: NodeId, cells: &mut Vec<NodeId>| {
        if doc.is_attached(cell) && !cells.contains(&cell) {
            cells.push(cell);
        }
    };
    for op in operations {
        match op {
            Operation::Insert { node, parent, .. } => {
                if doc.is_element(*parent, TABLE_CELL) {
                    push(*parent, &mut cells);
                }
                for inner in doc.descendants(*node) {
                    if doc.is_element(inner, TABLE_CELL) {
                        push(inner, &mut cells);
                    }
                }
            }
            Operation::Remove { parent, .. } => {
                if doc.is_element(*parent, TABLE_CELL) {
                    push(*parent, &mut cells);
                }
            }
            Operation::Attribute { node, .. } => {
                if doc.is_element(*node, PARAGRAPH) {
                    if let Some(parent) = doc.parent(*node) {
                        if doc.is_element(parent, TABLE_CELL) {
                            push(parent, &mut cells);
                        }
                    }
                }
            }
        }
    }
    cells
}

/// Whether a paragraph renders without a wrapper: the only child of its
/// cell and without attributes
pub fn is_single_plain_paragraph(doc: &Document, paragraph: NodeId) -> bool {
    let Some(cell) = doc.parent(paragraph) else {
        return false;
    };
    doc.is_element(paragraph, PARAGRAPH)
        && doc.is_element(cell, TABLE_CELL)
        && doc.child_count(cell) == 1
        && !doc.has_attributes(paragraph)
}

/// Whether a cell is a header cell
pub fn is_heading_cell(doc: &Document, cell: NodeId) -> bool {
    let Some(row) = doc.parent(cell) else {
        return false;
    };
    let Some(table) = doc.parent(row).filter(|&t| doc.is_element(t, TABLE)) else {
        return false;
    };
    // Cells are anchored in the row they belong to
    let row_index = doc.children_named(table, TABLE_ROW).position(|r| r == row);
    if row_index.is_some_and(|r| r < heading_count(doc, table, HEADING_ROWS)) {
        return true;
    }
    if heading_count(doc, table, HEADING_COLUMNS) == 0 {
        return false;
    }
    let map = TableMap::build(doc, table);
    map.cell_slot(cell)
        .is_some_and(|slot| map.is_heading(doc, slot))
}

/// Whether a cell holds nothing but empty paragraphs
pub fn is_cell_empty(doc: &Document, cell: NodeId) -> bool {
    doc.children(cell)
        .iter()
        .all(|&child| doc.is_element(child, PARAGRAPH) && doc.child_count(child) == 0)
}

/// Grid map of the cell's table and the cell's anchor row and column
pub fn locate_cell(doc: &Document, cell: NodeId) -> EditorResult<(TableMap, usize, usize)> {
    let table = table_of(doc, cell)
        .ok_or_else(|| EditorError::invalid_selection("the selection is not in a table"))?;
    let map = TableMap::build(doc, table);
    let slot = map
        .cell_slot(cell)
        .ok_or_else(|| EditorError::invalid_selection("the cell is not part of the table grid"))?;
    let (row, column) = (slot.row, slot.column);
    Ok((map, row, column))
}

// ============================================================================
// Writing
// ============================================================================

/// Create a detached empty cell holding one empty paragraph
pub fn create_empty_cell(
    writer: &mut Writer<'_>,
    rowspan: usize,
    colspan: usize,
) -> EditorResult<NodeId> {
    let cell = writer.create_element(TABLE_CELL, &[])?;
    update_span(writer, cell, ROWSPAN, rowspan)?;
    update_span(writer, cell, COLSPAN, colspan)?;
    let paragraph = writer.create_element(PARAGRAPH, &[])?;
    writer.append(paragraph, cell)?;
    Ok(cell)
}

/// Create a detached row with `columns` empty cells
pub fn create_empty_row(writer: &mut Writer<'_>, columns: usize) -> EditorResult<NodeId> {
    let row = writer.create_element(TABLE_ROW, &[])?;
    for _ in 0..columns {
        let cell = create_empty_cell(writer, 1, 1)?;
        writer.append(cell, row)?;
    }
    Ok(row)
}

/// Set a span attribute, removing it when it is the default
pub fn update_span(writer: &mut Writer<'_>, cell: NodeId, key: &str, span: usize) -> EditorResult<()> {
    if span > 1 {
        writer.set_attribute(cell, key, span)
    } else {
        writer.remove_attribute(cell, key)
    }
}

/// Set a heading count, removing it when it is zero
pub fn update_heading(
    writer: &mut Writer<'_>,
    table: NodeId,
    key: &str,
    count: usize,
) -> EditorResult<()> {
    if count > 0 {
        writer.set_attribute(table, key, count)
    } else {
        writer.remove_attribute(table, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_span() {
        assert_eq!(parse_span("3"), Some(3));
        assert_eq!(parse_span(" 2 "), Some(2));
        assert_eq!(parse_span("2abc"), Some(2));
        assert_eq!(parse_span("+4"), Some(4));
        assert_eq!(parse_span("abc"), None);
        assert_eq!(parse_span("-2"), None);
        assert_eq!(parse_span("0"), None);
        assert_eq!(parse_span(""), None);
        assert_eq!(parse_span("-0"), None);
        assert_eq!(parse_span("007"), Some(7));
    }

    #[test]
    fn test_parse_span_clamps_oversized_values() {
        assert_eq!(parse_span("1000"), Some(MAX_SPAN));
        assert_eq!(parse_span("1001"), Some(MAX_SPAN));
        assert_eq!(parse_span("2000000000"), Some(MAX_SPAN));
        assert_eq!(parse_span("99999999999999999999999999"), Some(MAX_SPAN));
        assert_eq!(span_to_model("2000000000"), Some(AttributeValue::from(MAX_SPAN)));
    }

    #[test]
    fn test_span_converters_drop_defaults() {
        assert_eq!(span_to_model("1"), None);
        assert_eq!(span_to_model("abc"), None);
        assert_eq!(span_to_model("4"), Some(AttributeValue::Integer(4)));
        assert_eq!(span_to_view(&AttributeValue::Integer(1)), None);
        assert_eq!(span_to_view(&AttributeValue::Integer(2)), Some("2".to_string()));
        assert_eq!(span_to_view(&AttributeValue::Text("-1".to_string())), None);
    }
}
