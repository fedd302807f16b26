//! Table downcast converters
//!
//! Editing view:
//!
//! ```text
//! figure.table.ck-widget[contenteditable=false]
//! └── table
//!     ├── thead > tr > th.ck-editor__nested-editable ...
//!     └── tbody > tr > td.ck-editor__nested-editable ...
//! ```
//!
//! A cell holding a single plain paragraph shows it as a
//! `span.ck-table-bogus-paragraph` so that the cell does not gain a visible
//! paragraph; the data output drops the wrapper entirely.

use crate::core::batch::DirtyScope;
use crate::core::conversion::{
    always, AttributeToAttribute, Conversion, DataConverter, EditingConverter, Priority,
};
use crate::core::downcast::{DataContext, EditingContext};
use crate::core::model::{Document, NodeId};
use crate::core::view::{ViewElement, ViewId, ViewNode};
use crate::data::constants::{
    BOGUS_PARAGRAPH_CLASS, COLSPAN, HEADING_COLUMNS, HEADING_ROWS, HTML_ATTRIBUTES,
    NESTED_EDITABLE_CLASS, PARAGRAPH, ROWSPAN, TABLE, TABLE_CAPTION, TABLE_CELL, TABLE_FIGURE,
    TABLE_ROW, WIDGET_CLASS,
};

use super::utils::{is_heading_cell, is_single_plain_paragraph, span_to_model, span_to_view};
use super::walker::{heading_count, TableMap};

/// Register every table downcast converter and the span attribute mappings
pub fn register(conversion: &mut Conversion) {
    for key in [COLSPAN, ROWSPAN] {
        conversion.add_attribute_to_attribute(AttributeToAttribute {
            model: TABLE_CELL,
            model_key: key,
            view_key: key,
            to_model: span_to_model,
            to_view: span_to_view,
        });
    }

    // Editing
    conversion.add_editing(EditingConverter {
        name: "table",
        model: TABLE,
        priority: Priority::Normal,
        matches: always,
        convert: editing_table,
    });
    conversion.add_editing(EditingConverter {
        name: "table-row",
        model: TABLE_ROW,
        priority: Priority::Normal,
        matches: always,
        convert: |ctx, _row| Some(ctx.view.create_element("tr")),
    });
    conversion.add_editing(EditingConverter {
        name: "table-cell",
        model: TABLE_CELL,
        priority: Priority::Normal,
        matches: always,
        convert: editing_cell,
    });
    conversion.add_editing(EditingConverter {
        name: "table-cell-paragraph",
        model: PARAGRAPH,
        priority: Priority::High,
        matches: is_single_plain_paragraph,
        convert: editing_cell_paragraph,
    });
    conversion.add_editing(EditingConverter {
        name: "table-figure",
        model: TABLE_FIGURE,
        priority: Priority::Normal,
        matches: always,
        convert: editing_table_figure,
    });
    conversion.add_editing(EditingConverter {
        name: "table-caption",
        model: TABLE_CAPTION,
        priority: Priority::Normal,
        matches: always,
        convert: |ctx, _caption| {
            let view = ctx.view.create_element("figcaption");
            ctx.view.set_attribute(view, "contenteditable", "true");
            Some(view)
        },
    });
    conversion.set_position_resolver(TABLE_ROW, row_position);
    conversion.set_removal(TABLE_ROW, remove_row);
    conversion.add_attribute_patch(TABLE, HEADING_COLUMNS, patch_heading_columns);
    conversion.set_dirty_scope(TABLE, HEADING_ROWS, DirtyScope::FullTableReconversion);

    // Data
    conversion.add_data(DataConverter {
        name: "table",
        model: TABLE,
        priority: Priority::Normal,
        matches: always,
        convert: data_table,
    });
    conversion.add_data(DataConverter {
        name: "table-row",
        model: TABLE_ROW,
        priority: Priority::Normal,
        matches: always,
        convert: |ctx, row| {
            vec![ViewNode::Element(
                ViewElement::new("tr").with_children(ctx.convert_children(row)),
            )]
        },
    });
    conversion.add_data(DataConverter {
        name: "table-cell",
        model: TABLE_CELL,
        priority: Priority::Normal,
        matches: always,
        convert: data_cell,
    });
    conversion.add_data(DataConverter {
        name: "table-cell-paragraph",
        model: PARAGRAPH,
        priority: Priority::High,
        matches: is_single_plain_paragraph,
        convert: |ctx, paragraph| ctx.convert_children(paragraph),
    });
    conversion.add_data(DataConverter {
        name: "table-figure",
        model: TABLE_FIGURE,
        priority: Priority::Normal,
        matches: always,
        convert: data_table_figure,
    });
    conversion.add_data(DataConverter {
        name: "table-caption",
        model: TABLE_CAPTION,
        priority: Priority::Normal,
        matches: always,
        convert: |ctx, caption| {
            vec![ViewNode::Element(
                ViewElement::new("figcaption").with_children(ctx.convert_children(caption)),
            )]
        },
    });
}

fn in_figure(doc: &Document, table: NodeId) -> bool {
    doc.parent(table)
        .is_some_and(|parent| doc.is_element(parent, TABLE_FIGURE))
}

// ============================================================================
// Editing
// ============================================================================

fn editing_table(ctx: &mut EditingContext<'_>, table: NodeId) -> Option<ViewId> {
    let table_view = ctx.view.create_element("table");
    if in_figure(ctx.doc, table) {
        return Some(table_view);
    }
    let figure = ctx.view.create_element("figure");
    ctx.view
        .set_attribute(figure, "class", &format!("table {}", WIDGET_CLASS));
    ctx.view.set_attribute(figure, "contenteditable", "false");
    ctx.view.append(figure, table_view);
    Some(figure)
}

/// The `table` element under whatever a table node is bound to
fn table_element(ctx: &EditingContext<'_>, table: NodeId) -> Option<ViewId> {
    let bound = ctx.mapper.to_view(table)?;
    if ctx.view.is_element(bound, "table") {
        Some(bound)
    } else {
        ctx.view.child_named(bound, "table")
    }
}

/// Rows go to `thead` or `tbody` depending on the heading row count
fn row_position(ctx: &mut EditingContext<'_>, row: NodeId) -> Option<(ViewId, usize)> {
    let doc = ctx.doc;
    let table = doc.parent(row)?;
    let table_view = table_element(ctx, table)?;
    let index = doc.index_of(row)?;
    let heading_rows = heading_count(doc, table, HEADING_ROWS);

    let section_name = if index < heading_rows { "thead" } else { "tbody" };
    let section = match ctx.view.child_named(table_view, section_name) {
        Some(section) => section,
        None => {
            let section = ctx.view.create_element(section_name);
            if section_name == "thead" {
                ctx.view.insert(table_view, 0, section);
            } else {
                ctx.view.append(table_view, section);
            }
            section
        }
    };
    let offset = ctx.preceding_in(table, index, section);
    tracing::trace!(row = %row, section = section_name, offset, "placing table row");
    Some((section, offset))
}

/// Rows take their section with them when it empties
fn remove_row(ctx: &mut EditingContext<'_>, _row: NodeId, view: ViewId) {
    let section = ctx.view.parent(view);
    ctx.remove_view(view);
    if let Some(section) = section {
        let is_section =
            ctx.view.is_element(section, "thead") || ctx.view.is_element(section, "tbody");
        if is_section && ctx.view.children(section).is_empty() {
            ctx.view.detach(section);
        }
    }
}

fn editing_cell(ctx: &mut EditingContext<'_>, cell: NodeId) -> Option<ViewId> {
    let name = if is_heading_cell(ctx.doc, cell) { "th" } else { "td" };
    let view = ctx.view.create_element(name);
    ctx.view.set_attribute(view, "class", NESTED_EDITABLE_CLASS);
    ctx.view.set_attribute(view, "contenteditable", "true");
    for (key, value) in ctx.conversion.attributes_to_view(ctx.doc, cell) {
        ctx.view.set_attribute(view, key, &value);
    }
    Some(view)
}

fn editing_cell_paragraph(ctx: &mut EditingContext<'_>, _paragraph: NodeId) -> Option<ViewId> {
    let span = ctx.view.create_element("span");
    ctx.view.set_attribute(span, "class", BOGUS_PARAGRAPH_CLASS);
    Some(span)
}

/// Heading columns only change cell names: rename in place
fn patch_heading_columns(ctx: &mut EditingContext<'_>, table: NodeId, _key: &str) {
    let doc = ctx.doc;
    let map = TableMap::build(doc, table);
    for slot in map.cells() {
        let Some(view) = ctx.mapper.to_view(slot.cell) else {
            continue;
        };
        let name = if map.is_heading(doc, slot) { "th" } else { "td" };
        if ctx.view.name(view) != Some(name) {
            ctx.view.rename(view, name);
        }
    }
}

fn editing_table_figure(ctx: &mut EditingContext<'_>, figure: NodeId) -> Option<ViewId> {
    let view = ctx.view.create_element("figure");
    if let Some(attributes) = ctx.doc.attribute(figure, HTML_ATTRIBUTES).and_then(|v| v.as_map()) {
        for (key, value) in attributes {
            ctx.view.set_attribute(view, key, value);
        }
    }
    let class = figure_class(ctx.view.attribute(view, "class"), Some(WIDGET_CLASS));
    ctx.view.set_attribute(view, "class", &class);
    ctx.view.set_attribute(view, "contenteditable", "false");
    Some(view)
}

/// `class` value with `table` (and `extra`) present exactly once
fn figure_class(existing: Option<&str>, extra: Option<&str>) -> String {
    let mut classes: Vec<&str> = existing.unwrap_or("").split_whitespace().collect();
    for wanted in std::iter::once("table").chain(extra) {
        if !classes.contains(&wanted) {
            classes.push(wanted);
        }
    }
    classes.join(" ")
}

// ============================================================================
// Data
// ============================================================================

fn data_table(ctx: &DataContext<'_>, table: NodeId) -> Vec<ViewNode> {
    let doc = ctx.doc;
    let rows: Vec<NodeId> = doc.children_named(table, TABLE_ROW).collect();
    let heading_rows = heading_count(doc, table, HEADING_ROWS).min(rows.len());
    let (head, body) = rows.split_at(heading_rows);

    let mut sections = Vec::new();
    for (name, rows) in [("thead", head), ("tbody", body)] {
        if rows.is_empty() {
            continue;
        }
        let children = rows.iter().flat_map(|&row| ctx.convert(row)).collect();
        sections.push(ViewNode::Element(ViewElement::new(name).with_children(children)));
    }
    let table_element = ViewNode::Element(ViewElement::new("table").with_children(sections));

    if in_figure(doc, table) {
        return vec![table_element];
    }
    vec![ViewNode::Element(
        ViewElement::new("figure")
            .with_attribute("class", "table")
            .with_children(vec![table_element]),
    )]
}

fn data_cell(ctx: &DataContext<'_>, cell: NodeId) -> Vec<ViewNode> {
    let name = if is_heading_cell(ctx.doc, cell) { "th" } else { "td" };
    let mut element = ViewElement::new(name);
    for (key, value) in ctx.conversion.attributes_to_view(ctx.doc, cell) {
        element = element.with_attribute(key, &value);
    }
    vec![ViewNode::Element(element.with_children(ctx.convert_children(cell)))]
}

fn data_table_figure(ctx: &DataContext<'_>, figure: NodeId) -> Vec<ViewNode> {
    let mut element = ViewElement::new("figure");
    if let Some(attributes) = ctx.doc.attribute(figure, HTML_ATTRIBUTES).and_then(|v| v.as_map()) {
        element.attributes = attributes.clone();
    }
    let class = figure_class(element.attribute("class"), None);
    element = element.with_attribute("class", &class);
    vec![ViewNode::Element(element.with_children(ctx.convert_children(figure)))]
}
