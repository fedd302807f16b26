//! Editing view refresh hints
//!
//! Some model changes alter how untouched nodes render:
//!
//! - a paragraph becomes (or stops being) the only plain paragraph of its
//!   cell and switches between `span` and `p`,
//! - a cell moves into or out of the heading area and switches between
//!   `td` and `th`,
//! - a row moves across the heading row boundary.
//!
//! The fixer compares the current editing view (which still shows the model
//! before this batch) with what the model now calls for and asks the view to
//! rebuild what differs. It never changes the model.

use crate::core::downcast::EditingView;
use crate::core::model::{Document, NodeId, Writer};
use crate::core::postfix::PostFixer;
use crate::data::constants::{HEADING_ROWS, PARAGRAPH};
use crate::features::table::utils::{affected_cells, affected_tables, is_single_plain_paragraph};
use crate::features::table::walker::{heading_count, TableMap};
use crate::utils::error::EditorResult;

pub struct CellRefreshFixer;

impl PostFixer for CellRefreshFixer {
    fn name(&self) -> &'static str {
        "cell-refresh"
    }

    fn fix(&self, writer: &mut Writer<'_>, view: &EditingView) -> EditorResult<bool> {
        let doc = writer.document();
        let mut refresh: Vec<NodeId> = affected_cells(doc, writer.operations())
            .into_iter()
            .filter(|&cell| paragraph_view_outdated(doc, view, cell))
            .collect();

        for table in affected_tables(doc, writer.operations()) {
            let map = TableMap::build(doc, table);
            let heading_rows = heading_count(doc, table, HEADING_ROWS);
            let sections_outdated = map.rows().iter().enumerate().any(|(index, &row)| {
                let wanted = if index < heading_rows { "thead" } else { "tbody" };
                view.to_view(row)
                    .and_then(|v| view.view().parent(v))
                    .and_then(|section| view.view().name(section))
                    .is_some_and(|section| section != wanted)
            });
            if sections_outdated {
                refresh.push(table);
                continue;
            }
            for slot in map.cells() {
                let wanted = if map.is_heading(doc, slot) { "th" } else { "td" };
                if view.view_name(slot.cell).is_some_and(|name| name != wanted) {
                    refresh.push(slot.cell);
                }
            }
        }

        for node in refresh {
            tracing::trace!(node = %node, "requesting view refresh");
            writer.request_refresh(node);
        }
        Ok(false)
    }
}

fn paragraph_view_outdated(doc: &Document, view: &EditingView, cell: NodeId) -> bool {
    doc.children(cell).iter().any(|&child| {
        if !doc.is_element(child, PARAGRAPH) {
            return false;
        }
        let wanted = if is_single_plain_paragraph(doc, child) {
            "span"
        } else {
            "p"
        };
        view.view_name(child).is_some_and(|current| current != wanted)
    })
}
