//! Cells are never empty: a cell left without children gets an empty
//! paragraph.

use crate::core::downcast::EditingView;
use crate::core::model::{NodeId, Writer};
use crate::core::postfix::PostFixer;
use crate::data::constants::PARAGRAPH;
use crate::features::table::utils::affected_cells;
use crate::utils::error::EditorResult;

pub struct CellParagraphFixer;

impl PostFixer for CellParagraphFixer {
    fn name(&self) -> &'static str {
        "cell-paragraph"
    }

    fn fix(&self, writer: &mut Writer<'_>, _view: &EditingView) -> EditorResult<bool> {
        let doc = writer.document();
        let empty: Vec<NodeId> = affected_cells(doc, writer.operations())
            .into_iter()
            .filter(|&cell| doc.child_count(cell) == 0)
            .collect();

        for &cell in &empty {
            tracing::trace!(cell = %cell, "adding paragraph to empty cell");
            let paragraph = writer.create_element(PARAGRAPH, &[])?;
            writer.append(paragraph, cell)?;
        }
        Ok(!empty.is_empty())
    }
}
