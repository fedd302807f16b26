//! Table post-fixers
//!
//! Registered in this order:
//!
//! | Name                   | Repairs                                              |
//! |------------------------|------------------------------------------------------|
//! | `heading-rows-refresh` | heading counts past the grid, cells straddling them  |
//! | `table-layout`         | spans past the grid, short rows, empty rows/tables   |
//! | `cell-refresh`         | editing view hints for cells whose rendering changed |
//! | `cell-paragraph`       | cells left without content                           |
//!
//! Every fixer only looks at the tables and cells the current batch touched.

pub mod cell_paragraph;
pub mod cell_refresh;
pub mod heading_rows;
pub mod layout;

use crate::core::postfix::PostFixer;

pub use cell_paragraph::CellParagraphFixer;
pub use cell_refresh::CellRefreshFixer;
pub use heading_rows::HeadingRowsFixer;
pub use layout::TableLayoutFixer;

/// The table post-fixers in registration order
pub fn post_fixers() -> Vec<Box<dyn PostFixer>> {
    vec![
        Box::new(HeadingRowsFixer),
        Box::new(TableLayoutFixer),
        Box::new(CellRefreshFixer),
        Box::new(CellParagraphFixer),
    ]
}
