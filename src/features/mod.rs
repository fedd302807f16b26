//! Feature modules - Editor functionality
//!
//! Each feature registers schema items, converters, post-fixers, commands
//! and configuration defaults through [`crate::core::editor::Services`]:
//! - Paragraphs and the generic block structure
//! - Tables (spans, headings, captions, table commands)

pub mod paragraph;
pub mod table;

// Re-export commonly used types
pub use paragraph::Paragraph;
pub use table::{CellSlot, GridRect, TableEditing, TableMap};
