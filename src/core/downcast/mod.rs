//! Downcast dispatchers
//!
//! - `editing`: incremental editing view, patched per batch through the mapper
//! - `data`: data tree, produced from scratch on demand

pub mod data;
pub mod editing;

pub use data::{to_data, DataContext};
pub use editing::{EditingContext, EditingView};
