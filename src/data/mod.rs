//! Data layer - Static names and markup tables
//!
//! This module contains all static data used by the editor:
//! - Model/view element names, attribute keys and command names
//! - Markup element classification used by the upcast dispatcher

pub mod constants;
pub mod elements;

// Re-export commonly used items
pub use constants::TABLE_COMMANDS;
pub use elements::{is_block_markup, is_ignored_markup};
