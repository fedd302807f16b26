//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Layered configuration with TOML loading
//! - Markup parsing and serialization

pub mod config;
pub mod error;
pub mod markup;

// Re-export commonly used items
pub use config::{Config, ConfigValue};
pub use error::{EditorError, EditorResult};
pub use markup::{parse_markup, to_markup};
