//! Core editing engine
//!
//! This module contains the model/view machinery every feature plugs into:
//! - `model`: document tree, selection and the schema-checked writer
//! - `schema`: structural rules for model elements
//! - `engine`: atomic change blocks and the post-fixer loop
//! - `view`: view trees shared by the editing and data pipelines
//! - `conversion`: converter registry
//! - `upcast` / `downcast`: markup to model and model to view
//! - `commands` / `editor`: named commands and the editor facade

pub mod batch;
pub mod commands;
pub mod conversion;
pub mod downcast;
pub mod editor;
pub mod engine;
pub mod model;
pub mod postfix;
pub mod schema;
pub mod upcast;
pub mod view;

// Re-export main types
pub use batch::{Batch, DirtyScope, Fragment, Mutation, Operation};
pub use commands::{Command, CommandOutcome, CommandParams, CommandRegistry};
pub use conversion::{Conversion, Priority};
pub use downcast::{to_data, EditingView};
pub use editor::{Editor, Feature, Services};
pub use engine::Model;
pub use model::{AttributeValue, Document, NodeId, Selection, Writer};
pub use postfix::PostFixer;
pub use schema::{Schema, SchemaItemDefinition};
pub use view::{ViewElement, ViewNode};
