//! # tabledit
//!
//! Structured table editing over a synchronized model/view document tree.
//!
//! ## Features
//!
//! - **Schema-checked model**: every change is validated against registered structure rules
//! - **Atomic changes**: a change and its post-fixers commit together or not at all
//! - **Two views**: an incrementally patched editing view and a data view for output
//! - **Tables**: row/column spans, heading rows and columns, captions
//! - **Table commands**: insert, remove, merge, split, set headers, select
//! - **Lenient input**: malformed spans, ragged rows and empty rows are repaired on load
//!
//! ## Usage Examples
//!
//! ### Normalizing Table Markup
//!
//! ```rust
//! use tabledit::normalize_table_markup;
//!
//! let data = normalize_table_markup("<table><tr><td colspan=\"abc\">a</td></tr><tr></tr></table>")
//!     .unwrap();
//! assert_eq!(
//!     data,
//!     "<figure class=\"table\"><table><tbody><tr><td>a</td></tr></tbody></table></figure>"
//! );
//! ```
//!
//! ### Running Commands
//!
//! ```rust
//! use tabledit::{constants, CommandParams, Editor, Selection};
//!
//! let mut editor = Editor::table_editor().unwrap();
//! editor
//!     .set_data("<table><tr><td>a</td><td>b</td></tr></table>")
//!     .unwrap();
//!
//! let doc = editor.document();
//! let table = tabledit::features::table::tables(doc)[0];
//! let a = tabledit::features::table::cell_at(doc, table, 0, 0).unwrap();
//! let b = tabledit::features::table::cell_at(doc, table, 0, 1).unwrap();
//! editor.set_selection(Selection::Cells(vec![a, b])).unwrap();
//!
//! let outcome = editor
//!     .execute(constants::MERGE_CELLS, &CommandParams::new())
//!     .unwrap();
//! assert!(outcome.is_applied());
//! assert!(editor.get_data().contains("colspan=\"2\""));
//! ```

/// Core editing engine
pub mod core;

/// Data layer - names, command names and markup tables
pub mod data;

/// Feature modules - paragraphs and tables
pub mod features;

/// Utility modules
pub mod utils;

// Re-export the editor surface
pub use core::{
    AttributeValue, Command, CommandOutcome, CommandParams, Document, Editor, Feature, Mutation,
    NodeId, Schema, SchemaItemDefinition, Selection,
};

// Re-export data modules
pub use data::constants;
pub use data::constants::TABLE_COMMANDS;

// Re-export feature modules
pub use features::paragraph;
pub use features::table;

// Re-export utilities
pub use utils::config::{Config, ConfigValue};
pub use utils::error::{EditorError, EditorResult};
pub use utils::markup;

/// Load markup into a table editor and serialize it back
///
/// The result is the canonical data form: spans and headings repaired,
/// tables wrapped in `figure.table`, header rows in `thead`.
pub fn normalize_table_markup(markup: &str) -> EditorResult<String> {
    normalize_table_markup_with_config(markup, Config::new())
}

/// [`normalize_table_markup`] with user configuration
pub fn normalize_table_markup_with_config(markup: &str, config: Config) -> EditorResult<String> {
    let mut editor = Editor::table_editor_with_config(config)?;
    editor.set_data(markup)?;
    Ok(editor.get_data())
}

/// Load markup, place the caret in the cell at `(row, column)` of the first
/// table and run one command
///
/// Returns the command outcome and the resulting data markup.
pub fn run_table_command(
    markup: &str,
    cell: (usize, usize),
    command: &str,
    params: &CommandParams,
    config: Config,
) -> EditorResult<(CommandOutcome, String)> {
    let mut editor = Editor::table_editor_with_config(config)?;
    editor.set_data(markup)?;

    let doc = editor.document();
    let table = table::tables(doc)
        .first()
        .copied()
        .ok_or_else(|| EditorError::invalid_selection("the markup holds no table"))?;
    let target = table::cell_at(doc, table, cell.0, cell.1).ok_or_else(|| {
        EditorError::invalid_selection(format!("no cell at row {}, column {}", cell.0, cell.1))
    })?;
    editor.set_selection(Selection::Caret(target))?;

    let outcome = editor.execute(command, params)?;
    Ok((outcome, editor.get_data()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_paragraphs() {
        assert_eq!(
            normalize_table_markup("<p>a</p>  <p>b</p>").unwrap(),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn test_normalize_ragged_rows() {
        assert_eq!(
            normalize_table_markup("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>")
                .unwrap(),
            "<figure class=\"table\"><table><tbody>\
             <tr><td>a</td><td>b</td></tr><tr><td>c</td><td></td></tr>\
             </tbody></table></figure>"
        );
    }

    #[test]
    fn test_run_table_command() {
        let (outcome, data) = run_table_command(
            "<table><tr><td colspan=\"2\">a</td></tr><tr><td>b</td><td>c</td></tr></table>",
            (0, 0),
            constants::SPLIT_CELL_VERTICALLY,
            &CommandParams::new(),
            Config::new(),
        )
        .unwrap();
        assert!(outcome.is_applied());
        assert_eq!(
            data,
            "<figure class=\"table\"><table><tbody>\
             <tr><td>a</td><td></td></tr><tr><td>b</td><td>c</td></tr>\
             </tbody></table></figure>"
        );
    }

    #[test]
    fn test_run_table_command_without_table() {
        let err = run_table_command(
            "<p>x</p>",
            (0, 0),
            constants::REMOVE_ROW,
            &CommandParams::new(),
            Config::new(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_every_table_command_is_registered() {
        let editor = Editor::table_editor().unwrap();
        for name in TABLE_COMMANDS {
            assert!(editor.commands().contains(name), "{} is missing", name);
        }
        assert_eq!(editor.commands().len(), TABLE_COMMANDS.len());
    }
}
