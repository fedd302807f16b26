//! Error handling for tabledit
//!
//! This module provides a unified error type and result type for schema
//! registration, mutation batches, conversion and command execution.
//!
//! Errors fall into three groups:
//! - validation failures (schema violations, invalid selections): the batch is
//!   rolled back and commands report a refusal,
//! - consistency faults (post-fixers that never settle): fatal for the affected
//!   table,
//! - everything else (parsing, I/O, configuration, lookups).

use thiserror::Error;

use crate::core::model::NodeId;

/// Editor error type
#[derive(Debug, Clone, Error)]
pub enum EditorError {
    /// A child element is not allowed inside its would-be parent
    #[error("schema violation: '{child}' is not allowed in '{parent}'")]
    SchemaViolation { parent: String, child: String },

    /// An attribute is not allowed on an element
    #[error("schema violation: attribute '{key}' is not allowed on '{element}'")]
    AttributeNotAllowed { element: String, key: String },

    /// A schema item definition was rejected at registration time
    #[error("invalid schema definition for '{item}': {reason}")]
    InvalidSchemaDefinition { item: String, reason: String },

    /// A mutation referenced an impossible position or node state
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// The selection does not satisfy what the command needs
    #[error("invalid selection: {message}")]
    InvalidSelection { message: String },

    /// A command was executed while disabled
    #[error("command '{command}' is disabled")]
    CommandDisabled { command: String },

    /// No command registered under this name
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Node id does not exist in the document arena
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Post-fixers did not reach a fixed point within the iteration cap
    #[error("post-fixers did not settle after {passes} passes (last fixer: {last_fixer})")]
    ConsistencyFault {
        passes: usize,
        last_fixer: &'static str,
    },

    /// A mutation touched a table halted by an earlier consistency fault
    #[error("node {0} belongs to a region halted after a consistency fault")]
    Halted(NodeId),

    /// Markup could not be parsed
    #[error("{}", format_parse_error(.message, .line, .column))]
    Parse {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// Configuration value missing or of the wrong type
    #[error("config error: {message}")]
    Config { message: String },

    /// IO error (for file operations)
    #[error("IO error: {message}")]
    Io { message: String },
}

fn format_parse_error(message: &str, line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(l), Some(c)) => format!("Parse error at line {}, column {}: {}", l, c, message),
        (Some(l), None) => format!("Parse error at line {}: {}", l, message),
        _ => format!("Parse error: {}", message),
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        EditorError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

// Convenience constructors for errors
impl EditorError {
    pub fn schema_violation(parent: impl Into<String>, child: impl Into<String>) -> Self {
        EditorError::SchemaViolation {
            parent: parent.into(),
            child: child.into(),
        }
    }

    pub fn attribute_not_allowed(element: impl Into<String>, key: impl Into<String>) -> Self {
        EditorError::AttributeNotAllowed {
            element: element.into(),
            key: key.into(),
        }
    }

    pub fn invalid_definition(item: impl Into<String>, reason: impl Into<String>) -> Self {
        EditorError::InvalidSchemaDefinition {
            item: item.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        EditorError::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        EditorError::InvalidSelection {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        EditorError::Parse {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, line: usize, column: usize) -> Self {
        EditorError::Parse {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        EditorError::Config {
            message: message.into(),
        }
    }

    /// Validation failures leave the model untouched and are reported to
    /// command callers as a refusal rather than an error.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EditorError::SchemaViolation { .. }
                | EditorError::AttributeNotAllowed { .. }
                | EditorError::InvalidOperation { .. }
                | EditorError::InvalidSelection { .. }
                | EditorError::CommandDisabled { .. }
        )
    }

    /// Faults of the consistency engine. These must reach the host.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            EditorError::ConsistencyFault { .. } | EditorError::Halted(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = EditorError::parse("unexpected token");
        assert!(err.to_string().contains("Parse error"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_parse_error_with_location() {
        let err = EditorError::parse_at("unclosed tag", 10, 5);
        let msg = err.to_string();
        assert!(msg.contains("line 10"));
        assert!(msg.contains("column 5"));
    }

    #[test]
    fn test_schema_violation_display() {
        let err = EditorError::schema_violation("tableRow", "paragraph");
        let msg = err.to_string();
        assert!(msg.contains("'paragraph'"));
        assert!(msg.contains("'tableRow'"));
    }

    #[test]
    fn test_error_classification() {
        assert!(EditorError::invalid_selection("not rectangular").is_validation());
        assert!(EditorError::attribute_not_allowed("tableRow", "colspan").is_validation());
        assert!(!EditorError::parse("x").is_validation());

        let fault = EditorError::ConsistencyFault {
            passes: 16,
            last_fixer: "table-layout",
        };
        assert!(fault.is_fault());
        assert!(!fault.is_validation());
        assert!(fault.to_string().contains("16 passes"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.html");
        let err: EditorError = io.into();
        assert!(err.to_string().contains("missing.html"));
    }
}
