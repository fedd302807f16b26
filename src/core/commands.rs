//! Command registry
//!
//! Commands are named objects that check whether they apply to the current
//! selection and, when executed, compute every mutation they need and submit
//! them through a single [`Editor::change`]. A refused command leaves the
//! model exactly as it was.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::editor::Editor;
use crate::utils::error::EditorResult;

/// Parameters a command may read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandParams {
    /// Rows of a new table
    pub rows: Option<usize>,
    /// Columns of a new table
    pub columns: Option<usize>,
    /// Set the state instead of toggling it
    pub force_value: Option<bool>,
}

impl CommandParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(rows: usize, columns: usize) -> Self {
        Self {
            rows: Some(rows),
            columns: Some(columns),
            ..Self::default()
        }
    }

    pub fn forced(value: bool) -> Self {
        Self {
            force_value: Some(value),
            ..Self::default()
        }
    }
}

/// What happened when a command was executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Nothing was changed; the reason is a validation message
    Refused(String),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Applied => write!(f, "applied"),
            CommandOutcome::Refused(reason) => write!(f, "refused: {}", reason),
        }
    }
}

/// A named editing command
pub trait Command {
    /// Whether the command applies to the current model and selection
    fn is_enabled(&self, editor: &Editor) -> bool;

    /// Compute and submit the command's mutations as one batch
    fn execute(&self, editor: &mut Editor, params: &CommandParams) -> EditorResult<()>;

    /// Current state of toggle commands
    fn value(&self, _editor: &Editor) -> Option<bool> {
        None
    }
}

/// Commands by name, in registration order
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, Rc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; a later registration under the same name wins
    pub fn add(&mut self, name: &str, command: impl Command + 'static) {
        tracing::trace!(command = name, "command registered");
        self.commands.insert(name.to_string(), Rc::new(command));
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Command for Noop {
        fn is_enabled(&self, _editor: &Editor) -> bool {
            true
        }

        fn execute(&self, _editor: &mut Editor, _params: &CommandParams) -> EditorResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_keeps_order() {
        let mut registry = CommandRegistry::new();
        registry.add("b", Noop);
        registry.add("a", Noop);
        registry.add("b", Noop);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(registry.contains("a"));
        assert!(registry.get("c").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_params() {
        let params = CommandParams::with_size(3, 4);
        assert_eq!(params.rows, Some(3));
        assert_eq!(params.force_value, None);
        assert_eq!(CommandParams::forced(true).force_value, Some(true));
        assert_eq!(
            CommandOutcome::Refused("x".to_string()).to_string(),
            "refused: x"
        );
    }
}
