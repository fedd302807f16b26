//! Editor
//!
//! Ties the services together: the [`Model`] (document, schema, selection,
//! post-fixers), the converter registry, the editing view, the command
//! registry and the configuration. Features receive those services through
//! [`Services`] when they are registered and never hold on to the editor.
//!
//! Every model change goes through [`Editor::change`]: the change and the
//! post-fixers run as one batch, then the editing view is patched from the
//! batch. The data tree is produced from the model on demand.

use super::batch::Mutation;
use super::commands::{CommandOutcome, CommandParams, CommandRegistry};
use super::conversion::Conversion;
use super::downcast::{to_data, EditingView};
use super::engine::Model;
use super::model::{Document, Selection, Writer};
use super::postfix::PostFixer;
use super::schema::Schema;
use super::upcast::upcast_into;
use super::view::ViewNode;
use crate::data::constants::{CONFIG_POST_FIX_CAP, DEFAULT_POST_FIX_CAP};
use crate::features::{paragraph::Paragraph, table::TableEditing};
use crate::utils::config::Config;
use crate::utils::error::{EditorError, EditorResult};
use crate::utils::markup::{parse_markup, to_markup};

/// A unit of editor functionality
pub trait Feature {
    fn name(&self) -> &'static str;

    /// Register schema items, converters, post-fixers, commands and config
    /// defaults
    fn register(&self, services: &mut Services<'_>) -> EditorResult<()>;
}

/// What a feature gets to register into
pub struct Services<'a> {
    model: &'a mut Model,
    pub conversion: &'a mut Conversion,
    pub commands: &'a mut CommandRegistry,
    pub config: &'a mut Config,
}

impl Services<'_> {
    pub fn schema(&mut self) -> &mut Schema {
        self.model.schema_mut()
    }

    pub fn add_post_fixer(&mut self, fixer: Box<dyn PostFixer>) {
        self.model.add_post_fixer(fixer);
    }
}

pub struct Editor {
    model: Model,
    conversion: Conversion,
    editing: EditingView,
    commands: CommandRegistry,
    config: Config,
    features: Vec<&'static str>,
}

impl Editor {
    /// Editor with paragraphs only
    pub fn new() -> EditorResult<Self> {
        Self::with_features(Config::new(), &[&Paragraph])
    }

    /// Editor with paragraphs and tables
    pub fn table_editor() -> EditorResult<Self> {
        Self::table_editor_with_config(Config::new())
    }

    pub fn table_editor_with_config(config: Config) -> EditorResult<Self> {
        Self::with_features(config, &[&Paragraph, &TableEditing])
    }

    /// Build an editor from user configuration and a list of features
    pub fn with_features(config: Config, features: &[&dyn Feature]) -> EditorResult<Self> {
        let mut editor = Self {
            model: Model::default(),
            conversion: Conversion::new(),
            editing: EditingView::new(),
            commands: CommandRegistry::new(),
            config,
            features: Vec::new(),
        };
        editor.config.define(CONFIG_POST_FIX_CAP, DEFAULT_POST_FIX_CAP);
        for feature in features {
            editor.add_feature(*feature)?;
        }
        Ok(editor)
    }

    /// Register one more feature and apply the configuration again
    pub fn add_feature(&mut self, feature: &dyn Feature) -> EditorResult<()> {
        let mut services = Services {
            model: &mut self.model,
            conversion: &mut self.conversion,
            commands: &mut self.commands,
            config: &mut self.config,
        };
        feature.register(&mut services)?;
        tracing::debug!(feature = feature.name(), "feature registered");
        self.features.push(feature.name());

        let cap = self
            .config
            .get_usize(CONFIG_POST_FIX_CAP, DEFAULT_POST_FIX_CAP)?;
        self.model.set_post_fix_cap(cap);
        self.editing = EditingView::convert_document(self.model.document(), &self.conversion);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn document(&self) -> &Document {
        self.model.document()
    }

    pub fn schema(&self) -> &Schema {
        self.model.schema()
    }

    pub fn selection(&self) -> &Selection {
        self.model.selection()
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn editing_view(&self) -> &EditingView {
        &self.editing
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Names of the registered features in registration order
    pub fn features(&self) -> &[&'static str] {
        &self.features
    }

    // ------------------------------------------------------------------------
    // Changes
    // ------------------------------------------------------------------------

    /// Run `f` and the post-fixers as one atomic batch and patch the editing
    /// view
    pub fn change<T>(
        &mut self,
        f: impl FnOnce(&mut Writer<'_>) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let (value, batch) = self.model.change(&self.editing, f)?;
        self.editing
            .apply_batch(self.model.document(), &self.conversion, &batch);
        Ok(value)
    }

    /// Apply a list of host mutations as one batch
    pub fn submit(&mut self, mutations: &[Mutation]) -> EditorResult<()> {
        self.change(|writer| {
            for mutation in mutations {
                writer.apply(mutation)?;
            }
            Ok(())
        })
    }

    pub fn set_selection(&mut self, selection: Selection) -> EditorResult<()> {
        self.model.set_selection(selection)
    }

    // ------------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------------

    /// Replace the document with parsed markup
    pub fn set_data(&mut self, markup: &str) -> EditorResult<()> {
        let nodes = parse_markup(markup)?;
        self.set_data_nodes(&nodes)
    }

    /// Replace the document with already parsed markup nodes
    ///
    /// Regions halted by earlier faults are released: the content they
    /// guarded is gone.
    pub fn set_data_nodes(&mut self, nodes: &[ViewNode]) -> EditorResult<()> {
        self.model.clear_halted();
        let conversion = &self.conversion;
        self.model.change(&self.editing, |writer| {
            let root = writer.document().root();
            for child in writer.document().children(root).to_vec() {
                writer.remove(child)?;
            }
            writer.set_selection(Selection::Empty);
            upcast_into(conversion, writer, nodes, root)
        })?;
        self.editing = EditingView::convert_document(self.model.document(), &self.conversion);
        Ok(())
    }

    /// Data tree of the whole document
    pub fn data_view(&self) -> Vec<ViewNode> {
        to_data(self.model.document(), &self.conversion)
    }

    /// Serialized data tree
    pub fn get_data(&self) -> String {
        to_markup(&self.data_view())
    }

    /// Serialized editing view, as patched so far
    pub fn editing_markup(&self) -> String {
        to_markup(&self.editing.to_fragment())
    }

    /// Serialized editing view converted from scratch
    pub fn fresh_editing_markup(&self) -> String {
        let fresh = EditingView::convert_document(self.model.document(), &self.conversion);
        to_markup(&fresh.to_fragment())
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn is_enabled(&self, name: &str) -> bool {
        self.commands
            .get(name)
            .is_some_and(|command| command.is_enabled(self))
    }

    /// State of a toggle command
    pub fn command_value(&self, name: &str) -> Option<bool> {
        self.commands.get(name).and_then(|command| command.value(self))
    }

    /// Execute a named command
    ///
    /// Validation failures come back as [`CommandOutcome::Refused`] with the
    /// model untouched; faults and lookup failures are errors.
    pub fn execute(&mut self, name: &str, params: &CommandParams) -> EditorResult<CommandOutcome> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;

        if !command.is_enabled(self) {
            tracing::debug!(command = name, "command is disabled");
            let reason = EditorError::CommandDisabled {
                command: name.to_string(),
            };
            return Ok(CommandOutcome::Refused(reason.to_string()));
        }

        match command.execute(self, params) {
            Ok(()) => {
                tracing::debug!(command = name, "command applied");
                Ok(CommandOutcome::Applied)
            }
            Err(err) if err.is_validation() => {
                tracing::debug!(command = name, error = %err, "command refused");
                Ok(CommandOutcome::Refused(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::Fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paragraph_round_trip() {
        let mut editor = Editor::new().unwrap();
        editor.set_data("<p>Hello   <b>world</b></p><p align=\"center\">x</p>").unwrap();
        assert_eq!(
            editor.get_data(),
            "<p>Hello world</p><p align=\"center\">x</p>"
        );
        assert_eq!(editor.editing_markup(), editor.fresh_editing_markup());
    }

    #[test]
    fn test_inline_root_text_is_wrapped() {
        let mut editor = Editor::new().unwrap();
        editor.set_data("loose <i>text</i>").unwrap();
        assert_eq!(editor.get_data(), "<p>loose text</p>");
    }

    #[test]
    fn test_submit_patches_editing_view() {
        let mut editor = Editor::new().unwrap();
        editor.set_data("<p>a</p>").unwrap();
        let root = editor.document().root();
        editor
            .submit(&[Mutation::Insert {
                parent: root,
                index: 1,
                fragment: Fragment::element("paragraph").with_child(Fragment::text("b")),
            }])
            .unwrap();
        assert_eq!(editor.get_data(), "<p>a</p><p>b</p>");
        assert_eq!(editor.editing_markup(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_rejected_submit_changes_nothing() {
        let mut editor = Editor::new().unwrap();
        editor.set_data("<p>a</p>").unwrap();
        let root = editor.document().root();
        let err = editor
            .submit(&[
                Mutation::Insert {
                    parent: root,
                    index: 1,
                    fragment: Fragment::element("paragraph"),
                },
                Mutation::Insert {
                    parent: root,
                    index: 0,
                    fragment: Fragment::text("loose"),
                },
            ])
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(editor.get_data(), "<p>a</p>");
        assert_eq!(editor.editing_markup(), "<p>a</p>");
    }

    #[test]
    fn test_unknown_command() {
        let mut editor = Editor::new().unwrap();
        assert!(matches!(
            editor.execute("nope", &CommandParams::new()),
            Err(EditorError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_post_fix_cap_from_config() {
        let mut config = Config::new();
        config.set(CONFIG_POST_FIX_CAP, 3usize);
        let editor = Editor::table_editor_with_config(config).unwrap();
        assert_eq!(editor.model().post_fix_cap(), 3);
        assert_eq!(editor.features(), &["paragraph", "table"]);
    }
}
