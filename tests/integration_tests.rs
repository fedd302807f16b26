//! Integration tests for tabledit editing, conversion and table commands

use pretty_assertions::assert_eq;
use tabledit::{
    constants::*,
    core::{EditingView, Fragment, Operation, PostFixer, Services, Writer},
    paragraph::Paragraph,
    table::{cell_at, tables, TableEditing, TableMap},
    AttributeValue, CommandParams, Config, Editor, EditorError, EditorResult, Feature, Mutation,
    Schema, SchemaItemDefinition, Selection,
};

// ============================================================================
// Helpers
// ============================================================================

fn load(markup: &str) -> Editor {
    let mut editor = Editor::table_editor().unwrap();
    editor.set_data(markup).unwrap();
    editor
}

fn first_table(editor: &Editor) -> tabledit::NodeId {
    tables(editor.document())[0]
}

fn caret(editor: &mut Editor, row: usize, column: usize) {
    let table = first_table(editor);
    let cell = cell_at(editor.document(), table, row, column).unwrap();
    editor.set_selection(Selection::Caret(cell)).unwrap();
}

fn select(editor: &mut Editor, slots: &[(usize, usize)]) {
    let table = first_table(editor);
    let cells = slots
        .iter()
        .map(|&(r, c)| cell_at(editor.document(), table, r, c).unwrap())
        .collect();
    editor.set_selection(Selection::Cells(cells)).unwrap();
}

fn run(editor: &mut Editor, command: &str) {
    let outcome = editor.execute(command, &CommandParams::new()).unwrap();
    assert!(outcome.is_applied(), "{} was {}", command, outcome);
}

/// Every table rectangular with fitting spans, every cell non-empty, and the
/// patched editing view equal to a fresh conversion
fn assert_consistent(editor: &Editor) {
    let doc = editor.document();
    for table in tables(doc) {
        let map = TableMap::build(doc, table);
        assert!(map.is_rectangular(), "table {} is not rectangular", table);
        for slot in map.cells() {
            assert!(!slot.is_truncated(), "cell {} has spans that do not fit", slot.cell);
            assert!(doc.child_count(slot.cell) > 0, "cell {} is empty", slot.cell);
        }
    }
    assert_eq!(editor.editing_markup(), editor.fresh_editing_markup());
}

fn figure(body: &str) -> String {
    format!("<figure class=\"table\"><table>{}</table></figure>", body)
}

// ============================================================================
// Loading and Output
// ============================================================================

mod data_pipeline {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_is_stable() {
        for (rows, columns) in [(1, 1), (2, 3), (4, 2)] {
            let mut markup = String::from("<table>");
            for r in 0..rows {
                markup.push_str("<tr>");
                for c in 0..columns {
                    markup.push_str(&format!("<td>{}-{}</td>", r, c));
                }
                markup.push_str("</tr>");
            }
            markup.push_str("</table>");

            let first = load(&markup).get_data();
            let second = load(&first).get_data();
            assert_eq!(first, second, "{}x{} is not stable", rows, columns);
            assert_eq!(first.matches("<td>").count(), rows * columns);
        }
    }

    #[test]
    fn test_empty_row_is_dropped() {
        let editor = load("<table><tr><td>a</td></tr><tr></tr><tr><td>b</td></tr></table>");
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td>a</td></tr><tr><td>b</td></tr></tbody>")
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_invalid_spans_become_one() {
        let editor = load(
            "<table><tr><td colspan=\"abc\">a</td><td rowspan=\"-2\">b</td><td colspan=\"0\">c</td></tr></table>",
        );
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td>a</td><td>b</td><td>c</td></tr></tbody>")
        );
    }

    #[test]
    fn test_oversized_rowspan_is_truncated() {
        let editor = load(
            "<table><tr><td rowspan=\"5\">a</td><td>b</td></tr><tr><td>c</td></tr></table>",
        );
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td rowspan=\"2\">a</td><td>b</td></tr><tr><td>c</td></tr></tbody>")
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_oversized_colspan_is_clamped() {
        let editor = load(
            "<table><tr><td colspan=\"2000000000\">a</td></tr><tr><td>b</td></tr></table>",
        );
        let doc = editor.document();
        let table = first_table(&editor);
        let map = TableMap::build(doc, table);
        assert_eq!((map.row_count(), map.column_count()), (2, MAX_SPAN));

        let wide = cell_at(doc, table, 0, 0).unwrap();
        assert_eq!(doc.int_attribute(wide, COLSPAN, 1), MAX_SPAN as i64);
        assert!(editor
            .get_data()
            .contains(&format!("<td colspan=\"{}\">a</td>", MAX_SPAN)));
        assert_consistent(&editor);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let editor = load("<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></table>");
        assert_eq!(
            editor.get_data(),
            figure(
                "<tbody><tr><td>a</td><td>b</td><td>c</td></tr>\
                 <tr><td>d</td><td></td><td></td></tr></tbody>"
            )
        );
    }

    #[test]
    fn test_headings_are_read_from_markup() {
        let editor = load(
            "<table><thead><tr><th>h1</th><th>h2</th></tr></thead>\
             <tbody><tr><th>r</th><td>x</td></tr></tbody></table>",
        );
        let doc = editor.document();
        let table = first_table(&editor);
        assert_eq!(doc.int_attribute(table, HEADING_ROWS, 0), 1);
        assert_eq!(doc.int_attribute(table, HEADING_COLUMNS, 0), 1);
        assert_eq!(
            editor.get_data(),
            figure(
                "<thead><tr><th>h1</th><th>h2</th></tr></thead>\
                 <tbody><tr><th>r</th><td>x</td></tr></tbody>"
            )
        );
    }

    #[test]
    fn test_caption_keeps_the_figure() {
        let editor = load(
            "<figure class=\"table\"><table><tr><td>a</td></tr></table>\
             <figcaption>Caption</figcaption></figure>",
        );
        assert_eq!(
            editor.get_data(),
            "<figure class=\"table\"><table><tbody><tr><td>a</td></tr></tbody></table>\
             <figcaption>Caption</figcaption></figure>"
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_cell_content_keeps_paragraphs() {
        let editor = load("<table><tr><td><p>a</p><p align=\"right\">b</p></td></tr></table>");
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td><p>a</p><p align=\"right\">b</p></td></tr></tbody>")
        );
        assert!(editor.editing_markup().contains("<p align=\"right\">b</p>"));
    }

    #[test]
    fn test_nested_table() {
        let editor = load(
            "<table><tr><td><table><tr><td>inner</td></tr></table></td></tr></table>",
        );
        assert_eq!(tables(editor.document()).len(), 2);
        assert_eq!(
            editor.get_data(),
            figure(&format!(
                "<tbody><tr><td>{}</td></tr></tbody>",
                figure("<tbody><tr><td>inner</td></tr></tbody>")
            ))
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_editing_view_marks_widgets() {
        let editor = load("<table><tr><td>a</td></tr></table>");
        let editing = editor.editing_markup();
        assert!(editing.contains("ck-widget"));
        assert!(editing.contains("contenteditable=\"false\""));
        assert!(editing.contains("ck-table-bogus-paragraph"));
    }
}

// ============================================================================
// Host Mutations
// ============================================================================

mod mutations {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cells_are_never_left_empty() {
        let mut editor = load("<table><tr><td>a</td><td>b</td></tr></table>");
        let table = first_table(&editor);
        let cell = cell_at(editor.document(), table, 0, 0).unwrap();
        let paragraph = editor.document().children(cell)[0];

        editor.submit(&[Mutation::Remove { node: paragraph }]).unwrap();
        assert_eq!(editor.document().child_count(cell), 1);
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td></td><td>b</td></tr></tbody>")
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_row_without_cells_is_removed() {
        let mut editor = load("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>");
        let table = first_table(&editor);
        let b = cell_at(editor.document(), table, 1, 0).unwrap();

        editor.submit(&[Mutation::Remove { node: b }]).unwrap();
        assert_eq!(editor.get_data(), figure("<tbody><tr><td>a</td></tr></tbody>"));
        assert_consistent(&editor);
    }

    #[test]
    fn test_extra_cell_pads_other_rows() {
        let mut editor = load("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>");
        let table = first_table(&editor);
        let row = editor.document().children(table)[0];

        editor
            .submit(&[Mutation::Insert {
                parent: row,
                index: 1,
                fragment: Fragment::element(TABLE_CELL)
                    .with_child(Fragment::element(PARAGRAPH).with_child(Fragment::text("x"))),
            }])
            .unwrap();
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td>a</td><td>x</td></tr><tr><td>b</td><td></td></tr></tbody>")
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_moving_row_across_heading_boundary() {
        let mut editor = load(
            "<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>b</td></tr></tbody></table>",
        );
        let table = first_table(&editor);
        let body_row = editor.document().children(table)[1];

        editor
            .submit(&[Mutation::Move {
                node: body_row,
                parent: table,
                index: 0,
            }])
            .unwrap();
        assert_eq!(
            editor.get_data(),
            figure("<thead><tr><th>b</th></tr></thead><tbody><tr><td>h</td></tr></tbody>")
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_schema_violation_rolls_back() {
        let mut editor = load("<table><tr><td>a</td></tr></table>");
        let table = first_table(&editor);
        let before = editor.get_data();

        let err = editor
            .submit(&[Mutation::Insert {
                parent: table,
                index: 0,
                fragment: Fragment::element(PARAGRAPH),
            }])
            .unwrap_err();
        assert!(matches!(err, EditorError::SchemaViolation { .. }));
        assert_eq!(editor.get_data(), before);
        assert_consistent(&editor);
    }
}

// ============================================================================
// Table Commands
// ============================================================================

mod commands {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grid_stays_consistent_through_a_session() {
        let mut editor = Editor::table_editor().unwrap();
        editor
            .execute(INSERT_TABLE, &CommandParams::with_size(3, 3))
            .unwrap();
        assert_consistent(&editor);

        caret(&mut editor, 1, 1);
        run(&mut editor, INSERT_ROW_BELOW);
        assert_consistent(&editor);

        caret(&mut editor, 0, 0);
        run(&mut editor, INSERT_COLUMN_RIGHT);
        assert_consistent(&editor);

        select(&mut editor, &[(0, 0), (0, 1), (1, 0), (1, 1)]);
        run(&mut editor, MERGE_CELLS);
        assert_consistent(&editor);

        caret(&mut editor, 0, 0);
        run(&mut editor, SPLIT_CELL_VERTICALLY);
        assert_consistent(&editor);

        caret(&mut editor, 0, 0);
        run(&mut editor, SET_ROW_HEADER);
        assert_consistent(&editor);

        caret(&mut editor, 2, 3);
        run(&mut editor, REMOVE_COLUMN);
        assert_consistent(&editor);

        caret(&mut editor, 0, 0);
        run(&mut editor, MERGE_CELL_RIGHT);
        assert_consistent(&editor);

        caret(&mut editor, 3, 0);
        run(&mut editor, REMOVE_ROW);
        assert_consistent(&editor);

        caret(&mut editor, 0, 0);
        run(&mut editor, SPLIT_CELL_HORIZONTALLY);
        assert_consistent(&editor);

        let map = TableMap::build(editor.document(), first_table(&editor));
        assert_eq!((map.row_count(), map.column_count()), (3, 3));
        let data = editor.get_data();
        assert_eq!(load(&data).get_data(), data);
    }

    #[test]
    fn test_rectangular_merge() {
        let mut editor = load("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>");
        select(&mut editor, &[(0, 0), (0, 1)]);
        run(&mut editor, MERGE_CELLS);
        assert_eq!(
            editor.get_data(),
            figure(
                "<tbody><tr><td colspan=\"2\"><p>a</p><p>b</p></td></tr>\
                 <tr><td>c</td><td>d</td></tr></tbody>"
            )
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_non_rectangular_merge_changes_nothing() {
        let mut editor = load(
            "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>",
        );
        select(&mut editor, &[(0, 0), (0, 1), (1, 0)]);
        let data = editor.get_data();
        let editing = editor.editing_markup();

        let outcome = editor.execute(MERGE_CELLS, &CommandParams::new()).unwrap();
        assert!(!outcome.is_applied());
        assert_eq!(editor.get_data(), data);
        assert_eq!(editor.editing_markup(), editing);
    }

    #[test]
    fn test_split_wide_cell() {
        let mut editor = load(
            "<table><tr><td colspan=\"4\">a</td></tr>\
             <tr><td>1</td><td>2</td><td>3</td><td>4</td></tr></table>",
        );
        caret(&mut editor, 0, 0);
        run(&mut editor, SPLIT_CELL_VERTICALLY);

        let map = TableMap::build(editor.document(), first_table(&editor));
        let spans: Vec<usize> = map
            .cells()
            .iter()
            .filter(|slot| slot.row == 0)
            .map(|slot| slot.colspan)
            .collect();
        assert_eq!(spans, vec![2, 2]);
        assert_consistent(&editor);
    }

    #[test]
    fn test_heading_rows_toggle() {
        let mut editor = load(
            "<table><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></table>",
        );
        let table = first_table(&editor);

        caret(&mut editor, 1, 0);
        run(&mut editor, SET_ROW_HEADER);
        assert_eq!(editor.document().int_attribute(table, HEADING_ROWS, 0), 2);
        assert_eq!(
            editor.get_data(),
            figure(
                "<thead><tr><th>a</th></tr><tr><th>b</th></tr></thead>\
                 <tbody><tr><td>c</td></tr></tbody>"
            )
        );
        assert_consistent(&editor);

        caret(&mut editor, 1, 0);
        run(&mut editor, SET_ROW_HEADER);
        assert_eq!(editor.document().int_attribute(table, HEADING_ROWS, 0), 0);
        assert_eq!(
            editor.get_data(),
            figure("<tbody><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></tbody>")
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_forced_heading_value() {
        let mut editor = load(
            "<table><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></table>",
        );
        let table = first_table(&editor);
        caret(&mut editor, 1, 0);
        editor
            .execute(SET_ROW_HEADER, &CommandParams::forced(true))
            .unwrap();
        editor
            .execute(SET_ROW_HEADER, &CommandParams::forced(true))
            .unwrap();
        assert_eq!(editor.document().int_attribute(table, HEADING_ROWS, 0), 2);

        caret(&mut editor, 1, 0);
        editor
            .execute(SET_ROW_HEADER, &CommandParams::forced(false))
            .unwrap();
        assert_eq!(editor.document().int_attribute(table, HEADING_ROWS, 0), 1);
        assert_consistent(&editor);
    }

    #[test]
    fn test_disabled_commands_outside_tables() {
        let mut editor = load("<p>x</p>");
        let paragraph = editor.document().children(editor.document().root())[0];
        editor.set_selection(Selection::Caret(paragraph)).unwrap();
        for name in TABLE_COMMANDS {
            if *name == INSERT_TABLE {
                assert!(editor.is_enabled(name));
            } else {
                assert!(!editor.is_enabled(name), "{} should be disabled", name);
            }
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

mod engine {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Flips every freshly set alignment back and forth forever
    struct PingPong;

    impl PostFixer for PingPong {
        fn name(&self) -> &'static str {
            "ping-pong"
        }

        fn fix(&self, writer: &mut Writer<'_>, _view: &EditingView) -> EditorResult<bool> {
            let target = writer.operations().iter().rev().find_map(|op| match op {
                Operation::Attribute { node, key, .. } if key == ALIGNMENT => Some(*node),
                _ => None,
            });
            let Some(node) = target else {
                return Ok(false);
            };
            let current = writer
                .document()
                .attribute(node, ALIGNMENT)
                .and_then(|value| value.as_text())
                == Some("left");
            writer.set_attribute(node, ALIGNMENT, if current { "right" } else { "left" })?;
            Ok(true)
        }
    }

    struct PingPongFeature;

    impl Feature for PingPongFeature {
        fn name(&self) -> &'static str {
            "ping-pong"
        }

        fn register(&self, services: &mut Services<'_>) -> EditorResult<()> {
            services.add_post_fixer(Box::new(PingPong));
            Ok(())
        }
    }

    #[test]
    fn test_consistency_fault_rolls_back_and_halts() {
        let mut editor = Editor::with_features(
            Config::new(),
            &[&Paragraph, &TableEditing, &PingPongFeature],
        )
        .unwrap();
        editor
            .set_data("<p>outside</p><table><tr><td>a</td></tr></table>")
            .unwrap();
        let data = editor.get_data();
        let table = first_table(&editor);
        let cell = cell_at(editor.document(), table, 0, 0).unwrap();
        let paragraph = editor.document().children(cell)[0];

        let err = editor
            .submit(&[Mutation::SetAttribute {
                node: paragraph,
                key: ALIGNMENT.to_string(),
                value: Some(AttributeValue::from("center")),
            }])
            .unwrap_err();
        assert!(err.is_fault());
        assert!(matches!(err, EditorError::ConsistencyFault { .. }));
        assert_eq!(editor.get_data(), data);
        assert!(editor.model().halted().contains(&table));
        assert_consistent(&editor);

        // The halted table refuses further changes
        let err = editor
            .submit(&[Mutation::Remove { node: paragraph }])
            .unwrap_err();
        assert!(matches!(err, EditorError::Halted(region) if region == table));

        // The rest of the document keeps working
        let root = editor.document().root();
        editor
            .submit(&[Mutation::Insert {
                parent: root,
                index: 0,
                fragment: Fragment::element(PARAGRAPH).with_child(Fragment::text("new")),
            }])
            .unwrap();
        assert!(editor.get_data().starts_with("<p>new</p><p>outside</p>"));

        // Loading new data releases the halted region
        editor.set_data("<table><tr><td>b</td></tr></table>").unwrap();
        assert!(editor.model().halted().is_empty());
    }

    #[test]
    fn test_schema_rejects_self_reference() {
        let mut schema = Schema::new();
        let err = schema
            .register("box", SchemaItemDefinition::new().allow_in("box"))
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidSchemaDefinition { .. }));
    }

    #[test]
    fn test_post_fixers_run_in_registration_order() {
        let editor = Editor::table_editor().unwrap();
        assert_eq!(
            editor.model().post_fixer_names(),
            vec!["heading-rows-refresh", "table-layout", "cell-refresh", "cell-paragraph"]
        );
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[cfg(feature = "config-toml")]
mod config {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_toml_overrides_defaults() {
        let config = Config::from_toml_str(
            "[table.defaultHeadings]\nrows = 1\ncolumns = 1\n\n[engine]\npostFixIterationCap = 4\n",
        )
        .unwrap();
        let mut editor = Editor::table_editor_with_config(config).unwrap();
        assert_eq!(editor.model().post_fix_cap(), 4);

        editor
            .execute(INSERT_TABLE, &CommandParams::with_size(2, 2))
            .unwrap();
        assert_eq!(
            editor.get_data(),
            figure(
                "<thead><tr><th></th><th></th></tr></thead>\
                 <tbody><tr><th></th><td></td></tr></tbody>"
            )
        );
        assert_consistent(&editor);
    }

    #[test]
    fn test_invalid_config_value() {
        let config = Config::from_toml_str("[engine]\npostFixIterationCap = \"many\"\n").unwrap();
        let err = Editor::table_editor_with_config(config).err().unwrap();
        assert!(matches!(err, EditorError::Config { .. }));
    }
}
