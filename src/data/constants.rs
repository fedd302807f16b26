//! Names and limits shared across the editor
//!
//! Model element names, attribute keys, view element names, command names
//! and config keys live here so that converters, post-fixers and commands
//! agree on spelling.

// ============================================================================
// Model Element Names
// ============================================================================

pub const ROOT: &str = "$root";
pub const BLOCK: &str = "$block";
pub const TEXT: &str = "$text";
pub const PARAGRAPH: &str = "paragraph";
pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "tableRow";
pub const TABLE_CELL: &str = "tableCell";
pub const TABLE_FIGURE: &str = "tableFigure";
pub const TABLE_CAPTION: &str = "tableCaption";

// ============================================================================
// Model Attribute Keys
// ============================================================================

pub const HEADING_ROWS: &str = "headingRows";
pub const HEADING_COLUMNS: &str = "headingColumns";
pub const COLSPAN: &str = "colspan";
pub const ROWSPAN: &str = "rowspan";
pub const ALIGNMENT: &str = "alignment";
pub const HTML_ATTRIBUTES: &str = "htmlAttributes";

// ============================================================================
// View Names and Classes
// ============================================================================

pub const VIEW_ROOT: &str = "$root";
pub const BOGUS_PARAGRAPH_CLASS: &str = "ck-table-bogus-paragraph";
pub const WIDGET_CLASS: &str = "ck-widget";
pub const NESTED_EDITABLE_CLASS: &str = "ck-editor__editable ck-editor__nested-editable";

// ============================================================================
// Command Names
// ============================================================================

pub const INSERT_TABLE: &str = "insertTable";
pub const INSERT_ROW_ABOVE: &str = "insertTableRowAbove";
pub const INSERT_ROW_BELOW: &str = "insertTableRowBelow";
pub const INSERT_COLUMN_LEFT: &str = "insertTableColumnLeft";
pub const INSERT_COLUMN_RIGHT: &str = "insertTableColumnRight";
pub const REMOVE_ROW: &str = "removeTableRow";
pub const REMOVE_COLUMN: &str = "removeTableColumn";
pub const SPLIT_CELL_VERTICALLY: &str = "splitTableCellVertically";
pub const SPLIT_CELL_HORIZONTALLY: &str = "splitTableCellHorizontally";
pub const MERGE_CELLS: &str = "mergeTableCells";
pub const MERGE_CELL_RIGHT: &str = "mergeTableCellRight";
pub const MERGE_CELL_LEFT: &str = "mergeTableCellLeft";
pub const MERGE_CELL_DOWN: &str = "mergeTableCellDown";
pub const MERGE_CELL_UP: &str = "mergeTableCellUp";
pub const SET_COLUMN_HEADER: &str = "setTableColumnHeader";
pub const SET_ROW_HEADER: &str = "setTableRowHeader";
pub const SELECT_ROW: &str = "selectTableRow";
pub const SELECT_COLUMN: &str = "selectTableColumn";

/// Every command the table feature registers, in registration order
pub const TABLE_COMMANDS: &[&str] = &[
    INSERT_TABLE,
    INSERT_ROW_ABOVE,
    INSERT_ROW_BELOW,
    INSERT_COLUMN_LEFT,
    INSERT_COLUMN_RIGHT,
    REMOVE_ROW,
    REMOVE_COLUMN,
    SPLIT_CELL_VERTICALLY,
    SPLIT_CELL_HORIZONTALLY,
    MERGE_CELLS,
    MERGE_CELL_RIGHT,
    MERGE_CELL_LEFT,
    MERGE_CELL_DOWN,
    MERGE_CELL_UP,
    SET_COLUMN_HEADER,
    SET_ROW_HEADER,
    SELECT_ROW,
    SELECT_COLUMN,
];

// ============================================================================
// Config Keys and Limits
// ============================================================================

pub const CONFIG_DEFAULT_HEADING_ROWS: &str = "table.defaultHeadings.rows";
pub const CONFIG_DEFAULT_HEADING_COLUMNS: &str = "table.defaultHeadings.columns";
pub const CONFIG_POST_FIX_CAP: &str = "engine.postFixIterationCap";

/// Post-fix passes allowed per batch before the engine gives up
pub const DEFAULT_POST_FIX_CAP: usize = 16;

/// Size used by `insertTable` when no rows/columns are given
pub const DEFAULT_TABLE_ROWS: usize = 2;
pub const DEFAULT_TABLE_COLUMNS: usize = 2;

/// Largest colspan or rowspan a cell can hold; bigger values are clamped
pub const MAX_SPAN: usize = 1000;
