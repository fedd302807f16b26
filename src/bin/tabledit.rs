//! tabledit CLI - normalize table markup and run table commands on it

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::process::ExitCode;
#[cfg(feature = "cli")]
use tabledit::{
    constants::TABLE_COMMANDS,
    table::{tables, TableMap},
    CommandOutcome, CommandParams, Config, Editor, EditorResult, Selection,
};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "tabledit")]
#[command(version)]
#[command(about = "tabledit - structured table editing over HTML-like markup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Load markup and print it back in canonical form
    Convert {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: Option<String>,

        /// Which view to print
        #[arg(long, value_enum, default_value_t = ViewKind::Data)]
        view: ViewKind,

        /// Print the data view as JSON (needs the `serde` feature)
        #[arg(long)]
        json: bool,
    },

    /// Run one table command with the caret in a cell of the first table
    Exec {
        /// Command name, e.g. mergeTableCellRight
        command: String,

        /// Input file path (reads from stdin if not provided)
        input: Option<String>,

        /// Cell as ROW,COLUMN
        #[arg(long, value_parser = parse_cell, default_value = "0,0")]
        cell: (usize, usize),

        /// Rows of a new table
        #[arg(long)]
        rows: Option<usize>,

        /// Columns of a new table
        #[arg(long)]
        columns: Option<usize>,

        /// Set a toggle instead of flipping it
        #[arg(long)]
        force: Option<bool>,

        /// Output file path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the grid of every table
    Inspect {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,
    },

    /// Show version, commands and configuration keys
    Info,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum ViewKind {
    /// Output markup
    Data,
    /// Editing view markup
    Editing,
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> EditorResult<ExitCode> {
    let config = match cli.config {
        Some(ref path) => Config::from_toml_file(path)?,
        None => Config::new(),
    };

    match cli.command {
        Commands::Convert {
            input,
            output,
            view,
            json,
        } => {
            let mut editor = Editor::table_editor_with_config(config)?;
            editor.set_data(&read_input(input.as_deref())?)?;

            let result = match view {
                _ if json => data_json(&editor)?,
                ViewKind::Data => editor.get_data(),
                ViewKind::Editing => editor.editing_markup(),
            };
            write_output(output.as_deref(), &result)?;
        }

        Commands::Exec {
            command,
            input,
            cell,
            rows,
            columns,
            force,
            output,
        } => {
            let mut editor = Editor::table_editor_with_config(config)?;
            editor.set_data(&read_input(input.as_deref())?)?;

            // insertTable works without a table to place the caret in
            let doc = editor.document();
            if let Some(&table) = tables(doc).first() {
                if let Some(target) = tabledit::table::cell_at(doc, table, cell.0, cell.1) {
                    editor.set_selection(Selection::Caret(target))?;
                }
            }

            let params = CommandParams {
                rows,
                columns,
                force_value: force,
            };
            let outcome = editor.execute(&command, &params)?;
            if let CommandOutcome::Refused(reason) = &outcome {
                eprintln!("Refused: {}", reason);
                return Ok(ExitCode::from(2));
            }
            write_output(output.as_deref(), &editor.get_data())?;
        }

        Commands::Inspect { input } => {
            let mut editor = Editor::table_editor_with_config(config)?;
            editor.set_data(&read_input(input.as_deref())?)?;
            let doc = editor.document();
            for (index, &table) in tables(doc).iter().enumerate() {
                let map = TableMap::build(doc, table);
                println!(
                    "table {}: {} x {}, heading rows {}, heading columns {}",
                    index + 1,
                    map.row_count(),
                    map.column_count(),
                    doc.int_attribute(table, tabledit::constants::HEADING_ROWS, 0),
                    doc.int_attribute(table, tabledit::constants::HEADING_COLUMNS, 0),
                );
                print!("{}", grid_picture(&map));
            }
        }

        Commands::Info => {
            println!("tabledit - structured table editing over HTML-like markup");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Commands:");
            for name in TABLE_COMMANDS {
                println!("  {}", name);
            }
            println!();
            println!("Configuration:");
            let editor = Editor::table_editor_with_config(config)?;
            for (key, value) in editor.config().entries() {
                println!("  {} = {}", key, value);
            }
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(all(feature = "cli", feature = "serde"))]
fn data_json(editor: &Editor) -> EditorResult<String> {
    serde_json::to_string_pretty(&editor.data_view())
        .map_err(|e| tabledit::EditorError::invalid_operation(e.to_string()))
}

#[cfg(all(feature = "cli", not(feature = "serde")))]
fn data_json(_editor: &Editor) -> EditorResult<String> {
    Err(tabledit::EditorError::config(
        "JSON output needs the `serde` feature",
    ))
}

#[cfg(feature = "cli")]
fn parse_cell(raw: &str) -> Result<(usize, usize), String> {
    let (row, column) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COLUMN, got '{}'", raw))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|e| format!("'{}': {}", part, e))
    };
    Ok((parse(row)?, parse(column)?))
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn write_output(path: Option<&str>, result: &str) -> io::Result<()> {
    match path {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            writeln!(file, "{}", result)?;
            eprintln!("✓ Output written to: {}", path);
        }
        None => println!("{}", result),
    }
    Ok(())
}

/// One line per row; each slot shows the reading-order number of its cell
#[cfg(feature = "cli")]
fn grid_picture(map: &TableMap) -> String {
    let mut out = String::new();
    for row in 0..map.row_count() {
        let line: Vec<String> = (0..map.column_count())
            .map(|column| {
                map.slot(row, column)
                    .and_then(|slot| map.cells().iter().position(|s| s.cell == slot.cell))
                    .map_or_else(|| ".".to_string(), |n| (n + 1).to_string())
            })
            .collect();
        out.push_str("  ");
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install tabledit --features cli");
    eprintln!("  tabledit convert [INPUT_FILE]");
}
