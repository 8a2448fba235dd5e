//! Tabula CLI
//!
//! Usage:
//!   tabula -p <PLATFORM> -c <COMMAND> [OPTIONS] [FILE]
//!
//! Reads raw command output from FILE (or stdin), resolves a template via
//! the index, and prints the parsed records.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use tabula::settings::{OutputFormat, Settings};
use tabula::{EngineError, FetchOptions, FileTransport, Orchestrator, Record, Transport, Value};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Parse device command output into structured records")]
struct Cli {
    /// Raw output file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Platform identifier for index resolution, e.g. cisco_nxos
    #[arg(short, long)]
    platform: String,

    /// Command whose output is being parsed
    #[arg(short, long)]
    command: String,

    /// Template directory (default: templates)
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Index file (default: <templates>/index)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Parse with this template file directly, bypassing the index
    #[arg(long)]
    template: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Replay captured output for this target from the capture directory
    #[arg(long, requires = "capture_dir")]
    target: Option<String>,

    /// Directory of captured command output, one file per target and command
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    // Load settings; flags win over settings, settings over defaults.
    let settings = match &cli.settings {
        Some(path) => match Settings::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading settings '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let raw_text = read_raw_text(&cli);

    let records = if let Some(template_path) = &cli.template {
        parse_with_template_file(template_path, &raw_text)
    } else {
        let templates = cli
            .templates
            .clone()
            .or(settings.templates.clone())
            .unwrap_or_else(|| PathBuf::from("templates"));
        let index = cli
            .index
            .clone()
            .or(settings.index.clone())
            .unwrap_or_else(|| templates.join("index"));

        let orchestrator = match Orchestrator::from_paths(&index, &templates) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        match orchestrator.run(&cli.platform, &cli.command, &raw_text) {
            Ok(records) => records,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    };

    let format = cli
        .format
        .map(OutputFormat::from)
        .or(settings.format)
        .unwrap_or(OutputFormat::Json);
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing records: {}", e);
                std::process::exit(1);
            }
        },
        OutputFormat::Text => print!("{}", render_text(&records)),
    }
}

/// Obtain raw output: capture directory replay, file, or stdin.
fn read_raw_text(cli: &Cli) -> String {
    if let (Some(target), Some(capture_dir)) = (&cli.target, &cli.capture_dir) {
        let transport = FileTransport::new(capture_dir);
        match transport.fetch_output(target, &cli.command, &FetchOptions::default()) {
            Ok(text) => return text,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            if io::stdin().is_terminal() {
                eprintln!(
                    "No input file given and stdin is a terminal.\n\
                     Pipe command output in, or pass a FILE argument. See --help."
                );
                std::process::exit(1);
            }
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Compile a template file directly and run it, printing compile failures
/// with source context.
fn parse_with_template_file(path: &PathBuf, raw_text: &str) -> Vec<Record> {
    let source = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading template '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };
    match tabula::parse(&source, raw_text) {
        Ok(records) => records,
        Err(EngineError::Template(e)) => {
            let filename = path.display().to_string();
            eprintln!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Render records as aligned text columns, one record per row.
fn render_text(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };

    let headers: Vec<&str> = first.field_names().collect();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len());
    for record in records {
        rows.push(
            headers
                .iter()
                .map(|name| record.get(name).map(display_value).unwrap_or_default())
                .collect(),
        );
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    render_row(&mut out, &headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(), &widths);
    for row in &rows {
        render_row(&mut out, row, &widths);
    }
    out
}

fn render_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Single(s) => s.clone(),
        Value::List(items) => items.join(","),
    }
}
