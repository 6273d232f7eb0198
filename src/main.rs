//! `sqlitedll-schema` CLI: read SQLite DDL text and either dump its parsed
//! [`sqlitedll_schema::Schema`] or regenerate canonical DDL from it.
//!
//! This binary is a thin driver; none of its I/O, argument parsing, or
//! logging belongs to the library's core. It never executes SQL or touches
//! a database.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use sqlitedll_schema::{generate, parse_schema, Error};

#[derive(ClapParser)]
#[command(
    name = "sqlitedll-schema",
    version,
    about = "Parse SQLite CREATE TABLE/CREATE INDEX DDL"
)]
struct Cli {
    /// DDL source file; pass `-` to read from stdin.
    path: PathBuf,

    /// Regenerate canonical DDL text instead of printing the parsed schema.
    #[arg(long)]
    regenerate: bool,
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();
    let result = run(cli);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger() {
    let level = std::env::var("SQLITEDLL_SCHEMA_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(log::LevelFilter::Off);
    let _ = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(level)
        .chain(io::stderr())
        .apply();
}

fn read_source(path: &PathBuf) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let src = read_source(&cli.path).map_err(|e| e.to_string())?;
    let schema = parse_schema(&src).map_err(|e| render_error(&src, &e))?;
    if cli.regenerate {
        println!("{}", generate(&schema));
    } else {
        for item in &schema.items {
            println!("{item:#?}");
        }
    }
    Ok(())
}

/// A span-based `source line + caret` rendering, same idiom as most
/// line-oriented parser CLIs: find the line containing the error's byte
/// offset and point at the column within it.
fn render_error(src: &str, error: &Error) -> String {
    let mut msg = format!("error: {error}");
    let Some(span) = error.span() else {
        return msg;
    };
    let at = span.start.min(src.len());
    let line_start = src[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = src[at..].find('\n').map(|i| at + i).unwrap_or(src.len());
    let line = &src[line_start..line_end];
    let col = at - line_start;
    msg.push_str(&format!("\n  |\n  | {line}\n  | {}^", " ".repeat(col)));
    msg
}
