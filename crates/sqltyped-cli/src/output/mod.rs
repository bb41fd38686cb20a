//! Output formatting

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use sqltyped_core::{Diagnostic, HelperRegistry, Query, Severity};

use crate::args::OutputFormat;

/// Everything `sqltyped compile` prints as JSON
#[derive(Serialize)]
pub struct CompileReport<'a> {
    pub queries: &'a [Query],
    pub helpers: &'a HelperRegistry,
    pub diagnostics: &'a [Diagnostic],
}

/// Output formatter for compile results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the compiled queries and every diagnostic in the configured format
    pub fn print_report(&self, report: &CompileReport<'_>, sources: &[(String, String)]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for diag in report.diagnostics {
                    let source = diag
                        .file
                        .as_deref()
                        .and_then(|file| sources.iter().find(|(name, _)| name == file))
                        .map(|(_, text)| text.as_str())
                        .unwrap_or_default();
                    print_human(diag, source);
                }
                for query in report.queries {
                    print_query(query);
                }
                Ok(())
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
                Ok(())
            }
        }
    }
}

fn print_human(diag: &Diagnostic, source: &str) {
    let severity_str = match diag.severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
    };

    match &diag.query {
        Some(query) => eprintln!("{}[{}]: {}: {}", severity_str, diag.code(), query, diag.message),
        None => eprintln!("{}[{}]: {}", severity_str, diag.code(), diag.message),
    }

    if let Some(span) = &diag.span {
        eprintln!(
            "  --> {}:{}:{}",
            diag.file.as_deref().unwrap_or("<input>"),
            span.line,
            span.column
        );

        if let Some(source_line) = get_source_line(source, span.line) {
            eprintln!("   |");
            eprintln!("{:>3} | {}", span.line, source_line);

            let indent = span.column.saturating_sub(1);
            let padding = " ".repeat(indent);
            let width = source_line.chars().count().saturating_sub(indent).max(1);
            eprintln!("   | {}{}", padding, "^".repeat(width));
        }
    }

    if let Some(help) = &diag.help {
        eprintln!("   = help: {}", help);
    }

    eprintln!();
}

fn print_query(query: &Query) {
    println!("{} {} ({})", query.name, query.cmd, query.filename);
    for param in &query.params {
        println!(
            "  ${} {} {}{}",
            param.number,
            display_name(&param.column.name),
            param.column.data_type,
            nullability(param.column.not_null)
        );
    }
    for column in &query.columns {
        println!(
            "  -> {} {}{}",
            column.name,
            column.data_type,
            nullability(column.not_null)
        );
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "_"
    } else {
        name
    }
}

fn nullability(not_null: bool) -> &'static str {
    if not_null {
        " NOT NULL"
    } else {
        ""
    }
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}
