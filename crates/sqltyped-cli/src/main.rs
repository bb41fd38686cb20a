//! sqltyped CLI - compiles annotated SQL into a typed query IR

mod args;
mod config;
mod output;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sqltyped_core::codegen::query_helpers;
use sqltyped_core::schema::SchemaBuilder;
use sqltyped_core::{sort_by_name, Catalog, CompileOptions, Compiler, HelperRegistry, SqlDialect};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, OutputFormat};
use crate::config::{Config, CONFIG_FILE};
use crate::output::{CompileReport, OutputFormatter};

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn run(args: Args) -> Result<bool> {
    let quiet = args.quiet;
    match args.command {
        Command::Compile {
            files,
            schema,
            schema_dir,
            dialect,
            format,
            config: config_path,
            positional_parameters,
        } => {
            let config = if let Some(path) = config_path {
                Config::from_file(&path)?
            } else {
                Config::find_and_load()?.unwrap_or_default()
            };

            // CLI args take precedence
            let config = config.merge_with_args(
                &schema,
                &schema_dir,
                &files,
                &dialect,
                &format,
                positional_parameters,
            );

            let dialect: SqlDialect = config
                .dialect
                .as_deref()
                .unwrap_or("postgresql")
                .parse()
                .map_err(|e: String| miette::miette!(e))?;

            let output_format = match config.format.as_deref() {
                Some(fmt) => fmt.parse().map_err(|e: String| miette::miette!(e))?,
                None => OutputFormat::Human,
            };

            let schema_files = collect_schema_files(&config)?;
            if schema_files.is_empty() {
                miette::bail!(
                    "No schema files specified. Use --schema, --schema-dir, or configure in {}",
                    CONFIG_FILE
                );
            }

            let Some(catalog) = build_catalog(&schema_files, dialect)? else {
                return Ok(true);
            };

            let query_files = expand_patterns(&config.queries)?;
            if query_files.is_empty() {
                miette::bail!(
                    "No query files specified. Use positional arguments or configure in {}",
                    CONFIG_FILE
                );
            }

            let mut options = CompileOptions::new(dialect);
            if let Some(positional) = config.positional_parameters {
                options = options.with_positional_parameters(positional);
            }
            let compiler = Compiler::new(&catalog, options);

            let mut queries = Vec::new();
            let mut diagnostics = Vec::new();
            let mut sources = Vec::new();
            for query_file in &query_files {
                let name = query_file.display().to_string();
                let content = fs::read_to_string(query_file).into_diagnostic()?;
                let compiled = compiler.compile(&content, &name);
                tracing::debug!(
                    file = %name,
                    queries = compiled.queries.len(),
                    errors = compiled.diagnostics.len(),
                    "compiled file"
                );
                queries.extend(compiled.queries);
                diagnostics.extend(compiled.diagnostics);
                sources.push((name, content));
            }

            sort_by_name(&mut queries);

            let mut helpers = HelperRegistry::new();
            for query in &queries {
                for helper in query_helpers(query) {
                    helpers.claim(&config.generate.package, helper);
                }
            }

            let report = CompileReport {
                queries: &queries,
                helpers: &helpers,
                diagnostics: &diagnostics,
            };
            OutputFormatter::new(output_format).print_report(&report, &sources)?;

            if !quiet {
                if diagnostics.is_empty() {
                    eprintln!(
                        "Compiled {} quer{} from {} file(s)",
                        queries.len(),
                        if queries.len() == 1 { "y" } else { "ies" },
                        query_files.len()
                    );
                } else {
                    eprintln!(
                        "Found {} error(s) in {} file(s)",
                        diagnostics.len(),
                        query_files.len()
                    );
                }
            }

            Ok(!diagnostics.is_empty())
        }

        Command::Schema {
            files,
            dialect,
            json,
        } => {
            let dialect: SqlDialect = dialect.parse().map_err(|e: String| miette::miette!(e))?;
            let mut builder = SchemaBuilder::with_dialect(dialect);
            for schema_file in &files {
                let content = fs::read_to_string(schema_file).into_diagnostic()?;
                let _ = builder.parse(&content);
            }
            let (catalog, _) = builder.build();

            if json {
                println!("{}", serde_json::to_string_pretty(&catalog).into_diagnostic()?);
                return Ok(false);
            }

            println!("Schema Information:");
            println!("==================");
            for (schema_name, schema) in &catalog.schemas {
                println!("\nSchema: {}", schema_name);
                for (table_name, table) in &schema.tables {
                    println!("  Table: {}", table_name);
                    for (col_name, col) in &table.columns {
                        let nullable = if col.nullable { "NULL" } else { "NOT NULL" };
                        println!(
                            "    - {} {} {}",
                            col_name,
                            col.data_type.display_name(),
                            nullable
                        );
                    }
                }
            }

            Ok(false)
        }

        Command::Parse { file, dialect } => {
            // Parse and display AST (for debugging)
            let content = fs::read_to_string(&file).into_diagnostic()?;
            let dialect: SqlDialect = dialect.parse().map_err(|e: String| miette::miette!(e))?;

            use sqlparser::parser::Parser;

            match Parser::parse_sql(dialect.parser_dialect().as_ref(), &content) {
                Ok(statements) => {
                    for (i, stmt) in statements.iter().enumerate() {
                        println!("Statement {}:", i + 1);
                        println!("{:#?}", stmt);
                        println!();
                    }
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    return Ok(true);
                }
            }

            Ok(false)
        }
    }
}

fn collect_schema_files(config: &Config) -> Result<Vec<PathBuf>> {
    let mut schema_files = expand_patterns(&config.schema)?;
    if let Some(dir) = &config.schema_dir {
        let pattern = format!("{}/**/*.sql", dir);
        schema_files.extend(glob::glob(&pattern).into_diagnostic()?.flatten());
    }
    Ok(schema_files)
}

/// Paths as given, with glob patterns expanded
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains('*') {
            files.extend(glob::glob(pattern).into_diagnostic()?.flatten());
        } else {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

/// Build the catalog, printing schema errors. `None` when the schema has errors.
fn build_catalog(schema_files: &[PathBuf], dialect: SqlDialect) -> Result<Option<Catalog>> {
    let mut builder = SchemaBuilder::with_dialect(dialect);
    for schema_file in schema_files {
        let content = fs::read_to_string(schema_file).into_diagnostic()?;
        if let Err(diags) = builder.parse(&content) {
            let name = schema_file.display().to_string();
            let diags: Vec<_> = diags.into_iter().map(|d| d.with_file(name.clone())).collect();
            let report = CompileReport {
                queries: &[],
                helpers: &HelperRegistry::new(),
                diagnostics: &diags,
            };
            OutputFormatter::new(OutputFormat::Human).print_report(&report, &[(name, content)])?;
            return Ok(None);
        }
    }
    let (catalog, schema_diags) = builder.build();

    if !schema_diags.is_empty() {
        tracing::warn!(count = schema_diags.len(), "schema parsing produced warnings");
    }
    Ok(Some(catalog))
}
