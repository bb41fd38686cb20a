//! Query compiler: turns annotated SQL into [`Query`] records.
//!
//! Each statement goes through the same pipeline:
//!
//! 1. statement kind check
//! 2. text extraction
//! 3. parameter style and shape validation
//! 4. directive parsing (statements without one are skipped)
//! 5. named-parameter rewriting, reference scanning and resolution, omit
//!    validation, output columns
//! 6. text edits (placeholders and wildcard expansion), re-validated by
//!    parsing the edited text
//! 7. comment stripping
//!
//! A failure stops the statement it happened in; the remaining statements
//! are still compiled and every failure is reported as a [`Diagnostic`].

mod expand;
mod output;
mod params;
mod placeholder;
mod query;
mod resolve;
mod rewrite;
mod validate;

use std::ops::ControlFlow;

use sqlparser::ast::{visit_expressions, Expr, Statement, Value};
use sqlparser::dialect::{Dialect, GenericDialect};
use sqlparser::parser::Parser;

pub use placeholder::{locate, LimitSlot, NamedForm, Occurrence, PlaceholderKind};
pub use query::{sort_by_name, Column, InsertValues, Parameter, Query};

use crate::dialect::SqlDialect;
use crate::error::{CompileError, Diagnostic, Span};
use crate::metadata;
use crate::schema::Catalog;
use crate::source::{self, LineIndex, RawStatement};
use output::QueryCatalog;

/// Options for one compilation session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub dialect: SqlDialect,
    /// Emit `?` placeholders; defaults to what the dialect expects
    pub positional_parameters: Option<bool>,
}

impl CompileOptions {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            positional_parameters: None,
        }
    }

    pub fn with_positional_parameters(mut self, positional: bool) -> Self {
        self.positional_parameters = Some(positional);
        self
    }

    pub fn positional(&self) -> bool {
        self.positional_parameters
            .unwrap_or_else(|| self.dialect.positional_parameters())
    }
}

/// Result of compiling one source file
#[derive(Debug, Default)]
pub struct Compiled {
    pub queries: Vec<Query>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compiled {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Compiles query files against a catalog.
///
/// The catalog is borrowed immutably for the compiler's lifetime, so one
/// catalog can serve compilers on several threads.
pub struct Compiler<'a> {
    catalog: &'a Catalog,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a Catalog, options: CompileOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile every statement of `source`, collecting failures
    pub fn compile(&self, source: &str, filename: &str) -> Compiled {
        let mut compiled = Compiled::default();
        let index = LineIndex::new(source);

        for raw in source::split_statements(source, self.options.dialect) {
            match self.compile_statement(source, &raw, filename) {
                Ok(Some(query)) => compiled.queries.push(query),
                Ok(None) => {}
                Err(err) => {
                    let (line, column) = index.position(raw.location);
                    let mut diagnostic = Diagnostic::from(&err)
                        .with_span(Span::new(raw.location, raw.len, line, column))
                        .with_file(filename);
                    if let Some(name) = self.directive_name(raw.text(source)) {
                        diagnostic = diagnostic.with_query(name);
                    }
                    tracing::debug!(file = filename, line, error = %err, "statement failed");
                    compiled.diagnostics.push(diagnostic);
                }
            }
        }

        compiled
    }

    /// Compile one statement of `source`.
    ///
    /// Returns `Ok(None)` for statements that carry no directive.
    pub fn compile_statement(
        &self,
        source: &str,
        raw: &RawStatement,
        filename: &str,
    ) -> Result<Option<Query>, CompileError> {
        let dialect = self.options.dialect;
        let syntax = dialect.comment_syntax();
        let text = raw.text(source);
        let has_directive = text.lines().any(|line| syntax.is_directive(line));

        let stmt = match parse_statement(text, dialect.parser_dialect().as_ref()) {
            Ok(stmt) => stmt,
            Err(err) if has_directive => return Err(err),
            Err(err) => {
                tracing::debug!(file = filename, error = %err, "skipping unparseable statement");
                return Ok(None);
            }
        };

        if !is_supported(&stmt) {
            if has_directive {
                return Err(CompileError::UnsupportedStatement(statement_kind(&stmt)));
            }
            tracing::debug!(file = filename, kind = %statement_kind(&stmt), "skipping statement");
            return Ok(None);
        }

        let text = source::pluck(source, raw)?;

        let occurrences = placeholder::locate(text, dialect)?;
        validate::param_style(&occurrences)?;
        validate::param_ref(&occurrences)?;
        validate::insert_stmt(&stmt)?;
        validate::func_call(&stmt, self.catalog)?;

        let Some(directive) = metadata::parse(text, syntax)? else {
            tracing::debug!(file = filename, "skipping statement without directive");
            return Ok(None);
        };

        let mut stmt = stmt;
        let rewrite = rewrite::named_parameters(&mut stmt, &occurrences);
        let qc = QueryCatalog::new(self.catalog, dialect);
        let refs = params::find_parameters(
            &stmt,
            &qc,
            dialect.in_list_slices(),
            &occurrences,
            &rewrite.ordinals,
        )?;

        let positional = self.options.positional();
        let (mut edits, refs_to_resolve) = if positional {
            (rewrite::numbered_parameters(&occurrences), refs.clone())
        } else {
            (rewrite.edits.clone(), params::unique_param_refs(&refs))
        };

        let params = resolve::resolve_params(&refs_to_resolve, &rewrite.named, &qc)?;
        let insert_values = resolve::insert_values(&stmt, &refs, &rewrite.named, &qc)?;
        resolve::validate_omits(&directive.omits, &params)?;
        let columns = qc.statement_columns(&stmt)?;
        edits.extend(expand::wildcard_edits(text, &stmt, &qc, dialect)?);

        let edited = source::mutate(text, &edits)?;
        if edited != text {
            revalidate(&edited, dialect, positional, occurrences.len())?;
        }

        let (sql, comments) = source::strip_comments(&edited, syntax);

        tracing::debug!(
            query = %directive.name,
            file = filename,
            params = params.len(),
            columns = columns.len(),
            "compiled query"
        );

        Ok(Some(Query {
            cmd: directive.cmd,
            name: directive.name,
            comments,
            params,
            columns,
            sql,
            omits: directive.omits,
            insert_values,
            filename: filename.to_string(),
        }))
    }

    fn directive_name(&self, text: &str) -> Option<String> {
        metadata::parse(text, self.options.dialect.comment_syntax())
            .ok()
            .flatten()
            .map(|d| d.name)
    }
}

fn parse_statement(text: &str, dialect: &dyn Dialect) -> Result<Statement, CompileError> {
    let mut statements =
        Parser::parse_sql(dialect, text).map_err(|e| CompileError::Parse(e.to_string()))?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        n => Err(CompileError::Parse(format!(
            "expected one statement, found {n}"
        ))),
    }
}

/// Parse the edited text again; it must still be one statement with the same
/// number of placeholders
fn revalidate(
    edited: &str,
    dialect: SqlDialect,
    positional: bool,
    expected: usize,
) -> Result<(), CompileError> {
    // PostgreSQL's grammar has no `?` placeholder
    let stmt = if positional && dialect == SqlDialect::PostgreSQL {
        parse_statement(edited, &GenericDialect {})
    } else {
        parse_statement(edited, dialect.parser_dialect().as_ref())
    }
    .map_err(|e| CompileError::InvalidRewrite(format!("{e}: {edited}")))?;

    let mut found = 0;
    let _ = visit_expressions(&stmt, |expr| {
        if let Expr::Value(Value::Placeholder(_)) = expr {
            found += 1;
        }
        ControlFlow::<()>::Continue(())
    });
    if found != expected {
        return Err(CompileError::InvalidRewrite(format!(
            "edited statement has {found} placeholders, expected {expected}"
        )));
    }
    Ok(())
}

fn is_supported(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::Query(_)
            | Statement::Insert(_)
            | Statement::Update { .. }
            | Statement::Delete(_)
            | Statement::Truncate { .. }
    )
}

/// Leading keywords of a statement, e.g. `CREATE TABLE`
fn statement_kind(stmt: &Statement) -> String {
    let text = stmt.to_string();
    let mut words = text.split_whitespace();
    match words.next() {
        Some(first @ ("CREATE" | "ALTER" | "DROP")) => match words.next() {
            Some(second) => format!("{first} {second}"),
            None => first.to_string(),
        },
        Some(first) => first.to_string(),
        None => String::new(),
    }
}
