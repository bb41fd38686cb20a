//! Error and diagnostic types

use serde::{Deserialize, Serialize};

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of source
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            length,
            line,
            column,
        }
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A failure while compiling one statement.
///
/// Every variant is fatal for the statement that produced it; the compiler
/// reports it and moves on to the next statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum CompileError {
    #[error("unsupported statement type: {0}")]
    #[diagnostic(
        code(sqltyped::unsupported_statement),
        help("only SELECT, INSERT, UPDATE, DELETE and TRUNCATE statements can be compiled")
    )]
    UnsupportedStatement(String),

    #[error("missing semicolon at end of file")]
    #[diagnostic(code(sqltyped::missing_terminator))]
    MissingTerminator,

    #[error("{reason}: {line}")]
    #[diagnostic(
        code(sqltyped::invalid_directive),
        help("expected `-- name: <Name> <:cmd> [omit, ...]`")
    )]
    InvalidDirective { reason: String, line: String },

    #[error("invalid query type: {0}")]
    #[diagnostic(
        code(sqltyped::invalid_command),
        help("use one of :one, :many, :exec, :execrows, :execresult")
    )]
    InvalidCommand(String),

    #[error("invalid query name: {0:?}")]
    #[diagnostic(code(sqltyped::invalid_identifier))]
    InvalidIdentifier(String),

    #[error("{}", column_not_found_message(.table.as_deref(), .column))]
    #[diagnostic(code(sqltyped::column_not_found))]
    ColumnNotFound {
        table: Option<String>,
        column: String,
    },

    #[error("relation \"{0}\" does not exist")]
    #[diagnostic(code(sqltyped::table_not_found))]
    TableNotFound(String),

    #[error("column reference \"{0}\" is ambiguous")]
    #[diagnostic(
        code(sqltyped::ambiguous_column),
        help("qualify the column with a table name or alias")
    )]
    AmbiguousColumn(String),

    #[error("{0}")]
    #[diagnostic(code(sqltyped::validation))]
    Validation(String),

    #[error("edited query syntax is invalid: {0}")]
    #[diagnostic(code(sqltyped::invalid_rewrite))]
    InvalidRewrite(String),

    #[error("parse error: {0}")]
    #[diagnostic(code(sqltyped::parse))]
    Parse(String),
}

fn column_not_found_message(table: Option<&str>, column: &str) -> String {
    match table {
        Some(table) => format!("column \"{column}\" does not exist in \"{table}\""),
        None => format!("column \"{column}\" does not exist"),
    }
}

impl CompileError {
    pub fn column_not_found(column: impl Into<String>) -> Self {
        CompileError::ColumnNotFound {
            table: None,
            column: column.into(),
        }
    }

    pub fn column_not_found_in(table: impl Into<String>, column: impl Into<String>) -> Self {
        CompileError::ColumnNotFound {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// The diagnostic classification of this error
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            CompileError::UnsupportedStatement(_) => DiagnosticKind::UnsupportedStatement,
            CompileError::MissingTerminator => DiagnosticKind::MissingTerminator,
            CompileError::InvalidDirective { .. } => DiagnosticKind::InvalidDirective,
            CompileError::InvalidCommand(_) => DiagnosticKind::InvalidCommand,
            CompileError::InvalidIdentifier(_) => DiagnosticKind::InvalidIdentifier,
            CompileError::ColumnNotFound { .. } => DiagnosticKind::ColumnNotFound,
            CompileError::TableNotFound(_) => DiagnosticKind::TableNotFound,
            CompileError::AmbiguousColumn(_) => DiagnosticKind::AmbiguousColumn,
            CompileError::Validation(_) => DiagnosticKind::ValidationFailure,
            CompileError::InvalidRewrite(_) => DiagnosticKind::InvalidRewrite,
            CompileError::Parse(_) => DiagnosticKind::ParseError,
        }
    }
}

/// Diagnostic message reported for a statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub help: Option<String>,
    /// Name of the query, when its directive was parsed
    pub query: Option<String>,
    /// File the statement came from
    pub file: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span: None,
            help: None,
            query: None,
            file: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span: None,
            help: None,
            query: None,
            file: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Get the error code string (e.g., "E0002")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(err: &CompileError) -> Self {
        let diag = Diagnostic::error(err.kind(), err.to_string());
        match err {
            CompileError::UnsupportedStatement(_) => diag.with_help(
                "only SELECT, INSERT, UPDATE, DELETE and TRUNCATE statements can be compiled",
            ),
            CompileError::InvalidCommand(_) => {
                diag.with_help("use one of :one, :many, :exec, :execrows, :execresult")
            }
            CompileError::AmbiguousColumn(_) => {
                diag.with_help("qualify the column with a table name or alias")
            }
            CompileError::MissingTerminator => {
                diag.with_help("terminate the statement with a semicolon")
            }
            _ => diag,
        }
    }
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// E0001: Table not found
    TableNotFound,
    /// E0002: Column not found
    ColumnNotFound,
    /// E0006: Ambiguous column reference
    AmbiguousColumn,
    /// E0101: Statement kind cannot be compiled
    UnsupportedStatement,
    /// E0102: Statement has no terminating semicolon
    MissingTerminator,
    /// E0103: Malformed directive comment
    InvalidDirective,
    /// E0104: Unknown query command
    InvalidCommand,
    /// E0105: Query name is not an identifier
    InvalidIdentifier,
    /// E0106: Pre-resolution validation failed
    ValidationFailure,
    /// E0107: Rewritten SQL no longer parses
    InvalidRewrite,
    /// Parse error
    ParseError,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "E0001",
            DiagnosticKind::ColumnNotFound => "E0002",
            DiagnosticKind::AmbiguousColumn => "E0006",
            DiagnosticKind::UnsupportedStatement => "E0101",
            DiagnosticKind::MissingTerminator => "E0102",
            DiagnosticKind::InvalidDirective => "E0103",
            DiagnosticKind::InvalidCommand => "E0104",
            DiagnosticKind::InvalidIdentifier => "E0105",
            DiagnosticKind::ValidationFailure => "E0106",
            DiagnosticKind::InvalidRewrite => "E0107",
            DiagnosticKind::ParseError => "E1000",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "table-not-found",
            DiagnosticKind::ColumnNotFound => "column-not-found",
            DiagnosticKind::AmbiguousColumn => "ambiguous-column",
            DiagnosticKind::UnsupportedStatement => "unsupported-statement",
            DiagnosticKind::MissingTerminator => "missing-terminator",
            DiagnosticKind::InvalidDirective => "invalid-directive",
            DiagnosticKind::InvalidCommand => "invalid-command",
            DiagnosticKind::InvalidIdentifier => "invalid-identifier",
            DiagnosticKind::ValidationFailure => "validation-failure",
            DiagnosticKind::InvalidRewrite => "invalid-rewrite",
            DiagnosticKind::ParseError => "parse-error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_not_found_message() {
        let err = CompileError::column_not_found("missing_col");
        assert_eq!(err.to_string(), "column \"missing_col\" does not exist");
        assert_eq!(err.kind(), DiagnosticKind::ColumnNotFound);

        let err = CompileError::column_not_found_in("users", "email");
        assert_eq!(
            err.to_string(),
            "column \"email\" does not exist in \"users\""
        );
    }

    #[test]
    fn test_diagnostic_from_error() {
        let err = CompileError::InvalidCommand(":two".to_string());
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.code(), "E0104");
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.contains(":two"));
        assert!(diag.help.is_some());
    }
}
