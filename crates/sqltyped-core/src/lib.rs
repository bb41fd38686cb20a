//! sqltyped-core: compiles annotated SQL into a typed query IR
//!
//! This library resolves the parameters and result columns of SQL queries
//! against schema definitions, without requiring a database connection.

pub mod codegen;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod schema;
pub mod source;
pub mod types;

pub use codegen::{GenerateSettings, HelperRegistry};
pub use compiler::{
    sort_by_name, Column, CompileOptions, Compiled, Compiler, InsertValues, Parameter, Query,
};
pub use dialect::SqlDialect;
pub use error::{CompileError, Diagnostic, DiagnosticKind, Severity, Span};
pub use metadata::{Cmd, CommentSyntax, Directive};
pub use schema::{Catalog, ColumnDef, QualifiedName, Schema, SchemaBuilder, TableDef};
pub use types::SqlType;
