//! Schema builder - converts DDL into a Catalog

use sqlparser::ast::{
    AlterTableOperation, ColumnOption, CommentObject, CreateFunction, DataType, ObjectName,
    Statement, TableConstraint, UserDefinedTypeRepresentation,
};
use sqlparser::parser::Parser;

use crate::dialect::SqlDialect;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::schema::fetcher::parse_field_type;
use crate::schema::{
    Catalog, ColumnDef, EnumTypeDef, FunctionArgDef, FunctionDef, QualifiedName, TableDef,
};
use crate::source::split_statements;
use crate::types::{self, SqlType};

/// Builder for constructing a Catalog from SQL schema definitions
pub struct SchemaBuilder {
    catalog: Catalog,
    dialect: SqlDialect,
    diagnostics: Vec<Diagnostic>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::with_dialect(SqlDialect::default())
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            catalog: Catalog::with_default_schema(dialect.default_schema()),
            dialect,
            diagnostics: Vec::new(),
        }
    }

    /// Continue building on top of an existing catalog
    pub fn from_catalog(catalog: Catalog, dialect: SqlDialect) -> Self {
        Self {
            catalog,
            dialect,
            diagnostics: Vec::new(),
        }
    }

    /// Parse SQL schema definitions and build the catalog
    pub fn parse(&mut self, sql: &str) -> Result<(), Vec<Diagnostic>> {
        let dialect = self.dialect.parser_dialect();

        // Try parsing the entire SQL first (fast path)
        match Parser::parse_sql(dialect.as_ref(), sql) {
            Ok(statements) => {
                for stmt in statements {
                    self.process_statement(&stmt);
                }
            }
            Err(_) => {
                // Fall back to statement-by-statement parsing to skip unsupported syntax
                self.parse_statements_individually(sql);
            }
        }

        if self
            .diagnostics
            .iter()
            .any(|d| d.severity == crate::error::Severity::Error)
        {
            Err(std::mem::take(&mut self.diagnostics))
        } else {
            Ok(())
        }
    }

    /// Parse SQL statements individually, skipping those that fail to parse
    /// (triggers, procedural languages, vendor extensions).
    fn parse_statements_individually(&mut self, sql: &str) {
        let dialect = self.dialect.parser_dialect();

        for raw in split_statements(sql, self.dialect) {
            let text = raw.text(sql).trim();
            if text.is_empty() {
                continue;
            }

            match Parser::parse_sql(dialect.as_ref(), text) {
                Ok(stmts) => {
                    for stmt in stmts {
                        self.process_statement(&stmt);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable schema statement");
                }
            }
        }
    }

    /// Process a single SQL statement
    fn process_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::CreateTable(create) => {
                self.process_create_table(create);
            }
            Statement::CreateType {
                name,
                representation,
            } => {
                self.process_create_type(name, representation);
            }
            Statement::CreateFunction(function) => {
                self.process_create_function(function);
            }
            Statement::AlterTable {
                name, operations, ..
            } => {
                self.process_alter_table(name, operations);
            }
            Statement::Comment {
                object_type,
                object_name,
                comment,
                ..
            } => {
                self.process_comment(object_type, object_name, comment.as_deref());
            }
            Statement::Drop {
                object_type: sqlparser::ast::ObjectType::Table,
                names,
                ..
            } => {
                for name in names {
                    self.catalog.remove_table(&object_name_to_qualified(name));
                }
            }
            _ => {}
        }
    }

    /// Process CREATE TABLE statement
    fn process_create_table(&mut self, create: &sqlparser::ast::CreateTable) {
        let name = object_name_to_qualified(&create.name);
        let mut table = TableDef::new(name.clone());

        for column in &create.columns {
            let col_def = self.column_from_ast(&name, column);
            table.columns.insert(col_def.name.clone(), col_def);
        }

        for constraint in &create.constraints {
            apply_table_constraint(&mut table, constraint);
        }

        tracing::debug!(table = %name, columns = table.columns.len(), "added table");
        self.catalog.add_table(table);
    }

    /// Build a column definition, registering inline enum types along the way
    fn column_from_ast(
        &mut self,
        table: &QualifiedName,
        column: &sqlparser::ast::ColumnDef,
    ) -> ColumnDef {
        let col_name = column.name.value.clone();
        let mut col = ColumnDef::new(&col_name, SqlType::from_ast(&column.data_type));
        col.unsigned = types::is_unsigned(&column.data_type);

        for option in &column.options {
            match &option.option {
                ColumnOption::Null => col.nullable = true,
                ColumnOption::NotNull => col.nullable = false,
                ColumnOption::Unique { is_primary, .. } => {
                    if *is_primary {
                        col.is_primary_key = true;
                        col.nullable = false;
                    }
                }
                ColumnOption::Comment(comment) => col.comment = Some(comment.clone()),
                _ => {}
            }
        }

        if let DataType::Enum(..) = &column.data_type {
            // MySQL inline ENUM(...) becomes a named enum type
            let enum_name = format!("{}_{}", table.name, col_name);
            let values = parse_field_type(&column.data_type.to_string())
                .map(|parsed| parsed.values)
                .unwrap_or_default();
            let mut enum_def = EnumTypeDef::new(&enum_name, values);
            enum_def.is_not_null = !col.nullable;
            self.catalog.add_enum(table.schema.as_deref(), enum_def);
            col.data_type = SqlType::Custom(enum_name);
        }

        col
    }

    /// Process ALTER TABLE statement
    fn process_alter_table(&mut self, name: &ObjectName, operations: &[AlterTableOperation]) {
        let table_name = object_name_to_qualified(name);

        if !self.catalog.table_exists(&table_name) {
            tracing::warn!(table = %table_name, "ALTER TABLE on unknown table");
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::TableNotFound,
                    format!(
                        "ALTER TABLE references table '{}' which was not found in schema",
                        table_name
                    ),
                )
                .with_help("Ensure the CREATE TABLE statement appears before ALTER TABLE"),
            );
            return;
        }

        for operation in operations {
            match operation {
                AlterTableOperation::AddColumn { column_def, .. } => {
                    let col = self.column_from_ast(&table_name, column_def);
                    if let Some(table) = self.catalog.get_table_mut(&table_name) {
                        table.columns.insert(col.name.clone(), col);
                    }
                }
                AlterTableOperation::DropColumn { column_name, .. } => {
                    if let Some(table) = self.catalog.get_table_mut(&table_name) {
                        table.columns.shift_remove(&column_name.value);
                    }
                }
                AlterTableOperation::RenameColumn {
                    old_column_name,
                    new_column_name,
                } => {
                    if let Some(table) = self.catalog.get_table_mut(&table_name) {
                        if let Some(index) = table.columns.get_index_of(&old_column_name.value) {
                            if let Some((_, mut col)) = table.columns.shift_remove_index(index) {
                                col.name = new_column_name.value.clone();
                                table
                                    .columns
                                    .shift_insert(index, new_column_name.value.clone(), col);
                            }
                        }
                    }
                }
                AlterTableOperation::RenameTable {
                    table_name: new_name,
                } => {
                    let new_qualified = object_name_to_qualified(new_name);
                    if let Some(mut table) = self.catalog.remove_table(&table_name) {
                        table.name = QualifiedName {
                            schema: table_name.schema.clone(),
                            name: new_qualified.name,
                        };
                        self.catalog.add_table(table);
                    }
                }
                AlterTableOperation::AddConstraint(constraint) => {
                    if let Some(table) = self.catalog.get_table_mut(&table_name) {
                        apply_table_constraint(table, constraint);
                    }
                }
                _ => {
                    // Other ALTER TABLE operations don't change column shape
                }
            }
        }
    }

    /// Process CREATE TYPE statement
    fn process_create_type(
        &mut self,
        name: &ObjectName,
        representation: &UserDefinedTypeRepresentation,
    ) {
        let qualified = object_name_to_qualified(name);
        if let UserDefinedTypeRepresentation::Enum { labels } = representation {
            let enum_def = EnumTypeDef::new(
                &qualified.name,
                labels.iter().map(|l| l.value.clone()).collect(),
            );
            self.catalog.add_enum(qualified.schema.as_deref(), enum_def);
        }
    }

    /// Process CREATE FUNCTION statement
    fn process_create_function(&mut self, function: &CreateFunction) {
        let qualified = object_name_to_qualified(&function.name);
        let args = function
            .args
            .iter()
            .flatten()
            .map(|arg| FunctionArgDef {
                name: arg.name.as_ref().map(|n| n.value.clone()),
                data_type: SqlType::from_ast(&arg.data_type),
                has_default: arg.default_expr.is_some(),
            })
            .collect();
        let return_type = function
            .return_type
            .as_ref()
            .map(SqlType::from_ast)
            .unwrap_or(SqlType::Unknown);

        self.catalog.add_function(
            qualified.schema.as_deref(),
            FunctionDef {
                name: qualified.name,
                args,
                return_type,
                return_not_null: false,
            },
        );
    }

    /// Process COMMENT ON TABLE / COLUMN
    fn process_comment(
        &mut self,
        object_type: &CommentObject,
        object_name: &ObjectName,
        comment: Option<&str>,
    ) {
        match object_type {
            CommentObject::Table => {
                let name = object_name_to_qualified(object_name);
                if let Some(table) = self.catalog.get_table_mut(&name) {
                    table.comment = comment.map(str::to_string);
                }
            }
            CommentObject::Column => {
                let parts = &object_name.0;
                let Some((column, table_parts)) = parts.split_last() else {
                    return;
                };
                let table_name = object_name_to_qualified(&ObjectName(table_parts.to_vec()));
                if let Some(table) = self.catalog.get_table_mut(&table_name) {
                    if let Some(col) = table.columns.get_mut(&column.value) {
                        col.comment = comment.map(str::to_string);
                    }
                }
            }
            _ => {}
        }
    }

    /// Consume the builder and return the catalog
    pub fn build(self) -> (Catalog, Vec<Diagnostic>) {
        (self.catalog, self.diagnostics)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mark PRIMARY KEY columns as not-null
fn apply_table_constraint(table: &mut TableDef, constraint: &TableConstraint) {
    if let TableConstraint::PrimaryKey { columns, .. } = constraint {
        for col_name in columns {
            if let Some(col) = table.columns.get_mut(&col_name.value) {
                col.is_primary_key = true;
                col.nullable = false;
            }
        }
    }
}

/// Convert sqlparser ObjectName to our QualifiedName
pub(crate) fn object_name_to_qualified(name: &ObjectName) -> QualifiedName {
    match name.0.as_slice() {
        [table] => QualifiedName::new(&table.value),
        [schema, table] => QualifiedName::with_schema(&schema.value, &table.value),
        [_catalog, schema, table] => QualifiedName::with_schema(&schema.value, &table.value),
        _ => QualifiedName::new(name.to_string()),
    }
}
