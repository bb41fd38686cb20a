//! Schema catalog - stores table, column, enum and function definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::SqlType;

/// Schema catalog - holds everything queries are resolved against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Schema name -> Schema
    pub schemas: IndexMap<String, Schema>,
    /// Schema whose members are referenced unqualified
    pub default_schema: String,
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_default_schema("public")
    }

    pub fn with_default_schema(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut catalog = Self {
            schemas: IndexMap::new(),
            default_schema: name.clone(),
        };
        catalog.get_or_create_schema(&name);
        catalog
    }

    /// Get or create a schema
    pub fn get_or_create_schema(&mut self, name: &str) -> &mut Schema {
        self.schemas
            .entry(name.to_string())
            .or_insert_with(|| Schema::new(name))
    }

    fn schema_for(&self, qualifier: Option<&String>) -> Option<&Schema> {
        self.schemas
            .get(qualifier.unwrap_or(&self.default_schema))
    }

    /// Add a table to the catalog, replacing any table of the same name
    pub fn add_table(&mut self, table: TableDef) {
        let schema_name = table
            .name
            .schema
            .clone()
            .unwrap_or_else(|| self.default_schema.clone());
        let schema = self.get_or_create_schema(&schema_name);
        schema.tables.insert(table.name.name.clone(), table);
    }

    /// Look up a table by name
    pub fn get_table(&self, name: &QualifiedName) -> Option<&TableDef> {
        self.schema_for(name.schema.as_ref())
            .and_then(|s| s.get_table(&name.name))
    }

    /// Look up a table by name (mutable)
    pub fn get_table_mut(&mut self, name: &QualifiedName) -> Option<&mut TableDef> {
        let schema_name = name.schema.as_ref().unwrap_or(&self.default_schema).clone();
        self.schemas.get_mut(&schema_name).and_then(|s| {
            s.tables
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(&name.name))
                .map(|(_, v)| v)
        })
    }

    /// Remove a table, returning its definition
    pub fn remove_table(&mut self, name: &QualifiedName) -> Option<TableDef> {
        let schema_name = name.schema.as_ref().unwrap_or(&self.default_schema).clone();
        self.schemas
            .get_mut(&schema_name)
            .and_then(|s| s.tables.shift_remove(&name.name))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &QualifiedName) -> bool {
        self.get_table(name).is_some()
    }

    /// Add an enum type, replacing any type of the same name in its schema
    pub fn add_enum(&mut self, schema: Option<&str>, enum_def: EnumTypeDef) {
        let schema_name = schema
            .map(str::to_string)
            .unwrap_or_else(|| self.default_schema.clone());
        self.get_or_create_schema(&schema_name)
            .types
            .insert(enum_def.name.clone(), TypeDef::Enum(enum_def));
    }

    /// Look up an enum type by (optionally qualified) name
    pub fn get_enum(&self, name: &QualifiedName) -> Option<&EnumTypeDef> {
        self.schema_for(name.schema.as_ref())
            .and_then(|s| s.types.get(&name.name))
            .map(|t| match t {
                TypeDef::Enum(e) => e,
            })
    }

    /// Register a function signature. Overloads are kept side by side.
    pub fn add_function(&mut self, schema: Option<&str>, function: FunctionDef) {
        let schema_name = schema
            .map(str::to_string)
            .unwrap_or_else(|| self.default_schema.clone());
        self.get_or_create_schema(&schema_name)
            .functions
            .push(function);
    }

    /// All overloads of a function
    pub fn get_functions(&self, name: &QualifiedName) -> Vec<&FunctionDef> {
        self.schema_for(name.schema.as_ref())
            .map(|s| {
                s.functions
                    .iter()
                    .filter(|f| f.name.eq_ignore_ascii_case(&name.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all table names
    pub fn table_names(&self) -> Vec<QualifiedName> {
        self.schemas
            .iter()
            .flat_map(|(schema_name, schema)| {
                schema.tables.keys().map(move |table_name| QualifiedName {
                    schema: Some(schema_name.clone()),
                    name: table_name.clone(),
                })
            })
            .collect()
    }
}

/// A database schema (namespace)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub tables: IndexMap<String, TableDef>,
    pub types: IndexMap<String, TypeDef>,
    pub functions: Vec<FunctionDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name).or_else(|| {
            self.tables
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }
}

/// Qualified name (schema.table or just table)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Parse from a dotted name like "schema.table" or just "table"
    pub fn parse(s: &str) -> Self {
        if let Some((schema, name)) = s.split_once('.') {
            Self::with_schema(schema, name)
        } else {
            Self::new(s)
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.{}", schema, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Table definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub name: QualifiedName,
    pub columns: IndexMap<String, ColumnDef>,
    pub comment: Option<String>,
}

impl TableDef {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            columns: IndexMap::new(),
            comment: None,
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        // Case-insensitive lookup
        self.columns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Check if a column exists
    pub fn column_exists(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: SqlType,
    pub nullable: bool,
    pub is_array: bool,
    /// Fixed length or precision, when declared
    pub length: Option<u64>,
    pub unsigned: bool,
    pub is_primary_key: bool,
    pub comment: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        let is_array = data_type.is_array();
        let length = data_type.length();
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            is_array,
            length,
            unsigned: false,
            is_primary_key: false,
            comment: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }
}

/// User-defined type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDef {
    Enum(EnumTypeDef),
}

/// Enum type definition (CREATE TYPE ... AS ENUM, or an inline MySQL ENUM column)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTypeDef {
    pub name: String,
    pub comment: Option<String>,
    pub values: Vec<String>,
    pub is_not_null: bool,
}

impl EnumTypeDef {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            values,
            is_not_null: false,
        }
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub args: Vec<FunctionArgDef>,
    pub return_type: SqlType,
    pub return_not_null: bool,
}

impl FunctionDef {
    /// Whether a call with `count` arguments matches this signature
    pub fn accepts(&self, count: usize) -> bool {
        let required = self.args.iter().filter(|a| !a.has_default).count();
        count >= required && count <= self.args.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionArgDef {
    pub name: Option<String>,
    pub data_type: SqlType,
    pub has_default: bool,
}
