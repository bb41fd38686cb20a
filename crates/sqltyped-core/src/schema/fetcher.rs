//! Live database schema loading.
//!
//! A [`SchemaFetcher`] is the seam to a running database: it reports the
//! database name, its tables, each table's `CREATE TABLE` text and the
//! per-column field descriptors. The loaders here turn that into a
//! [`Catalog`] without performing any I/O themselves.

use crate::dialect::SqlDialect;
use crate::error::Diagnostic;
use crate::schema::{Catalog, ColumnDef, EnumTypeDef, QualifiedName, SchemaBuilder, TableDef};
use crate::types::SqlType;

/// Column description as reported by the database, e.g. `SHOW FULL FIELDS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Base type, e.g. `varchar`. Empty when the type string was not understood.
    pub type_name: String,
    pub size: Option<u64>,
    pub unsigned: bool,
    pub allow_null: bool,
    pub comment: Option<String>,
    /// Values of an `enum(...)` or `set(...)` type
    pub values: Vec<String>,
}

impl FieldDescriptor {
    /// Build a descriptor from a raw column type string such as `int(10) unsigned`.
    ///
    /// Unparseable type strings do not fail: the descriptor gets an empty type
    /// name and later maps to the opaque `any` type.
    pub fn from_column_type(
        name: impl Into<String>,
        column_type: &str,
        allow_null: bool,
        comment: Option<String>,
    ) -> Self {
        let name = name.into();
        let parsed = parse_field_type(column_type).unwrap_or_else(|e| {
            tracing::warn!(column = %name, error = %e, "unrecognized field type");
            ParsedFieldType::default()
        });
        Self {
            name,
            type_name: parsed.base,
            size: parsed.size,
            unsigned: parsed.unsigned,
            allow_null,
            comment: comment.filter(|c| !c.is_empty()),
            values: parsed.values,
        }
    }
}

/// Structured form of a database type string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFieldType {
    pub base: String,
    pub size: Option<u64>,
    pub scale: Option<u64>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldTypeError {
    #[error("empty type string")]
    Empty,
    #[error("invalid type name in {0:?}")]
    InvalidBase(String),
    #[error("invalid size in {0:?}")]
    InvalidSize(String),
    #[error("unterminated value list in {0:?}")]
    Unterminated(String),
    #[error("unexpected qualifier {qualifier:?} in {input:?}")]
    UnexpectedQualifier { qualifier: String, input: String },
}

/// Parse a type string of the shape `type[(size[,scale]) | ('v1','v2')] [unsigned] [zerofill]`
pub fn parse_field_type(input: &str) -> Result<ParsedFieldType, FieldTypeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldTypeError::Empty);
    }

    let base_len = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    if base_len == 0 {
        return Err(FieldTypeError::InvalidBase(input.to_string()));
    }
    let mut parsed = ParsedFieldType {
        base: trimmed[..base_len].to_ascii_lowercase(),
        ..Default::default()
    };
    let mut rest = trimmed[base_len..].trim_start();

    if let Some(args) = rest.strip_prefix('(') {
        let (inner, after) = if parsed.base == "enum" || parsed.base == "set" {
            let (values, after) = parse_value_list(args)
                .ok_or_else(|| FieldTypeError::Unterminated(input.to_string()))?;
            parsed.values = values;
            ("", after)
        } else {
            let close = args
                .find(')')
                .ok_or_else(|| FieldTypeError::Unterminated(input.to_string()))?;
            (&args[..close], &args[close + 1..])
        };

        if !inner.is_empty() {
            let mut numbers = inner.split(',').map(|n| n.trim().parse::<u64>());
            parsed.size = match numbers.next() {
                Some(Ok(n)) => Some(n),
                _ => return Err(FieldTypeError::InvalidSize(input.to_string())),
            };
            parsed.scale = match numbers.next() {
                Some(Ok(n)) => Some(n),
                Some(Err(_)) => return Err(FieldTypeError::InvalidSize(input.to_string())),
                None => None,
            };
            if numbers.next().is_some() {
                return Err(FieldTypeError::InvalidSize(input.to_string()));
            }
        }
        rest = after;
    }

    for word in rest.split_whitespace() {
        match word.to_ascii_lowercase().as_str() {
            "unsigned" => parsed.unsigned = true,
            "zerofill" => parsed.zerofill = true,
            "signed" => {}
            _ => {
                return Err(FieldTypeError::UnexpectedQualifier {
                    qualifier: word.to_string(),
                    input: input.to_string(),
                })
            }
        }
    }

    Ok(parsed)
}

/// Parse `'a','b')...` returning the values and the text after `)`
fn parse_value_list(s: &str) -> Option<(Vec<String>, &str)> {
    let mut values = Vec::new();
    let mut chars = s.char_indices().peekable();
    loop {
        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        match chars.next()? {
            (i, ')') => return Some((values, &s[i + 1..])),
            (_, '\'') => {
                let mut value = String::new();
                loop {
                    match chars.next()? {
                        (_, '\'') if matches!(chars.peek(), Some((_, '\''))) => {
                            chars.next();
                            value.push('\'');
                        }
                        (_, '\'') => break,
                        (_, c) => value.push(c),
                    }
                }
                values.push(value);
            }
            _ => return None,
        }
    }
}

/// Source of live schema metadata
pub trait SchemaFetcher {
    type Error: std::error::Error + Send + Sync + 'static;

    fn database_name(&self) -> Result<String, Self::Error>;

    fn table_names(&self) -> Result<Vec<String>, Self::Error>;

    /// Full `CREATE TABLE` text for one table
    fn create_syntax(&self, table: &str) -> Result<String, Self::Error>;

    fn field_descriptors(&self, table: &str) -> Result<Vec<FieldDescriptor>, Self::Error>;

    /// Quote an identifier for use in introspection statements
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError<E: std::error::Error + 'static> {
    #[error("failed to fetch {context}")]
    Fetcher {
        context: String,
        #[source]
        source: E,
    },
    #[error("schema for table {table} could not be loaded")]
    Schema {
        table: String,
        diagnostics: Vec<Diagnostic>,
    },
}

fn fetch<T, E: std::error::Error + 'static>(
    result: Result<T, E>,
    context: impl FnOnce() -> String,
) -> Result<T, FetchError<E>> {
    result.map_err(|source| FetchError::Fetcher {
        context: context(),
        source,
    })
}

/// Build a catalog from field descriptors. The database becomes the default schema.
pub fn load_catalog<F: SchemaFetcher>(fetcher: &F) -> Result<Catalog, FetchError<F::Error>> {
    let database = fetch(fetcher.database_name(), || "database name".to_string())?;
    let mut catalog = Catalog::with_default_schema(&database);

    for table_name in fetch(fetcher.table_names(), || "table names".to_string())? {
        let fields = fetch(fetcher.field_descriptors(&table_name), || {
            format!("fields of {}", fetcher.quote_identifier(&table_name))
        })?;

        let mut table = TableDef::new(QualifiedName::new(&table_name));
        for field in fields {
            let mut data_type = SqlType::from_name(&field.type_name, field.size, None);
            if field.type_name == "enum" {
                let enum_name = format!("{}_{}", table_name, field.name);
                let mut enum_def = EnumTypeDef::new(&enum_name, field.values.clone());
                enum_def.is_not_null = !field.allow_null;
                catalog.add_enum(None, enum_def);
                data_type = SqlType::Custom(enum_name);
            }

            let mut column = ColumnDef::new(&field.name, data_type);
            column.nullable = field.allow_null;
            column.unsigned = field.unsigned;
            column.length = field.size;
            column.comment = field.comment;
            table.columns.insert(column.name.clone(), column);
        }

        tracing::debug!(table = %table_name, columns = table.columns.len(), "loaded table");
        catalog.add_table(table);
    }

    Ok(catalog)
}

/// Build a catalog by replaying each table's `CREATE TABLE` text
pub fn load_catalog_from_ddl<F: SchemaFetcher>(
    fetcher: &F,
) -> Result<(Catalog, Vec<Diagnostic>), FetchError<F::Error>> {
    let database = fetch(fetcher.database_name(), || "database name".to_string())?;
    let mut builder =
        SchemaBuilder::from_catalog(Catalog::with_default_schema(&database), SqlDialect::MySQL);
    for table_name in fetch(fetcher.table_names(), || "table names".to_string())? {
        let ddl = fetch(fetcher.create_syntax(&table_name), || {
            format!("create syntax of {}", fetcher.quote_identifier(&table_name))
        })?;
        if let Err(diagnostics) = builder.parse(&format!("{ddl};")) {
            return Err(FetchError::Schema {
                table: table_name,
                diagnostics,
            });
        }
    }

    Ok(builder.build())
}
