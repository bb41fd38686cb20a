//! Schema management module

mod builder;
mod catalog;
pub mod fetcher;

pub(crate) use builder::object_name_to_qualified;
pub use builder::SchemaBuilder;
pub use catalog::{
    Catalog, ColumnDef, EnumTypeDef, FunctionArgDef, FunctionDef, QualifiedName, Schema,
    TableDef, TypeDef,
};
pub use fetcher::{load_catalog, load_catalog_from_ddl, FieldDescriptor, SchemaFetcher};
