//! Naming and bookkeeping shared by code generators.
//!
//! Nothing here emits code. Generators read [`GenerateSettings`] as policy,
//! derive struct and argument names from the [`Query`] IR, and record which
//! support helpers they emitted in a [`HelperRegistry`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::compiler::{Column, Query};
use crate::schema::{Catalog, QualifiedName};

/// Generation policy, read-only to the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    /// Target package or namespace
    pub package: String,
    pub emit_db_tags: bool,
    pub emit_json_tags: bool,
    /// Use table names as struct names without singularizing them
    pub emit_exact_table_names: bool,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            package: "db".to_string(),
            emit_db_tags: false,
            emit_json_tags: false,
            emit_exact_table_names: false,
        }
    }
}

/// Support helpers already generated, per namespace.
///
/// One registry belongs to one generation pass. Passes running in parallel
/// each own a registry and [`merge`](Self::merge) them afterwards.
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    namespaces: HashMap<String, HashSet<String>>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `helper` in `namespace`. Returns false if it was already there.
    pub fn claim(&mut self, namespace: &str, helper: &str) -> bool {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(helper.to_string())
    }

    pub fn contains(&self, namespace: &str, helper: &str) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|helpers| helpers.contains(helper))
    }

    pub fn merge(&mut self, other: HelperRegistry) {
        for (namespace, helpers) in other.namespaces {
            self.namespaces.entry(namespace).or_default().extend(helpers);
        }
    }

    /// Namespaces and their helpers, both sorted
    pub fn sorted(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        self.namespaces
            .iter()
            .map(|(ns, helpers)| {
                (
                    ns.as_str(),
                    helpers.iter().map(String::as_str).collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(HashSet::is_empty)
    }
}

impl Serialize for HelperRegistry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}

/// Support helpers a generated method for `query` needs
pub fn query_helpers(query: &Query) -> Vec<&'static str> {
    let mut helpers = Vec::new();
    if query.params.iter().any(|p| p.column.is_slice) {
        helpers.push("expand_slice");
    }
    if query.insert_values.is_some() {
        helpers.push("batch_values");
    }
    helpers
}

/// One field of a generated params or row struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    /// Tag key (`db`, `json`) to tag value
    pub tags: BTreeMap<String, String>,
    pub column: Column,
}

/// Fields for `columns`, each paired with an id.
///
/// Columns sharing an id (the same numbered parameter) share a field name.
/// Otherwise a repeated column name gets `_N`, N being its occurrence count.
/// Generated names can still collide, e.g. `count, count, count_2` gives
/// fields `Count, Count_2, Count_2`; this is a known limitation.
pub fn struct_fields(columns: &[(usize, &Column)], settings: &GenerateSettings) -> Vec<Field> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut suffixes: HashMap<usize, usize> = HashMap::new();
    let mut fields = Vec::with_capacity(columns.len());

    for (pos, (id, column)) in columns.iter().enumerate() {
        let col_name = column_name(column, pos);
        let mut tag_name = col_name.clone();
        let mut field_name = struct_name(&col_name);

        let suffix = match suffixes.get(id) {
            Some(&suffix) => suffix,
            None => match seen.get(&col_name) {
                Some(&count) if count > 0 => count + 1,
                _ => 0,
            },
        };
        suffixes.insert(*id, suffix);
        if suffix > 0 {
            tag_name = format!("{tag_name}_{suffix}");
            field_name = format!("{field_name}_{suffix}");
        }

        let mut tags = BTreeMap::new();
        if settings.emit_db_tags {
            tags.insert("db".to_string(), tag_name.clone());
        }
        if settings.emit_json_tags {
            tags.insert("json".to_string(), tag_name);
        }
        fields.push(Field {
            name: field_name,
            tags,
            column: (*column).clone(),
        });
        *seen.entry(col_name).or_default() += 1;
    }
    fields
}

/// Fields of the params struct of `query`, keyed by parameter number
pub fn param_fields(query: &Query, settings: &GenerateSettings) -> Vec<Field> {
    let columns: Vec<(usize, &Column)> = query
        .params
        .iter()
        .map(|p| (p.number, &p.column))
        .collect();
    struct_fields(&columns, settings)
}

/// Fields of the row struct of `query`, keyed by output position
pub fn row_fields(query: &Query, settings: &GenerateSettings) -> Vec<Field> {
    let columns: Vec<(usize, &Column)> = query.columns.iter().enumerate().collect();
    struct_fields(&columns, settings)
}

/// Column name, or `column_<pos+1>` for an anonymous one
pub fn column_name(column: &Column, pos: usize) -> String {
    if column.name.is_empty() {
        format!("column_{}", pos + 1)
    } else {
        column.name.clone()
    }
}

/// Argument name of a parameter: camelCase column name, or `dollar_N`
pub fn param_name(param: &crate::compiler::Parameter) -> String {
    if param.column.name.is_empty() {
        format!("dollar_{}", param.number)
    } else {
        arg_name(&param.column.name)
    }
}

/// `user_id` ⇒ `userID`
pub fn arg_name(name: &str) -> String {
    let mut out = String::new();
    for (i, part) in name.split('_').enumerate() {
        if i == 0 {
            out.push_str(&part.to_lowercase());
        } else if part == "id" {
            out.push_str("ID");
        } else {
            out.push_str(&title(part));
        }
    }
    out
}

/// `user_id` ⇒ `UserID`
pub fn struct_name(name: &str) -> String {
    name.split('_')
        .map(|part| if part == "id" { "ID".to_string() } else { title(part) })
        .collect()
}

/// Struct name for a catalog table.
///
/// Tables outside the default schema are prefixed with their schema.
pub fn table_struct_name(
    catalog: &Catalog,
    table: &QualifiedName,
    settings: &GenerateSettings,
) -> String {
    let table_name = match table.schema.as_deref() {
        Some(schema) if schema != catalog.default_schema => format!("{schema}_{}", table.name),
        _ => table.name.clone(),
    };
    if settings.emit_exact_table_names {
        struct_name(&table_name)
    } else {
        struct_name(&singular(&table_name))
    }
}

fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English singular of the last word of a snake_case name
fn singular(name: &str) -> String {
    let (head, word) = match name.rfind('_') {
        Some(i) => name.split_at(i + 1),
        None => ("", name),
    };
    let lower = word.to_lowercase();
    let stem = if lower.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if ["sses", "shes", "ches", "xes", "zes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        word[..word.len() - 2].to_string()
    } else if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    };
    format!("{head}{stem}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Parameter;
    use crate::types::SqlType;

    fn col(name: &str) -> Column {
        Column::typed(name, &SqlType::Integer, true)
    }

    #[test]
    fn test_registry_claim_once() {
        let mut registry = HelperRegistry::new();
        assert!(registry.claim("db", "expand_slice"));
        assert!(!registry.claim("db", "expand_slice"));
        assert!(registry.claim("other", "expand_slice"));
        assert!(registry.contains("db", "expand_slice"));
        assert!(!registry.contains("db", "batch_values"));
    }

    #[test]
    fn test_registry_merge() {
        let mut a = HelperRegistry::new();
        a.claim("db", "expand_slice");
        let mut b = HelperRegistry::new();
        b.claim("db", "batch_values");
        b.claim("db", "expand_slice");
        b.claim("admin", "batch_values");
        a.merge(b);

        let sorted = a.sorted();
        assert_eq!(
            sorted.get("db").unwrap().iter().copied().collect::<Vec<_>>(),
            vec!["batch_values", "expand_slice"]
        );
        assert_eq!(sorted.keys().copied().collect::<Vec<_>>(), vec!["admin", "db"]);
    }

    #[test]
    fn test_field_suffixes() {
        let settings = GenerateSettings {
            emit_db_tags: true,
            ..Default::default()
        };
        let count = col("count");
        let other = col("count_2");
        let fields = struct_fields(&[(0, &count), (1, &count), (2, &other)], &settings);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Count", "Count_2", "Count2"]);
        assert_eq!(fields[1].tags.get("db").unwrap(), "count_2");
        assert_eq!(fields[2].tags.get("db").unwrap(), "count_2");
        assert!(fields[0].tags.get("json").is_none());
    }

    #[test]
    fn test_shared_ordinal_shares_suffix() {
        let settings = GenerateSettings::default();
        let id = col("id");
        let fields = struct_fields(&[(1, &id), (2, &id), (1, &id), (3, &id)], &settings);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "ID_2", "ID", "ID_4"]);
    }

    #[test]
    fn test_anonymous_columns() {
        let anonymous = Column::any("");
        assert_eq!(column_name(&anonymous, 2), "column_3");
        let param = Parameter {
            number: 4,
            column: anonymous,
            location: 0,
        };
        assert_eq!(param_name(&param), "dollar_4");
    }

    #[test]
    fn test_names() {
        assert_eq!(arg_name("user_id"), "userID");
        assert_eq!(arg_name("Created_at"), "createdAt");
        assert_eq!(struct_name("user_id"), "UserID");
        assert_eq!(struct_name("author_books"), "AuthorBooks");
    }

    #[test]
    fn test_table_struct_names() {
        let catalog = Catalog::with_default_schema("public");
        let settings = GenerateSettings::default();
        let exact = GenerateSettings {
            emit_exact_table_names: true,
            ..Default::default()
        };
        let users = QualifiedName::new("users");
        assert_eq!(table_struct_name(&catalog, &users, &settings), "User");
        assert_eq!(table_struct_name(&catalog, &users, &exact), "Users");
        let categories = QualifiedName::with_schema("public", "categories");
        assert_eq!(table_struct_name(&catalog, &categories, &settings), "Category");
        let audit = QualifiedName::with_schema("audit", "addresses");
        assert_eq!(table_struct_name(&catalog, &audit, &settings), "AuditAddress");
    }
}
