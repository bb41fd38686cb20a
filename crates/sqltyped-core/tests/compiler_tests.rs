// Integration tests for the query compiler
use pretty_assertions::assert_eq;
use sqlparser::parser::Parser;
use sqltyped_core::codegen::{param_fields, query_helpers, row_fields, GenerateSettings, HelperRegistry};
use sqltyped_core::compiler::{sort_by_name, CompileOptions, Compiled, Compiler};
use sqltyped_core::dialect::SqlDialect;
use sqltyped_core::error::DiagnosticKind;
use sqltyped_core::metadata::Cmd;
use sqltyped_core::schema::fetcher::parse_field_type;
use sqltyped_core::schema::{Catalog, SchemaBuilder};

const PG_SCHEMA: &str = r#"
    CREATE TABLE users (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT
    );

    CREATE TABLE orders (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL,
        total DECIMAL(10, 2)
    );
"#;

const MYSQL_SCHEMA: &str = r#"
    CREATE TABLE users (
        id int NOT NULL,
        name varchar(255) NOT NULL,
        bio text
    );
"#;

fn build_catalog(dialect: SqlDialect, ddl: &str) -> Catalog {
    let mut builder = SchemaBuilder::with_dialect(dialect);
    builder.parse(ddl).unwrap();
    let (catalog, _) = builder.build();
    catalog
}

fn compile_with(options: CompileOptions, ddl: &str, sql: &str) -> Compiled {
    let catalog = build_catalog(options.dialect, ddl);
    Compiler::new(&catalog, options).compile(sql, "query.sql")
}

fn compile_pg(sql: &str) -> Compiled {
    compile_with(CompileOptions::new(SqlDialect::PostgreSQL), PG_SCHEMA, sql)
}

fn compile_mysql(sql: &str) -> Compiled {
    compile_with(CompileOptions::new(SqlDialect::MySQL), MYSQL_SCHEMA, sql)
}

fn assert_clean(compiled: &Compiled) {
    assert!(
        compiled.diagnostics.is_empty(),
        "Expected no errors: {:?}",
        compiled.diagnostics
    );
}

#[test]
fn test_get_user_one() {
    let sql = "-- name: GetUser :one\nSELECT id, name FROM users WHERE id = ?;";
    let compiled = compile_with(
        CompileOptions::new(SqlDialect::MySQL),
        "CREATE TABLE users (id int, name varchar(255));",
        sql,
    );
    assert_clean(&compiled);
    assert_eq!(compiled.queries.len(), 1);

    let query = &compiled.queries[0];
    assert_eq!(query.name, "GetUser");
    assert_eq!(query.cmd, Cmd::One);
    assert_eq!(query.filename, "query.sql");
    assert_eq!(query.sql, "SELECT id, name FROM users WHERE id = ?");

    assert_eq!(query.params.len(), 1);
    let param = &query.params[0];
    assert_eq!(param.number, 1);
    assert_eq!(param.column.data_type, "int");
    assert!(param.column.not_null);
    assert_eq!(param.location, sql.find('?').unwrap());

    let columns: Vec<_> = query
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_str()))
        .collect();
    assert_eq!(columns, vec![("id", "int"), ("name", "varchar")]);
    assert_eq!(query.columns[1].length, Some(255));
}

#[test]
fn test_malformed_directive() {
    let compiled = compile_mysql("-- name: Bad :one :two\nSELECT id FROM users;");
    assert!(compiled.queries.is_empty());
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::InvalidDirective);
    assert_eq!(compiled.diagnostics[0].query, None);
}

#[test]
fn test_invalid_command() {
    let compiled = compile_mysql("-- name: Bad :all\nSELECT id FROM users;");
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::InvalidCommand);
    assert!(compiled.diagnostics[0].message.contains(":all"));
}

#[test]
fn test_unknown_omit() {
    let compiled = compile_mysql("-- name: Del :exec [missing_col]\nDELETE FROM users WHERE id = ?;");
    assert!(compiled.queries.is_empty());
    assert_eq!(compiled.diagnostics.len(), 1);

    let diagnostic = &compiled.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::ColumnNotFound);
    assert!(diagnostic.message.contains("missing_col"));
    assert_eq!(diagnostic.query.as_deref(), Some("Del"));
    assert_eq!(diagnostic.file.as_deref(), Some("query.sql"));
}

#[test]
fn test_omits_subset_of_params() {
    let compiled = compile_pg(
        "-- name: CreateUser :exec [email]\nINSERT INTO users (name, email) VALUES ($1, $2);",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.omits, vec!["email".to_string()]);
    for omit in &query.omits {
        assert!(query.params.iter().any(|p| &p.column.name == omit));
    }
}

#[test]
fn test_duplicate_ordinals_dedupe() {
    let compiled = compile_pg(
        "-- name: Find :many\nSELECT id FROM users WHERE id = $2 OR name = $1 OR id = $2;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    let numbers: Vec<_> = query.params.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(query.params[0].column.name, "name");
    assert_eq!(query.params[0].column.data_type, "text");
    assert_eq!(query.params[1].column.name, "id");
    assert_eq!(query.params[1].column.data_type, "int");
    assert_eq!(
        query.sql,
        "SELECT id FROM users WHERE id = $2 OR name = $1 OR id = $2"
    );
}

#[test]
fn test_positional_mode_keeps_every_occurrence() {
    let compiled = compile_with(
        CompileOptions::new(SqlDialect::PostgreSQL).with_positional_parameters(true),
        PG_SCHEMA,
        "-- name: Find :many\nSELECT id FROM users WHERE id = $1 OR email = $1;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    assert_eq!(query.sql, "SELECT id FROM users WHERE id = ? OR email = ?");
    let params: Vec<_> = query
        .params
        .iter()
        .map(|p| (p.number, p.column.name.as_str()))
        .collect();
    assert_eq!(params, vec![(1, "id"), (1, "email")]);
}

#[test]
fn test_named_parameters() {
    let compiled = compile_pg(
        "-- name: ByName :many\n\
         SELECT id FROM users\n\
         WHERE name = sqlc.arg(user_name) AND email = sqlc.narg(email) OR name = sqlc.arg(user_name);",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    assert_eq!(
        query.sql,
        "SELECT id FROM users\nWHERE name = $1 AND email = $2 OR name = $1"
    );
    assert_eq!(query.params.len(), 2);

    let first = &query.params[0];
    assert_eq!(first.number, 1);
    assert_eq!(first.column.name, "user_name");
    assert_eq!(first.column.data_type, "text");
    assert!(first.column.not_null);

    let second = &query.params[1];
    assert_eq!(second.number, 2);
    assert_eq!(second.column.name, "email");
    assert!(!second.column.not_null);
}

#[test]
fn test_named_parameters_positional_output() {
    let compiled = compile_mysql(
        "-- name: Search :many\nSELECT id FROM users WHERE name = sqlc.arg(name) OR id = sqlc.arg(uid);",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    assert_eq!(query.sql, "SELECT id FROM users WHERE name = ? OR id = ?");
    let params: Vec<_> = query
        .params
        .iter()
        .map(|p| (p.number, p.column.name.as_str(), p.column.data_type.as_str()))
        .collect();
    assert_eq!(params, vec![(1, "name", "varchar"), (2, "uid", "int")]);
}

#[test]
fn test_slice_parameter() {
    let compiled = compile_mysql(
        "-- name: ByIds :many\nSELECT name FROM users WHERE id IN (sqlc.slice(ids));",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.sql, "SELECT name FROM users WHERE id IN (?)");
    assert!(query.params[0].column.is_slice);
    assert_eq!(query.params[0].column.name, "ids");
    assert_eq!(query_helpers(query), vec!["expand_slice"]);
}

#[test]
fn test_in_list_slice_mysql() {
    let compiled = compile_mysql("-- name: ByIds :many\nSELECT name FROM users WHERE id IN (?);");
    assert_clean(&compiled);
    let param = &compiled.queries[0].params[0];
    assert!(param.column.is_slice);
    assert_eq!(param.column.data_type, "int");
}

#[test]
fn test_any_array_parameter() {
    let compiled = compile_pg("-- name: ByIds :many\nSELECT name FROM users WHERE id = ANY($1);");
    assert_clean(&compiled);
    let param = &compiled.queries[0].params[0];
    assert!(param.column.is_array);
    assert_eq!(param.column.data_type, "int");
}

#[test]
fn test_limit_offset_and_casts() {
    let compiled = compile_pg(
        "-- name: Page :many\n\
         SELECT id FROM users WHERE name = $1::text ORDER BY id LIMIT $2 OFFSET $3;",
    );
    assert_clean(&compiled);
    let params: Vec<_> = compiled.queries[0]
        .params
        .iter()
        .map(|p| (p.column.name.as_str(), p.column.data_type.as_str(), p.column.not_null))
        .collect();
    assert_eq!(
        params,
        vec![
            ("", "text", true),
            ("limit", "bigint", true),
            ("offset", "bigint", true)
        ]
    );
}

#[test]
fn test_mysql_limit_offset_pair() {
    let compiled = compile_mysql("-- name: Page :many\nSELECT id FROM users LIMIT ?, ?;");
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    assert_eq!(query.sql, "SELECT id FROM users LIMIT ?, ?");
    let params: Vec<_> = query
        .params
        .iter()
        .map(|p| (p.number, p.column.name.as_str(), p.column.not_null))
        .collect();
    // MySQL reads `LIMIT offset, count`
    assert_eq!(params, vec![(1, "offset", true), (2, "limit", true)]);
    assert!(query.params[0].location < query.params[1].location);
}

#[test]
fn test_unknown_function_argument() {
    let compiled = compile_pg("-- name: Lowered :one\nSELECT lower($1) AS lowered;");
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.params[0].column.data_type, "any");
    assert_eq!(query.columns[0].name, "lowered");
    assert_eq!(query.columns[0].data_type, "text");
}

#[test]
fn test_unresolvable_parameter() {
    let compiled = compile_pg("-- name: Echo :one\nSELECT $1;");
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::ColumnNotFound);
    assert!(compiled.diagnostics[0].message.contains("$1"));
}

#[test]
fn test_cte_and_alias() {
    let compiled = compile_pg(
        "-- name: Recent :many\n\
         WITH active AS (SELECT id, name FROM users WHERE email IS NOT NULL)\n\
         SELECT a.id, a.name FROM active a WHERE a.id > $1;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    let columns: Vec<_> = query
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_str(), c.not_null))
        .collect();
    assert_eq!(columns, vec![("id", "int", true), ("name", "text", true)]);
    assert_eq!(query.params[0].column.name, "id");
    assert_eq!(query.params[0].column.data_type, "int");
}

#[test]
fn test_left_join_nullability() {
    let compiled = compile_pg(
        "-- name: UserOrders :many\n\
         SELECT u.name, o.user_id, o.total\n\
         FROM users u LEFT JOIN orders o ON o.user_id = u.id\n\
         WHERE u.id = $1;",
    );
    assert_clean(&compiled);
    let columns: Vec<_> = compiled.queries[0]
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_str(), c.not_null))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("name", "text", true),
            ("user_id", "int", false),
            ("total", "decimal", false)
        ]
    );
}

#[test]
fn test_wildcard_and_aggregates() {
    let compiled = compile_pg(
        "-- name: Stats :one\nSELECT count(*), max(total) FROM orders WHERE user_id = $1;\n\
         -- name: All :many\nSELECT * FROM users;",
    );
    assert_clean(&compiled);

    let stats = &compiled.queries[0];
    assert_eq!(stats.columns[0].name, "count");
    assert_eq!(stats.columns[0].data_type, "bigint");
    assert!(stats.columns[0].not_null);
    assert_eq!(stats.columns[1].data_type, "decimal");
    assert!(!stats.columns[1].not_null);

    let names: Vec<_> = compiled.queries[1]
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["id", "name", "email"]);
    assert_eq!(compiled.queries[1].sql, "SELECT id, name, email FROM users");
}

#[test]
fn test_wildcard_expansion() {
    let compiled = compile_pg(
        "-- name: UserOrders :many\n\
         SELECT u.*, o.* FROM users u JOIN orders o ON o.user_id = u.id WHERE u.id = $1;\n\
         -- name: Everything :many\n\
         SELECT * FROM users u JOIN orders o ON o.user_id = u.id;\n\
         -- name: Remove :one\n\
         DELETE FROM orders WHERE id = $1 RETURNING *;",
    );
    assert_clean(&compiled);

    assert_eq!(
        compiled.queries[0].sql,
        "SELECT u.id, u.name, u.email, o.id, o.user_id, o.total FROM users u JOIN orders o ON o.user_id = u.id WHERE u.id = $1"
    );
    assert_eq!(
        compiled.queries[1].sql,
        "SELECT u.id, name, email, o.id, user_id, total FROM users u JOIN orders o ON o.user_id = u.id"
    );
    assert_eq!(
        compiled.queries[2].sql,
        "DELETE FROM orders WHERE id = $1 RETURNING id, user_id, total"
    );
    assert_eq!(compiled.queries[1].columns.len(), 6);
}

#[test]
fn test_wildcard_expansion_with_positional_rewrite() {
    let compiled = compile_mysql("-- name: GetUser :one\nSELECT * FROM users WHERE id = sqlc.arg(id);");
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.sql, "SELECT id, name, bio FROM users WHERE id = ?");
    assert_eq!(query.params[0].column.name, "id");
}

#[test]
fn test_anonymous_columns_numbered() {
    let compiled = compile_pg("-- name: Flags :one\nSELECT id, id > 10, name FROM users;");
    assert_clean(&compiled);
    let names: Vec<_> = compiled.queries[0]
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["id", "column_2", "name"]);
    assert_eq!(compiled.queries[0].columns[1].data_type, "bool");
}

#[test]
fn test_insert_values() {
    let compiled = compile_pg(
        "-- name: CreateUsers :exec\nINSERT INTO users (name, email) VALUES ($1, $2), ($3, $4);",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    let params: Vec<_> = query
        .params
        .iter()
        .map(|p| (p.number, p.column.name.as_str(), p.column.not_null))
        .collect();
    assert_eq!(
        params,
        vec![
            (1, "name", true),
            (2, "email", false),
            (3, "name", true),
            (4, "email", false)
        ]
    );

    let values = query.insert_values.as_ref().unwrap();
    assert_eq!(values.len, 2);
    let first_row: Vec<_> = values.params.iter().map(|p| p.number).collect();
    assert_eq!(first_row, vec![1, 2]);
    assert!(query.columns.is_empty());
    assert_eq!(query_helpers(query), vec!["batch_values"]);
}

#[test]
fn test_insert_shape_rejected() {
    let compiled = compile_pg("-- name: Bad :exec\nINSERT INTO users (name, email) VALUES ($1);");
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::ValidationFailure);
}

#[test]
fn test_insert_returning() {
    let compiled = compile_pg(
        "-- name: CreateUser :one\nINSERT INTO users (name) VALUES ($1) RETURNING id, name;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    let columns: Vec<_> = query.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "name"]);
    assert_eq!(query.params[0].column.data_type, "text");
}

#[test]
fn test_update_assignments() {
    let compiled = compile_mysql(
        "-- name: Rename :execrows\nUPDATE users SET name = ?, bio = ? WHERE id = ?;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.cmd, Cmd::ExecRows);

    let params: Vec<_> = query
        .params
        .iter()
        .map(|p| (p.number, p.column.name.as_str(), p.column.data_type.as_str(), p.column.not_null))
        .collect();
    assert_eq!(
        params,
        vec![
            (1, "name", "varchar", true),
            (2, "bio", "text", false),
            (3, "id", "int", true)
        ]
    );
}

#[test]
fn test_delete_returning() {
    let compiled = compile_pg(
        "-- name: DeleteUser :one\nDELETE FROM users WHERE id = $1 RETURNING id, email;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.params[0].column.name, "id");
    let columns: Vec<_> = query
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.not_null))
        .collect();
    assert_eq!(columns, vec![("id", true), ("email", false)]);
}

#[test]
fn test_subquery_parameter() {
    let compiled = compile_pg(
        "-- name: Buyers :many\n\
         SELECT name FROM users WHERE id IN (SELECT user_id FROM orders WHERE total > $1);",
    );
    assert_clean(&compiled);
    let param = &compiled.queries[0].params[0];
    assert_eq!(param.column.name, "total");
    assert_eq!(param.column.data_type, "decimal");
}

#[test]
fn test_ambiguous_column() {
    let compiled = compile_pg(
        "-- name: Bad :many\nSELECT name FROM users u JOIN orders o ON o.user_id = u.id WHERE id = $1;",
    );
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::AmbiguousColumn);
}

#[test]
fn test_unknown_table() {
    let compiled = compile_pg("-- name: Bad :many\nSELECT id FROM nope WHERE id = $1;");
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::TableNotFound);
}

#[test]
fn test_mixed_parameter_styles() {
    let compiled = compile_pg(
        "-- name: Mixed :many\nSELECT id FROM users WHERE id = $1 AND name = sqlc.arg(name);",
    );
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::ValidationFailure);
}

#[test]
fn test_parameter_gap() {
    let compiled = compile_pg("-- name: Gap :many\nSELECT id FROM users WHERE id = $1 OR id = $3;");
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::ValidationFailure);
    assert!(compiled.diagnostics[0].message.contains("$2"));
}

#[test]
fn test_errors_are_collected() {
    let sql = "-- name: First :one\nSELECT id FROM users WHERE id = $1;\n\n\
               -- name: Broken :one\nSELECT id FROM users WHERE nope = $1;\n\n\
               -- name: Third :many\nSELECT name FROM users;\n";
    let compiled = compile_pg(sql);

    let names: Vec<_> = compiled.queries.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Third"]);
    assert!(compiled.has_errors());
    assert_eq!(compiled.diagnostics.len(), 1);

    let diagnostic = &compiled.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::ColumnNotFound);
    assert_eq!(diagnostic.query.as_deref(), Some("Broken"));
    assert!(diagnostic.message.contains("nope"));
    let span = diagnostic.span.unwrap();
    assert_eq!(span.line, 4);
    assert_eq!(span.column, 1);
    assert_eq!(span.offset, sql.find("-- name: Broken").unwrap());
}

#[test]
fn test_statements_without_directive_skipped() {
    let compiled = compile_pg(
        "CREATE TABLE scratch (id int);\n\
         SELECT id FROM users;\n\
         -- name: Count :one\nSELECT count(*) FROM users;",
    );
    assert_clean(&compiled);
    assert_eq!(compiled.queries.len(), 1);
    assert_eq!(compiled.queries[0].name, "Count");
}

#[test]
fn test_unsupported_statement_with_directive() {
    let compiled = compile_pg("-- name: MakeTable :exec\nCREATE TABLE scratch (id int);");
    assert_eq!(compiled.diagnostics.len(), 1);
    let diagnostic = &compiled.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UnsupportedStatement);
    assert_eq!(diagnostic.query.as_deref(), Some("MakeTable"));
    assert_eq!(diagnostic.code(), "E0101");
}

#[test]
fn test_missing_terminator() {
    let compiled = compile_pg("-- name: Open :many\nSELECT id FROM users");
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::MissingTerminator);
}

#[test]
fn test_truncate() {
    let compiled = compile_pg("-- name: Wipe :exec\nTRUNCATE orders;");
    assert_clean(&compiled);
    assert!(compiled.queries[0].params.is_empty());
    assert!(compiled.queries[0].columns.is_empty());
}

#[test]
fn test_comments_kept_separately() {
    let compiled = compile_pg(
        "-- name: ListUsers :many\n-- Lists every user\n-- by name\nSELECT id, name FROM users ORDER BY name;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.comments, vec!["Lists every user", "by name"]);
    assert_eq!(query.sql, "SELECT id, name FROM users ORDER BY name");
}

#[test]
fn test_multiline_block_comment() {
    let compiled = compile_pg(
        "-- name: G :one\n/*\n multi line\n*/\nSELECT id FROM users WHERE id = $1;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    assert_eq!(query.sql, "SELECT id FROM users WHERE id = $1");
    assert_eq!(query.comments, vec!["multi line"]);
}

#[test]
fn test_edited_sql_reparses() {
    let dialect = SqlDialect::PostgreSQL.parser_dialect();
    let compiled = compile_pg(
        "-- name: ByName :many\n\
         SELECT id FROM users WHERE name = sqlc.arg(name) OR email = sqlc.arg(name);",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    let original = Parser::parse_sql(
        dialect.as_ref(),
        "SELECT id FROM users WHERE name = $1 OR email = $1",
    )
    .unwrap();
    let edited = Parser::parse_sql(dialect.as_ref(), &query.sql).unwrap();
    assert_eq!(edited, original);
    assert_eq!(query.params.len(), 1);
}

#[test]
fn test_comments_round_trip() {
    let dialect = SqlDialect::PostgreSQL.parser_dialect();
    let compiled = compile_pg(
        "-- name: ListUsers :many\n-- Lists every user\nSELECT id FROM users WHERE id > $1;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];

    let reattached = query
        .comments
        .iter()
        .map(|c| format!("-- {c}\n"))
        .collect::<String>()
        + &query.sql;
    assert_eq!(
        Parser::parse_sql(dialect.as_ref(), &reattached).unwrap(),
        Parser::parse_sql(dialect.as_ref(), &query.sql).unwrap()
    );
}

#[test]
fn test_sort_and_helpers() {
    let mut compiled = compile_mysql(
        "-- name: Zed :exec\nINSERT INTO users (id, name) VALUES (?, ?);\n\
         -- name: Alpha :many\nSELECT name FROM users WHERE id IN (?);\n\
         -- name: Mid :exec\nINSERT INTO users (id, name) VALUES (?, ?);",
    );
    assert_clean(&compiled);
    sort_by_name(&mut compiled.queries);
    let names: Vec<_> = compiled.queries.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Mid", "Zed"]);

    let mut registry = HelperRegistry::new();
    let mut emitted = Vec::new();
    for query in &compiled.queries {
        for helper in query_helpers(query) {
            if registry.claim("db", helper) {
                emitted.push(helper);
            }
        }
    }
    assert_eq!(emitted, vec!["expand_slice", "batch_values"]);
}

#[test]
fn test_struct_fields_from_query() {
    let compiled = compile_pg(
        "-- name: Pair :many\n\
         SELECT u.id, o.id, u.name FROM users u JOIN orders o ON o.user_id = u.id\n\
         WHERE u.id = $1 OR o.user_id = $2;",
    );
    assert_clean(&compiled);
    let query = &compiled.queries[0];
    let settings = GenerateSettings {
        emit_json_tags: true,
        ..Default::default()
    };

    let rows: Vec<_> = row_fields(query, &settings)
        .into_iter()
        .map(|f| (f.name, f.tags.get("json").cloned().unwrap_or_default()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("ID".to_string(), "id".to_string()),
            ("ID_2".to_string(), "id_2".to_string()),
            ("Name".to_string(), "name".to_string())
        ]
    );

    let params: Vec<_> = param_fields(query, &settings)
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(params, vec!["ID".to_string(), "UserID".to_string()]);
}

#[test]
fn test_hash_directive_mysql() {
    let compiled = compile_mysql("# name: GetName :one\nSELECT name FROM users WHERE id = ?;");
    assert_clean(&compiled);
    assert_eq!(compiled.queries[0].name, "GetName");
    assert_eq!(compiled.queries[0].sql, "SELECT name FROM users WHERE id = ?");
}

#[test]
fn test_field_type_strings() {
    let varchar = parse_field_type("varchar(255)").unwrap();
    assert_eq!(varchar.base, "varchar");
    assert_eq!(varchar.size, Some(255));
    assert!(!varchar.unsigned);

    let int = parse_field_type("int(10) unsigned").unwrap();
    assert_eq!(int.base, "int");
    assert_eq!(int.size, Some(10));
    assert!(int.unsigned);
}
