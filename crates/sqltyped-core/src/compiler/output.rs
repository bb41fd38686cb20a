//! Query catalog view and output-column resolution.
//!
//! A [`QueryCatalog`] is the catalog as seen from one statement: catalog
//! tables plus the virtual tables introduced by CTEs. Range variables visible
//! at a point in the statement form a [`Scope`], a stack of [`Frame`]s with
//! the innermost query level last.

use std::rc::Rc;

use indexmap::IndexMap;
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, JoinConstraint,
    JoinOperator, ObjectName, Query, Select, SelectItem, SetExpr, Statement,
    TableAlias, TableFactor, TableWithJoins, UnaryOperator, Value, With,
};

use super::query::Column;
use crate::dialect::SqlDialect;
use crate::error::CompileError;
use crate::schema::{object_name_to_qualified, Catalog, QualifiedName};
use crate::types::SqlType;

/// A range variable: catalog table, CTE, derived table or table function
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub alias: Option<String>,
    pub columns: Vec<Column>,
}

impl Table {
    fn new(name: impl Into<String>, alias: Option<&TableAlias>, mut columns: Vec<Column>) -> Self {
        let alias_name = alias.map(|a| a.name.value.clone());
        if let Some(alias) = alias {
            for (column, renamed) in columns.iter_mut().zip(&alias.columns) {
                column.name = renamed.name.value.clone();
            }
            for column in columns.iter_mut() {
                column.table_alias = alias_name.clone();
            }
        }
        Self {
            name: name.into(),
            alias: alias_name,
            columns,
        }
    }

    /// Whether `qualifier` refers to this range variable
    pub(super) fn matches(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias.eq_ignore_ascii_case(qualifier),
            None => self.name.eq_ignore_ascii_case(qualifier),
        }
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }
}

/// Range variables of one query level
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub tables: Vec<Table>,
    /// Columns merged by `JOIN ... USING`
    merged: Vec<String>,
}

impl Frame {
    pub fn single(table: Table) -> Self {
        Self {
            tables: vec![table],
            merged: Vec::new(),
        }
    }
}

/// Range variables visible at one point of a statement
#[derive(Debug, Clone, Default)]
pub struct Scope {
    frames: Vec<Rc<Frame>>,
}

impl Scope {
    /// A new scope with `frame` as its innermost level
    pub fn push(&self, frame: Frame) -> Scope {
        let mut frames = self.frames.clone();
        frames.push(Rc::new(frame));
        Scope { frames }
    }

    fn innermost(&self) -> Option<&Frame> {
        self.frames.last().map(|f| f.as_ref())
    }

    /// Resolve a column reference, innermost level first
    pub fn lookup(&self, qualifier: Option<&str>, name: &str) -> Result<Column, CompileError> {
        for frame in self.frames.iter().rev() {
            if let Some(qualifier) = qualifier {
                if let Some(table) = frame.tables.iter().find(|t| t.matches(qualifier)) {
                    return table
                        .column(name)
                        .cloned()
                        .ok_or_else(|| CompileError::column_not_found_in(qualifier, name));
                }
                continue;
            }

            let mut hits = frame.tables.iter().filter_map(|t| t.column(name));
            if let Some(first) = hits.next() {
                if hits.next().is_some() && !frame.merged.iter().any(|m| m.eq_ignore_ascii_case(name)) {
                    return Err(CompileError::AmbiguousColumn(name.to_string()));
                }
                return Ok(first.clone());
            }
        }

        match qualifier {
            Some(qualifier) => Err(CompileError::TableNotFound(qualifier.to_string())),
            None => Err(CompileError::column_not_found(name)),
        }
    }

    /// The single visible column called `name`, if there is exactly one
    pub fn unique(&self, name: &str) -> Option<Column> {
        self.lookup(None, name).ok()
    }
}

/// The catalog as seen from one statement
#[derive(Debug, Clone)]
pub struct QueryCatalog<'a> {
    catalog: &'a Catalog,
    dialect: SqlDialect,
    /// Lowercased CTE name -> columns
    ctes: IndexMap<String, Vec<Column>>,
}

impl<'a> QueryCatalog<'a> {
    pub fn new(catalog: &'a Catalog, dialect: SqlDialect) -> Self {
        Self {
            catalog,
            dialect,
            ctes: IndexMap::new(),
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// This view extended with the CTEs of a `WITH` clause
    pub fn with_ctes(&self, with: Option<&With>, outer: &Scope) -> Result<Self, CompileError> {
        let mut extended = self.clone();
        let Some(with) = with else {
            return Ok(extended);
        };

        for cte in &with.cte_tables {
            let name = cte.alias.name.value.clone();
            // A recursive CTE takes its columns from the non-recursive term
            let mut columns = match (with.recursive, cte.query.body.as_ref()) {
                (true, SetExpr::SetOperation { left, .. }) => {
                    extended.set_expr_columns(left, outer)?
                }
                _ => extended.query_columns(&cte.query, outer)?,
            };
            for (column, renamed) in columns.iter_mut().zip(&cte.alias.columns) {
                column.name = renamed.name.value.clone();
            }
            tracing::trace!(cte = %name, columns = columns.len(), "registered CTE");
            extended.ctes.insert(name.to_lowercase(), columns);
        }
        Ok(extended)
    }

    /// A named relation from the CTEs or the catalog
    pub fn relation(&self, name: &ObjectName, alias: Option<&TableAlias>) -> Result<Table, CompileError> {
        let qualified = object_name_to_qualified(name);
        if qualified.schema.is_none() {
            if let Some(columns) = self.ctes.get(&qualified.name.to_lowercase()) {
                return Ok(Table::new(&qualified.name, alias, columns.clone()));
            }
        }

        let table = self
            .catalog
            .get_table(&qualified)
            .ok_or_else(|| CompileError::TableNotFound(qualified.to_string()))?;
        let columns = table
            .columns
            .values()
            .map(|def| Column::from_def(self.catalog, table, def))
            .collect();
        Ok(Table::new(&table.name.name, alias, columns))
    }

    /// Range variables introduced by one FROM item
    fn table_factor(
        &self,
        factor: &TableFactor,
        outer: &Scope,
        preceding: &Frame,
    ) -> Result<Vec<Table>, CompileError> {
        match factor {
            TableFactor::Table {
                name,
                alias,
                args: None,
                ..
            } => Ok(vec![self.relation(name, alias.as_ref())?]),
            TableFactor::Derived {
                lateral,
                subquery,
                alias,
            } => {
                let scope = if *lateral {
                    outer.push(preceding.clone())
                } else {
                    outer.clone()
                };
                let columns = self.query_columns(subquery, &scope)?;
                let name = alias.as_ref().map(|a| a.name.value.clone()).unwrap_or_default();
                Ok(vec![Table::new(name, alias.as_ref(), columns)])
            }
            TableFactor::NestedJoin {
                table_with_joins,
                alias,
            } => {
                let frame = self.from_clause([table_with_joins.as_ref()], outer)?;
                match alias {
                    Some(alias) => {
                        let columns = frame.tables.into_iter().flat_map(|t| t.columns).collect();
                        Ok(vec![Table::new(&alias.name.value, Some(alias), columns)])
                    }
                    None => Ok(frame.tables),
                }
            }
            // Table functions expose only the columns named by their alias
            TableFactor::Table { alias, .. }
            | TableFactor::TableFunction { alias, .. }
            | TableFactor::Function { alias, .. }
            | TableFactor::UNNEST { alias, .. } => Ok(alias
                .iter()
                .map(|a| {
                    let columns = a.columns.iter().map(|c| Column::any(&c.name.value)).collect();
                    Table::new(&a.name.value, Some(a), columns)
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    /// Range variables of a FROM clause, with outer-join nullability applied
    pub fn from_clause<'t>(
        &self,
        from: impl IntoIterator<Item = &'t TableWithJoins>,
        outer: &Scope,
    ) -> Result<Frame, CompileError> {
        let mut frame = Frame::default();
        for item in from {
            let mut tables = self.table_factor(&item.relation, outer, &frame)?;
            for join in &item.joins {
                let mut right = self.table_factor(&join.relation, outer, &frame)?;
                let constraint = match &join.join_operator {
                    JoinOperator::LeftOuter(c) => {
                        make_nullable(&mut right);
                        Some(c)
                    }
                    JoinOperator::RightOuter(c) => {
                        make_nullable(&mut tables);
                        Some(c)
                    }
                    JoinOperator::FullOuter(c) => {
                        make_nullable(&mut tables);
                        make_nullable(&mut right);
                        Some(c)
                    }
                    JoinOperator::Inner(c)
                    | JoinOperator::LeftSemi(c)
                    | JoinOperator::RightSemi(c)
                    | JoinOperator::LeftAnti(c)
                    | JoinOperator::RightAnti(c) => Some(c),
                    _ => None,
                };
                if let Some(JoinConstraint::Using(columns)) = constraint {
                    frame
                        .merged
                        .extend(columns.iter().map(|c| c.value.clone()));
                }
                tables.append(&mut right);
            }
            frame.tables.append(&mut tables);
        }
        Ok(frame)
    }

    /// Output columns of a query
    pub fn query_columns(&self, query: &Query, outer: &Scope) -> Result<Vec<Column>, CompileError> {
        let qc = self.with_ctes(query.with.as_ref(), outer)?;
        qc.set_expr_columns(&query.body, outer)
    }

    fn set_expr_columns(&self, body: &SetExpr, outer: &Scope) -> Result<Vec<Column>, CompileError> {
        match body {
            SetExpr::Select(select) => self.select_columns(select, outer),
            SetExpr::Query(query) => self.query_columns(query, outer),
            SetExpr::SetOperation { left, right, .. } => {
                let mut columns = self.set_expr_columns(left, outer)?;
                let others = self.set_expr_columns(right, outer)?;
                for (column, other) in columns.iter_mut().zip(&others) {
                    column.not_null &= other.not_null;
                }
                Ok(columns)
            }
            SetExpr::Values(values) => {
                let Some(first) = values.rows.first() else {
                    return Ok(Vec::new());
                };
                first
                    .iter()
                    .enumerate()
                    .map(|(i, expr)| {
                        let mut column = self.expr_column(expr, outer)?;
                        column.name = format!("column{}", i + 1);
                        Ok(column)
                    })
                    .collect()
            }
            _ => Ok(Vec::new()),
        }
    }

    fn select_columns(&self, select: &Select, outer: &Scope) -> Result<Vec<Column>, CompileError> {
        let frame = self.from_clause(&select.from, outer)?;
        let scope = outer.push(frame);
        self.projection(&select.projection, &scope)
    }

    /// One column per projected expression, with wildcards expanded
    pub fn projection(&self, items: &[SelectItem], scope: &Scope) -> Result<Vec<Column>, CompileError> {
        let mut columns = Vec::new();
        for item in items {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    let mut column = self.expr_column(expr, scope)?;
                    if column.name.is_empty() {
                        column.name = format!("column_{}", columns.len() + 1);
                    }
                    columns.push(column);
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    let mut column = self.expr_column(expr, scope)?;
                    column.name = alias.value.clone();
                    columns.push(column);
                }
                SelectItem::Wildcard(_) => {
                    if let Some(frame) = scope.innermost() {
                        for table in &frame.tables {
                            columns.extend(table.columns.iter().cloned());
                        }
                    }
                }
                SelectItem::QualifiedWildcard(name, _) => {
                    let qualifier = name.0.last().map(|i| i.value.as_str()).unwrap_or_default();
                    let table = scope
                        .innermost()
                        .and_then(|f| f.tables.iter().find(|t| t.matches(qualifier)))
                        .ok_or_else(|| CompileError::TableNotFound(qualifier.to_string()))?;
                    columns.extend(table.columns.iter().cloned());
                }
            }
        }
        Ok(columns)
    }

    /// Output columns of a statement: the select list or RETURNING clause
    pub fn statement_columns(&self, stmt: &Statement) -> Result<Vec<Column>, CompileError> {
        match stmt {
            Statement::Query(query) => self.query_columns(query, &Scope::default()),
            Statement::Insert(insert) => match &insert.returning {
                Some(returning) => {
                    let table = self.relation(&insert.table_name, None)?;
                    self.projection(returning, &Scope::default().push(Frame::single(table)))
                }
                None => Ok(Vec::new()),
            },
            Statement::Update {
                table,
                from,
                returning: Some(returning),
                ..
            } => {
                let frame = self.from_clause(std::iter::once(table).chain(from), &Scope::default())?;
                self.projection(returning, &Scope::default().push(frame))
            }
            Statement::Delete(delete) => match &delete.returning {
                Some(returning) => {
                    let frame = self.from_clause(delete_tables(delete), &Scope::default())?;
                    self.projection(returning, &Scope::default().push(frame))
                }
                None => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }

    /// Type of an expression
    pub fn expr_column(&self, expr: &Expr, scope: &Scope) -> Result<Column, CompileError> {
        let column = match expr {
            Expr::Identifier(ident) => scope.lookup(None, &ident.value)?,
            Expr::CompoundIdentifier(parts) => {
                let (qualifier, name) = split_compound(parts);
                scope.lookup(qualifier, name)?
            }
            Expr::Nested(inner) => self.expr_column(inner, scope)?,
            Expr::Value(value) => value_column(value),
            Expr::TypedString { data_type, .. } => {
                Column::typed("", &SqlType::from_ast(data_type), true)
            }
            Expr::Cast {
                expr, data_type, ..
            } => {
                let inner = self.expr_column(expr, scope)?;
                Column::typed(inner.name, &SqlType::from_ast(data_type), inner.not_null)
            }
            Expr::BinaryOp { left, op, right } => {
                let l = self.expr_column(left, scope)?;
                let r = self.expr_column(right, scope)?;
                let not_null = l.not_null && r.not_null;
                match op {
                    BinaryOperator::Eq
                    | BinaryOperator::NotEq
                    | BinaryOperator::Lt
                    | BinaryOperator::LtEq
                    | BinaryOperator::Gt
                    | BinaryOperator::GtEq
                    | BinaryOperator::Spaceship
                    | BinaryOperator::And
                    | BinaryOperator::Or
                    | BinaryOperator::Xor => Column::typed("", &SqlType::Boolean, not_null),
                    BinaryOperator::StringConcat => Column::typed("", &SqlType::Text, not_null),
                    BinaryOperator::Plus
                    | BinaryOperator::Minus
                    | BinaryOperator::Multiply
                    | BinaryOperator::Divide
                    | BinaryOperator::Modulo => {
                        let base = if l.data_type == "any" { r } else { l };
                        Column {
                            name: String::new(),
                            not_null,
                            table: None,
                            table_alias: None,
                            comment: None,
                            ..base
                        }
                    }
                    _ => Column::any(""),
                }
            }
            Expr::UnaryOp { op, expr } => {
                let inner = self.expr_column(expr, scope)?;
                match op {
                    UnaryOperator::Not => Column::typed("", &SqlType::Boolean, inner.not_null),
                    _ => Column {
                        name: String::new(),
                        table: None,
                        ..inner
                    },
                }
            }
            Expr::IsNull(_)
            | Expr::IsNotNull(_)
            | Expr::IsTrue(_)
            | Expr::IsFalse(_)
            | Expr::IsNotTrue(_)
            | Expr::IsNotFalse(_)
            | Expr::IsDistinctFrom(..)
            | Expr::IsNotDistinctFrom(..)
            | Expr::Exists { .. } => Column::typed("", &SqlType::Boolean, true),
            Expr::InList { expr, .. }
            | Expr::InSubquery { expr, .. }
            | Expr::Between { expr, .. }
            | Expr::Like { expr, .. }
            | Expr::ILike { expr, .. }
            | Expr::SimilarTo { expr, .. } => {
                let inner = self.expr_column(expr, scope)?;
                Column::typed("", &SqlType::Boolean, inner.not_null)
            }
            Expr::Case {
                results,
                else_result,
                ..
            } => {
                let mut typed = results
                    .iter()
                    .chain(else_result.as_deref())
                    .map(|e| self.expr_column(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                let not_null = else_result.is_some() && typed.iter().all(|c| c.not_null);
                let base = typed
                    .iter()
                    .position(|c| c.data_type != "any")
                    .map(|i| typed.swap_remove(i))
                    .unwrap_or_else(|| Column::any(""));
                Column::typed("", &SqlType::Unknown, not_null).with_type_of(&base)
            }
            Expr::Subquery(query) => {
                let columns = self.query_columns(query, scope)?;
                match columns.into_iter().next() {
                    Some(first) => Column {
                        name: String::new(),
                        not_null: false,
                        table: None,
                        table_alias: None,
                        ..first
                    },
                    None => Column::any(""),
                }
            }
            Expr::Function(func) => self.function_column(func, scope)?,
            Expr::Interval(_) => Column::typed("", &SqlType::Interval, true),
            _ => Column::any(""),
        };
        Ok(column)
    }

    fn function_column(
        &self,
        func: &sqlparser::ast::Function,
        scope: &Scope,
    ) -> Result<Column, CompileError> {
        let name = object_name_to_qualified(&func.name);
        let fname = name.name.to_lowercase();
        let args: Vec<&Expr> = match &func.args {
            FunctionArguments::List(list) => list
                .args
                .iter()
                .filter_map(|arg| match arg {
                    FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                    | FunctionArg::Named {
                        arg: FunctionArgExpr::Expr(e),
                        ..
                    }
                    | FunctionArg::ExprNamed {
                        arg: FunctionArgExpr::Expr(e),
                        ..
                    } => Some(e),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let arg_count = match &func.args {
            FunctionArguments::List(list) => list.args.len(),
            _ => 0,
        };
        let typed = args
            .iter()
            .map(|e| self.expr_column(e, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let all_not_null = typed.iter().all(|c| c.not_null);

        let column = match fname.as_str() {
            "count" => Column::typed(&fname, &SqlType::BigInt, true),
            "sum" | "min" | "max" => match typed.first() {
                Some(arg) => Column::typed(&fname, &SqlType::Unknown, false).with_type_of(arg),
                None => Column::any(&fname),
            },
            "avg" => Column::typed(
                &fname,
                &SqlType::Decimal {
                    precision: None,
                    scale: None,
                },
                false,
            ),
            "coalesce" | "ifnull" => {
                let not_null = typed.iter().any(|c| c.not_null);
                match typed.iter().find(|c| c.data_type != "any") {
                    Some(arg) => Column::typed(&fname, &SqlType::Unknown, not_null).with_type_of(arg),
                    None => Column::typed(&fname, &SqlType::Unknown, not_null),
                }
            }
            "now" | "current_timestamp" | "localtimestamp" => {
                let data_type = match self.dialect {
                    SqlDialect::PostgreSQL => SqlType::Timestamp {
                        precision: None,
                        with_timezone: true,
                    },
                    SqlDialect::MySQL => SqlType::Datetime,
                };
                Column::typed(&fname, &data_type, true)
            }
            "lower" | "upper" | "concat" | "trim" | "replace" | "substring" | "substr" => {
                Column::typed(&fname, &SqlType::Text, all_not_null)
            }
            "length" | "char_length" => Column::typed(&fname, &SqlType::Integer, all_not_null),
            _ => match self
                .catalog
                .get_functions(&name)
                .into_iter()
                .find(|f| f.accepts(arg_count))
            {
                Some(def) => Column::typed(&fname, &def.return_type, def.return_not_null),
                None => Column::any(&fname),
            },
        };
        Ok(column)
    }
}

impl Column {
    /// Take type information from `other`, keeping name and nullability
    fn with_type_of(self, other: &Column) -> Column {
        Column {
            data_type: other.data_type.clone(),
            is_array: other.is_array,
            unsigned: other.unsigned,
            length: other.length,
            enum_ref: other.enum_ref.clone(),
            ..self
        }
    }
}

fn value_column(value: &Value) -> Column {
    match value {
        Value::Number(n, _) if n.contains(['.', 'e', 'E']) => Column::typed(
            "",
            &SqlType::Decimal {
                precision: None,
                scale: None,
            },
            true,
        ),
        Value::Number(..) => Column::typed("", &SqlType::Integer, true),
        Value::SingleQuotedString(_)
        | Value::DoubleQuotedString(_)
        | Value::EscapedStringLiteral(_)
        | Value::NationalStringLiteral(_) => Column::typed("", &SqlType::Text, true),
        Value::Boolean(_) => Column::typed("", &SqlType::Boolean, true),
        _ => Column::any(""),
    }
}

fn make_nullable(tables: &mut [Table]) {
    for column in tables.iter_mut().flat_map(|t| t.columns.iter_mut()) {
        column.not_null = false;
    }
}

/// Split `a.b.c` into qualifier `b` and column `c`
pub(crate) fn split_compound(parts: &[sqlparser::ast::Ident]) -> (Option<&str>, &str) {
    match parts {
        [] => (None, ""),
        [name] => (None, name.value.as_str()),
        [.., qualifier, name] => (Some(qualifier.value.as_str()), name.value.as_str()),
    }
}

/// Tables a DELETE reads from, including `USING`
pub(crate) fn delete_tables(delete: &sqlparser::ast::Delete) -> impl Iterator<Item = &TableWithJoins> {
    let from = match &delete.from {
        sqlparser::ast::FromTable::WithFromKeyword(tables) => tables,
        sqlparser::ast::FromTable::WithoutKeyword(tables) => tables,
    };
    from.iter().chain(delete.using.iter().flatten())
}

/// The catalog table a FROM item names, if any
pub(crate) fn relation_name(factor: &TableFactor) -> Option<QualifiedName> {
    match factor {
        TableFactor::Table { name, .. } => Some(object_name_to_qualified(name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;
    use pretty_assertions::assert_eq;
    use sqlparser::parser::Parser;

    fn catalog() -> Catalog {
        let mut builder = SchemaBuilder::new();
        builder
            .parse(
                "CREATE TABLE users (id int PRIMARY KEY, name text NOT NULL, bio text);
                 CREATE TABLE posts (id int PRIMARY KEY, user_id int NOT NULL, title text NOT NULL);",
            )
            .unwrap();
        builder.build().0
    }

    fn columns(sql: &str) -> Result<Vec<Column>, CompileError> {
        let catalog = catalog();
        let stmt = Parser::parse_sql(SqlDialect::PostgreSQL.parser_dialect().as_ref(), sql)
            .unwrap()
            .remove(0);
        QueryCatalog::new(&catalog, SqlDialect::PostgreSQL).statement_columns(&stmt)
    }

    fn summary(columns: &[Column]) -> Vec<(String, String, bool)> {
        columns
            .iter()
            .map(|c| (c.name.clone(), c.data_type.clone(), c.not_null))
            .collect()
    }

    #[test]
    fn test_wildcard_and_left_join() {
        let cols = columns("SELECT * FROM users u LEFT JOIN posts p ON p.user_id = u.id").unwrap();
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "bio", "id", "user_id", "title"]);
        assert!(cols[1].not_null);
        assert!(!cols[5].not_null);
        assert_eq!(cols[0].table_alias.as_deref(), Some("u"));
    }

    #[test]
    fn test_expression_types() {
        let cols = columns(
            "SELECT count(*), max(id), coalesce(bio, name), id > 1, 1 + 1, bio IS NULL FROM users",
        )
        .unwrap();
        assert_eq!(
            summary(&cols),
            vec![
                ("count".to_string(), "bigint".to_string(), true),
                ("max".to_string(), "int".to_string(), false),
                ("coalesce".to_string(), "text".to_string(), true),
                ("column_4".to_string(), "bool".to_string(), true),
                ("column_5".to_string(), "int".to_string(), true),
                ("column_6".to_string(), "bool".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_cte_and_derived_table() {
        let cols = columns(
            "WITH named AS (SELECT id, name AS label FROM users)
             SELECT n.label, d.total FROM named n, (SELECT count(*) AS total FROM posts) d",
        )
        .unwrap();
        assert_eq!(
            summary(&cols),
            vec![
                ("label".to_string(), "text".to_string(), true),
                ("total".to_string(), "bigint".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            columns("SELECT missing FROM users").unwrap_err(),
            CompileError::column_not_found("missing")
        );
        assert_eq!(
            columns("SELECT id FROM users JOIN posts ON true").unwrap_err(),
            CompileError::AmbiguousColumn("id".to_string())
        );
        assert_eq!(
            columns("SELECT * FROM nope").unwrap_err(),
            CompileError::TableNotFound("nope".to_string())
        );
        assert_eq!(
            columns("SELECT x.id FROM users u").unwrap_err(),
            CompileError::TableNotFound("x".to_string())
        );
    }

    #[test]
    fn test_using_join_is_not_ambiguous() {
        let cols = columns("SELECT id FROM users JOIN posts USING (id)").unwrap();
        assert_eq!(cols[0].name, "id");
    }

    #[test]
    fn test_returning() {
        let cols = columns("DELETE FROM users WHERE id = 1 RETURNING id, name").unwrap();
        assert_eq!(cols.len(), 2);
        let cols = columns("UPDATE users SET bio = 'x' RETURNING *").unwrap();
        assert_eq!(cols.len(), 3);
    }
}
