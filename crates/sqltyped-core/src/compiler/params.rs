//! Parameter reference scanner.
//!
//! Walks a statement in source order and records, for every placeholder, the
//! syntactic position it sits in and the range variables visible there. The
//! scanner does not resolve anything itself; see [`super::resolve`].

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use sqlparser::ast::{
    visit_expressions, Assignment, AssignmentTarget, BinaryOperator, Expr, FunctionArg,
    FunctionArgExpr, FunctionArguments, GroupByExpr, Insert, JoinConstraint, JoinOperator,
    OnConflictAction, OnInsert, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins, Value, Visit,
};

use super::output::{delete_tables, relation_name, split_compound, Frame, QueryCatalog, Scope};
use super::placeholder::{LimitSlot, Occurrence};
use crate::error::CompileError;
use crate::schema::{object_name_to_qualified, QualifiedName};
use crate::types::SqlType;

/// Where a placeholder sits, as far as typing it is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum RefContext {
    /// Compared against a column: `col = $1`, `col BETWEEN $1 AND $2`
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// `col = ANY($1)`
    AnyOf {
        qualifier: Option<String>,
        name: String,
    },
    /// The only element of `col IN (?)` where lists expand at runtime
    InList {
        qualifier: Option<String>,
        name: String,
    },
    /// Written into a column: INSERT values and SET assignments
    Target { table: QualifiedName, column: String },
    FunctionArg {
        function: QualifiedName,
        index: usize,
        count: usize,
    },
    Cast(SqlType),
    Limit,
    Offset,
    Unknown,
}

/// One placeholder found in a statement
#[derive(Debug, Clone)]
pub struct ParamRef {
    pub number: usize,
    /// Byte offset relative to the statement start
    pub location: usize,
    pub context: RefContext,
    pub scope: Scope,
    /// Index of the VALUES tuple the placeholder belongs to
    pub values_row: Option<usize>,
}

/// A placeholder node before it is matched with its source occurrence
struct Found {
    number: Option<usize>,
    context: RefContext,
    scope: Scope,
    values_row: Option<usize>,
}

/// Find every parameter reference in `stmt`, in source order.
///
/// `stmt` must already have named placeholders rewritten. Each placeholder
/// node is paired with the occurrence at the same position in `occurrences`.
pub fn find_parameters(
    stmt: &Statement,
    qc: &QueryCatalog<'_>,
    in_list_slices: bool,
    occurrences: &[Occurrence],
    ordinals: &[usize],
) -> Result<Vec<ParamRef>, CompileError> {
    let mut scanner = Scanner {
        qc: qc.clone(),
        in_list_slices,
        values_row: None,
        found: Vec::new(),
    };
    scanner.statement(stmt)?;

    if scanner.found.len() != occurrences.len() {
        return Err(CompileError::InvalidRewrite(format!(
            "statement has {} placeholders but its text has {}",
            scanner.found.len(),
            occurrences.len()
        )));
    }

    let mut found = scanner.found;
    align_limit_offset(&mut found, occurrences);

    let refs = found
        .into_iter()
        .zip(occurrences.iter().zip(ordinals))
        .map(|(found, (occurrence, ordinal))| {
            let r = ParamRef {
                number: found.number.unwrap_or(*ordinal),
                location: occurrence.location,
                context: found.context,
                scope: found.scope,
                values_row: found.values_row,
            };
            tracing::trace!(number = r.number, location = r.location, context = ?r.context, "parameter reference");
            r
        })
        .collect();
    Ok(refs)
}

/// The walk visits LIMIT before OFFSET, but `LIMIT offset, count` and
/// `OFFSET .. LIMIT ..` write them the other way round. Swap each such pair
/// so the nodes line up with their text occurrences.
fn align_limit_offset(found: &mut [Found], occurrences: &[Occurrence]) {
    let mut i = 0;
    while i + 1 < found.len().min(occurrences.len()) {
        let walked = (&found[i].context, &found[i + 1].context);
        let written = (occurrences[i].slot, occurrences[i + 1].slot);
        if matches!(walked, (RefContext::Limit, RefContext::Offset))
            && written == (Some(LimitSlot::Offset), Some(LimitSlot::Limit))
        {
            found.swap(i, i + 1);
            i += 2;
        } else {
            i += 1;
        }
    }
}

/// One reference per ordinal, ascending.
///
/// The first occurrence wins; when its position says nothing about its type,
/// the first later occurrence that does supplies the context.
pub fn unique_param_refs(refs: &[ParamRef]) -> Vec<ParamRef> {
    let mut unique: BTreeMap<usize, ParamRef> = BTreeMap::new();
    for r in refs {
        match unique.get_mut(&r.number) {
            None => {
                unique.insert(r.number, r.clone());
            }
            Some(first) if first.context == RefContext::Unknown && r.context != RefContext::Unknown => {
                first.context = r.context.clone();
                first.scope = r.scope.clone();
            }
            Some(_) => {}
        }
    }
    unique.into_values().collect()
}

struct Scanner<'a> {
    qc: QueryCatalog<'a>,
    in_list_slices: bool,
    values_row: Option<usize>,
    found: Vec<Found>,
}

impl<'a> Scanner<'a> {
    fn statement(&mut self, stmt: &Statement) -> Result<(), CompileError> {
        match stmt {
            Statement::Query(query) => self.query(query, &Scope::default()),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                returning,
                ..
            } => {
                let frame = self
                    .qc
                    .from_clause(std::iter::once(table).chain(from), &Scope::default())?;
                let scope = Scope::default().push(frame);
                let target = relation_name(&table.relation);

                self.from_items(std::iter::once(table), &Scope::default(), &scope)?;
                self.assignments(assignments, target.as_ref(), &scope)?;
                self.from_items(from, &Scope::default(), &scope)?;
                if let Some(selection) = selection {
                    self.expr(selection, &scope)?;
                }
                if let Some(returning) = returning {
                    self.projection(returning, &scope)?;
                }
                Ok(())
            }
            Statement::Delete(delete) => {
                let frame = self.qc.from_clause(delete_tables(delete), &Scope::default())?;
                let scope = Scope::default().push(frame);

                self.from_items(delete_tables(delete), &Scope::default(), &scope)?;
                if let Some(selection) = &delete.selection {
                    self.expr(selection, &scope)?;
                }
                if let Some(returning) = &delete.returning {
                    self.projection(returning, &scope)?;
                }
                for order in &delete.order_by {
                    self.expr(&order.expr, &scope)?;
                }
                if let Some(limit) = &delete.limit {
                    self.expr_in(limit, &scope, RefContext::Limit)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, insert: &Insert) -> Result<(), CompileError> {
        let table_name = object_name_to_qualified(&insert.table_name);
        let target = self.qc.relation(&insert.table_name, None)?;
        let columns: Vec<String> = if insert.columns.is_empty() {
            target.columns.iter().map(|c| c.name.clone()).collect()
        } else {
            insert.columns.iter().map(|c| c.value.clone()).collect()
        };
        let target_scope = Scope::default().push(Frame::single(target));

        if let Some(source) = &insert.source {
            match source.body.as_ref() {
                SetExpr::Values(values) => {
                    for (row_index, row) in values.rows.iter().enumerate() {
                        self.values_row = Some(row_index);
                        for (i, expr) in row.iter().enumerate() {
                            let context = match columns.get(i) {
                                Some(column) => RefContext::Target {
                                    table: table_name.clone(),
                                    column: column.clone(),
                                },
                                None => RefContext::Unknown,
                            };
                            self.expr_in(expr, &Scope::default(), context)?;
                        }
                    }
                    self.values_row = None;
                }
                _ => self.query(source, &Scope::default())?,
            }
        }

        match &insert.on {
            Some(OnInsert::DuplicateKeyUpdate(assignments)) => {
                self.assignments(assignments, Some(&table_name), &target_scope)?;
            }
            Some(OnInsert::OnConflict(conflict)) => {
                if let OnConflictAction::DoUpdate(update) = &conflict.action {
                    self.assignments(&update.assignments, Some(&table_name), &target_scope)?;
                    if let Some(selection) = &update.selection {
                        self.expr(selection, &target_scope)?;
                    }
                }
            }
            _ => {}
        }

        if let Some(returning) = &insert.returning {
            self.projection(returning, &target_scope)?;
        }
        Ok(())
    }

    fn assignments(
        &mut self,
        assignments: &[Assignment],
        target: Option<&QualifiedName>,
        scope: &Scope,
    ) -> Result<(), CompileError> {
        for assignment in assignments {
            let context = match (&assignment.target, target) {
                (AssignmentTarget::ColumnName(column), Some(table)) => match column.0.last() {
                    Some(ident) => RefContext::Target {
                        table: table.clone(),
                        column: ident.value.clone(),
                    },
                    None => RefContext::Unknown,
                },
                _ => RefContext::Unknown,
            };
            self.expr_in(&assignment.value, scope, context)?;
        }
        Ok(())
    }

    fn query(&mut self, query: &Query, outer: &Scope) -> Result<(), CompileError> {
        let extended = self.qc.with_ctes(query.with.as_ref(), outer)?;
        let saved = std::mem::replace(&mut self.qc, extended);
        let result = self.query_body(query, outer);
        self.qc = saved;
        result
    }

    fn query_body(&mut self, query: &Query, outer: &Scope) -> Result<(), CompileError> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.query(&cte.query, outer)?;
            }
        }

        let scope = self.set_expr(&query.body, outer)?;

        if let Some(order_by) = &query.order_by {
            for order in &order_by.exprs {
                self.expr(&order.expr, &scope)?;
            }
        }
        if let Some(limit) = &query.limit {
            self.expr_in(limit, &scope, RefContext::Limit)?;
        }
        if let Some(offset) = &query.offset {
            self.expr_in(&offset.value, &scope, RefContext::Offset)?;
        }
        Ok(())
    }

    /// Walk a query body, returning the scope its ORDER BY sees
    fn set_expr(&mut self, body: &SetExpr, outer: &Scope) -> Result<Scope, CompileError> {
        match body {
            SetExpr::Select(select) => self.select(select, outer),
            SetExpr::Query(query) => {
                self.query(query, outer)?;
                Ok(outer.clone())
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(left, outer)?;
                self.set_expr(right, outer)?;
                Ok(outer.clone())
            }
            SetExpr::Values(values) => {
                for row in &values.rows {
                    for expr in row {
                        self.expr(expr, outer)?;
                    }
                }
                Ok(outer.clone())
            }
            other => {
                self.generic(other, outer);
                Ok(outer.clone())
            }
        }
    }

    fn select(&mut self, select: &Select, outer: &Scope) -> Result<Scope, CompileError> {
        let frame = self.qc.from_clause(&select.from, outer)?;
        let scope = outer.push(frame);

        self.projection(&select.projection, &scope)?;
        self.from_items(&select.from, outer, &scope)?;
        if let Some(selection) = &select.selection {
            self.expr(selection, &scope)?;
        }
        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            for expr in exprs {
                self.expr(expr, &scope)?;
            }
        }
        if let Some(having) = &select.having {
            self.expr(having, &scope)?;
        }
        if let Some(qualify) = &select.qualify {
            self.expr(qualify, &scope)?;
        }
        Ok(scope)
    }

    fn projection(&mut self, items: &[SelectItem], scope: &Scope) -> Result<(), CompileError> {
        for item in items {
            match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    self.expr(expr, scope)?
                }
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {}
            }
        }
        Ok(())
    }

    /// Placeholders inside FROM items: subqueries, function arguments, ON
    fn from_items<'t>(
        &mut self,
        from: impl IntoIterator<Item = &'t TableWithJoins>,
        outer: &Scope,
        scope: &Scope,
    ) -> Result<(), CompileError> {
        for item in from {
            self.table_factor(&item.relation, outer, scope)?;
            for join in &item.joins {
                self.table_factor(&join.relation, outer, scope)?;
                let constraint = match &join.join_operator {
                    JoinOperator::Inner(c)
                    | JoinOperator::LeftOuter(c)
                    | JoinOperator::RightOuter(c)
                    | JoinOperator::FullOuter(c)
                    | JoinOperator::LeftSemi(c)
                    | JoinOperator::RightSemi(c)
                    | JoinOperator::LeftAnti(c)
                    | JoinOperator::RightAnti(c) => Some(c),
                    _ => None,
                };
                if let Some(JoinConstraint::On(expr)) = constraint {
                    self.expr(expr, scope)?;
                }
            }
        }
        Ok(())
    }

    fn table_factor(
        &mut self,
        factor: &TableFactor,
        outer: &Scope,
        scope: &Scope,
    ) -> Result<(), CompileError> {
        match factor {
            TableFactor::Table { args: None, .. } => Ok(()),
            TableFactor::Derived {
                lateral, subquery, ..
            } => self.query(subquery, if *lateral { scope } else { outer }),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.from_items([table_with_joins.as_ref()], outer, scope),
            other => {
                self.generic(other, scope);
                Ok(())
            }
        }
    }

    fn expr(&mut self, expr: &Expr, scope: &Scope) -> Result<(), CompileError> {
        self.expr_in(expr, scope, RefContext::Unknown)
    }

    /// Walk `expr`; a placeholder at its root gets `context`
    fn expr_in(&mut self, expr: &Expr, scope: &Scope, context: RefContext) -> Result<(), CompileError> {
        match expr {
            Expr::Value(Value::Placeholder(p)) => {
                self.push(p, context, scope);
                Ok(())
            }
            Expr::Nested(inner) => self.expr_in(inner, scope, context),
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) | Expr::Value(_) => Ok(()),
            Expr::BinaryOp { left, op, right } => {
                if is_logical(op) {
                    self.expr(left, scope)?;
                    return self.expr(right, scope);
                }
                if let (Expr::Tuple(ls), Expr::Tuple(rs)) = (left.as_ref(), right.as_ref()) {
                    if ls.len() == rs.len() {
                        for (l, r) in ls.iter().zip(rs) {
                            self.expr_in(l, scope, operand_context(r))?;
                        }
                        for (l, r) in ls.iter().zip(rs) {
                            self.expr_in(r, scope, operand_context(l))?;
                        }
                        return Ok(());
                    }
                }
                self.expr_in(left, scope, operand_context(right))?;
                self.expr_in(right, scope, operand_context(left))
            }
            Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
                self.expr(left, scope)?;
                let context = match operand_context(left) {
                    RefContext::Column { qualifier, name } => RefContext::AnyOf { qualifier, name },
                    _ => RefContext::Unknown,
                };
                self.expr_in(right, scope, context)
            }
            Expr::InList { expr, list, .. } => {
                self.expr(expr, scope)?;
                let column = operand_context(expr);
                let lone = list.len() == 1 && self.in_list_slices;
                for item in list {
                    let context = match (&column, lone) {
                        (RefContext::Column { qualifier, name }, true) => RefContext::InList {
                            qualifier: qualifier.clone(),
                            name: name.clone(),
                        },
                        _ => column.clone(),
                    };
                    self.expr_in(item, scope, context)?;
                }
                Ok(())
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.expr(expr, scope)?;
                self.query(subquery, scope)
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.expr(expr, scope)?;
                self.expr_in(low, scope, operand_context(expr))?;
                self.expr_in(high, scope, operand_context(expr))
            }
            Expr::Like { expr, pattern, .. }
            | Expr::ILike { expr, pattern, .. }
            | Expr::SimilarTo { expr, pattern, .. } => {
                self.expr(expr, scope)?;
                self.expr_in(pattern, scope, operand_context(expr))
            }
            Expr::Cast {
                expr, data_type, ..
            } => self.expr_in(expr, scope, RefContext::Cast(SqlType::from_ast(data_type))),
            Expr::Function(func) => self.function(func, scope),
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                let when_context = match operand {
                    Some(operand) => {
                        self.expr(operand, scope)?;
                        operand_context(operand)
                    }
                    None => RefContext::Unknown,
                };
                for (condition, result) in conditions.iter().zip(results) {
                    self.expr_in(condition, scope, when_context.clone())?;
                    self.expr(result, scope)?;
                }
                if let Some(else_result) = else_result {
                    self.expr(else_result, scope)?;
                }
                Ok(())
            }
            Expr::Subquery(query) | Expr::Exists { subquery: query, .. } => self.query(query, scope),
            Expr::UnaryOp { expr, .. }
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::IsTrue(expr)
            | Expr::IsFalse(expr)
            | Expr::IsNotTrue(expr)
            | Expr::IsNotFalse(expr) => self.expr(expr, scope),
            Expr::Tuple(items) => {
                for item in items {
                    self.expr(item, scope)?;
                }
                Ok(())
            }
            other => {
                self.generic(other, scope);
                Ok(())
            }
        }
    }

    fn function(&mut self, func: &sqlparser::ast::Function, scope: &Scope) -> Result<(), CompileError> {
        let function = object_name_to_qualified(&func.name);
        match &func.args {
            FunctionArguments::List(list) => {
                let count = list.args.len();
                for (index, arg) in list.args.iter().enumerate() {
                    let expr = match arg {
                        FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                        | FunctionArg::Named {
                            arg: FunctionArgExpr::Expr(e),
                            ..
                        }
                        | FunctionArg::ExprNamed {
                            arg: FunctionArgExpr::Expr(e),
                            ..
                        } => e,
                        _ => continue,
                    };
                    let context = RefContext::FunctionArg {
                        function: function.clone(),
                        index,
                        count,
                    };
                    self.expr_in(expr, scope, context)?;
                }
                self.generic(&list.clauses, scope);
            }
            FunctionArguments::Subquery(query) => self.query(query, scope)?,
            FunctionArguments::None => {}
        }
        if let Some(filter) = &func.filter {
            self.expr(filter, scope)?;
        }
        if let Some(over) = &func.over {
            self.generic(over, scope);
        }
        Ok(())
    }

    /// Collect placeholders under a node this walker has no special rules for
    fn generic<V: Visit>(&mut self, node: &V, scope: &Scope) {
        let _ = visit_expressions(node, |expr| {
            if let Expr::Value(Value::Placeholder(p)) = expr {
                self.push(p, RefContext::Unknown, scope);
            }
            ControlFlow::<()>::Continue(())
        });
    }

    fn push(&mut self, placeholder: &str, context: RefContext, scope: &Scope) {
        let number = placeholder
            .strip_prefix('$')
            .or_else(|| placeholder.strip_prefix('?'))
            .and_then(|n| n.parse().ok());
        self.found.push(Found {
            number,
            context,
            scope: scope.clone(),
            values_row: self.values_row,
        });
    }
}

fn is_logical(op: &BinaryOperator) -> bool {
    matches!(op, BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Xor)
}

/// The context a placeholder gets from the other side of an operator
fn operand_context(other: &Expr) -> RefContext {
    match other {
        Expr::Identifier(ident) => RefContext::Column {
            qualifier: None,
            name: ident.value.clone(),
        },
        Expr::CompoundIdentifier(parts) => {
            let (qualifier, name) = split_compound(parts);
            RefContext::Column {
                qualifier: qualifier.map(str::to_string),
                name: name.to_string(),
            }
        }
        Expr::Nested(inner) => operand_context(inner),
        Expr::Cast { data_type, .. } => RefContext::Cast(SqlType::from_ast(data_type)),
        _ => RefContext::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::placeholder::locate;
    use crate::compiler::rewrite::named_parameters;
    use crate::dialect::SqlDialect;
    use crate::schema::{Catalog, SchemaBuilder};
    use pretty_assertions::assert_eq;
    use sqlparser::parser::Parser;

    fn catalog() -> Catalog {
        let mut builder = SchemaBuilder::new();
        builder
            .parse("CREATE TABLE users (id int PRIMARY KEY, name text NOT NULL, age int);")
            .unwrap();
        builder.build().0
    }

    fn scan(sql: &str, dialect: SqlDialect) -> Vec<ParamRef> {
        let catalog = catalog();
        let mut stmt = Parser::parse_sql(dialect.parser_dialect().as_ref(), sql)
            .unwrap()
            .remove(0);
        let occurrences = locate(sql, dialect).unwrap();
        let rewrite = named_parameters(&mut stmt, &occurrences);
        let qc = QueryCatalog::new(&catalog, dialect);
        find_parameters(
            &stmt,
            &qc,
            dialect.in_list_slices(),
            &occurrences,
            &rewrite.ordinals,
        )
        .unwrap()
    }

    fn column(name: &str) -> RefContext {
        RefContext::Column {
            qualifier: None,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_contexts_in_source_order() {
        let refs = scan(
            "SELECT name FROM users WHERE id = $1 AND $2 < age LIMIT $3 OFFSET $4",
            SqlDialect::PostgreSQL,
        );
        let contexts: Vec<_> = refs.iter().map(|r| (r.number, r.context.clone())).collect();
        assert_eq!(
            contexts,
            vec![
                (1, column("id")),
                (2, column("age")),
                (3, RefContext::Limit),
                (4, RefContext::Offset),
            ]
        );
        assert_eq!(refs[0].location, 34);
    }

    #[test]
    fn test_mysql_limit_comma_order() {
        let refs = scan("SELECT name FROM users WHERE age > ? LIMIT ?, ?", SqlDialect::MySQL);
        let contexts: Vec<_> = refs.iter().map(|r| (r.number, r.context.clone())).collect();
        assert_eq!(
            contexts,
            vec![
                (1, column("age")),
                (2, RefContext::Offset),
                (3, RefContext::Limit),
            ]
        );
        assert!(refs[1].location < refs[2].location);
    }

    #[test]
    fn test_offset_before_limit() {
        let sql = "SELECT name FROM users OFFSET $1 LIMIT $2";
        let refs = scan(sql, SqlDialect::PostgreSQL);
        assert_eq!(refs[0].number, 1);
        assert_eq!(refs[0].context, RefContext::Offset);
        assert_eq!(&sql[refs[0].location..refs[0].location + 2], "$1");
        assert_eq!(refs[1].context, RefContext::Limit);
    }

    #[test]
    fn test_insert_targets() {
        let refs = scan(
            "INSERT INTO users (name, age) VALUES (?, ?), (?, ?)",
            SqlDialect::MySQL,
        );
        assert_eq!(refs.len(), 4);
        assert_eq!(
            refs[1].context,
            RefContext::Target {
                table: QualifiedName::new("users"),
                column: "age".to_string()
            }
        );
        assert_eq!(refs[2].values_row, Some(1));
        assert_eq!(refs.iter().map(|r| r.number).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_any_in_and_cast() {
        let refs = scan(
            "SELECT id FROM users WHERE id = ANY($1) AND name = $2::text",
            SqlDialect::PostgreSQL,
        );
        assert!(matches!(refs[0].context, RefContext::AnyOf { .. }));
        assert_eq!(refs[1].context, RefContext::Cast(SqlType::Text));

        let refs = scan("SELECT id FROM users WHERE id IN (?)", SqlDialect::MySQL);
        assert!(matches!(refs[0].context, RefContext::InList { .. }));
        let refs = scan("SELECT id FROM users WHERE id IN (?, ?)", SqlDialect::MySQL);
        assert_eq!(refs[1].context, column("id"));
    }

    #[test]
    fn test_update_and_subquery() {
        let refs = scan(
            "UPDATE users SET name = sqlc.arg(new_name) WHERE id IN (SELECT id FROM users WHERE age > sqlc.arg(min_age))",
            SqlDialect::PostgreSQL,
        );
        assert_eq!(
            refs[0].context,
            RefContext::Target {
                table: QualifiedName::new("users"),
                column: "name".to_string()
            }
        );
        assert_eq!(refs[1].context, column("age"));
        assert_eq!(refs[1].number, 2);
    }

    #[test]
    fn test_unique_refs() {
        let refs = scan(
            "SELECT id FROM users WHERE lower($2) = name OR $1 = id OR age = $2",
            SqlDialect::PostgreSQL,
        );
        assert_eq!(refs.len(), 3);
        let unique = unique_param_refs(&refs);
        assert_eq!(unique.iter().map(|r| r.number).collect::<Vec<_>>(), vec![1, 2]);
        // the first $2 sits in a function call; its location is kept
        assert_eq!(unique[1].location, refs[0].location);
        assert!(matches!(unique[1].context, RefContext::FunctionArg { .. }));
    }
}
