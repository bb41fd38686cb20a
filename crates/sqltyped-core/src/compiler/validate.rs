//! Checks that run before any rewriting.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use sqlparser::ast::{visit_expressions, Expr, FunctionArguments, SetExpr, Statement};

use super::placeholder::{Occurrence, PlaceholderKind};
use super::rewrite::helper_call;
use crate::error::CompileError;
use crate::schema::{object_name_to_qualified, Catalog};

/// Reject statements mixing placeholder styles
pub fn param_style(occurrences: &[Occurrence]) -> Result<(), CompileError> {
    let named = occurrences.iter().any(Occurrence::is_named);
    let numbered = occurrences
        .iter()
        .any(|o| matches!(o.kind, PlaceholderKind::Numbered(_)));
    let positional = occurrences
        .iter()
        .any(|o| o.kind == PlaceholderKind::Positional);

    if named && (numbered || positional) {
        return Err(CompileError::Validation(
            "query mixes positional parameters ($1 or ?) and named parameters (sqlc.arg, :name or @name)"
                .to_string(),
        ));
    }
    if numbered && positional {
        return Err(CompileError::Validation(
            "query mixes numbered ($1) and unnumbered (?) parameters".to_string(),
        ));
    }
    Ok(())
}

/// `$N` numbering must not skip an ordinal
pub fn param_ref(occurrences: &[Occurrence]) -> Result<(), CompileError> {
    let numbers: BTreeSet<usize> = occurrences
        .iter()
        .filter_map(|o| match o.kind {
            PlaceholderKind::Numbered(n) => Some(n),
            _ => None,
        })
        .collect();

    if numbers.contains(&0) {
        return Err(CompileError::Validation(
            "there is no parameter $0".to_string(),
        ));
    }
    let max = numbers.last().copied().unwrap_or(0);
    match (1..=max).find(|n| !numbers.contains(n)) {
        Some(missing) => Err(CompileError::Validation(format!(
            "could not determine data type of parameter ${missing}"
        ))),
        None => Ok(()),
    }
}

/// INSERT column lists and VALUES tuples must line up
pub fn insert_stmt(stmt: &Statement) -> Result<(), CompileError> {
    let Statement::Insert(insert) = stmt else {
        return Ok(());
    };
    let Some(SetExpr::Values(values)) = insert.source.as_ref().map(|s| s.body.as_ref()) else {
        return Ok(());
    };

    let first_len = values.rows.first().map(Vec::len).unwrap_or(0);
    if values.rows.iter().any(|row| row.len() != first_len) {
        return Err(CompileError::Validation(
            "VALUES lists must all be the same length".to_string(),
        ));
    }
    if insert.columns.is_empty() {
        return Ok(());
    }
    if first_len > insert.columns.len() {
        return Err(CompileError::Validation(
            "INSERT has more expressions than target columns".to_string(),
        ));
    }
    if first_len < insert.columns.len() {
        return Err(CompileError::Validation(
            "INSERT has more target columns than expressions".to_string(),
        ));
    }
    Ok(())
}

/// `sqlc.*` helpers must be well formed and catalog functions called with an
/// arity one of their overloads accepts
pub fn func_call(stmt: &Statement, catalog: &Catalog) -> Result<(), CompileError> {
    let flow = visit_expressions(stmt, |expr| {
        let Expr::Function(func) = expr else {
            return ControlFlow::Continue(());
        };
        let name = &func.name.0;

        if name.len() == 2 && name[0].value.eq_ignore_ascii_case("sqlc") {
            let helper = name[1].value.to_lowercase();
            if !matches!(helper.as_str(), "arg" | "narg" | "slice") {
                return ControlFlow::Break(CompileError::Validation(format!(
                    "function sqlc.{helper} does not exist"
                )));
            }
            if helper_call(func).is_none() {
                return ControlFlow::Break(CompileError::Validation(format!(
                    "expected 1 identifier or string parameter to sqlc.{helper}"
                )));
            }
            return ControlFlow::Continue(());
        }

        let qualified = object_name_to_qualified(&func.name);
        let overloads = catalog.get_functions(&qualified);
        let count = match &func.args {
            FunctionArguments::List(list) => list.args.len(),
            _ => 0,
        };
        if !overloads.is_empty() && !overloads.iter().any(|f| f.accepts(count)) {
            return ControlFlow::Break(CompileError::Validation(format!(
                "function {qualified} does not accept {count} argument(s)"
            )));
        }
        ControlFlow::Continue(())
    });

    match flow {
        ControlFlow::Break(err) => Err(err),
        ControlFlow::Continue(()) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::placeholder::locate;
    use crate::dialect::SqlDialect;
    use crate::schema::{FunctionArgDef, FunctionDef};
    use crate::types::SqlType;
    use sqlparser::parser::Parser;

    fn parse(sql: &str) -> Statement {
        Parser::parse_sql(SqlDialect::PostgreSQL.parser_dialect().as_ref(), sql)
            .unwrap()
            .remove(0)
    }

    fn occurrences(sql: &str, dialect: SqlDialect) -> Vec<Occurrence> {
        locate(sql, dialect).unwrap()
    }

    #[test]
    fn test_mixed_styles_rejected() {
        let sql = "SELECT * FROM t WHERE a = $1 AND b = sqlc.arg(b)";
        assert!(param_style(&occurrences(sql, SqlDialect::PostgreSQL)).is_err());

        let sql = "SELECT * FROM t WHERE a = ? AND b = :b";
        assert!(param_style(&occurrences(sql, SqlDialect::MySQL)).is_err());

        let sql = "SELECT * FROM t WHERE a = sqlc.arg(a) AND b = @b";
        assert!(param_style(&occurrences(sql, SqlDialect::MySQL)).is_ok());
    }

    #[test]
    fn test_param_gaps() {
        let ok = occurrences("SELECT $2, $1, $2", SqlDialect::PostgreSQL);
        assert!(param_ref(&ok).is_ok());

        let gap = occurrences("SELECT $1, $3", SqlDialect::PostgreSQL);
        assert_eq!(
            param_ref(&gap).unwrap_err().to_string(),
            "could not determine data type of parameter $2"
        );
    }

    #[test]
    fn test_insert_shape() {
        assert!(insert_stmt(&parse("INSERT INTO t (a, b) VALUES ($1, $2), ($3, $4)")).is_ok());
        assert!(insert_stmt(&parse("INSERT INTO t VALUES ($1, $2, $3)")).is_ok());
        assert!(insert_stmt(&parse("INSERT INTO t (a, b) VALUES ($1)")).is_err());
        assert!(insert_stmt(&parse("INSERT INTO t (a) VALUES ($1, $2)")).is_err());
        assert!(insert_stmt(&parse("INSERT INTO t (a) VALUES ($1), ($2, $3)")).is_err());
    }

    #[test]
    fn test_func_calls() {
        let mut catalog = Catalog::new();
        catalog.add_function(
            None,
            FunctionDef {
                name: "add_one".to_string(),
                args: vec![FunctionArgDef {
                    name: Some("x".to_string()),
                    data_type: SqlType::Integer,
                    has_default: false,
                }],
                return_type: SqlType::Integer,
                return_not_null: true,
            },
        );

        assert!(func_call(&parse("SELECT add_one($1)"), &catalog).is_ok());
        assert!(func_call(&parse("SELECT add_one($1, $2)"), &catalog).is_err());
        assert!(func_call(&parse("SELECT lower($1)"), &catalog).is_ok());
        assert!(func_call(&parse("SELECT sqlc.arg(a)"), &catalog).is_ok());
        assert!(func_call(&parse("SELECT sqlc.argh(a)"), &catalog).is_err());
        assert!(func_call(&parse("SELECT sqlc.arg(a, b)"), &catalog).is_err());
    }
}
