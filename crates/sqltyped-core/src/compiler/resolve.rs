//! Catalog reference resolution for parameters.

use std::collections::BTreeMap;

use sqlparser::ast::{SetExpr, Statement};

use super::output::QueryCatalog;
use super::params::{unique_param_refs, ParamRef, RefContext};
use super::query::{Column, InsertValues, Parameter};
use super::rewrite::NamedParam;
use crate::error::CompileError;
use crate::schema::{Catalog, QualifiedName};
use crate::types::SqlType;

/// Type every reference, in the order given
pub fn resolve_params(
    refs: &[ParamRef],
    named: &BTreeMap<usize, NamedParam>,
    qc: &QueryCatalog<'_>,
) -> Result<Vec<Parameter>, CompileError> {
    refs.iter()
        .map(|r| resolve_param(r, named.get(&r.number), qc.catalog()))
        .collect()
}

fn resolve_param(
    r: &ParamRef,
    named: Option<&NamedParam>,
    catalog: &Catalog,
) -> Result<Parameter, CompileError> {
    let mut column = match &r.context {
        RefContext::Column { qualifier, name } => compared(r.scope.lookup(qualifier.as_deref(), name)?),
        RefContext::AnyOf { qualifier, name } => Column {
            is_array: true,
            ..compared(r.scope.lookup(qualifier.as_deref(), name)?)
        },
        RefContext::InList { qualifier, name } => Column {
            is_slice: true,
            ..compared(r.scope.lookup(qualifier.as_deref(), name)?)
        },
        RefContext::Target { table, column } => target_column(catalog, table, column)?,
        RefContext::FunctionArg {
            function,
            index,
            count,
        } => function_arg(catalog, function, *index, *count),
        RefContext::Cast(data_type) => Column::typed("", data_type, true),
        RefContext::Limit => Column::typed("limit", &SqlType::BigInt, true),
        RefContext::Offset => Column::typed("offset", &SqlType::BigInt, true),
        RefContext::Unknown => match named.and_then(|n| r.scope.unique(&n.name)) {
            Some(column) => column,
            None => {
                let name = named
                    .map(|n| n.name.clone())
                    .unwrap_or_else(|| format!("${}", r.number));
                return Err(CompileError::column_not_found(name));
            }
        },
    };

    if let Some(named) = named {
        column.name = named.name.clone();
        if named.nullable {
            column.not_null = false;
        }
        if named.slice {
            column.is_slice = true;
        }
    }

    Ok(Parameter {
        number: r.number,
        column,
        location: r.location,
    })
}

/// A value compared against a column can never usefully be NULL
fn compared(column: Column) -> Column {
    Column {
        not_null: true,
        ..column
    }
}

fn target_column(catalog: &Catalog, table: &QualifiedName, column: &str) -> Result<Column, CompileError> {
    let def = catalog
        .get_table(table)
        .ok_or_else(|| CompileError::TableNotFound(table.to_string()))?;
    let col = def
        .get_column(column)
        .ok_or_else(|| CompileError::column_not_found_in(&table.name, column))?;
    Ok(Column::from_def(catalog, def, col))
}

fn function_arg(catalog: &Catalog, function: &QualifiedName, index: usize, count: usize) -> Column {
    let arg = catalog
        .get_functions(function)
        .into_iter()
        .find(|f| f.accepts(count))
        .and_then(|f| f.args.get(index));
    match arg {
        Some(arg) => Column::typed(arg.name.clone().unwrap_or_default(), &arg.data_type, true),
        None => Column::any(""),
    }
}

/// Parameters of the first VALUES tuple of an INSERT, with the tuple length
pub fn insert_values(
    stmt: &Statement,
    refs: &[ParamRef],
    named: &BTreeMap<usize, NamedParam>,
    qc: &QueryCatalog<'_>,
) -> Result<Option<InsertValues>, CompileError> {
    let Statement::Insert(insert) = stmt else {
        return Ok(None);
    };
    let Some(SetExpr::Values(values)) = insert.source.as_ref().map(|s| s.body.as_ref()) else {
        return Ok(None);
    };
    let len = values.rows.first().map(Vec::len).unwrap_or(0);

    let first_row: Vec<ParamRef> = refs
        .iter()
        .filter(|r| r.values_row == Some(0))
        .cloned()
        .collect();
    let params = resolve_params(&unique_param_refs(&first_row), named, qc)?;
    Ok(Some(InsertValues { params, len }))
}

/// Every omitted column must be the column of some parameter
pub fn validate_omits(omits: &[String], params: &[Parameter]) -> Result<(), CompileError> {
    let missing: Vec<&str> = omits
        .iter()
        .filter(|omit| !params.iter().any(|p| &p.column.name == *omit))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CompileError::column_not_found(missing.join(",")))
    }
}
