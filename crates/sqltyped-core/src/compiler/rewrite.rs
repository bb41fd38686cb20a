//! Named-parameter rewriting.
//!
//! Named placeholders (`sqlc.arg(x)`, `:x`, `@x`) receive ordinals in order of
//! first appearance; a name used again reuses its ordinal. The AST is rewritten
//! to `$N` placeholders and a matching edit list reproduces the change in the
//! statement text.

use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

use sqlparser::ast::{
    visit_expressions_mut, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Statement,
    UnaryOperator, Value,
};

use super::placeholder::{NamedForm, Occurrence, PlaceholderKind};
use crate::source::Edit;

/// What a named placeholder asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedParam {
    pub name: String,
    /// `sqlc.narg`
    pub nullable: bool,
    /// `sqlc.slice`
    pub slice: bool,
}

#[derive(Debug, Default)]
pub struct Rewrite {
    /// Ordinal of each occurrence, parallel to the occurrence list
    pub ordinals: Vec<usize>,
    /// Ordinal -> named parameter
    pub named: BTreeMap<usize, NamedParam>,
    pub edits: Vec<Edit>,
}

/// Assign ordinals to every occurrence and rewrite named placeholders in
/// `stmt` to their `$N` form.
pub fn named_parameters(stmt: &mut Statement, occurrences: &[Occurrence]) -> Rewrite {
    let mut rewrite = Rewrite::default();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut positional = 0;

    for occurrence in occurrences {
        let ordinal = match &occurrence.kind {
            PlaceholderKind::Numbered(n) => *n,
            PlaceholderKind::Positional => {
                positional += 1;
                positional
            }
            PlaceholderKind::Named { name, form } => {
                let next = by_name.len() + 1;
                let ordinal = *by_name.entry(name.clone()).or_insert(next);
                let entry = rewrite.named.entry(ordinal).or_insert_with(|| NamedParam {
                    name: name.clone(),
                    nullable: false,
                    slice: false,
                });
                entry.nullable |= *form == NamedForm::NullableArg;
                entry.slice |= *form == NamedForm::Slice;

                rewrite
                    .edits
                    .push(Edit::new(occurrence.location, &occurrence.text, format!("${ordinal}")));
                ordinal
            }
        };
        rewrite.ordinals.push(ordinal);
    }

    if !by_name.is_empty() {
        let _ = visit_expressions_mut(stmt, |expr| {
            if let Some(name) = placeholder_name(expr) {
                if let Some(ordinal) = by_name.get(&name) {
                    *expr = Expr::Value(Value::Placeholder(format!("${ordinal}")));
                }
            }
            ControlFlow::<()>::Continue(())
        });
    }

    tracing::trace!(named = by_name.len(), edits = rewrite.edits.len(), "named parameters");
    rewrite
}

/// Edits turning every placeholder into a bare `?`
pub fn numbered_parameters(occurrences: &[Occurrence]) -> Vec<Edit> {
    occurrences
        .iter()
        .filter(|o| o.text != "?")
        .map(|o| Edit::new(o.location, &o.text, "?"))
        .collect()
}

/// The parameter name of a named placeholder expression
pub(crate) fn placeholder_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::Placeholder(p)) => p
            .strip_prefix(':')
            .or_else(|| p.strip_prefix('@'))
            .map(str::to_string),
        // PostgreSQL parses `@name` as the absolute-value operator
        Expr::UnaryOp {
            op: UnaryOperator::PGAbs,
            expr,
        } => match expr.as_ref() {
            Expr::Identifier(ident) if ident.quote_style.is_none() => Some(ident.value.clone()),
            _ => None,
        },
        // MySQL parses `@name` as a user variable identifier
        Expr::Identifier(ident) if ident.quote_style.is_none() => ident
            .value
            .strip_prefix('@')
            .filter(|v| !v.is_empty() && !v.starts_with('@'))
            .map(str::to_string),
        Expr::Function(func) => helper_call(func).map(|(name, _)| name),
        _ => None,
    }
}

/// Name and form of a `sqlc.arg(x)` style call
pub(crate) fn helper_call(func: &sqlparser::ast::Function) -> Option<(String, NamedForm)> {
    let [namespace, helper] = func.name.0.as_slice() else {
        return None;
    };
    if !namespace.value.eq_ignore_ascii_case("sqlc") {
        return None;
    }
    let form = NamedForm::from_helper(&helper.value)?;
    let FunctionArguments::List(list) = &func.args else {
        return None;
    };
    let [FunctionArg::Unnamed(FunctionArgExpr::Expr(arg))] = list.args.as_slice() else {
        return None;
    };
    let name = match arg {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::Value(Value::SingleQuotedString(s)) => s.clone(),
        _ => return None,
    };
    Some((name, form))
}
