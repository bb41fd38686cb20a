//! Wildcard expansion.
//!
//! `*` and `t.*` in a statement's own select list or RETURNING clause are
//! replaced in the stored SQL by the columns they resolve to, so the query
//! keeps returning the same columns after a table gains new ones.

use std::collections::HashMap;

use sqlparser::ast::{ObjectName, SelectItem, SetExpr, Statement, WildcardAdditionalOptions};
use sqlparser::tokenizer::Span;

use super::output::{delete_tables, Frame, QueryCatalog, Scope, Table};
use super::placeholder::byte_offset;
use crate::dialect::SqlDialect;
use crate::error::CompileError;
use crate::source::{Edit, LineIndex};

/// Edits replacing each top-level wildcard of `stmt` with its column list.
///
/// `text` is the statement text `stmt` was parsed from. Wildcards inside
/// subqueries and CTE bodies are left alone.
pub fn wildcard_edits(
    text: &str,
    stmt: &Statement,
    qc: &QueryCatalog<'_>,
    dialect: SqlDialect,
) -> Result<Vec<Edit>, CompileError> {
    let mut expander = Expander {
        text,
        index: LineIndex::new(text),
        dialect,
        edits: Vec::new(),
    };

    match stmt {
        Statement::Query(query) => {
            let qc = qc.with_ctes(query.with.as_ref(), &Scope::default())?;
            expander.set_expr(&qc, &query.body)?;
        }
        Statement::Insert(insert) => {
            if let Some(returning) = &insert.returning {
                let table = qc.relation(&insert.table_name, None)?;
                expander.items(returning, &Frame::single(table))?;
            }
        }
        Statement::Update {
            table,
            from,
            returning: Some(returning),
            ..
        } => {
            let frame = qc.from_clause(std::iter::once(table).chain(from), &Scope::default())?;
            expander.items(returning, &frame)?;
        }
        Statement::Delete(delete) => {
            if let Some(returning) = &delete.returning {
                let frame = qc.from_clause(delete_tables(delete), &Scope::default())?;
                expander.items(returning, &frame)?;
            }
        }
        _ => {}
    }

    Ok(expander.edits)
}

struct Expander<'t> {
    text: &'t str,
    index: LineIndex<'t>,
    dialect: SqlDialect,
    edits: Vec<Edit>,
}

impl Expander<'_> {
    fn set_expr(&mut self, qc: &QueryCatalog<'_>, body: &SetExpr) -> Result<(), CompileError> {
        match body {
            SetExpr::Select(select) => {
                let frame = qc.from_clause(&select.from, &Scope::default())?;
                self.items(&select.projection, &frame)
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(qc, left)?;
                self.set_expr(qc, right)
            }
            _ => Ok(()),
        }
    }

    fn items(&mut self, items: &[SelectItem], frame: &Frame) -> Result<(), CompileError> {
        for item in items {
            match item {
                SelectItem::Wildcard(options) if is_plain(options) => {
                    let columns = self.unqualified(frame);
                    self.replace(options.wildcard_token.0.span, columns)?;
                }
                SelectItem::QualifiedWildcard(name, options) if is_plain(options) => {
                    let Some(first) = name.0.first() else {
                        continue;
                    };
                    let qualifier = name.0.last().map(|i| i.value.as_str()).unwrap_or_default();
                    let Some(table) = frame.tables.iter().find(|t| t.matches(qualifier)) else {
                        return Err(CompileError::TableNotFound(qualifier.to_string()));
                    };
                    let columns = self.qualified(name, table);
                    let span = Span::new(first.span.start, options.wildcard_token.0.span.end);
                    self.replace(span, columns)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Columns of every range variable; names seen in more than one are qualified
    fn unqualified(&self, frame: &Frame) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for column in frame.tables.iter().flat_map(|t| &t.columns) {
            *counts.entry(column.name.to_lowercase()).or_default() += 1;
        }

        let mut columns = Vec::new();
        for table in &frame.tables {
            let qualifier = table.alias.as_deref().unwrap_or(&table.name);
            for column in &table.columns {
                let name = self.dialect.quote_identifier(&column.name);
                if counts[&column.name.to_lowercase()] > 1 && !qualifier.is_empty() {
                    columns.push(format!("{}.{}", self.dialect.quote_identifier(qualifier), name));
                } else {
                    columns.push(name);
                }
            }
        }
        columns
    }

    fn qualified(&self, name: &ObjectName, table: &Table) -> Vec<String> {
        table
            .columns
            .iter()
            .map(|c| format!("{}.{}", name, self.dialect.quote_identifier(&c.name)))
            .collect()
    }

    fn replace(&mut self, span: Span, columns: Vec<String>) -> Result<(), CompileError> {
        // line 0 marks a node the parser did not place
        if columns.is_empty() || span.start.line == 0 {
            return Ok(());
        }
        let start = byte_offset(&self.index, span.start)?;
        let end = byte_offset(&self.index, span.end)?;
        let old = self.text.get(start..end).ok_or_else(|| {
            CompileError::InvalidRewrite(format!("wildcard span {start}..{end} is outside the statement"))
        })?;
        tracing::trace!(wildcard = old, columns = columns.len(), "expanding wildcard");
        self.edits.push(Edit::new(start, old, columns.join(", ")));
        Ok(())
    }
}

/// A bare wildcard, without EXCLUDE, EXCEPT, REPLACE and similar modifiers
fn is_plain(options: &WildcardAdditionalOptions) -> bool {
    options.opt_ilike.is_none()
        && options.opt_exclude.is_none()
        && options.opt_except.is_none()
        && options.opt_replace.is_none()
        && options.opt_rename.is_none()
}
