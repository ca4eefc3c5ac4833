//! SQL compilation.
//!
//! Turns a [`QuerySpec`] into a parameterized SELECT or COUNT statement.
//! Values are always bound; identifiers (table and columns) are written into
//! the text and must already have been vetted, the table by the allow-list
//! and the columns by the classifier.
//!
//! Placeholders are numbered globally in this order: equality filters, LIKE
//! filters, IN filters, IN-or-NULL filters, then `LIMIT` and `OFFSET`.

mod builder;


pub use builder::SqlBuilder;

use crate::classify::{Filter, QuerySpec};
use crate::value::ScalarValue;
use serde::Serialize;
use tokio_postgres::types::ToSql;

/// SQL text plus the arguments for its `$n` placeholders, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub args: Vec<ScalarValue>,
}

impl CompiledQuery {
    /// Number of distinct `$n` placeholders in `sql`.
    pub fn placeholder_count(&self) -> usize {
        placeholder_numbers(&self.sql).len()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|a| a as &(dyn ToSql + Sync)).collect()
    }
}

/// Compile the row-returning form.
pub fn compile_select(spec: &QuerySpec, table: &str) -> CompiledQuery {
    let mut q = SqlBuilder::new("SELECT ");
    if spec.distinct.is_some() {
        q.push("DISTINCT ");
    }
    match &spec.projection {
        Some(projection) if !projection.columns.is_empty() => {
            q.push(&projection.columns.join(", "));
        }
        _ => {
            q.push("*");
        }
    }
    q.push(" FROM ").push(table);

    push_where(&mut q, &spec.filters);

    if !spec.order_by.is_empty() {
        let order = spec
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        q.push(" ORDER BY ").push(&order);
    }
    if let Some(limit) = spec.limit {
        q.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = spec.offset {
        q.push(" OFFSET ").push_bind(offset);
    }

    q.finish()
}

/// Compile the counting form. Ordering and pagination do not apply.
pub fn compile_count(spec: &QuerySpec, table: &str) -> CompiledQuery {
    let mut q = SqlBuilder::new("SELECT ");
    match spec.distinct.as_ref().and_then(|d| d.column()) {
        Some(column) => q.push("COUNT(DISTINCT ").push(column).push(")"),
        None => q.push("COUNT(*)"),
    };
    q.push(" FROM ").push(table);

    push_where(&mut q, &spec.filters);

    q.finish()
}

fn push_where(q: &mut SqlBuilder, filters: &[Filter]) {
    if filters.is_empty() {
        return;
    }

    // Stable sort keeps filter order inside each category.
    let mut ordered: Vec<&Filter> = filters.iter().collect();
    ordered.sort_by_key(|f| f.category());

    q.push(" WHERE ");
    for (i, filter) in ordered.into_iter().enumerate() {
        if i > 0 {
            q.push(" AND ");
        }
        push_filter(q, filter);
    }
}

fn push_filter(q: &mut SqlBuilder, filter: &Filter) {
    match filter {
        Filter::Eq { column, value } => {
            q.push(column).push(" = ").push_bind(value.clone());
        }
        Filter::Like { column, pattern } => {
            q.push(column)
                .push(" LIKE ")
                .push_bind(format!("%{pattern}%"));
        }
        Filter::In { column, values } => {
            q.push(column).push(" IN (");
            q.push_bind_list(values.iter().cloned()).push(")");
        }
        Filter::InOrNull { column, values } if values.is_empty() => {
            q.push(column).push(" IS NULL");
        }
        Filter::InOrNull { column, values } => {
            q.push("(").push(column).push(" IN (");
            q.push_bind_list(values.iter().cloned());
            q.push(") OR ").push(column).push(" IS NULL)");
        }
    }
}

/// The `$n` numbers that occur in `sql`, sorted and deduplicated.
///
/// Only used to check compiled statements, which never contain quoted
/// literals, so a plain scan is enough.
pub(crate) fn placeholder_numbers(sql: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if let Ok(n) = sql[start..end].parse::<usize>() {
                out.push(n);
            }
            i = end.max(start);
        } else {
            i += 1;
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}
