use super::CompiledQuery;
use crate::value::ScalarValue;
use std::fmt::Write;

#[derive(Debug, Clone)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A parameter-safe SQL builder.
///
/// Raw text and bound values are stored separately; `$1, $2, ...` are only
/// produced when the statement is rendered, so callers never number
/// placeholders by hand.
#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    parts: Vec<SqlPart>,
    args: Vec<ScalarValue>,
}

impl SqlBuilder {
    /// Create a builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            args: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<ScalarValue>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.args.push(value.into());
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// An empty list appends `NULL`, so `IN (NULL)` stays valid SQL.
    pub fn push_bind_list<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<ScalarValue>,
    {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append another builder, consuming it. Its placeholders are renumbered.
    pub fn push_sql(&mut self, mut other: SqlBuilder) -> &mut Self {
        self.parts.append(&mut other.parts);
        self.args.append(&mut other.args);
        self
    }

    pub fn placeholder_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count()
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${idx}");
                }
            }
        }
        out
    }

    pub fn args(&self) -> &[ScalarValue] {
        &self.args
    }

    pub fn finish(self) -> CompiledQuery {
        CompiledQuery {
            sql: self.to_sql(),
            args: self.args,
        }
    }
}
