use crate::value::ScalarValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single column-scoped WHERE condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: ScalarValue },
    /// `column LIKE '%pattern%'`
    Like { column: String, pattern: String },
    /// `column IN (values...)`, never empty.
    In {
        column: String,
        values: Vec<ScalarValue>,
    },
    /// `(column IN (values...) OR column IS NULL)`.
    ///
    /// `values` may be empty when the list held only `_null`; that compiles
    /// to `column IS NULL`.
    InOrNull {
        column: String,
        values: Vec<ScalarValue>,
    },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. }
            | Filter::Like { column, .. }
            | Filter::In { column, .. }
            | Filter::InOrNull { column, .. } => column,
        }
    }

    /// Emission rank: equality, LIKE, IN, IN-or-NULL.
    pub(crate) fn category(&self) -> u8 {
        match self {
            Filter::Eq { .. } => 0,
            Filter::Like { .. } => 1,
            Filter::In { .. } => 2,
            Filter::InOrNull { .. } => 3,
        }
    }
}

/// Columns requested via `_cmp` (loose) or `_scmp` (strict).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub columns: Vec<String>,
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction, ignoring ASCII case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// The raw `_distinct` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Distinct(pub String);

impl Distinct {
    const FLAGS: [&'static str; 9] = ["", "true", "false", "1", "0", "yes", "no", "on", "off"];

    /// The column to count distinct values of, if the marker names one.
    ///
    /// Boolean-like markers (`true`, `1`, empty, ...) and anything that is
    /// not a valid identifier yield `None`.
    pub fn column(&self) -> Option<&str> {
        let raw = self.0.trim();
        if Self::FLAGS.iter().any(|f| f.eq_ignore_ascii_case(raw)) {
            return None;
        }
        crate::ident::is_valid_ident(raw).then_some(raw)
    }
}

/// The structured form of one request's parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuerySpec {
    /// WHERE conditions, in parameter-key order.
    pub filters: Vec<Filter>,
    /// `table->attribute` parameters: join → attribute → value. Not compiled.
    pub joins: BTreeMap<String, BTreeMap<String, String>>,
    pub projection: Option<Projection>,
    pub order_by: Vec<OrderBy>,
    pub distinct: Option<Distinct>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self, column: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.column() == column)
    }

    /// Whether the compiled statement will carry a WHERE clause.
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    // Consuming setters for building a query by hand.

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn like(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::Like {
            column: column.into(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn in_list(mut self, column: impl Into<String>, values: Vec<ScalarValue>) -> Self {
        self.filters.push(Filter::In {
            column: column.into(),
            values,
        });
        self
    }

    pub fn in_or_null(mut self, column: impl Into<String>, values: Vec<ScalarValue>) -> Self {
        self.filters.push(Filter::InOrNull {
            column: column.into(),
            values,
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }
}

/// Why a parameter was dropped instead of classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// `_limit` / `_offset` is not an integer.
    InvalidInteger,
    /// `_limit` / `_offset` is negative.
    NegativeInteger,
    /// A column name that cannot be written into SQL text.
    InvalidIdentifier,
    /// `password` was requested in a projection.
    PasswordColumn,
    /// `_orderby` without `_ordertype`, or the reverse.
    IncompleteOrdering,
    /// `_ordertype` is neither ASC nor DESC.
    InvalidDirection,
    /// `->` key with an empty side.
    InvalidJoinPath,
    /// Join parameter accepted but not turned into SQL.
    JoinNotCompiled,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidInteger => "not an integer",
            Self::NegativeInteger => "negative integer",
            Self::InvalidIdentifier => "invalid identifier",
            Self::PasswordColumn => "password column is never projected",
            Self::IncompleteOrdering => "_orderby and _ordertype must be given together",
            Self::InvalidDirection => "direction must be ASC or DESC",
            Self::InvalidJoinPath => "invalid join path",
            Self::JoinNotCompiled => "join parameters are not compiled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ignored {
    /// Parameter key, or `key=part` for a rejected list member.
    pub key: String,
    pub reason: IgnoreReason,
}

impl Ignored {
    pub fn new(key: impl Into<String>, reason: IgnoreReason) -> Self {
        Self {
            key: key.into(),
            reason,
        }
    }
}

/// Classifier output: the query plus every parameter that was dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classified {
    pub spec: QuerySpec,
    pub ignored: Vec<Ignored>,
}

impl Classified {
    pub fn ignored_because(&self, reason: IgnoreReason) -> impl Iterator<Item = &Ignored> {
        self.ignored.iter().filter(move |i| i.reason == reason)
    }
}
