//! Parameter classification.
//!
//! Turns the flat [`QueryParams`] map into a [`QuerySpec`]. Each key lands in
//! exactly one place, checked in this order:
//!
//! 1. `table->attribute` keys become join groups.
//! 2. Control keywords (`_limit`, `_offset`, `_cmp`, `_scmp`, `_orderby`,
//!    `_ordertype`, `_distinct`, `_cache`) are consumed.
//! 3. `_lk<pattern>_lk` values become LIKE filters.
//! 4. Comma-separated values become IN filters, or IN-or-NULL filters when
//!    one member is `_null`.
//! 5. Everything else is an equality filter.
//!
//! Classification never fails. Input that cannot be used is dropped and
//! listed in [`Classified::ignored`].
//!
//! # Example
//! ```ignore
//! let params = QueryParams::parse("status=1,2,_null&name=_lkjoh_lk&_limit=10");
//! let classified = tablegate::classify(&params);
//! assert_eq!(classified.spec.limit, Some(10));
//! ```

mod model;


pub use model::{
    Classified, Distinct, Filter, IgnoreReason, Ignored, OrderBy, Projection, QuerySpec,
    SortDirection,
};

use crate::ident::is_valid_ident;
use crate::params::QueryParams;
use crate::value::ScalarValue;

pub const OFFSET_KEY: &str = "_offset";
pub const LIMIT_KEY: &str = "_limit";
pub const PROJECTION_KEY: &str = "_cmp";
pub const STRICT_PROJECTION_KEY: &str = "_scmp";
pub const ORDER_BY_KEY: &str = "_orderby";
pub const ORDER_TYPE_KEY: &str = "_ordertype";
pub const DISTINCT_KEY: &str = "_distinct";
pub const CACHE_KEY: &str = "_cache";

/// Marker wrapped around a LIKE pattern: `_lkfoo_lk`.
pub const LIKE_MARKER: &str = "_lk";
/// Comma-list member that adds `OR column IS NULL`.
pub const NULL_TOKEN: &str = "_null";
/// Separator between join name and attribute in a key.
pub const JOIN_SEPARATOR: &str = "->";
/// Column that is never projected.
pub const PASSWORD_COLUMN: &str = "password";

/// Classify a parameter map.
///
/// Control keywords are matched before the LIKE and comma rules, so
/// `_cmp=id,name` is a projection and never an IN filter.
pub fn classify(params: &QueryParams) -> Classified {
    let mut out = Classified::default();
    let mut loose: Option<Vec<String>> = None;
    let mut strict: Option<Vec<String>> = None;

    for (key, value) in params.iter() {
        if let Some((join, attribute)) = key.split_once(JOIN_SEPARATOR) {
            if join.is_empty() || attribute.is_empty() {
                out.ignored.push(Ignored::new(key, IgnoreReason::InvalidJoinPath));
                continue;
            }
            out.spec
                .joins
                .entry(join.to_string())
                .or_default()
                .insert(attribute.to_string(), value.to_string());
            out.ignored.push(Ignored::new(key, IgnoreReason::JoinNotCompiled));
            continue;
        }

        match key {
            OFFSET_KEY => out.spec.offset = parse_pagination(key, value, &mut out.ignored),
            LIMIT_KEY => out.spec.limit = parse_pagination(key, value, &mut out.ignored),
            PROJECTION_KEY => loose = Some(projection_columns(key, value, &mut out.ignored)),
            STRICT_PROJECTION_KEY => {
                strict = Some(projection_columns(key, value, &mut out.ignored));
            }
            DISTINCT_KEY => out.spec.distinct = Some(Distinct(value.to_string())),
            // Ordering is resolved as a pair below; `_cache` has no effect.
            ORDER_BY_KEY | ORDER_TYPE_KEY | CACHE_KEY => {}
            _ => match classify_filter(key, value) {
                Some(filter) => out.spec.filters.push(filter),
                None => out.ignored.push(Ignored::new(key, IgnoreReason::InvalidIdentifier)),
            },
        }
    }

    out.spec.order_by = ordering(params, &mut out.ignored).into_iter().collect();
    out.spec.projection = match (strict, loose) {
        (Some(columns), _) if !columns.is_empty() => Some(Projection {
            columns,
            strict: true,
        }),
        (_, Some(columns)) if !columns.is_empty() => Some(Projection {
            columns,
            strict: false,
        }),
        _ => None,
    };

    out
}

/// Classify a non-keyword parameter as a filter.
///
/// Returns `None` when `key` cannot be used as a column name.
pub fn classify_filter(key: &str, value: &str) -> Option<Filter> {
    if !is_valid_ident(key) {
        return None;
    }
    let column = key.to_string();

    if let Some(pattern) = like_pattern(value) {
        return Some(Filter::Like {
            column,
            pattern: pattern.to_string(),
        });
    }

    if value.contains(',') {
        let mut has_null = false;
        let mut values = Vec::new();
        for part in value.split(',').map(str::trim) {
            if part == NULL_TOKEN {
                has_null = true;
            } else {
                values.push(ScalarValue::number_or_text(part));
            }
        }
        return Some(if has_null {
            Filter::InOrNull { column, values }
        } else {
            Filter::In { column, values }
        });
    }

    Some(Filter::Eq {
        column,
        value: ScalarValue::Text(value.to_string()),
    })
}

/// The interior of a `_lk..._lk` value. A lone `_lk` is an empty pattern.
fn like_pattern(value: &str) -> Option<&str> {
    if value == LIKE_MARKER {
        return Some("");
    }
    value
        .strip_prefix(LIKE_MARKER)
        .and_then(|rest| rest.strip_suffix(LIKE_MARKER))
}

fn parse_pagination(key: &str, value: &str, ignored: &mut Vec<Ignored>) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Some(n),
        Ok(_) => {
            ignored.push(Ignored::new(key, IgnoreReason::NegativeInteger));
            None
        }
        Err(_) => {
            ignored.push(Ignored::new(key, IgnoreReason::InvalidInteger));
            None
        }
    }
}

fn projection_columns(key: &str, value: &str, ignored: &mut Vec<Ignored>) -> Vec<String> {
    let mut columns = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if names_password(part) {
            ignored.push(Ignored::new(key, IgnoreReason::PasswordColumn));
        } else if !is_valid_ident(part) {
            ignored.push(Ignored::new(
                format!("{key}={part}"),
                IgnoreReason::InvalidIdentifier,
            ));
        } else if !columns.iter().any(|c| c == part) {
            columns.push(part.to_string());
        }
    }
    columns
}

/// Whether a possibly qualified column name (`users.password`) is the
/// password column.
fn names_password(column: &str) -> bool {
    column
        .rsplit('.')
        .next()
        .is_some_and(|last| last.eq_ignore_ascii_case(PASSWORD_COLUMN))
}

fn ordering(params: &QueryParams, ignored: &mut Vec<Ignored>) -> Option<OrderBy> {
    match (params.get(ORDER_BY_KEY), params.get(ORDER_TYPE_KEY)) {
        (Some(column), Some(direction)) => {
            let column = column.trim();
            if !is_valid_ident(column) {
                ignored.push(Ignored::new(ORDER_BY_KEY, IgnoreReason::InvalidIdentifier));
                return None;
            }
            let Some(direction) = SortDirection::parse(direction) else {
                ignored.push(Ignored::new(ORDER_TYPE_KEY, IgnoreReason::InvalidDirection));
                return None;
            };
            Some(OrderBy {
                column: column.to_string(),
                direction,
            })
        }
        (Some(_), None) => {
            ignored.push(Ignored::new(ORDER_BY_KEY, IgnoreReason::IncompleteOrdering));
            None
        }
        (None, Some(_)) => {
            ignored.push(Ignored::new(ORDER_TYPE_KEY, IgnoreReason::IncompleteOrdering));
            None
        }
        (None, None) => None,
    }
}
