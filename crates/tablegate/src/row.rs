//! Row shaping: database rows to JSON objects.

use crate::classify::PASSWORD_COLUMN;
use crate::error::{GateError, GateResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::net::IpAddr;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};

/// A shaped row: column name → JSON value.
pub type JsonRow = Map<String, Value>;

/// Whether a column is dropped from every shaped row.
pub fn is_hidden_column(name: &str) -> bool {
    name.eq_ignore_ascii_case(PASSWORD_COLUMN)
}

/// Convert a row into a JSON object, omitting hidden columns.
///
/// SQL `NULL` becomes JSON `null`. Enum columns become their label, and
/// one-dimensional arrays of the mapped types become JSON arrays. Other
/// text-like types go through their text form. Any other column type is a
/// [`GateError::Decode`].
pub fn row_to_json(row: &Row) -> GateResult<JsonRow> {
    let mut out = Map::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        if is_hidden_column(name) {
            continue;
        }
        let value = column_value(row, idx, name, column.type_())?;
        out.insert(name.to_string(), value);
    }
    Ok(out)
}

/// Shape every row, stopping at the first decode failure.
pub fn rows_to_json(rows: &[Row]) -> GateResult<Vec<JsonRow>> {
    rows.iter().map(row_to_json).collect()
}

/// The label of a value of any enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EnumLabel(String);

impl<'a> FromSql<'a> for EnumLabel {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let label = <&str as FromSql>::from_sql(ty, raw)?;
        Ok(Self(label.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> GateResult<Option<T>>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| GateError::decode(name, e.to_string()))
}

fn scalar<'a, T, F>(row: &'a Row, idx: usize, name: &str, to_json: F) -> GateResult<Option<Value>>
where
    T: FromSql<'a>,
    F: Fn(T) -> Value,
{
    Ok(get::<T>(row, idx, name)?.map(to_json))
}

fn array<'a, T, F>(row: &'a Row, idx: usize, name: &str, to_json: F) -> GateResult<Option<Value>>
where
    T: FromSql<'a>,
    F: Fn(T) -> Value,
{
    Ok(get::<Vec<Option<T>>>(row, idx, name)?.map(|items| {
        Value::Array(
            items
                .into_iter()
                .map(|item| item.map(&to_json).unwrap_or(Value::Null))
                .collect(),
        )
    }))
}

fn column_value(row: &Row, idx: usize, name: &str, ty: &Type) -> GateResult<Value> {
    let value = match ty.kind() {
        Kind::Enum(_) => scalar(row, idx, name, enum_to_json)?,
        Kind::Array(member) => array_value(row, idx, name, ty, member)?,
        _ => scalar_value(row, idx, name, ty)?,
    };
    Ok(value.unwrap_or(Value::Null))
}

fn scalar_value(row: &Row, idx: usize, name: &str, ty: &Type) -> GateResult<Option<Value>> {
    match *ty {
        Type::BOOL => scalar(row, idx, name, Value::Bool),
        Type::INT2 => scalar::<i16, _>(row, idx, name, Value::from),
        Type::INT4 => scalar::<i32, _>(row, idx, name, Value::from),
        Type::INT8 => scalar::<i64, _>(row, idx, name, Value::from),
        Type::OID => scalar::<u32, _>(row, idx, name, Value::from),
        Type::FLOAT4 => scalar(row, idx, name, |f: f32| float_to_json(f64::from(f))),
        Type::FLOAT8 => scalar(row, idx, name, float_to_json),
        Type::NUMERIC => scalar(row, idx, name, decimal_to_json),
        Type::UUID => scalar(row, idx, name, |u: uuid::Uuid| Value::String(u.to_string())),
        Type::DATE => scalar(row, idx, name, date_to_json),
        Type::TIME => scalar(row, idx, name, time_to_json),
        Type::TIMESTAMP => scalar(row, idx, name, timestamp_to_json),
        Type::TIMESTAMPTZ => scalar(row, idx, name, |ts: DateTime<Utc>| {
            Value::String(ts.to_rfc3339())
        }),
        Type::JSON | Type::JSONB => get::<Value>(row, idx, name),
        Type::INET => scalar(row, idx, name, |ip: IpAddr| Value::String(ip.to_string())),
        _ if <String as FromSql>::accepts(ty) => scalar(row, idx, name, Value::String),
        _ => Err(unsupported(name, ty)),
    }
}

fn array_value(
    row: &Row,
    idx: usize,
    name: &str,
    ty: &Type,
    member: &Type,
) -> GateResult<Option<Value>> {
    if let Kind::Enum(_) = member.kind() {
        return array(row, idx, name, enum_to_json);
    }
    match *member {
        Type::BOOL => array(row, idx, name, Value::Bool),
        Type::INT2 => array::<i16, _>(row, idx, name, Value::from),
        Type::INT4 => array::<i32, _>(row, idx, name, Value::from),
        Type::INT8 => array::<i64, _>(row, idx, name, Value::from),
        Type::FLOAT4 => array(row, idx, name, |f: f32| float_to_json(f64::from(f))),
        Type::FLOAT8 => array(row, idx, name, float_to_json),
        Type::NUMERIC => array(row, idx, name, decimal_to_json),
        Type::UUID => array(row, idx, name, |u: uuid::Uuid| Value::String(u.to_string())),
        Type::DATE => array(row, idx, name, date_to_json),
        Type::TIME => array(row, idx, name, time_to_json),
        Type::TIMESTAMP => array(row, idx, name, timestamp_to_json),
        Type::TIMESTAMPTZ => array(row, idx, name, |ts: DateTime<Utc>| {
            Value::String(ts.to_rfc3339())
        }),
        Type::JSON | Type::JSONB => array(row, idx, name, |v: Value| v),
        _ if <String as FromSql>::accepts(member) => array(row, idx, name, Value::String),
        _ => Err(unsupported(name, ty)),
    }
}

fn unsupported(name: &str, ty: &Type) -> GateError {
    GateError::decode(name, format!("unsupported column type `{ty}`"))
}

fn enum_to_json(label: EnumLabel) -> Value {
    Value::String(label.0)
}

fn date_to_json(d: NaiveDate) -> Value {
    Value::String(d.format("%Y-%m-%d").to_string())
}

fn time_to_json(t: NaiveTime) -> Value {
    Value::String(t.format("%H:%M:%S%.f").to_string())
}

fn timestamp_to_json(ts: NaiveDateTime) -> Value {
    Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn decimal_to_json(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return Value::from(i);
        }
    }
    match d.to_f64().and_then(Number::from_f64) {
        Some(n) if n.to_string().parse::<Decimal>().ok() == Some(d.normalize()) => {
            Value::Number(n)
        }
        _ => Value::String(d.to_string()),
    }
}
