//! Typed scalar values carried from classification to the driver.
//!
//! Query-string values have no type of their own. The classifier decides once
//! whether a value is an integer, a float or text, and the compiler binds that
//! [`ScalarValue`] unchanged. At bind time the value adapts to the parameter
//! type PostgreSQL inferred for its placeholder, so `age = $1` with
//! `Text("18")` works against an `integer` column.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::net::IpAddr;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// A bound argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Best-effort numeric parse used for comma-list members.
    ///
    /// Integers win over floats; non-finite floats (`inf`, `NaN`) are not
    /// numbers here. Returns `None` when `s` is not numeric.
    pub fn parse_number(s: &str) -> Option<Self> {
        if let Ok(i) = s.parse::<i64>() {
            return Some(Self::Integer(i));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Self::Float(f)),
            _ => None,
        }
    }

    /// Parse `s` as a number, falling back to text.
    ///
    /// Zero-padded digits (`01234`) stay text so codes keep their leading
    /// zeros; text still binds to numeric columns.
    pub fn number_or_text(s: &str) -> Self {
        if has_leading_zero(s) {
            return Self::Text(s.to_string());
        }
        Self::parse_number(s).unwrap_or_else(|| Self::Text(s.to_string()))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_i64(&self) -> Result<i64, BoxError> {
        match self {
            Self::Integer(i) => Ok(*i),
            Self::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 => {
                Ok(*f as i64)
            }
            Self::Float(f) => Err(format!("{f} is not an integer").into()),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("cannot bind '{s}' as an integer: {e}").into()),
        }
    }

    fn to_f64(&self) -> Result<f64, BoxError> {
        match self {
            Self::Integer(i) => Ok(*i as f64),
            Self::Float(f) => Ok(*f),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("cannot bind '{s}' as a float: {e}").into()),
        }
    }

    fn to_decimal(&self) -> Result<Decimal, BoxError> {
        match self {
            Self::Integer(i) => Ok(Decimal::from(*i)),
            Self::Float(f) => Decimal::try_from(*f).map_err(|e| e.into()),
            Self::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|e| format!("cannot bind '{s}' as numeric: {e}").into()),
        }
    }

    fn to_bool(&self) -> Result<bool, BoxError> {
        match self {
            Self::Integer(0) => Ok(false),
            Self::Integer(1) => Ok(true),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "1" | "yes" | "y" | "on" => Ok(true),
                "f" | "false" | "0" | "no" | "n" | "off" => Ok(false),
                _ => Err(format!("cannot bind '{s}' as a boolean").into()),
            },
            other => Err(format!("cannot bind {other} as a boolean").into()),
        }
    }

    fn text_for(&self, target: &str) -> Result<&str, BoxError> {
        self.as_text()
            .map(str::trim)
            .ok_or_else(|| format!("cannot bind {self} as {target}").into())
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) => {
                serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone()))
            }
        }
    }
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s).as_bytes();
    digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit()
}

fn parse_time(s: &str) -> Result<NaiveTime, BoxError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("cannot bind '{s}' as a time: {e}").into())
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("cannot bind '{s}' as a timestamp: {e}"))?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("cannot bind '{s}' as a timestamp").into())
}

fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, BoxError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    Ok(parse_timestamp(s)?.and_utc())
}

impl ToSql for ScalarValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match *ty {
            Type::BOOL => self.to_bool()?.to_sql(ty, out),
            Type::INT2 => i16::try_from(self.to_i64()?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(self.to_i64()?)?.to_sql(ty, out),
            Type::INT8 => self.to_i64()?.to_sql(ty, out),
            Type::FLOAT4 => (self.to_f64()? as f32).to_sql(ty, out),
            Type::FLOAT8 => self.to_f64()?.to_sql(ty, out),
            Type::NUMERIC => self.to_decimal()?.to_sql(ty, out),
            Type::UUID => uuid::Uuid::parse_str(self.text_for("uuid")?)?.to_sql(ty, out),
            Type::DATE => {
                NaiveDate::parse_from_str(self.text_for("date")?, "%Y-%m-%d")?.to_sql(ty, out)
            }
            Type::TIME => parse_time(self.text_for("time")?)?.to_sql(ty, out),
            Type::TIMESTAMP => parse_timestamp(self.text_for("timestamp")?)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => {
                parse_timestamptz(self.text_for("timestamptz")?)?.to_sql(ty, out)
            }
            Type::JSON | Type::JSONB => self.to_json().to_sql(ty, out),
            Type::INET => self.text_for("inet")?.parse::<IpAddr>()?.to_sql(ty, out),
            // Text-like types and enum labels.
            _ => self.to_string().as_str().to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::UUID
                | Type::DATE
                | Type::TIME
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::JSON
                | Type::JSONB
                | Type::INET
        ) || matches!(ty.kind(), Kind::Enum(_))
            || <&str as ToSql>::accepts(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
