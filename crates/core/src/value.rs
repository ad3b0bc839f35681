//! Field values and the permissive coercions rules apply to them.
//!
//! All numeric values use `rust_decimal::Decimal`, never `f64`. Rule
//! arithmetic goes through [`Value::flt`], which treats anything that is
//! not a number (missing, empty, non-numeric text) as zero.

use std::str::FromStr;

use rust_decimal::Decimal;
use time::macros::format_description;
use time::Date;

use crate::doctype::FieldKind;
use crate::error::DocumentError;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Date(Date),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    /// Whether the field holds something a user would call "set".
    /// Empty text counts as unset.
    pub fn is_set(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Non-empty text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Date content, accepting ISO `YYYY-MM-DD` text.
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s).ok(),
            _ => None,
        }
    }

    /// Integer-cast truthiness: `true`, any non-zero number, or numeric
    /// text that is non-zero.
    pub fn as_flag(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Decimal(d) => !d.is_zero(),
            Value::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map(|d| !d.is_zero())
                .unwrap_or(false),
            Value::Null | Value::Date(_) => false,
        }
    }

    /// Coerce to a number. Non-numeric or missing values become zero.
    pub fn flt(&self) -> Decimal {
        match self {
            Value::Decimal(d) => *d,
            Value::Int(i) => Decimal::from(*i),
            Value::Bool(b) => {
                if *b {
                    Decimal::ONE
                } else {
                    Decimal::ZERO
                }
            }
            Value::Text(s) => parse_decimal(s.trim()).unwrap_or(Decimal::ZERO),
            Value::Null | Value::Date(_) => Decimal::ZERO,
        }
    }

    /// Parse a plain JSON value according to a field kind.
    ///
    /// Numeric fields keep unparseable input as text instead of failing, so
    /// a stray entry still reaches the rules and is coerced to zero there.
    pub fn from_json(v: &serde_json::Value, kind: FieldKind) -> Result<Value, DocumentError> {
        if v.is_null() {
            return Ok(Value::Null);
        }
        match kind {
            FieldKind::Check => match v {
                serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
                other => Ok(Value::Bool(json_to_plain(other).as_flag())),
            },
            FieldKind::Int => match v.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => Ok(json_to_plain(v)),
            },
            FieldKind::Currency | FieldKind::Float => match v {
                serde_json::Value::Number(n) => Ok(parse_decimal(&n.to_string())
                    .map(Value::Decimal)
                    .unwrap_or(Value::Decimal(Decimal::ZERO))),
                serde_json::Value::String(s) => Ok(parse_decimal(s.trim())
                    .map(Value::Decimal)
                    .unwrap_or_else(|| Value::Text(s.clone()))),
                other => Ok(json_to_plain(other)),
            },
            FieldKind::Date => {
                let s = v.as_str().ok_or_else(|| DocumentError::InvalidValue {
                    message: format!("expected date string, got {}", v),
                })?;
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                parse_date(s).map(Value::Date)
            }
            FieldKind::Link | FieldKind::Data => match v {
                serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
                other => Ok(Value::Text(other.to_string())),
            },
            FieldKind::Table { .. } => Err(DocumentError::InvalidValue {
                message: "table fields hold rows, not values".to_string(),
            }),
        }
    }

    /// Serialize to plain JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(i),
            Value::Decimal(d) => serde_json::Value::String(d.normalize().to_string()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(format_date(*d)),
        }
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Value::Date(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Coerce an arbitrary JSON value (e.g. a remote rate response) to a number.
/// Missing or non-numeric input becomes zero.
pub fn flt_json(v: &serde_json::Value) -> Decimal {
    match v {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()).unwrap_or(Decimal::ZERO),
        serde_json::Value::String(s) => parse_decimal(s.trim()).unwrap_or(Decimal::ZERO),
        serde_json::Value::Bool(true) => Decimal::ONE,
        _ => Decimal::ZERO,
    }
}

pub fn parse_date(s: &str) -> Result<Date, DocumentError> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DocumentError::InvalidValue {
            message: format!("invalid date '{}': {}", s, e),
        }
    })
}

pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn json_to_plain(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Decimal(flt_json(v)),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn flt_coerces_garbage_to_zero() {
        assert_eq!(Value::Null.flt(), Decimal::ZERO);
        assert_eq!(Value::text("abc").flt(), Decimal::ZERO);
        assert_eq!(Value::text("").flt(), Decimal::ZERO);
        assert_eq!(Value::text(" 12.5 ").flt(), dec("12.5"));
        assert_eq!(Value::Int(3).flt(), dec("3"));
    }

    #[test]
    fn flt_json_handles_rate_responses() {
        assert_eq!(flt_json(&serde_json::json!(83.5)), dec("83.5"));
        assert_eq!(flt_json(&serde_json::json!("0.012")), dec("0.012"));
        assert_eq!(flt_json(&serde_json::json!(null)), Decimal::ZERO);
        assert_eq!(flt_json(&serde_json::json!({"rate": 2})), Decimal::ZERO);
        assert_eq!(flt_json(&serde_json::json!("n/a")), Decimal::ZERO);
    }

    #[test]
    fn numeric_field_keeps_bad_text() {
        let v = Value::from_json(&serde_json::json!("twelve"), FieldKind::Float).unwrap();
        assert_eq!(v, Value::text("twelve"));
        assert_eq!(v.flt(), Decimal::ZERO);

        let v = Value::from_json(&serde_json::json!(2.25), FieldKind::Currency).unwrap();
        assert_eq!(v, Value::Decimal(dec("2.25")));
    }

    #[test]
    fn date_parsing() {
        let v = Value::from_json(&serde_json::json!("2025-01-10"), FieldKind::Date).unwrap();
        assert_eq!(v.to_json(), serde_json::json!("2025-01-10"));
        assert!(Value::from_json(&serde_json::json!("10/01/2025"), FieldKind::Date).is_err());
        assert_eq!(
            Value::from_json(&serde_json::json!(""), FieldKind::Date).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn flags_follow_integer_cast() {
        assert!(Value::Int(1).as_flag());
        assert!(Value::text("1").as_flag());
        assert!(!Value::text("0").as_flag());
        assert!(!Value::text("yes").as_flag());
        assert!(!Value::Null.as_flag());
        assert_eq!(
            Value::from_json(&serde_json::json!(1), FieldKind::Check).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn decimal_equality_ignores_scale() {
        assert_eq!(Value::Decimal(dec("1.0")), Value::Decimal(Decimal::ONE));
    }
}
