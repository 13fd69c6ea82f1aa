//! Concrete field values and their command-line text form

use std::fmt;

use chrono::NaiveDate;
use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::{FlagType, ScalarKind, TypeSpec, DATE_FORMAT};

/// A value carried by a request field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    List(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Parse one command-line token under a scalar flag type.
    ///
    /// `flag` is the long flag name, used only for the error message.
    pub fn parse(flag_type: &FlagType, raw: &str, flag: &str) -> DomainResult<Value> {
        let format_err = || DomainError::FlagFormat {
            flag: flag.to_string(),
            value: raw.to_string(),
            expected: flag_type.to_string(),
        };
        match flag_type {
            FlagType::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(format_err),
            FlagType::Int => raw.trim().parse().map(Value::Int).map_err(|_| format_err()),
            FlagType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(format_err),
            FlagType::String => Ok(Value::String(raw.to_string())),
            FlagType::Date => parse_date(raw).map(Value::Date).ok_or_else(format_err),
            FlagType::Composite(_) => Err(format_err()),
        }
    }

    /// Parse the values of one composite flag occurrence, component by component.
    pub fn parse_composite(parts: &[FlagType], raw: &[&str], flag: &str) -> DomainResult<Value> {
        if parts.len() != raw.len() {
            return Err(DomainError::FlagFormat {
                flag: flag.to_string(),
                value: raw.join(" "),
                expected: FlagType::Composite(parts.to_vec()).to_string(),
            });
        }
        parts
            .iter()
            .zip(raw)
            .map(|(part, token)| Value::parse(part, token, flag))
            .collect::<DomainResult<Vec<_>>>()
            .map(Value::Tuple)
    }

    /// Structural match against a declared type.
    ///
    /// `Null` conforms only to optional types. An int conforms to a float
    /// field so that integral defaults need no decimal point.
    pub fn conforms_to(&self, spec: &TypeSpec) -> bool {
        match (self, spec) {
            (Value::Null, TypeSpec::Optional(_)) => true,
            (value, TypeSpec::Optional(inner)) => value.conforms_to(inner),
            (_, TypeSpec::Union(alts)) => alts.iter().any(|alt| self.conforms_to(alt)),
            (Value::Bool(_), TypeSpec::Scalar(ScalarKind::Bool)) => true,
            (Value::Int(_), TypeSpec::Scalar(ScalarKind::Int)) => true,
            (Value::Int(_) | Value::Float(_), TypeSpec::Scalar(ScalarKind::Float)) => true,
            (Value::String(_), TypeSpec::Scalar(ScalarKind::String)) => true,
            (Value::Date(_), TypeSpec::Scalar(ScalarKind::Date)) => true,
            (Value::List(items), TypeSpec::List(inner)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            (Value::Tuple(items), TypeSpec::Tuple(specs)) => {
                items.len() == specs.len()
                    && items.iter().zip(specs).all(|(item, s)| item.conforms_to(s))
            }
            _ => false,
        }
    }

    /// Integers declared as floats become floats, at any depth.
    ///
    /// Parsing a float flag always yields `Float`, so stored defaults and
    /// constructed values are widened the same way to compare equal.
    pub fn widen_to(self, spec: &TypeSpec) -> Value {
        match (self, spec) {
            (Value::Int(n), TypeSpec::Scalar(ScalarKind::Float)) => Value::Float(n as f64),
            (value, TypeSpec::Optional(inner)) => value.widen_to(inner),
            (Value::List(items), TypeSpec::List(inner)) => {
                Value::List(items.into_iter().map(|item| item.widen_to(inner)).collect())
            }
            (Value::Tuple(items), TypeSpec::Tuple(specs)) if items.len() == specs.len() => {
                Value::Tuple(
                    items
                        .into_iter()
                        .zip(specs)
                        .map(|(item, s)| item.widen_to(s))
                        .collect(),
                )
            }
            (value, _) => value,
        }
    }

    /// Command-line tokens that parse back to this value.
    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            Value::Null => vec![],
            Value::List(items) | Value::Tuple(items) => {
                items.iter().flat_map(Value::to_tokens).collect()
            }
            other => vec![other.to_string()],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::List(items) | Value::Tuple(items) => write!(f, "{}", items.iter().join(",")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Strict `YYYY-MM-DD`: chrono alone would also accept unpadded fields.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
