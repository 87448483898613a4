//! Loose (`==`), identical (`===`), and ordering comparison rules.
//!
//! Loose equality follows the guest language's coercion table:
//! - either side boolean → truthiness compare
//! - null against a string → compares as the empty string (so `null == "0"`
//!   is false even though `"0"` is falsy)
//! - numeric strings compare numerically; a number against any string
//!   coerces the string to a number
//! - arrays compare by size and key-wise loose equality (order-insensitive)
//! - objects compare loosely by class and field values, identically by
//!   handle
//!
//! `loose_cmp` is a *total* order so sort operators never fail: where the
//! guest table is non-numeric, mixed categories fall back to a fixed type
//! rank (scalars < array < object < callable).

use std::cmp::Ordering;

use crate::value::Number;
use crate::{ArrayValue, Value};

impl Value {
    /// Identity comparison (`===`): same type, no coercion. Arrays are
    /// structural (same keys, same order, identical values); objects and
    /// callables compare by handle.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => arrays_identical(a, b),
            (Value::Object(a), Value::Object(b)) => a.same_object(b),
            (Value::Callable(a), Value::Callable(b)) => {
                a.function == b.function
                    && match (&a.receiver, &b.receiver) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.same_object(y),
                        _ => false,
                    }
            }
            _ => false,
        }
    }

    /// Loose equality (`==`) with coercion.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => arrays_loose_eq(a, b),
            (Value::Object(a), Value::Object(b)) => {
                a.same_object(b) || (a.class_id() == b.class_id() && object_fields_eq(a, b))
            }
            // Booleans win over everything else: compare truthiness.
            (Value::Bool(_), _) | (_, Value::Bool(_)) => self.to_bool() == other.to_bool(),
            // Null against a string compares as the empty string.
            (Value::Null, Value::Str(s)) | (Value::Str(s), Value::Null) => s.is_empty(),
            (Value::Null, _) | (_, Value::Null) => !other.to_bool() && !self.to_bool(),
            (Value::Str(a), Value::Str(b)) => {
                match (self.as_fully_numeric(), other.as_fully_numeric()) {
                    (Some(x), Some(y)) => number_eq(x, y),
                    _ => a == b,
                }
            }
            // An array never loosely equals a non-array (short of the
            // boolean/null coercions handled above).
            (Value::Array(_), _) | (_, Value::Array(_)) => false,
            // Number against anything else (string, object): numeric.
            _ => number_eq(self.to_number().0, other.to_number().0),
        }
    }

    /// Total ordering used by the relational and sort operators.
    pub fn loose_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => arrays_cmp(a, b),
            (Value::Bool(_) | Value::Null, _) | (_, Value::Bool(_) | Value::Null) => {
                self.to_bool().cmp(&other.to_bool())
            }
            (Value::Str(a), Value::Str(b)) => {
                match (self.as_fully_numeric(), other.as_fully_numeric()) {
                    (Some(x), Some(y)) => number_cmp(x, y),
                    _ => a.as_bytes().cmp(b.as_bytes()),
                }
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.same_object(b) {
                    Ordering::Equal
                } else {
                    a.class_id().raw().cmp(&b.class_id().raw())
                }
            }
            _ => {
                let (ra, rb) = (type_rank(self), type_rank(other));
                if ra != rb {
                    ra.cmp(&rb)
                } else {
                    number_cmp(self.to_number().0, other.to_number().0)
                }
            }
        }
    }
}

/// Structural comparison backs `PartialEq` so tests and host code can use
/// `assert_eq!`; it is the `===` relation.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

fn number_eq(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x == y,
        _ => a.to_f64() == b.to_f64(),
    }
}

fn number_cmp(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        _ => a.to_f64().partial_cmp(&b.to_f64()).unwrap_or(Ordering::Equal),
    }
}

/// Ordering rank for mixed-category comparison: scalars, then containers.
fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => 0,
        Value::Array(_) => 1,
        Value::Object(_) => 2,
        Value::Callable(_) => 3,
    }
}

fn arrays_identical(a: &ArrayValue, b: &ArrayValue) -> bool {
    if a.is_same_data(b) {
        return true;
    }
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
        ka == kb && va.with_value(|x| vb.with_value(|y| x.identical(y)))
    })
}

fn arrays_loose_eq(a: &ArrayValue, b: &ArrayValue) -> bool {
    if a.is_same_data(b) {
        return true;
    }
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(key, cell)| match b.get(key) {
        Some(other) => cell.with_value(|v| v.loose_eq(&other)),
        None => false,
    })
}

/// Smaller array sorts first; equal sizes compare the left array's entries
/// against the right's values for the same keys (missing key → greater).
fn arrays_cmp(a: &ArrayValue, b: &ArrayValue) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        unequal => return unequal,
    }
    for (key, cell) in a.iter() {
        match b.get(key) {
            Some(other) => {
                let ord = cell.with_value(|v| v.loose_cmp(&other));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            None => return Ordering::Greater,
        }
    }
    Ordering::Equal
}

fn object_fields_eq(a: &crate::ObjectHandle, b: &crate::ObjectHandle) -> bool {
    let fields_a = a.fields_snapshot();
    let fields_b = b.fields_snapshot();
    fields_a.len() == fields_b.len()
        && fields_a.iter().all(|(name, value)| {
            fields_b
                .iter()
                .any(|(n, v)| n == name && v.loose_eq(value))
        })
}
