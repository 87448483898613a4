//! The runtime value and its total conversion rules.

use std::fmt;
use std::rc::Rc;

use holm_ir::Name;

use crate::{ArrayValue, ObjectHandle};

/// A parsed numeric quantity: integer when the text fit one, float otherwise.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => float_to_int(f),
        }
    }
}

/// A callable value: a registered function name, optionally bound to a
/// receiver object for method-style invocation.
#[derive(Clone, Debug)]
pub struct CallableValue {
    pub function: Name,
    pub receiver: Option<ObjectHandle>,
}

/// Runtime value in the Holm interpreter.
///
/// Scalars copy on assignment; `Array` shares lazily with copy-on-write
/// (see [`ArrayValue`]); `Object` and `Callable` share by handle.
///
/// Every conversion here is a total function: there is no input for which
/// `to_int`/`to_float`/`to_bool`/`to_string_lossy` fail. Where the guest
/// language would warn (non-numeric string as a number), the conversion
/// still produces the documented fallback and the *evaluator* reports the
/// warning — purity here keeps the value layer context-free.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(ArrayValue),
    Object(ObjectHandle),
    Callable(Rc<CallableValue>),
}

impl Value {
    // Factories, used by literal nodes and native modules.

    pub fn int(v: i64) -> Value {
        Value::Int(v)
    }

    pub fn float(v: f64) -> Value {
        Value::Float(v)
    }

    pub fn bool(v: bool) -> Value {
        Value::Bool(v)
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::from(s.into()))
    }

    pub fn str_rc(s: Rc<str>) -> Value {
        Value::Str(s)
    }

    pub fn array(a: ArrayValue) -> Value {
        Value::Array(a)
    }

    pub fn empty_array() -> Value {
        Value::Array(ArrayValue::new())
    }

    pub fn object(o: ObjectHandle) -> Value {
        Value::Object(o)
    }

    pub fn callable(function: Name) -> Value {
        Value::Callable(Rc::new(CallableValue {
            function,
            receiver: None,
        }))
    }

    pub fn bound_callable(function: Name, receiver: ObjectHandle) -> Value {
        Value::Callable(Rc::new(CallableValue {
            function,
            receiver: Some(receiver),
        }))
    }

    /// Guest-visible type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Callable(_) => "callable",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Assignment copy. Lazy for arrays (divergence happens on first write
    /// through either handle), handle-sharing for objects and callables.
    pub fn copy(&self) -> Value {
        self.clone()
    }

    /// Truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"`, and the empty
    /// array are false; everything else is true.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty() && &**s != "0",
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) | Value::Callable(_) => true,
        }
    }

    /// Integer coercion. Strings parse a leading numeric prefix; a
    /// non-numeric string is 0. Floats truncate toward zero.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(i) => *i,
            Value::Float(f) => float_to_int(*f),
            Value::Str(s) => parse_numeric_prefix(s).0.to_i64(),
            Value::Array(a) => i64::from(!a.is_empty()),
            Value::Object(_) | Value::Callable(_) => 1,
        }
    }

    /// Float coercion, same prefix rule as `to_int`.
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => parse_numeric_prefix(s).0.to_f64(),
            Value::Array(a) => f64::from(u8::from(!a.is_empty())),
            Value::Object(_) | Value::Callable(_) => 1.0,
        }
    }

    /// String coercion. Arrays render as `"Array"` (the evaluator emits the
    /// accompanying notice), objects as `"Object"`.
    pub fn to_string_lossy(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::Object(_) => "Object".to_string(),
            Value::Callable(_) => "Callable".to_string(),
        }
    }

    /// Numeric interpretation used by the arithmetic operators.
    ///
    /// The `bool` is true when the coercion was clean (no warning needed):
    /// numeric types, bools, null, and fully numeric strings are clean;
    /// strings with only a numeric prefix (or none) are not.
    pub fn to_number(&self) -> (Number, bool) {
        match self {
            Value::Null => (Number::Int(0), true),
            Value::Bool(b) => (Number::Int(i64::from(*b)), true),
            Value::Int(i) => (Number::Int(*i), true),
            Value::Float(f) => (Number::Float(*f), true),
            Value::Str(s) => parse_numeric_prefix(s),
            Value::Array(a) => (Number::Int(i64::from(!a.is_empty())), false),
            Value::Object(_) | Value::Callable(_) => (Number::Int(1), false),
        }
    }

    /// Whether this is a string whose entire content is numeric.
    pub fn as_fully_numeric(&self) -> Option<Number> {
        match self {
            Value::Str(s) => parse_fully_numeric(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(a) => write!(f, "{a:?}"),
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Callable(c) => write!(f, "callable({:?})", c.function),
        }
    }
}

/// Float-to-int truncation toward zero; NaN is 0, infinities saturate.
pub(crate) fn float_to_int(f: f64) -> i64 {
    if f.is_nan() {
        0
    } else if f >= i64::MAX as f64 {
        i64::MAX
    } else if f <= i64::MIN as f64 {
        i64::MIN
    } else {
        f.trunc() as i64
    }
}

/// Guest-style float formatting: integral values print without a fraction.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF" } else { "-INF" }.to_string()
    } else if f == f.trunc() && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Parse the longest numeric prefix of `s` (optional leading whitespace and
/// sign, digits, fraction, exponent). Returns the parsed number and whether
/// the whole string was consumed cleanly.
///
/// This is the single implementation behind string-to-number coercion; key
/// normalization uses the stricter [`canonical_int`] instead.
pub(crate) fn parse_numeric_prefix(s: &str) -> (Number, bool) {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut pos = 0;
    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        pos += 1;
    }
    let digits_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = pos - digits_start;
    let mut is_float = false;
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac = frac_start;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
        }
        if frac > frac_start || int_digits > 0 {
            is_float = true;
            pos = frac;
        }
    }
    if int_digits == 0 && !is_float {
        return (Number::Int(0), false);
    }
    // Exponent only counts if digits follow it.
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits_start {
            is_float = true;
            pos = exp;
        }
    }
    let text = &trimmed[..pos];
    let clean = pos == trimmed.len() && !trimmed.is_empty();
    let number = if is_float {
        Number::Float(text.parse::<f64>().unwrap_or(0.0))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Number::Int(i),
            // Integer text too large for i64 falls back to float.
            Err(_) => Number::Float(text.parse::<f64>().unwrap_or(0.0)),
        }
    };
    (number, clean)
}

/// Numeric value of a string that is numeric in its entirety, else `None`.
pub(crate) fn parse_fully_numeric(s: &str) -> Option<Number> {
    let (number, clean) = parse_numeric_prefix(s);
    clean.then_some(number)
}

/// The integer a string denotes *canonically*, or `None`.
///
/// Canonical means the round-trip is exact: `"7"` and `"-3"` qualify,
/// `"07"`, `"+7"`, `" 7"`, `"-0"`, and `"7.0"` do not. Used only by array
/// key normalization.
pub(crate) fn canonical_int(s: &str) -> Option<i64> {
    let value: i64 = s.parse().ok()?;
    (value.to_string() == s).then_some(value)
}
