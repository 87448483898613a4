//! Argument marshaling between guest values and native functions.
//!
//! Each native parameter declares a [`Marshal`] describing the Rust-side
//! shape it wants. Marshaling applies the standard coercion rules, so a
//! native taking `Int` sees the same number a guest-level `(int)` cast
//! would produce. `Reference` passes the variable cell itself; writes
//! through it are visible to the caller.
//!
//! Marshals also rank how well a value fits, which is what overload
//! resolution minimizes when one native name has several signatures.

use holm_value::errors::{ref_param_not_addressable, EvalResult};
use holm_value::{ArrayValue, Value, Var};

use crate::env::Env;
use crate::interp::Argument;

/// Native entry point. Runs against the caller's context.
pub type NativeFn = fn(&mut Env, &[NativeArg]) -> EvalResult;

/// One marshaled actual as seen by a native function.
#[derive(Clone, Debug)]
pub enum NativeArg {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(ArrayValue),
    /// The caller's cell; writes through it are caller-visible.
    Ref(Var),
    /// Unconverted value.
    Val(Value),
}

impl NativeArg {
    pub fn as_int(&self) -> i64 {
        match self {
            NativeArg::Int(i) => *i,
            NativeArg::Val(v) => v.to_int(),
            NativeArg::Bool(b) => i64::from(*b),
            NativeArg::Float(f) => Value::Float(*f).to_int(),
            NativeArg::Str(s) => Value::string(s.clone()).to_int(),
            NativeArg::Array(_) | NativeArg::Ref(_) => 0,
        }
    }

    pub fn as_str(&self) -> String {
        match self {
            NativeArg::Str(s) => s.clone(),
            NativeArg::Val(v) => v.to_string_lossy(),
            other => other.to_value().to_string_lossy(),
        }
    }

    /// Back-conversion to a guest value.
    pub fn to_value(&self) -> Value {
        match self {
            NativeArg::Bool(b) => Value::Bool(*b),
            NativeArg::Int(i) => Value::Int(*i),
            NativeArg::Float(f) => Value::Float(*f),
            NativeArg::Str(s) => Value::string(s.clone()),
            NativeArg::Array(a) => Value::Array(a.clone()),
            NativeArg::Ref(cell) => cell.get(),
            NativeArg::Val(v) => v.clone(),
        }
    }
}

/// Target shape for one native parameter or the return value.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Marshal {
    Bool,
    Int,
    Float,
    Str,
    Array,
    /// Pass the cell; the actual must be addressable.
    Reference,
    /// Pass the value unconverted.
    Raw,
}

/// Fit cost of one conversion. Exact is 0, numeric widening 1, generic
/// coercion 2, shape mismatch 4.
const COST_EXACT: u32 = 0;
const COST_NUMERIC: u32 = 1;
const COST_COERCE: u32 = 2;
const COST_MISMATCH: u32 = 4;

impl Marshal {
    /// Convert one bound actual, reporting coercion conditions through the
    /// context's diagnostic channel.
    pub fn marshal(self, env: &mut Env, param_name: &str, arg: Argument) -> EvalResult<NativeArg> {
        if self == Marshal::Reference {
            return match arg {
                Argument::ByRef(cell) => Ok(NativeArg::Ref(cell)),
                Argument::ByVal(_) => Err(ref_param_not_addressable(param_name)),
            };
        }
        let value = match arg {
            Argument::ByVal(value) => value,
            Argument::ByRef(cell) => cell.get(),
        };
        Ok(match self {
            Marshal::Bool => NativeArg::Bool(value.to_bool()),
            Marshal::Int => {
                let (number, clean) = value.to_number();
                if !clean {
                    env.warning(format!(
                        "${param_name} expects int, {} given",
                        value.type_name()
                    ));
                }
                NativeArg::Int(number.to_i64())
            }
            Marshal::Float => {
                let (number, clean) = value.to_number();
                if !clean {
                    env.warning(format!(
                        "${param_name} expects float, {} given",
                        value.type_name()
                    ));
                }
                NativeArg::Float(number.to_f64())
            }
            Marshal::Str => NativeArg::Str(value.to_string_lossy()),
            Marshal::Array => match value {
                Value::Array(a) => NativeArg::Array(a),
                other => {
                    env.warning(format!(
                        "${param_name} expects array, {} given",
                        other.type_name()
                    ));
                    NativeArg::Array(ArrayValue::new())
                }
            },
            Marshal::Raw => NativeArg::Val(value),
            Marshal::Reference => NativeArg::Val(value),
        })
    }

    /// Coerce a native return value back to the declared guest shape.
    pub fn unmarshal_return(self, value: Value) -> Value {
        match self {
            Marshal::Bool => Value::Bool(value.to_bool()),
            Marshal::Int => Value::Int(value.to_int()),
            Marshal::Float => Value::Float(value.to_float()),
            Marshal::Str => Value::string(value.to_string_lossy()),
            Marshal::Array => match value {
                Value::Array(_) => value,
                _ => Value::empty_array(),
            },
            Marshal::Reference | Marshal::Raw => value,
        }
    }

    /// How well `value` fits this marshal without conversion.
    pub fn cost(self, value: &Value) -> u32 {
        match self {
            Marshal::Raw | Marshal::Reference => COST_EXACT,
            Marshal::Bool => match value {
                Value::Bool(_) => COST_EXACT,
                _ => COST_COERCE,
            },
            Marshal::Int => match value {
                Value::Int(_) => COST_EXACT,
                Value::Float(_) | Value::Bool(_) => COST_NUMERIC,
                Value::Str(_) if value.as_fully_numeric().is_some() => COST_NUMERIC,
                Value::Array(_) | Value::Object(_) | Value::Callable(_) => COST_MISMATCH,
                _ => COST_COERCE,
            },
            Marshal::Float => match value {
                Value::Float(_) => COST_EXACT,
                Value::Int(_) | Value::Bool(_) => COST_NUMERIC,
                Value::Str(_) if value.as_fully_numeric().is_some() => COST_NUMERIC,
                Value::Array(_) | Value::Object(_) | Value::Callable(_) => COST_MISMATCH,
                _ => COST_COERCE,
            },
            Marshal::Str => match value {
                Value::Str(_) => COST_EXACT,
                Value::Array(_) | Value::Object(_) | Value::Callable(_) => COST_MISMATCH,
                _ => COST_COERCE,
            },
            Marshal::Array => match value {
                Value::Array(_) => COST_EXACT,
                _ => COST_MISMATCH,
            },
        }
    }
}

/// Per-signature marshal list plus return conversion.
#[derive(Clone, Debug)]
pub struct MarshalSet {
    pub params: Vec<Marshal>,
    pub ret: Marshal,
}

impl MarshalSet {
    pub fn new(params: Vec<Marshal>) -> Self {
        MarshalSet {
            params,
            ret: Marshal::Raw,
        }
    }

    pub fn returning(mut self, ret: Marshal) -> Self {
        self.ret = ret;
        self
    }

    /// Marshal for the parameter at `index`; trailing actuals past the
    /// declared list are passed raw.
    pub fn param(&self, index: usize) -> Marshal {
        self.params.get(index).copied().unwrap_or(Marshal::Raw)
    }

    /// Total fit cost of a candidate signature against the actuals.
    /// Arity mismatch is costed like one shape mismatch per missing or
    /// surplus actual.
    pub fn cost_of(&self, args: &[Value]) -> u32 {
        let shared = self.params.len().min(args.len());
        let mut total = 0u32;
        for (marshal, value) in self.params.iter().zip(args.iter()).take(shared) {
            total = total.saturating_add(marshal.cost(value));
        }
        let arity_gap = self.params.len().abs_diff(args.len()) as u32;
        total.saturating_add(arity_gap.saturating_mul(COST_MISMATCH))
    }
}

/// Pick the cheapest candidate signature for the actuals. Ties resolve to
/// the earliest candidate.
pub fn resolve_overload(candidates: &[&MarshalSet], args: &[Value]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, set)| (set.cost_of(args), i))
        .min_by_key(|&(cost, i)| (cost, i))
        .map(|(_, i)| i)
}
