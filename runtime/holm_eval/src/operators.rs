//! Binary and unary operator semantics.
//!
//! Operators are total over values: coercion conditions and division by
//! zero report through the context's diagnostic channel and produce a
//! value, they never become hard errors. Integer arithmetic that would
//! overflow promotes to float instead of wrapping.

use holm_ir::{BinaryOp, UnaryOp};
use holm_value::{Number, Value};

use crate::env::Env;

/// Apply a non-short-circuit binary operator.
///
/// `&&`/`||` never reach here; the evaluator short-circuits them before
/// the right operand exists.
pub fn binary(env: &Env, op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            // Array union when both sides are arrays; left keys win.
            if let (Value::Array(a), Value::Array(b)) = (lhs, rhs) {
                return Value::Array(a.union(b));
            }
            arithmetic(env, op, lhs, rhs)
        }
        BinaryOp::Sub | BinaryOp::Mul => arithmetic(env, op, lhs, rhs),
        BinaryOp::Div => divide(env, lhs, rhs),
        BinaryOp::Mod => modulo(env, lhs, rhs),
        BinaryOp::Concat => {
            Value::string(format!("{}{}", stringify(env, lhs), stringify(env, rhs)))
        }
        BinaryOp::Eq => Value::Bool(lhs.loose_eq(rhs)),
        BinaryOp::Neq => Value::Bool(!lhs.loose_eq(rhs)),
        BinaryOp::Identical => Value::Bool(lhs.identical(rhs)),
        BinaryOp::NotIdentical => Value::Bool(!lhs.identical(rhs)),
        BinaryOp::Lt => Value::Bool(lhs.loose_cmp(rhs).is_lt()),
        BinaryOp::Le => Value::Bool(lhs.loose_cmp(rhs).is_le()),
        BinaryOp::Gt => Value::Bool(lhs.loose_cmp(rhs).is_gt()),
        BinaryOp::Ge => Value::Bool(lhs.loose_cmp(rhs).is_ge()),
        BinaryOp::And | BinaryOp::Or => {
            let l = lhs.to_bool();
            let r = rhs.to_bool();
            Value::Bool(if op == BinaryOp::And { l && r } else { l || r })
        }
    }
}

/// Apply a unary operator.
pub fn unary(env: &Env, op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Bool(!operand.to_bool()),
        UnaryOp::Plus => match numeric(env, operand) {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        },
        UnaryOp::Neg => match numeric(env, operand) {
            Number::Int(i) => match i.checked_neg() {
                Some(n) => Value::Int(n),
                // -i64::MIN promotes to float.
                None => Value::Float(-(i as f64)),
            },
            Number::Float(f) => Value::Float(-f),
        },
    }
}

fn numeric(env: &Env, value: &Value) -> Number {
    let (number, clean) = value.to_number();
    if !clean {
        env.warning(format!(
            "non-numeric {} used in arithmetic",
            value.type_name()
        ));
    }
    number
}

fn stringify(env: &Env, value: &Value) -> String {
    if value.is_array() {
        env.notice("array to string conversion");
    }
    value.to_string_lossy()
}

fn arithmetic(env: &Env, op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    let l = numeric(env, lhs);
    let r = numeric(env, rhs);
    match (l, r) {
        (Number::Int(a), Number::Int(b)) => {
            let checked = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                _ => a.checked_mul(b),
            };
            match checked {
                Some(result) => Value::Int(result),
                // Overflow promotes to float.
                None => {
                    let (x, y) = (a as f64, b as f64);
                    Value::Float(match op {
                        BinaryOp::Add => x + y,
                        BinaryOp::Sub => x - y,
                        _ => x * y,
                    })
                }
            }
        }
        _ => {
            let (x, y) = (l.to_f64(), r.to_f64());
            Value::Float(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                _ => x * y,
            })
        }
    }
}

fn divide(env: &Env, lhs: &Value, rhs: &Value) -> Value {
    let l = numeric(env, lhs);
    let r = numeric(env, rhs);
    let zero = match r {
        Number::Int(i) => i == 0,
        Number::Float(f) => f == 0.0,
    };
    if zero {
        env.warning("division by zero");
        return Value::Bool(false);
    }
    match (l, r) {
        (Number::Int(a), Number::Int(b)) => {
            // Exact integer division stays integral, otherwise float.
            if b != -1 && a % b == 0 {
                Value::Int(a / b)
            } else if b == -1 {
                match a.checked_neg() {
                    Some(n) => Value::Int(n),
                    None => Value::Float(-(a as f64)),
                }
            } else {
                Value::Float(a as f64 / b as f64)
            }
        }
        _ => Value::Float(l.to_f64() / r.to_f64()),
    }
}

fn modulo(env: &Env, lhs: &Value, rhs: &Value) -> Value {
    let a = numeric(env, lhs).to_i64();
    let b = numeric(env, rhs).to_i64();
    if b == 0 {
        env.warning("modulo by zero");
        return Value::Bool(false);
    }
    // i64::MIN % -1 has no checked result; the remainder is 0.
    Value::Int(a.checked_rem(b).unwrap_or(0))
}
