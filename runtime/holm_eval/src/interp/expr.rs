//! Rvalue evaluation: `eval`, `eval_bool`, `eval_copy`.

use holm_ir::{BinaryOp, Expr, ExprKind, UnaryOp};
use holm_value::errors::{not_assignable, EvalResult};
use holm_value::{ArrayKey, ArrayValue, Value};

use super::Interpreter;
use crate::operators;
use crate::stack::ensure_sufficient_stack;

impl Interpreter<'_> {
    /// Evaluate an expression to a value.
    ///
    /// Reads of missing variables, indexes, and fields produce `Null` with
    /// a notice. Hard errors only come from protocol misuse (assigning to
    /// a non-lvalue, calling the undefined).
    pub fn eval(&mut self, id: holm_ir::ExprId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(id))
    }

    fn eval_inner(&mut self, id: holm_ir::ExprId) -> EvalResult {
        let Expr { kind, span } = *self.arena.expr(id);
        match kind {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(b)),
            ExprKind::Int(i) => Ok(Value::Int(i)),
            ExprKind::Float(bits) => Ok(Value::Float(f64::from_bits(bits))),
            ExprKind::Str(name) => Ok(Value::string(self.interner.resolve(name).as_ref())),

            ExprKind::Var(name) => match self.env.lookup(name) {
                Some(cell) => Ok(cell.get()),
                None => {
                    self.env
                        .notice_at(format!("undefined variable ${}", self.name_str(name)), span);
                    Ok(Value::Null)
                }
            },

            ExprKind::ArrayGet { base, index } => {
                let Some(index) = index else {
                    self.env
                        .warning_at("cannot use the append form for reading", span);
                    return Ok(Value::Null);
                };
                let base_value = self.eval(base)?;
                let key_value = self.eval(index)?;
                self.read_index(&base_value, &key_value)
            }

            ExprKind::Field { base, name } => {
                let base_value = self.eval(base)?;
                match base_value {
                    Value::Object(handle) => {
                        if !self.check_field_access(&handle, name) {
                            return Ok(Value::Null);
                        }
                        match handle.get_field(name) {
                            Some(value) => Ok(value),
                            None => {
                                self.env.notice_at(
                                    format!("undefined property {}", self.name_str(name)),
                                    span,
                                );
                                Ok(Value::Null)
                            }
                        }
                    }
                    other => {
                        self.env.notice_at(
                            format!("trying to read property of {}", other.type_name()),
                            span,
                        );
                        Ok(Value::Null)
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                if op.is_short_circuit() {
                    let result = match op {
                        BinaryOp::And => self.eval_bool(lhs)? && self.eval_bool(rhs)?,
                        _ => self.eval_bool(lhs)? || self.eval_bool(rhs)?,
                    };
                    return Ok(Value::Bool(result));
                }
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Ok(operators::binary(&self.env, op, &lhs, &rhs))
            }

            ExprKind::Unary { op, expr } => {
                if op == UnaryOp::Not {
                    return Ok(Value::Bool(!self.eval_bool(expr)?));
                }
                let operand = self.eval(expr)?;
                Ok(operators::unary(&self.env, op, &operand))
            }

            ExprKind::Assign { target, value } => {
                let value = self.eval_copy(value)?;
                self.assign(target, value.clone())?;
                Ok(value)
            }

            ExprKind::AssignRef { target, source } => {
                let cell = self.eval_ref(source)?;
                self.bind_ref(target, cell.clone())?;
                Ok(cell.get())
            }

            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.eval(inner)
            }

            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.eval_bool(cond)? {
                    self.eval(then_expr)
                } else {
                    self.eval(else_expr)
                }
            }

            ExprKind::Call { name, args } => {
                let args = self.arena.args(args).to_vec();
                self.call_named(name, &args, span)
            }
            ExprKind::DynCall { callee, args } => {
                let args = self.arena.args(args).to_vec();
                let callee = self.eval(callee)?;
                self.call_value(&callee, &args, span)
            }
            ExprKind::MethodCall { base, name, args } => {
                let args = self.arena.args(args).to_vec();
                self.call_method(base, name, &args, span)
            }
            ExprKind::New { class, args } => {
                let args = self.arena.args(args).to_vec();
                self.instantiate(class, &args, span)
            }

            ExprKind::InstanceOf { expr, class } => {
                let value = self.eval(expr)?;
                let result = match value {
                    Value::Object(handle) => {
                        self.classes
                            .read()
                            .is_instance_of(self.interner, handle.class_id(), class)
                    }
                    _ => false,
                };
                Ok(Value::Bool(result))
            }

            ExprKind::Isset(inner) => Ok(Value::Bool(self.eval_isset(inner)?)),
            ExprKind::Unset(inner) => {
                self.eval_unset(inner)?;
                Ok(Value::Null)
            }
            ExprKind::Empty(inner) => {
                let value = self.peek(inner)?;
                Ok(Value::Bool(!value.is_some_and(|v| v.to_bool())))
            }

            ExprKind::ArrayLit(range) => {
                let items = self.arena.items(range).to_vec();
                let mut array = ArrayValue::new();
                for item in items {
                    let value = self.eval_copy(item.value)?;
                    match item.key {
                        Some(key) => {
                            if let Some(key) = self.array_key(key)? {
                                array.put(key, value);
                            }
                        }
                        None => {
                            array.append(value);
                        }
                    }
                }
                Ok(Value::Array(array))
            }
        }
    }

    /// Boolean evaluation. Short-circuit operators and `!` dispatch here
    /// directly so their operands never materialize a value.
    pub fn eval_bool(&mut self, id: holm_ir::ExprId) -> EvalResult<bool> {
        ensure_sufficient_stack(|| {
            let Expr { kind, .. } = *self.arena.expr(id);
            match kind {
                ExprKind::Binary {
                    op: BinaryOp::And,
                    lhs,
                    rhs,
                } => Ok(self.eval_bool(lhs)? && self.eval_bool(rhs)?),
                ExprKind::Binary {
                    op: BinaryOp::Or,
                    lhs,
                    rhs,
                } => Ok(self.eval_bool(lhs)? || self.eval_bool(rhs)?),
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    expr,
                } => Ok(!self.eval_bool(expr)?),
                ExprKind::Suppress(inner) => {
                    let _guard = self.env.suppress();
                    self.eval_bool(inner)
                }
                _ => Ok(self.eval(id)?.to_bool()),
            }
        })
    }

    /// Evaluate to an assignment copy (scalars by value, arrays as a lazy
    /// copy-on-write handle, objects by handle).
    pub fn eval_copy(&mut self, id: holm_ir::ExprId) -> EvalResult {
        Ok(self.eval(id)?.copy())
    }

    /// Index read against an already-evaluated base.
    fn read_index(&mut self, base: &Value, key_value: &Value) -> EvalResult {
        match base {
            Value::Array(array) => {
                let Some(key) = ArrayKey::normalize(key_value) else {
                    self.env
                        .warning(format!("illegal offset type: {}", key_value.type_name()));
                    return Ok(Value::Null);
                };
                match array.get(&key) {
                    Some(value) => Ok(value),
                    None => {
                        self.env
                            .notice(format!("undefined index {}", key_value.to_string_lossy()));
                        Ok(Value::Null)
                    }
                }
            }
            Value::Str(s) => {
                let offset = key_value.to_int();
                match string_offset(s, offset) {
                    Some(ch) => Ok(Value::string(ch.to_string())),
                    None => {
                        self.env
                            .notice(format!("uninitialized string offset {offset}"));
                        Ok(Value::string(""))
                    }
                }
            }
            Value::Null => Ok(Value::Null),
            other => {
                self.env.notice(format!(
                    "trying to access an offset on {}",
                    other.type_name()
                ));
                Ok(Value::Null)
            }
        }
    }

    /// Value assignment into an lvalue shape. Container bases vivify.
    pub(crate) fn assign(&mut self, target: holm_ir::ExprId, value: Value) -> EvalResult<()> {
        let Expr { kind, span } = *self.arena.expr(target);
        match kind {
            ExprKind::Var(name) => {
                self.env.get_var(name).set(value);
                Ok(())
            }
            ExprKind::ArrayGet { base, index } => {
                let key = match index {
                    Some(index) => match self.array_key(index)? {
                        Some(key) => Some(key),
                        // Illegal offset: the write is discarded.
                        None => return Ok(()),
                    },
                    None => None,
                };
                let base_cell = self.eval_array(base)?;
                base_cell.with_value_mut(|v| {
                    if let Value::Array(array) = v {
                        match key {
                            Some(key) => array.put(key, value),
                            None => {
                                array.append(value);
                            }
                        }
                    }
                });
                Ok(())
            }
            ExprKind::Field { base, name } => {
                let handle = self.eval_object_handle(base)?;
                if self.check_field_access(&handle, name) {
                    handle.put_field(name, value);
                }
                Ok(())
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.assign(inner, value)
            }
            other => Err(not_assignable(other.shape_name()).with_span(span)),
        }
    }

    /// Reference assignment: bind `cell` into the target lvalue shape.
    pub(crate) fn bind_ref(
        &mut self,
        target: holm_ir::ExprId,
        cell: holm_value::Var,
    ) -> EvalResult<()> {
        let Expr { kind, span } = *self.arena.expr(target);
        match kind {
            ExprKind::Var(name) => {
                self.env.bind_var(name, cell);
                Ok(())
            }
            ExprKind::ArrayGet { base, index } => {
                let key = match index {
                    Some(index) => match self.array_key(index)? {
                        Some(key) => Some(key),
                        None => return Ok(()),
                    },
                    None => None,
                };
                let base_cell = self.eval_array(base)?;
                base_cell.with_value_mut(|v| {
                    if let Value::Array(array) = v {
                        match key {
                            Some(key) => array.put_var(key, cell),
                            None => {
                                array.push_var(cell);
                            }
                        }
                    }
                });
                Ok(())
            }
            ExprKind::Field { base, name } => {
                let handle = self.eval_object_handle(base)?;
                if self.check_field_access(&handle, name) {
                    handle.put_field_var(name, cell);
                }
                Ok(())
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.bind_ref(inner, cell)
            }
            other => Err(not_assignable(other.shape_name()).with_span(span)),
        }
    }

    /// Field visibility gate; reports an access violation and returns
    /// false when the declared field is not visible from the current class.
    pub(crate) fn check_field_access(
        &self,
        handle: &holm_value::ObjectHandle,
        name: holm_ir::Name,
    ) -> bool {
        let classes = self.classes.read();
        match classes.field_declaration(handle.class_id(), name) {
            Some((declaring, visibility)) => {
                if classes.can_access(declaring, visibility, self.env.calling_class()) {
                    true
                } else {
                    drop(classes);
                    self.env.access_violation(format!(
                        "cannot access {} property {}",
                        visibility,
                        self.name_str(name)
                    ));
                    false
                }
            }
            // Undeclared (dynamic) fields are public.
            None => true,
        }
    }

}

/// Character at a string offset; negative offsets count from the end.
fn string_offset(s: &str, offset: i64) -> Option<char> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let index = if offset < 0 { len + offset } else { offset };
    if (0..len).contains(&index) {
        chars.get(index as usize).copied()
    } else {
        None
    }
}
