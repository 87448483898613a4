//! Cell-producing modes: `eval_ref`, `eval_array`, `eval_object`,
//! `eval_arg`, and the non-vivifying `eval_isset` / `eval_unset`.
//!
//! The write-intent modes (`eval_ref`, `eval_array`, `eval_object`)
//! vivify: a null base becomes an empty array or a base-class object so
//! the pending write has somewhere to land. A scalar base does not
//! vivify; the write is diverted into a detached cell and discarded, with
//! a warning. The presence modes never vivify anything.

use holm_ir::{Expr, ExprId, ExprKind};
use holm_value::errors::{not_a_reference, not_assignable, EvalResult};
use holm_value::{ClassId, ObjectHandle, Value, Var};

use super::{Argument, Interpreter};

impl Interpreter<'_> {
    /// Addressable cell for aliasing (`=&`, by-reference arguments).
    ///
    /// Marks the cell referenced, switching its array slot (if any) to
    /// share-by-handle under the array copy rule. Non-addressable shapes
    /// are a hard error regardless of the suppression mask.
    pub fn eval_ref(&mut self, id: ExprId) -> EvalResult<Var> {
        let cell = self.ref_cell(id)?;
        cell.mark_referenced();
        Ok(cell)
    }

    fn ref_cell(&mut self, id: ExprId) -> EvalResult<Var> {
        let Expr { kind, span } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => Ok(self.env.get_var(name)),
            ExprKind::ArrayGet { base, index } => {
                let key = match index {
                    Some(index) => self.array_key(index)?,
                    None => None,
                };
                let parent = self.eval_array(base)?;
                let cell = parent.with_value_mut(|v| match v {
                    Value::Array(array) => Some(match key {
                        Some(key) => array.get_var(key),
                        None => array.append_var(),
                    }),
                    _ => None,
                });
                // eval_array guarantees an array; the fallback is a
                // detached cell for the diverted-write case.
                Ok(cell.unwrap_or_else(Var::null))
            }
            ExprKind::Field { base, name } => {
                let handle = self.eval_object_handle(base)?;
                if !self.check_field_access(&handle, name) {
                    // Detached cell: the alias works but never sees the field.
                    return Ok(Var::null());
                }
                Ok(handle.field_var(name))
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.ref_cell(inner)
            }
            other => Err(not_a_reference(other.shape_name()).with_span(span)),
        }
    }

    /// Container cell for a pending array write (`$a[k] = v` chains).
    ///
    /// The returned cell always holds an array: null vivifies, a scalar
    /// diverts to a detached array with a warning. Does not mark the cell
    /// referenced; a plain element write is not an alias.
    pub fn eval_array(&mut self, id: ExprId) -> EvalResult<Var> {
        let Expr { kind, span } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => {
                let cell = self.env.get_var(name);
                Ok(self.vivify_array(cell))
            }
            ExprKind::ArrayGet { base, index } => {
                let key = match index {
                    Some(index) => self.array_key(index)?,
                    None => None,
                };
                let parent = self.eval_array(base)?;
                let cell = parent.with_value_mut(|v| match v {
                    Value::Array(array) => Some(match key {
                        Some(key) => array.get_var(key),
                        None => array.append_var(),
                    }),
                    _ => None,
                });
                match cell {
                    Some(cell) => Ok(self.vivify_array(cell)),
                    None => Ok(Var::new(Value::empty_array())),
                }
            }
            ExprKind::Field { base, name } => {
                let handle = self.eval_object_handle(base)?;
                if !self.check_field_access(&handle, name) {
                    return Ok(Var::new(Value::empty_array()));
                }
                let cell = handle.field_var(name);
                Ok(self.vivify_array(cell))
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.eval_array(inner)
            }
            other => Err(not_a_reference(other.shape_name()).with_span(span)),
        }
    }

    fn vivify_array(&mut self, cell: Var) -> Var {
        enum State {
            Ready,
            Vivify,
            Scalar(&'static str),
        }
        let state = cell.with_value(|v| match v {
            Value::Array(_) => State::Ready,
            Value::Null => State::Vivify,
            other => State::Scalar(other.type_name()),
        });
        match state {
            State::Ready => cell,
            State::Vivify => {
                cell.set(Value::empty_array());
                cell
            }
            State::Scalar(type_name) => {
                self.env
                    .warning(format!("cannot use a {type_name} value as an array"));
                // Detached target: the write happens but is unobservable.
                Var::new(Value::empty_array())
            }
        }
    }

    /// Object handle for a pending field write (`$o->f = v` chains).
    ///
    /// A null base vivifies to a fresh base-class instance, with a notice.
    pub fn eval_object(&mut self, id: ExprId) -> EvalResult<Var> {
        let Expr { kind, span } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => {
                let cell = self.env.get_var(name);
                self.vivify_object(&cell);
                Ok(cell)
            }
            ExprKind::ArrayGet { .. } | ExprKind::Field { .. } => {
                let handle = self.eval_object_handle(id)?;
                Ok(Var::new(Value::object(handle)))
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.eval_object(inner)
            }
            other => Err(not_assignable(other.shape_name()).with_span(span)),
        }
    }

    /// Resolve the base of a field write to an object handle, vivifying.
    pub(crate) fn eval_object_handle(&mut self, id: ExprId) -> EvalResult<ObjectHandle> {
        let Expr { kind, span } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => {
                let cell = self.env.get_var(name);
                Ok(self.vivify_object(&cell))
            }
            ExprKind::ArrayGet { base, index } => {
                let key = match index {
                    Some(index) => self.array_key(index)?,
                    None => None,
                };
                let parent = self.eval_array(base)?;
                let cell = parent.with_value_mut(|v| match v {
                    Value::Array(array) => Some(match key {
                        Some(key) => array.get_var(key),
                        None => array.append_var(),
                    }),
                    _ => None,
                });
                match cell {
                    Some(cell) => Ok(self.vivify_object(&cell)),
                    None => Ok(ObjectHandle::new(ClassId::BASE)),
                }
            }
            ExprKind::Field { base, name } => {
                let handle = self.eval_object_handle(base)?;
                if !self.check_field_access(&handle, name) {
                    return Ok(ObjectHandle::new(ClassId::BASE));
                }
                let cell = handle.field_var(name);
                Ok(self.vivify_object(&cell))
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.eval_object_handle(inner)
            }
            // Rvalue shapes that may already hold an object (`(new C)->f`,
            // call results) evaluate normally.
            ExprKind::New { .. }
            | ExprKind::Call { .. }
            | ExprKind::DynCall { .. }
            | ExprKind::MethodCall { .. }
            | ExprKind::Conditional { .. } => match self.eval(id)? {
                Value::Object(handle) => Ok(handle),
                other => {
                    self.env.warning(format!(
                        "attempt to write a property of {}",
                        other.type_name()
                    ));
                    Ok(ObjectHandle::new(ClassId::BASE))
                }
            },
            other => Err(not_assignable(other.shape_name()).with_span(span)),
        }
    }

    fn vivify_object(&mut self, cell: &Var) -> ObjectHandle {
        enum State {
            Ready(ObjectHandle),
            Vivify,
            Scalar(&'static str),
        }
        let state = cell.with_value(|v| match v {
            Value::Object(handle) => State::Ready(handle.clone()),
            Value::Null => State::Vivify,
            other => State::Scalar(other.type_name()),
        });
        match state {
            State::Ready(handle) => handle,
            State::Vivify => {
                self.env.notice("creating default object from empty value");
                let handle = ObjectHandle::new(ClassId::BASE);
                cell.set(Value::object(handle.clone()));
                handle
            }
            State::Scalar(type_name) => {
                self.env.warning(format!(
                    "attempt to write a property of {type_name} value"
                ));
                // Detached instance; the write is unobservable.
                ObjectHandle::new(ClassId::BASE)
            }
        }
    }

    /// Evaluate one actual argument.
    ///
    /// A by-reference parameter takes the cell; at the top level a
    /// non-addressable actual is a hard error, nested ones degrade to a
    /// copy with a warning. By-value parameters get an assignment copy.
    pub fn eval_arg(&mut self, id: ExprId, by_ref: bool, is_top: bool) -> EvalResult<Argument> {
        if !by_ref {
            return Ok(Argument::ByVal(self.eval_copy(id)?));
        }
        match self.eval_ref(id) {
            Ok(cell) => Ok(Argument::ByRef(cell)),
            Err(err) => {
                if is_top {
                    Err(err)
                } else {
                    self.env
                        .warning("passing a temporary where a reference is expected");
                    Ok(Argument::ByVal(self.eval_copy(id)?))
                }
            }
        }
    }

    /// `isset` semantics: defined and non-null, without vivifying.
    pub fn eval_isset(&mut self, id: ExprId) -> EvalResult<bool> {
        Ok(self.peek(id)?.is_some_and(|value| !value.is_null()))
    }

    /// Non-vivifying lookup backing `isset`/`empty`. `None` means the
    /// chain broke before producing a value.
    pub(crate) fn peek(&mut self, id: ExprId) -> EvalResult<Option<Value>> {
        let Expr { kind, .. } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => Ok(self.env.lookup(name).map(|cell| cell.get())),
            ExprKind::ArrayGet { base, index } => {
                let Some(index) = index else {
                    return Ok(None);
                };
                let Some(base_value) = self.peek(base)? else {
                    return Ok(None);
                };
                let key_value = self.eval(index)?;
                match base_value {
                    Value::Array(array) => {
                        Ok(holm_value::ArrayKey::normalize(&key_value)
                            .and_then(|key| array.get(&key)))
                    }
                    Value::Str(s) => {
                        let offset = key_value.to_int();
                        let len = s.chars().count() as i64;
                        let index = if offset < 0 { len + offset } else { offset };
                        if (0..len).contains(&index) {
                            Ok(s
                                .chars()
                                .nth(index as usize)
                                .map(|ch| Value::string(ch.to_string())))
                        } else {
                            Ok(None)
                        }
                    }
                    _ => Ok(None),
                }
            }
            ExprKind::Field { base, name } => match self.peek(base)? {
                Some(Value::Object(handle)) => Ok(handle.get_field(name)),
                _ => Ok(None),
            },
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.peek(inner)
            }
            _ => Ok(Some(self.eval(id)?)),
        }
    }

    /// `unset` semantics: remove the binding/entry/field. Absent targets
    /// are a no-op; nothing vivifies along the way.
    pub fn eval_unset(&mut self, id: ExprId) -> EvalResult<()> {
        let Expr { kind, span } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => {
                self.env.unset_var(name);
                Ok(())
            }
            ExprKind::ArrayGet { base, index } => {
                let Some(index) = index else {
                    self.env
                        .warning_at("cannot unset an append expression", span);
                    return Ok(());
                };
                let Some(key) = self.array_key(index)? else {
                    return Ok(());
                };
                if let Some(parent) = self.unset_cell(base)? {
                    parent.with_value_mut(|v| {
                        if let Value::Array(array) = v {
                            array.remove(&key);
                        }
                    });
                }
                Ok(())
            }
            ExprKind::Field { base, name } => {
                if let Some(Value::Object(handle)) = self.peek(base)? {
                    if self.check_field_access(&handle, name) {
                        handle.remove_field(name);
                    }
                }
                Ok(())
            }
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.eval_unset(inner)
            }
            other => Err(not_assignable(other.shape_name()).with_span(span)),
        }
    }

    /// Cell of the parent container for an unset target: existing entries
    /// only, but copy-on-write still applies because the caller mutates
    /// through the cell.
    fn unset_cell(&mut self, id: ExprId) -> EvalResult<Option<Var>> {
        let Expr { kind, .. } = *self.arena.expr(id);
        match kind {
            ExprKind::Var(name) => Ok(self.env.lookup(name)),
            ExprKind::ArrayGet { base, index } => {
                let Some(index) = index else {
                    return Ok(None);
                };
                let Some(key) = self.array_key(index)? else {
                    return Ok(None);
                };
                let Some(parent) = self.unset_cell(base)? else {
                    return Ok(None);
                };
                Ok(parent.with_value_mut(|v| match v {
                    Value::Array(array) => array.existing_var(&key),
                    _ => None,
                }))
            }
            ExprKind::Field { base, name } => match self.peek(base)? {
                Some(Value::Object(handle)) => {
                    if !self.check_field_access(&handle, name) {
                        return Ok(None);
                    }
                    Ok(handle.existing_field_var(name))
                }
                _ => Ok(None),
            },
            ExprKind::Suppress(inner) => {
                let _guard = self.env.suppress();
                self.unset_cell(inner)
            }
            _ => Ok(None),
        }
    }
}
