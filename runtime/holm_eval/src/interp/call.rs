//! Call dispatch: named calls, callable values, methods, construction.
//!
//! Binding runs in two phases. Actuals are evaluated in the caller's
//! context (by-reference parameters take the cell via `eval_ref`, the
//! rest get assignment copies); defaults for omitted parameters are then
//! evaluated in the callee's own context, in parameter order. Native
//! functions marshal instead of binding and run against the caller's
//! context directly.

use holm_ir::{ExprId, Name, Span};
use holm_value::errors::{
    not_callable, stack_overflow, undefined_class, undefined_function, undefined_method,
    EvalResult,
};
use holm_value::{ArrayValue, ObjectHandle, Value, Var};
use smallvec::SmallVec;

use super::{Argument, Flow, Interpreter};
use crate::function::{FunctionFlags, FunctionId, FunctionKind};
use crate::marshal::{Marshal, NativeArg};

impl Interpreter<'_> {
    /// `f(...)` — call a function by name.
    pub fn call_named(&mut self, name: Name, args: &[ExprId], span: Span) -> EvalResult {
        let id = self
            .functions
            .read()
            .lookup(self.interner, name)
            .ok_or_else(|| undefined_function(self.name_str(name)).with_span(span))?;
        self.invoke(id, None, args)
    }

    /// `$f(...)` — call through an evaluated callable value.
    pub fn call_value(&mut self, callee: &Value, args: &[ExprId], span: Span) -> EvalResult {
        match callee {
            Value::Callable(callable) => match &callable.receiver {
                Some(receiver) => {
                    self.dispatch_method(receiver.clone(), callable.function, args, span)
                }
                None => self.call_named(callable.function, args, span),
            },
            Value::Str(name) => {
                let name = self.interner.intern(name);
                self.call_named(name, args, span)
            }
            other => Err(not_callable(other.type_name()).with_span(span)),
        }
    }

    /// `$obj->m(...)` — method call with receiver binding.
    pub fn call_method(
        &mut self,
        base: ExprId,
        name: Name,
        args: &[ExprId],
        span: Span,
    ) -> EvalResult {
        let base_value = self.eval(base)?;
        let Value::Object(receiver) = base_value else {
            self.env.warning_at(
                format!("method call on {}", base_value.type_name()),
                span,
            );
            return Ok(Value::Null);
        };
        self.dispatch_method(receiver, name, args, span)
    }

    fn dispatch_method(
        &mut self,
        receiver: ObjectHandle,
        name: Name,
        args: &[ExprId],
        span: Span,
    ) -> EvalResult {
        let resolved = self
            .classes
            .read()
            .resolve_method(self.interner, receiver.class_id(), name);
        let Some((declaring, id)) = resolved else {
            let class = self
                .classes
                .read()
                .name_of(self.interner, receiver.class_id());
            return Err(undefined_method(class, self.name_str(name)).with_span(span));
        };
        let visibility = self.fetch_function(id)?.visibility;
        let accessible =
            self.classes
                .read()
                .can_access(declaring, visibility, self.env.calling_class());
        if !accessible {
            let class = self.classes.read().name_of(self.interner, declaring);
            self.env.access_violation(format!(
                "cannot call {visibility} method {class}::{}()",
                self.name_str(name)
            ));
            return Ok(Value::Null);
        }
        self.invoke(id, Some(receiver), args)
    }

    /// `new C(...)` — the single construction entry point: instantiability
    /// check, field defaults (ancestors first), then the constructor.
    pub fn instantiate(&mut self, class: Name, args: &[ExprId], span: Span) -> EvalResult {
        let id = self
            .classes
            .read()
            .lookup(self.interner, class)
            .ok_or_else(|| undefined_class(self.name_str(class)).with_span(span))?;
        self.classes.read().check_instantiable(self.interner, id)?;

        let handle = ObjectHandle::new(id);
        let fields = self.classes.read().fields_in_init_order(id);
        for field in fields {
            let value = match field.default {
                Some(expr) => self.eval_copy(expr)?,
                None => Value::Null,
            };
            handle.put_field(field.name, value);
        }

        // Drop the registry guard before re-entering the evaluator.
        let constructor = self.classes.read().resolve_constructor(id);
        match constructor {
            Some((_, constructor)) => {
                self.invoke(constructor, Some(handle.clone()), args)?;
            }
            None => {
                // No constructor: arguments still evaluate for effect.
                for &arg in args {
                    self.eval(arg)?;
                }
            }
        }
        Ok(Value::object(handle))
    }

    /// Invoke a resolved function with receiver and actual expressions.
    pub fn invoke(
        &mut self,
        id: FunctionId,
        receiver: Option<ObjectHandle>,
        args: &[ExprId],
    ) -> EvalResult {
        if self.depth >= self.max_depth {
            return Err(stack_overflow(self.max_depth));
        }
        let function = self.fetch_function(id)?;
        tracing::trace!(
            function = %self.name_str(function.name),
            depth = self.depth,
            args = args.len(),
            "call"
        );
        match function.kind.clone() {
            FunctionKind::Guest { body } => self.invoke_guest(&function, body, receiver, args),
            FunctionKind::Native { entry, marshals } => {
                self.invoke_native(&function, entry, &marshals, args)
            }
        }
    }

    fn invoke_guest(
        &mut self,
        function: &crate::function::Function,
        body: holm_ir::StmtId,
        receiver: Option<ObjectHandle>,
        args: &[ExprId],
    ) -> EvalResult {
        let fixed = function.fixed_arity();
        let variadic = function.variadic_param().copied();

        if args.len() > fixed && variadic.is_none() {
            self.env.warning(format!(
                "{}() expects at most {} arguments, {} given",
                self.name_str(function.name),
                fixed,
                args.len()
            ));
            return Ok(Value::Null);
        }

        // Phase 1: evaluate provided actuals in the caller's context.
        let mut provided: SmallVec<[Option<Argument>; 4]> = SmallVec::new();
        for (position, param) in function.params.iter().take(fixed).enumerate() {
            match args.get(position) {
                Some(&expr) => provided.push(Some(self.eval_arg(expr, param.by_ref, true)?)),
                None => provided.push(None),
            }
        }
        let rest = match variadic {
            Some(param) => {
                let mut rest = ArrayValue::new();
                for &expr in args.iter().skip(fixed) {
                    if param.by_ref {
                        let cell = self.eval_ref(expr)?;
                        rest.push_var(cell);
                    } else {
                        rest.append(self.eval_copy(expr)?);
                    }
                }
                Some(rest)
            }
            None => None,
        };

        // Phase 2: bind into the callee's context; defaults evaluate there.
        let mut env = self.env.child();
        env.set_this(receiver.clone());
        env.set_calling_class(function.declaring_class);
        if let Some(object) = receiver {
            let this = self.interner.intern("this");
            env.bind_var(this, Var::new(Value::object(object)));
        }
        if function.flags.contains(FunctionFlags::USES_CALLER_SYMBOLS) {
            env.set_caller_symbols(Some(self.env.symbols_snapshot()));
        }
        let mut callee = self.child_frame(env);

        for (position, param) in function.params.iter().take(fixed).enumerate() {
            let argument = provided.get_mut(position).and_then(Option::take);
            let cell = match argument {
                Some(Argument::ByRef(cell)) => cell,
                Some(Argument::ByVal(value)) => Var::new(value),
                None => match param.default {
                    Some(default) => Var::new(callee.eval_copy(default)?),
                    None => {
                        callee.env.warning(format!(
                            "missing argument {} (${}) for {}()",
                            position + 1,
                            callee.name_str(param.name),
                            callee.name_str(function.name)
                        ));
                        Var::null()
                    }
                },
            };
            callee.env.bind_var(param.name, cell);
        }
        if let Some(param) = variadic {
            callee
                .env
                .bind_var(param.name, Var::new(Value::Array(rest.unwrap_or_default())));
        }

        let result = match callee.exec(body)? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Null,
        };
        callee.env.close();
        Ok(result)
    }

    fn invoke_native(
        &mut self,
        function: &crate::function::Function,
        entry: crate::marshal::NativeFn,
        marshals: &crate::marshal::MarshalSet,
        args: &[ExprId],
    ) -> EvalResult {
        let mut native_args: SmallVec<[NativeArg; 4]> = SmallVec::new();
        for (position, param) in function.params.iter().enumerate() {
            let marshal = marshals.param(position);
            let argument = match args.get(position) {
                Some(&expr) => {
                    let by_ref = param.by_ref || marshal == Marshal::Reference;
                    self.eval_arg(expr, by_ref, true)?
                }
                None => match param.default {
                    Some(default) => Argument::ByVal(self.eval_copy(default)?),
                    None => {
                        self.env.warning(format!(
                            "missing argument {} (${}) for {}()",
                            position + 1,
                            self.name_str(param.name),
                            self.name_str(function.name)
                        ));
                        Argument::ByVal(Value::Null)
                    }
                },
            };
            let param_name = self.name_str(param.name);
            native_args.push(marshal.marshal(&mut self.env, &param_name, argument)?);
        }
        // Surplus actuals pass through raw; natives may be variadic.
        for &expr in args.iter().skip(function.params.len()) {
            native_args.push(NativeArg::Val(self.eval(expr)?));
        }

        if function.flags.contains(FunctionFlags::USES_CALLER_SYMBOLS) {
            let snapshot = self.env.symbols_snapshot();
            self.env.set_caller_symbols(Some(snapshot));
        }
        let result = entry(&mut self.env, &native_args);
        self.env.set_caller_symbols(None);
        Ok(marshals.ret.unmarshal_return(result?))
    }
}
