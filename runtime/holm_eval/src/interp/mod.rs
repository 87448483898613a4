//! The tree-walking evaluator.
//!
//! One [`Interpreter`] is one call frame: it borrows the (read-only) arena
//! and interner, holds clonable handles to the shared registries, and owns
//! its [`Env`]. Calls build a child interpreter over a child env.
//!
//! Evaluation is multi-mode. Each mode accepts the node shapes it
//! documents and has its own vivification behavior:
//!
//! - `eval` / `eval_bool` / `eval_copy` — rvalue reads
//! - `eval_ref` — addressable cell, marks it referenced
//! - `eval_array` / `eval_object` — container cell for a pending write,
//!   vivifying null bases
//! - `eval_arg` — actual-argument evaluation, by-value or by-reference
//! - `eval_isset` / `eval_unset` — never vivify
//!
//! Submodules split the modes: `expr` (rvalue), `lvalue` (cells and
//! vivification), `stmt` (statements), `call` (dispatch and binding).

mod call;
mod expr;
mod lvalue;
mod stmt;

pub use stmt::Flow;

use holm_ir::{ExprArena, ExprId, StringInterner};
use holm_value::errors::EvalResult;
use holm_value::{ArrayKey, Value, Var};

use crate::class::ClassRegistry;
use crate::env::Env;
use crate::function::{Function, FunctionId, FunctionRegistry};
use crate::shared::SharedRegistry;

/// Default call-depth limit.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// One evaluated actual argument, ready for parameter binding.
#[derive(Clone, Debug)]
pub enum Argument {
    /// Copied value for a by-value parameter.
    ByVal(Value),
    /// The caller's cell for a by-reference parameter.
    ByRef(Var),
}

impl Argument {
    /// Current value, whichever way it was bound.
    pub fn value(&self) -> Value {
        match self {
            Argument::ByVal(value) => value.clone(),
            Argument::ByRef(cell) => cell.get(),
        }
    }
}

/// One call frame of evaluation.
pub struct Interpreter<'a> {
    pub(crate) arena: &'a ExprArena,
    pub(crate) interner: &'a StringInterner,
    pub(crate) functions: SharedRegistry<FunctionRegistry>,
    pub(crate) classes: SharedRegistry<ClassRegistry>,
    pub env: Env,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        arena: &'a ExprArena,
        interner: &'a StringInterner,
        functions: SharedRegistry<FunctionRegistry>,
        classes: SharedRegistry<ClassRegistry>,
    ) -> Self {
        Self::with_env(arena, interner, functions, classes, Env::new())
    }

    pub fn with_env(
        arena: &'a ExprArena,
        interner: &'a StringInterner,
        functions: SharedRegistry<FunctionRegistry>,
        classes: SharedRegistry<ClassRegistry>,
        env: Env,
    ) -> Self {
        Interpreter {
            arena,
            interner,
            functions,
            classes,
            env,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Frame for a callee: fresh locals, shared request state and
    /// registries, depth one deeper.
    pub(crate) fn child_frame(&self, env: Env) -> Interpreter<'a> {
        Interpreter {
            arena: self.arena,
            interner: self.interner,
            functions: self.functions.clone(),
            classes: self.classes.clone(),
            env,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }

    /// Resolve an interned name for a message.
    pub(crate) fn name_str(&self, name: holm_ir::Name) -> String {
        self.interner.resolve(name).to_string()
    }

    pub(crate) fn fetch_function(&self, id: FunctionId) -> EvalResult<Function> {
        self.functions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| holm_value::errors::EvalError::new("function id out of range"))
    }

    /// Evaluate and normalize an index expression to an array key.
    /// `None` (with a warning) for the illegal offset types.
    pub(crate) fn array_key(&mut self, index: ExprId) -> EvalResult<Option<ArrayKey>> {
        let value = self.eval(index)?;
        match ArrayKey::normalize(&value) {
            Some(key) => Ok(Some(key)),
            None => {
                self.env
                    .warning(format!("illegal offset type: {}", value.type_name()));
                Ok(None)
            }
        }
    }
}
