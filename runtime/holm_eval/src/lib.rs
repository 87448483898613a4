//! Evaluator for the Holm PHP-compatible runtime.
//!
//! This crate executes the `holm_ir` expression tree over `holm_value`
//! values with the guest language's semantics:
//!
//! - [`Env`] — execution context: per-call locals, request-shared globals,
//!   diagnostics with an error mask, and resource cleanup
//! - [`Interpreter`] — multi-mode tree-walking evaluation (`eval`,
//!   `eval_bool`, `eval_copy`, `eval_ref`, `eval_array`, `eval_object`,
//!   `eval_arg`, `eval_isset`, `eval_unset`)
//! - [`FunctionRegistry`] / [`ClassRegistry`] — process-shared definition
//!   tables behind [`SharedRegistry`]
//! - [`Marshal`] — guest/native argument conversion with overload ranking
//!
//! Recoverable guest conditions (coercions, access violations, missing
//! reads) go through the context's diagnostic channel; structural misuse
//! of the protocol is an [`errors::EvalError`] propagated with `?`.

pub mod class;
pub mod env;
pub mod function;
pub mod interp;
pub mod marshal;
pub mod operators;
pub mod shared;
pub mod stack;

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;

pub use class::{ClassDef, ClassFlags, ClassRegistry, ClassSpec, FieldDef};
pub use env::{CleanupError, CleanupHandle, Env, EnvCleanup, RequestState, SuppressGuard};
pub use function::{Function, FunctionFlags, FunctionId, FunctionKind, FunctionRegistry, LookupPolicy};
pub use interp::{Argument, Flow, Interpreter, DEFAULT_MAX_CALL_DEPTH};
pub use marshal::{Marshal, MarshalSet, NativeArg, NativeFn};
pub use shared::SharedRegistry;

/// Hard-error types, re-exported from the value crate where they live.
pub mod errors {
    pub use holm_value::errors::*;
}
