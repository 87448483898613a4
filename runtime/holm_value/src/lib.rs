//! Holm Value - runtime data model for the Holm PHP-compatible runtime.
//!
//! # Architecture
//!
//! - [`Value`]: the tagged runtime datum (null, bool, int, float, string,
//!   array, object, callable) with conversion and loose-comparison rules
//! - [`Var`]: the addressable variable cell; arrays and object fields store
//!   cells, not raw values, so aliasing (`=&`) works uniformly everywhere
//! - [`ArrayValue`]: insertion-ordered key/cell container with lazy
//!   copy-on-write duplication that keeps aliased cells shared
//! - [`ObjectHandle`]: reference-semantics object with an ordered field map
//! - [`EvalError`]: hard (non-recoverable, non-suppressible) evaluation
//!   errors with factory constructors
//!
//! Recoverable conditions (coercion warnings, access violations) are *not*
//! errors at this layer: conversions here are total and pure, and the
//! evaluator decides what to report through its diagnostic channel.
//!
//! # Sharing model
//!
//! All cells use `Rc` — a value graph belongs to exactly one execution
//! context. Cloning a `Var` clones the handle (that *is* aliasing); cloning
//! an `ArrayValue` is the lazy assignment copy that diverges on first write.

mod array;
mod cell;
mod compare;
pub mod errors;
mod object;
mod value;

pub use array::{ArrayKey, ArrayValue};
pub use cell::{LocalCell, Var};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use object::{ClassId, ObjectHandle};
pub use value::{CallableValue, Number, Value};
