//! Diagnostic system for the Holm runtime.
//!
//! Guest-level runtime conditions (coercion warnings, access violations,
//! notices) are not Rust errors: evaluation recovers locally and keeps
//! going. They are reported through this crate instead:
//!
//! - [`ErrorMask`] — PHP-style reporting mask; the `@` suppression operator
//!   temporarily clears it.
//! - [`Diagnostic`] — one reported condition with level, message, and span.
//! - [`DiagnosticQueue`] — collecting sink with an error limit and
//!   same-message deduplication.
//!
//! Hard errors (reference/addressability misuse, instantiation of an
//! abstract class) do not pass through here; they are `EvalError` values
//! propagated with `?`.

mod diagnostic;
mod level;
mod queue;

pub use diagnostic::Diagnostic;
pub use level::ErrorMask;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
