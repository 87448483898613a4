//! Holm IR - expression tree types for the Holm PHP-compatible runtime.
//!
//! This crate holds everything the evaluator consumes but never mutates:
//!
//! - `Expr`/`Stmt` nodes, arena-allocated and addressed by `ExprId`/`StmtId`
//!   indices (no `Box<Expr>`, contiguous arrays for cache locality)
//! - `Name` interned identifiers and the thread-safe `StringInterner`
//! - `Span` source locations
//! - Declaration-level types shared with the loader: `Param`, `Visibility`
//!
//! The arena is built once by the (external) parser and is read-only
//! afterward, so it can be shared across concurrently running execution
//! contexts behind an `Arc`.

mod ast;
mod interner;
mod name;
mod span;

pub use ast::{
    ArrayItem, BinaryOp, Expr, ExprArena, ExprId, ExprKind, ExprRange, ItemRange, Param, SharedArena,
    Stmt, StmtId, StmtKind, StmtRange, UnaryOp, Visibility,
};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
