//! Flat AST types using arena allocation.
//!
//! Nodes hold `ExprId`/`StmtId` indices into an [`ExprArena`] instead of
//! boxed children. The arena is immutable once the parser finishes, which is
//! what lets many execution contexts walk the same tree concurrently.
//!
//! # Module Structure
//!
//! - `expr`: expression nodes (`Expr`, `ExprKind`)
//! - `stmt`: statement nodes (`Stmt`, `StmtKind`)
//! - `operators`: binary and unary operators
//! - `arena`: the arena itself plus range types
//! - `items`: declaration-level types shared with the loader

mod arena;
mod expr;
mod items;
mod operators;
mod stmt;

pub use arena::{ExprArena, ExprId, ExprRange, ItemRange, SharedArena, StmtId, StmtRange};
pub use expr::{ArrayItem, Expr, ExprKind};
pub use items::{Param, Visibility};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{Stmt, StmtKind};
