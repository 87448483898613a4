//! Arena storage for expression and statement nodes.

use std::sync::Arc;

use super::expr::{ArrayItem, Expr, ExprKind};
use super::stmt::{Stmt, StmtKind};
use crate::Span;

/// Index of an expression in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ExprId(u32);

/// Index of a statement in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct StmtId(u32);

/// Contiguous run of call-argument expression ids.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExprRange {
    start: u32,
    len: u32,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    pub fn len(self) -> usize {
        self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Contiguous run of array-literal items.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ItemRange {
    start: u32,
    len: u32,
}

impl ItemRange {
    pub const EMPTY: ItemRange = ItemRange { start: 0, len: 0 };
}

/// Contiguous run of statement ids (block bodies).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StmtRange {
    start: u32,
    len: u32,
}

impl StmtRange {
    pub const EMPTY: StmtRange = StmtRange { start: 0, len: 0 };
}

/// Arena holding every node of a compiled source unit.
///
/// Append-only while the parser runs; the evaluator only reads. Out-of-range
/// ids resolve to a `Null` literal / empty block rather than panicking — ids
/// are only ever produced by the arena itself, so that path is a parser bug,
/// not a runtime condition worth unwinding for.
#[derive(Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    args: Vec<ExprId>,
    items: Vec<ArrayItem>,
    stmt_lists: Vec<StmtId>,
}

/// Shared, read-only handle to a finished arena.
pub type SharedArena = Arc<ExprArena>;

const NULL_EXPR: Expr = Expr {
    kind: ExprKind::Null,
    span: Span::NONE,
};

const EMPTY_STMT: Stmt = Stmt {
    kind: StmtKind::Block(StmtRange::EMPTY),
    span: Span::NONE,
};

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression with an explicit span.
    pub fn add_expr_at(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(Expr::new(kind, span));
        id
    }

    /// Allocate an expression with no source location (synthesized nodes, tests).
    pub fn add_expr(&mut self, kind: ExprKind) -> ExprId {
        self.add_expr_at(kind, Span::NONE)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        self.exprs.get(id.0 as usize).unwrap_or(&NULL_EXPR)
    }

    /// Allocate a statement with an explicit span.
    pub fn add_stmt_at(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(u32::try_from(self.stmts.len()).unwrap_or(u32::MAX));
        self.stmts.push(Stmt::new(kind, span));
        id
    }

    /// Allocate a statement with no source location.
    pub fn add_stmt(&mut self, kind: StmtKind) -> StmtId {
        self.add_stmt_at(kind, Span::NONE)
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        self.stmts.get(id.0 as usize).unwrap_or(&EMPTY_STMT)
    }

    /// Store a call-argument list, returning its range.
    pub fn add_args(&mut self, ids: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = u32::try_from(self.args.len()).unwrap_or(u32::MAX);
        self.args.extend(ids);
        let end = u32::try_from(self.args.len()).unwrap_or(u32::MAX);
        ExprRange {
            start,
            len: end.saturating_sub(start),
        }
    }

    pub fn args(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        let end = start.saturating_add(range.len as usize);
        self.args.get(start..end).unwrap_or(&[])
    }

    /// Store an array-literal item list, returning its range.
    pub fn add_items(&mut self, items: impl IntoIterator<Item = ArrayItem>) -> ItemRange {
        let start = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        self.items.extend(items);
        let end = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        ItemRange {
            start,
            len: end.saturating_sub(start),
        }
    }

    pub fn items(&self, range: ItemRange) -> &[ArrayItem] {
        let start = range.start as usize;
        let end = start.saturating_add(range.len as usize);
        self.items.get(start..end).unwrap_or(&[])
    }

    /// Store a statement list (block body), returning its range.
    pub fn add_stmt_list(&mut self, ids: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = u32::try_from(self.stmt_lists.len()).unwrap_or(u32::MAX);
        self.stmt_lists.extend(ids);
        let end = u32::try_from(self.stmt_lists.len()).unwrap_or(u32::MAX);
        StmtRange {
            start,
            len: end.saturating_sub(start),
        }
    }

    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        let end = start.saturating_add(range.len as usize);
        self.stmt_lists.get(start..end).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn expr_roundtrip() {
        let mut arena = ExprArena::new();
        let id = arena.add_expr(ExprKind::Int(7));
        assert_eq!(arena.expr(id).kind, ExprKind::Int(7));
    }

    #[test]
    fn args_roundtrip_preserves_order() {
        let mut arena = ExprArena::new();
        let a = arena.add_expr(ExprKind::Int(1));
        let b = arena.add_expr(ExprKind::Int(2));
        let range = arena.add_args([a, b]);
        assert_eq!(arena.args(range), &[a, b]);
    }

    #[test]
    fn empty_ranges() {
        let arena = ExprArena::new();
        assert!(arena.args(ExprRange::EMPTY).is_empty());
        assert!(arena.stmt_list(StmtRange::EMPTY).is_empty());
        assert!(arena.items(ItemRange::EMPTY).is_empty());
    }

    #[test]
    fn out_of_range_id_is_null_literal() {
        let arena = ExprArena::new();
        assert_eq!(arena.expr(ExprId(42)).kind, ExprKind::Null);
    }
}
