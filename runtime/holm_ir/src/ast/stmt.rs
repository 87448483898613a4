//! Statement nodes.

use std::fmt;

use super::arena::{ExprId, StmtId, StmtRange};
use crate::{Name, Span};

/// Statement node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Statement variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StmtKind {
    /// Expression statement (result discarded).
    Expr(ExprId),
    /// Sequential block.
    Block(StmtRange),
    /// `if (cond) then else`.
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    /// `while (cond) body`.
    While { cond: ExprId, body: StmtId },
    /// `return expr;` / `return;` (returns by value, copied).
    Return(Option<ExprId>),
    /// `global $x;` — aliases the global cell into the local table.
    Global(Name),
}
