//! Expression nodes.
//!
//! Every syntactic shape the evaluator dispatches on is a variant here.
//! The set is closed: the evaluator matches exhaustively, and each of its
//! evaluation modes documents which shapes it accepts.

use std::fmt;

use super::arena::{ExprId, ExprRange, ItemRange};
use super::operators::{BinaryOp, UnaryOp};
use crate::{Name, Span};

/// Expression node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// One element of an array literal: `key => value` or bare `value`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArrayItem {
    /// Key expression; `None` appends at the next integer key.
    pub key: Option<ExprId>,
    pub value: ExprId,
}

/// Expression variants.
///
/// All children are arena indices, not boxes. Float literals store raw bits
/// so the node stays `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    /// `null`
    Null,
    /// `true`, `false`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal (stored as bits for `Hash`).
    Float(u64),
    /// String literal (interned).
    Str(Name),

    /// Variable read/write: `$x`.
    Var(Name),
    /// Array index: `$a[$k]`; `index: None` is the append form `$a[]`.
    ArrayGet {
        base: ExprId,
        index: Option<ExprId>,
    },
    /// Object field: `$obj->name`.
    Field { base: ExprId, name: Name },

    /// Binary operator application.
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Unary operator application.
    Unary { op: UnaryOp, expr: ExprId },

    /// Value assignment: `$x = expr` (copies per value semantics).
    Assign { target: ExprId, value: ExprId },
    /// Reference assignment: `$x =& $y` (aliases the cell).
    AssignRef { target: ExprId, source: ExprId },

    /// Error suppression: `@expr`.
    Suppress(ExprId),
    /// `cond ? then : else`.
    Conditional {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },

    /// Named function call: `f(...)`.
    Call { name: Name, args: ExprRange },
    /// Call through a callable value: `$f(...)`.
    DynCall { callee: ExprId, args: ExprRange },
    /// Method call: `$obj->m(...)`.
    MethodCall {
        base: ExprId,
        name: Name,
        args: ExprRange,
    },
    /// Object construction: `new C(...)`.
    New { class: Name, args: ExprRange },
    /// `expr instanceof C`.
    InstanceOf { expr: ExprId, class: Name },

    /// `isset(expr)` — presence test, never vivifies.
    Isset(ExprId),
    /// `unset(expr)` — removal, no-op when absent.
    Unset(ExprId),
    /// `empty(expr)` — true when unset or falsy.
    Empty(ExprId),

    /// Array literal: `array(k => v, ...)`.
    ArrayLit(ItemRange),
}

impl ExprKind {
    /// Human-readable shape name for "not assignable" style diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            ExprKind::Null
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_) => "literal",
            ExprKind::Var(_) => "variable",
            ExprKind::ArrayGet { .. } => "array index",
            ExprKind::Field { .. } => "object field",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Assign { .. } | ExprKind::AssignRef { .. } => "assignment",
            ExprKind::Suppress(_) => "suppressed expression",
            ExprKind::Conditional { .. } => "conditional",
            ExprKind::Call { .. } | ExprKind::DynCall { .. } => "function call",
            ExprKind::MethodCall { .. } => "method call",
            ExprKind::New { .. } => "object construction",
            ExprKind::InstanceOf { .. } => "instanceof",
            ExprKind::Isset(_) => "isset",
            ExprKind::Unset(_) => "unset",
            ExprKind::Empty(_) => "empty",
            ExprKind::ArrayLit(_) => "array literal",
        }
    }
}
