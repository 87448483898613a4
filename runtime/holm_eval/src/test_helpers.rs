//! Shared fixture for evaluator tests: an arena-plus-registries bundle
//! with shorthand constructors for common node shapes. Tests build their
//! expression ids first, then borrow an [`Interpreter`] to run them.

use holm_ir::{
    ArrayItem, BinaryOp, ExprArena, ExprId, ExprKind, Name, StmtId, StmtKind, StringInterner,
};

use crate::class::ClassRegistry;
use crate::function::FunctionRegistry;
use crate::interp::Interpreter;
use crate::shared::SharedRegistry;

pub struct Harness {
    pub arena: ExprArena,
    pub interner: StringInterner,
    pub functions: SharedRegistry<FunctionRegistry>,
    pub classes: SharedRegistry<ClassRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let classes = SharedRegistry::new(ClassRegistry::new(&interner));
        Harness {
            arena: ExprArena::new(),
            interner,
            functions: SharedRegistry::new(FunctionRegistry::new()),
            classes,
        }
    }

    pub fn interp(&self) -> Interpreter<'_> {
        Interpreter::new(
            &self.arena,
            &self.interner,
            self.functions.clone(),
            self.classes.clone(),
        )
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    // Expression shorthand

    pub fn null(&mut self) -> ExprId {
        self.arena.add_expr(ExprKind::Null)
    }

    pub fn int(&mut self, v: i64) -> ExprId {
        self.arena.add_expr(ExprKind::Int(v))
    }

    pub fn str_lit(&mut self, s: &str) -> ExprId {
        let name = self.interner.intern(s);
        self.arena.add_expr(ExprKind::Str(name))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        let name = self.interner.intern(name);
        self.arena.add_expr(ExprKind::Var(name))
    }

    pub fn index(&mut self, base: ExprId, key: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::ArrayGet {
            base,
            index: Some(key),
        })
    }

    pub fn append_at(&mut self, base: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::ArrayGet { base, index: None })
    }

    pub fn field(&mut self, base: ExprId, name: &str) -> ExprId {
        let name = self.interner.intern(name);
        self.arena.add_expr(ExprKind::Field { base, name })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::Assign { target, value })
    }

    pub fn assign_ref(&mut self, target: ExprId, source: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::AssignRef { target, source })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::Binary { op, lhs, rhs })
    }

    pub fn suppress(&mut self, inner: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::Suppress(inner))
    }

    pub fn isset(&mut self, inner: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::Isset(inner))
    }

    pub fn unset(&mut self, inner: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::Unset(inner))
    }

    pub fn empty(&mut self, inner: ExprId) -> ExprId {
        self.arena.add_expr(ExprKind::Empty(inner))
    }

    pub fn array_lit(&mut self, items: Vec<(Option<ExprId>, ExprId)>) -> ExprId {
        let items: Vec<ArrayItem> = items
            .into_iter()
            .map(|(key, value)| ArrayItem { key, value })
            .collect();
        let range = self.arena.add_items(items);
        self.arena.add_expr(ExprKind::ArrayLit(range))
    }

    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let name = self.interner.intern(name);
        let args = self.arena.add_args(args);
        self.arena.add_expr(ExprKind::Call { name, args })
    }

    pub fn method_call(&mut self, base: ExprId, name: &str, args: Vec<ExprId>) -> ExprId {
        let name = self.interner.intern(name);
        let args = self.arena.add_args(args);
        self.arena.add_expr(ExprKind::MethodCall { base, name, args })
    }

    pub fn new_object(&mut self, class: &str, args: Vec<ExprId>) -> ExprId {
        let class = self.interner.intern(class);
        let args = self.arena.add_args(args);
        self.arena.add_expr(ExprKind::New { class, args })
    }

    // Statement shorthand

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.arena.add_stmt(StmtKind::Expr(expr))
    }

    pub fn block(&mut self, stmts: Vec<StmtId>) -> StmtId {
        let range = self.arena.add_stmt_list(stmts);
        self.arena.add_stmt(StmtKind::Block(range))
    }

    pub fn ret(&mut self, expr: ExprId) -> StmtId {
        self.arena.add_stmt(StmtKind::Return(Some(expr)))
    }
}
