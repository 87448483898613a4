//! Statement execution.

use holm_ir::{Stmt, StmtId, StmtKind};
use holm_value::errors::EvalResult;
use holm_value::Value;

use super::Interpreter;
use crate::stack::ensure_sufficient_stack;

/// Control-flow result of a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Normal,
    /// Unwinding to the enclosing call with a (copied) return value.
    Return(Value),
}

impl Interpreter<'_> {
    /// Execute a statement.
    pub fn exec(&mut self, id: StmtId) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| self.exec_inner(id))
    }

    fn exec_inner(&mut self, id: StmtId) -> EvalResult<Flow> {
        let Stmt { kind, .. } = *self.arena.stmt(id);
        match kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::Block(range) => {
                let body = self.arena.stmt_list(range).to_vec();
                for stmt in body {
                    if let Flow::Return(value) = self.exec(stmt)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_bool(cond)? {
                    self.exec(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval_bool(cond)? {
                    if let Flow::Return(value) = self.exec(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_copy(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Global(name) => {
                self.env.import_global(name);
                Ok(Flow::Normal)
            }
        }
    }

    /// Run a top-level statement, yielding the `return` value (or null).
    pub fn run(&mut self, id: StmtId) -> EvalResult {
        match self.exec(id)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }
}
