//! Hard evaluation errors.
//!
//! These are the non-recoverable, non-suppressible conditions: structural
//! misuse of the evaluation protocol (taking a reference to a literal),
//! instantiating an abstract class, calling something undefined. Everything
//! the guest language recovers from (coercion, access violations) goes
//! through the diagnostic channel instead and never appears here.
//!
//! Factory functions are the public construction API; they populate both
//! the structured `kind` and the display `message`.

use std::fmt;

use holm_ir::Span;

use crate::Value;

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// `eval_ref` requested on a node shape with no addressable cell.
    NotAReference { shape: &'static str },
    /// Assignment target is not an lvalue shape.
    NotAssignable { shape: &'static str },
    /// `new` on an abstract class.
    AbstractInstantiation { class: String },
    /// `new` on an interface.
    InterfaceInstantiation { class: String },
    UndefinedClass { name: String },
    UndefinedFunction { name: String },
    UndefinedMethod { class: String, method: String },
    NotCallable { type_name: &'static str },
    /// Recursion limit exceeded.
    StackOverflow { depth: usize },
    /// A by-reference parameter received a non-addressable actual.
    RefParamNotAddressable { param: String },
    Custom { message: String },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAReference { shape } => {
                write!(f, "cannot take a reference to a {shape}")
            }
            Self::NotAssignable { shape } => write!(f, "{shape} is not assignable"),
            Self::AbstractInstantiation { class } => {
                write!(f, "cannot instantiate abstract class {class}")
            }
            Self::InterfaceInstantiation { class } => {
                write!(f, "cannot instantiate interface {class}")
            }
            Self::UndefinedClass { name } => write!(f, "undefined class: {name}"),
            Self::UndefinedFunction { name } => write!(f, "undefined function: {name}()"),
            Self::UndefinedMethod { class, method } => {
                write!(f, "undefined method: {class}::{method}()")
            }
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),
            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
            Self::RefParamNotAddressable { param } => {
                write!(f, "parameter ${param} expects a reference, got a temporary")
            }
            Self::Custom { message } => f.write_str(message),
        }
    }
}

/// Hard evaluation error.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    /// Source location, attached by the evaluator when known.
    pub span: Option<Span>,
}

impl EvalError {
    /// Uncategorized error. Prefer a specific factory when one exists.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        EvalError {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            span: None,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError {
            kind,
            message,
            span: None,
        }
    }

    /// Attach a source location, keeping an existing one.
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Factory functions

pub fn not_a_reference(shape: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAReference { shape })
}

pub fn not_assignable(shape: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAssignable { shape })
}

pub fn abstract_instantiation(class: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AbstractInstantiation {
        class: class.into(),
    })
}

pub fn interface_instantiation(class: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InterfaceInstantiation {
        class: class.into(),
    })
}

pub fn undefined_class(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedClass { name: name.into() })
}

pub fn undefined_function(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedFunction { name: name.into() })
}

pub fn undefined_method(class: impl Into<String>, method: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        class: class.into(),
        method: method.into(),
    })
}

pub fn not_callable(type_name: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable { type_name })
}

pub fn stack_overflow(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

pub fn ref_param_not_addressable(param: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RefParamNotAddressable {
        param: param.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_populates_kind_and_message() {
        let err = not_a_reference("literal");
        assert_eq!(err.kind, EvalErrorKind::NotAReference { shape: "literal" });
        assert_eq!(err.message, "cannot take a reference to a literal");
    }

    #[test]
    fn with_span_keeps_first() {
        let err = EvalError::new("x")
            .with_span(Span::new(1, 2))
            .with_span(Span::new(3, 4));
        assert_eq!(err.span, Some(Span::new(1, 2)));
    }
}
