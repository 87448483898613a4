//! Declaration-level types shared between the loader and the evaluator.

use std::fmt;

use super::arena::ExprId;
use crate::Name;

/// Member visibility.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Protected => f.write_str("protected"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Formal parameter descriptor.
///
/// Each parameter independently chooses value or reference passing; the
/// binder consults `by_ref` to pick the evaluation mode for the actual
/// argument expression.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    /// `&$x` — actual argument must be addressable; writes are visible to
    /// the caller.
    pub by_ref: bool,
    /// `...$rest` — captures remaining actuals as an array. Only valid on
    /// the final parameter.
    pub variadic: bool,
    /// Default expression, evaluated in the callee's own context when the
    /// actual is omitted.
    pub default: Option<ExprId>,
}

impl Param {
    /// By-value parameter with no default.
    pub fn by_value(name: Name) -> Self {
        Param {
            name,
            by_ref: false,
            variadic: false,
            default: None,
        }
    }

    /// By-reference parameter.
    pub fn by_reference(name: Name) -> Self {
        Param {
            name,
            by_ref: true,
            variadic: false,
            default: None,
        }
    }

    /// By-value parameter with a default expression.
    pub fn with_default(name: Name, default: ExprId) -> Self {
        Param {
            name,
            by_ref: false,
            variadic: false,
            default: Some(default),
        }
    }

    /// Variadic capture parameter.
    pub fn variadic(name: Name) -> Self {
        Param {
            name,
            by_ref: false,
            variadic: true,
            default: None,
        }
    }
}
