//! The diagnostic record.

use std::fmt;

use holm_ir::Span;

use crate::ErrorMask;

/// One reported runtime condition.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    /// Level bit this diagnostic was reported at (exactly one flag set).
    pub level: ErrorMask,
    pub message: String,
    /// Source location, when the reporting site had one.
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(level: ErrorMask, message: impl Into<String>) -> Self {
        Diagnostic {
            level,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        if !span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Coercion/arity warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorMask::WARNING, message)
    }

    /// Notice.
    pub fn notice(message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorMask::NOTICE, message)
    }

    /// Access violation report.
    pub fn access(message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorMask::ACCESS, message)
    }

    fn level_name(&self) -> &'static str {
        if self.level.contains(ErrorMask::ACCESS) {
            "access"
        } else if self.level.contains(ErrorMask::WARNING) {
            "warning"
        } else if self.level.contains(ErrorMask::NOTICE) {
            "notice"
        } else {
            "strict"
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level_name(), self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}
