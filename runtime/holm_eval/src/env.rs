//! Execution context.
//!
//! An [`Env`] is the per-call symbol table plus the per-request state every
//! call in a request shares: the global table, the diagnostic queue with
//! its reporting mask, and the cleanup list. `child()` builds the context
//! for a callee; the local table is fresh, the shared state is the same
//! handles.
//!
//! Lifecycle: a request's root `Env` is created, code runs against it, and
//! `close()` releases registered resources in registration order exactly
//! once. Dropping an unclosed root env closes it as a fallback.

use holm_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorMask};
use holm_ir::{Name, Span};
use holm_value::{ClassId, LocalCell, ObjectHandle, Var};
use rustc_hash::FxHashMap;

/// State shared by every call frame of one request.
pub struct RequestState {
    pub diagnostics: DiagnosticQueue,
    pub mask: ErrorMask,
}

/// Error from releasing one resource during `Env::close`.
#[derive(Clone, Debug)]
pub struct CleanupError {
    pub message: String,
}

impl CleanupError {
    pub fn new(message: impl Into<String>) -> Self {
        CleanupError {
            message: message.into(),
        }
    }
}

/// A resource that must be released when the owning context closes.
///
/// Implementations register themselves with [`Env::register_cleanup`] on
/// acquisition and may deregister on early release. `close` is called at
/// most once per registration.
pub trait EnvCleanup {
    /// Short resource label for log lines.
    fn label(&self) -> &str {
        "resource"
    }

    fn close(&mut self) -> Result<(), CleanupError>;
}

/// Handle for deregistering a cleanup before the env closes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CleanupHandle(usize);

/// Execution context: one call frame plus the request-shared state.
pub struct Env {
    locals: FxHashMap<Name, Var>,
    globals: LocalCell<FxHashMap<Name, Var>>,
    state: LocalCell<RequestState>,
    this: Option<ObjectHandle>,
    calling_class: Option<ClassId>,
    /// Caller's bindings, exposed to functions flagged as symbol-table
    /// consumers (`extract`-style builtins).
    caller_symbols: Option<FxHashMap<Name, Var>>,
    /// Registration-ordered cleanup list; `None` marks a deregistered slot.
    /// Only the request's root env owns cleanups.
    cleanups: Vec<Option<Box<dyn EnvCleanup>>>,
    closed: bool,
}

impl Env {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        Env {
            locals: FxHashMap::default(),
            globals: LocalCell::new(FxHashMap::default()),
            state: LocalCell::new(RequestState {
                diagnostics: DiagnosticQueue::new(config),
                mask: ErrorMask::default_reporting(),
            }),
            this: None,
            calling_class: None,
            caller_symbols: None,
            cleanups: Vec::new(),
            closed: false,
        }
    }

    /// Context for a callee: fresh locals, shared request state.
    pub fn child(&self) -> Env {
        Env {
            locals: FxHashMap::default(),
            globals: self.globals.clone(),
            state: self.state.clone(),
            this: None,
            calling_class: None,
            caller_symbols: None,
            cleanups: Vec::new(),
            closed: true,
        }
    }

    // Variable table

    /// Get-or-create the cell bound to a local name. Creating binds a
    /// fresh null cell (auto-vivification of the binding itself).
    pub fn get_var(&mut self, name: Name) -> Var {
        self.locals.entry(name).or_insert_with(Var::null).clone()
    }

    /// Cell bound to a local name, without creating one.
    pub fn lookup(&self, name: Name) -> Option<Var> {
        self.locals.get(&name).cloned()
    }

    /// Bind a name to an existing cell (reference assignment to a local).
    pub fn bind_var(&mut self, name: Name, cell: Var) {
        self.locals.insert(name, cell);
    }

    /// Remove a local binding. Aliases of the cell keep their value.
    pub fn unset_var(&mut self, name: Name) {
        self.locals.remove(&name);
    }

    /// Get-or-create the global cell for a name.
    pub fn global_var(&mut self, name: Name) -> Var {
        self.globals
            .borrow_mut()
            .entry(name)
            .or_insert_with(Var::null)
            .clone()
    }

    /// `global $x;` — alias the global cell into the local table.
    pub fn import_global(&mut self, name: Name) {
        let cell = self.global_var(name);
        cell.mark_referenced();
        self.locals.insert(name, cell);
    }

    pub fn local_names(&self) -> impl Iterator<Item = Name> + '_ {
        self.locals.keys().copied()
    }

    /// Snapshot of the local bindings (name to cell handle).
    pub fn symbols_snapshot(&self) -> FxHashMap<Name, Var> {
        self.locals.clone()
    }

    // Receiver binding

    pub fn this(&self) -> Option<&ObjectHandle> {
        self.this.as_ref()
    }

    pub fn set_this(&mut self, this: Option<ObjectHandle>) {
        self.this = this;
    }

    /// Class whose code is currently executing, for visibility checks.
    pub fn calling_class(&self) -> Option<ClassId> {
        self.calling_class
    }

    pub fn set_calling_class(&mut self, class: Option<ClassId>) {
        self.calling_class = class;
    }

    pub fn caller_symbols(&self) -> Option<&FxHashMap<Name, Var>> {
        self.caller_symbols.as_ref()
    }

    pub fn set_caller_symbols(&mut self, symbols: Option<FxHashMap<Name, Var>>) {
        self.caller_symbols = symbols;
    }

    // Diagnostics

    /// Report a diagnostic, subject to the current mask.
    pub fn report(&self, diagnostic: Diagnostic) {
        let mut state = self.state.borrow_mut();
        if state.mask.reports(diagnostic.level) {
            state.diagnostics.report(diagnostic);
        }
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.report(Diagnostic::warning(message));
    }

    pub fn warning_at(&self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::warning(message).with_span(span));
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.report(Diagnostic::notice(message));
    }

    pub fn notice_at(&self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::notice(message).with_span(span));
    }

    pub fn access_violation(&self, message: impl Into<String>) {
        self.report(Diagnostic::access(message));
    }

    pub fn error_mask(&self) -> ErrorMask {
        self.state.borrow().mask
    }

    /// Swap the reporting mask, returning the previous one.
    pub fn set_error_mask(&self, mask: ErrorMask) -> ErrorMask {
        std::mem::replace(&mut self.state.borrow_mut().mask, mask)
    }

    /// Clear the mask for the extent of the returned guard (`@` operator).
    pub fn suppress(&self) -> SuppressGuard {
        let previous = self.set_error_mask(ErrorMask::empty());
        SuppressGuard {
            state: self.state.clone(),
            previous,
        }
    }

    /// Read access to the collected diagnostics.
    pub fn with_diagnostics<R>(&self, f: impl FnOnce(&DiagnosticQueue) -> R) -> R {
        f(&self.state.borrow().diagnostics)
    }

    /// Drain collected diagnostics (end-of-request reporting, tests).
    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        self.state.borrow_mut().diagnostics.drain()
    }

    // Resource cleanup

    /// Register a resource for release at close, in registration order.
    pub fn register_cleanup(&mut self, cleanup: Box<dyn EnvCleanup>) -> CleanupHandle {
        let handle = CleanupHandle(self.cleanups.len());
        self.cleanups.push(Some(cleanup));
        self.closed = false;
        handle
    }

    /// Deregister a resource that was released early. Idempotent.
    pub fn deregister_cleanup(&mut self, handle: CleanupHandle) {
        if let Some(slot) = self.cleanups.get_mut(handle.0) {
            *slot = None;
        }
    }

    /// Release registered resources in registration order, exactly once.
    ///
    /// A failing cleanup is logged and skipped; the remaining resources are
    /// still released.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for slot in self.cleanups.iter_mut() {
            if let Some(mut cleanup) = slot.take() {
                if let Err(err) = cleanup.close() {
                    tracing::warn!(
                        resource = cleanup.label(),
                        error = %err.message,
                        "resource cleanup failed, skipping"
                    );
                }
            }
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        self.close();
    }
}

/// RAII guard restoring the reporting mask at the end of a suppressed
/// expression, including on the error path.
pub struct SuppressGuard {
    state: LocalCell<RequestState>,
    previous: ErrorMask,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.state.borrow_mut().mask = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holm_value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_var_vivifies_binding() {
        let mut env = Env::new();
        let name = Name::from_raw(1);
        let cell = env.get_var(name);
        assert_eq!(cell.get(), Value::Null);
        cell.set(Value::Int(3));
        assert_eq!(env.get_var(name).get(), Value::Int(3));
    }

    #[test]
    fn child_shares_globals_not_locals() {
        let mut parent = Env::new();
        let name = Name::from_raw(1);
        parent.get_var(name).set(Value::Int(1));
        let mut child = parent.child();
        assert!(child.lookup(name).is_none());
        child.import_global(name);
        child.get_var(name).set(Value::Int(9));
        let mut parent2 = parent.child();
        parent2.import_global(name);
        assert_eq!(parent2.get_var(name).get(), Value::Int(9));
    }

    #[test]
    fn unset_keeps_alias_value() {
        let mut env = Env::new();
        let a = Name::from_raw(1);
        let b = Name::from_raw(2);
        let cell = env.get_var(a);
        cell.set(Value::Int(5));
        env.bind_var(b, cell);
        env.unset_var(a);
        assert!(env.lookup(a).is_none());
        assert_eq!(env.get_var(b).get(), Value::Int(5));
    }

    #[test]
    fn suppress_guard_restores_mask() {
        let env = Env::new();
        {
            let _guard = env.suppress();
            env.warning("masked");
            assert_eq!(env.error_mask(), ErrorMask::empty());
        }
        assert_eq!(env.error_mask(), ErrorMask::default_reporting());
        env.warning("visible");
        let messages: Vec<_> = env
            .drain_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(messages, vec!["visible".to_string()]);
    }

    struct Probe {
        log: LocalCell<Vec<&'static str>>,
        tag: &'static str,
        fail: bool,
    }

    impl EnvCleanup for Probe {
        fn label(&self) -> &str {
            self.tag
        }

        fn close(&mut self) -> Result<(), CleanupError> {
            self.log.borrow_mut().push(self.tag);
            if self.fail {
                Err(CleanupError::new("close failed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn cleanups_run_in_order_exactly_once() {
        let log = LocalCell::new(Vec::new());
        let mut env = Env::new();
        env.register_cleanup(Box::new(Probe {
            log: log.clone(),
            tag: "a",
            fail: false,
        }));
        env.register_cleanup(Box::new(Probe {
            log: log.clone(),
            tag: "b",
            fail: true,
        }));
        env.register_cleanup(Box::new(Probe {
            log: log.clone(),
            tag: "c",
            fail: false,
        }));
        env.close();
        env.close();
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn deregistered_cleanup_is_skipped() {
        let log = LocalCell::new(Vec::new());
        let mut env = Env::new();
        let handle = env.register_cleanup(Box::new(Probe {
            log: log.clone(),
            tag: "a",
            fail: false,
        }));
        env.register_cleanup(Box::new(Probe {
            log: log.clone(),
            tag: "b",
            fail: false,
        }));
        env.deregister_cleanup(handle);
        env.close();
        assert_eq!(*log.borrow(), vec!["b"]);
    }

    #[test]
    fn drop_closes_unclosed_env() {
        let log = LocalCell::new(Vec::new());
        {
            let mut env = Env::new();
            env.register_cleanup(Box::new(Probe {
                log: log.clone(),
                tag: "a",
                fail: false,
            }));
        }
        assert_eq!(*log.borrow(), vec!["a"]);
    }
}
