//! Function definitions and the function registry.
//!
//! A function is either guest code (a statement body plus formal
//! parameters) or a native entry point with a marshal list. Lookup is
//! exact first, then case-insensitive when the registry policy allows it,
//! matching the guest language's function-name rules.

use bitflags::bitflags;
use holm_ir::{Name, Param, StmtId, StringInterner, Visibility};
use holm_value::ClassId;
use rustc_hash::FxHashMap;

use crate::marshal::{MarshalSet, NativeFn};

/// Index of a function in the registry.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct FunctionId(u32);

impl FunctionId {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Function attributes.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct FunctionFlags: u32 {
        const STATIC      = 1 << 0;
        const FINAL       = 1 << 1;
        const ABSTRACT    = 1 << 2;
        const CONSTRUCTOR = 1 << 3;
        /// Receives a handle to the caller's symbol table
        /// (`extract`-style builtins).
        const USES_CALLER_SYMBOLS = 1 << 4;
    }
}

/// Function body kind.
#[derive(Clone)]
pub enum FunctionKind {
    /// Guest code: evaluated statement body.
    Guest { body: StmtId },
    /// Native Rust entry point with per-parameter marshals.
    Native { entry: NativeFn, marshals: MarshalSet },
}

/// One callable definition.
#[derive(Clone)]
pub struct Function {
    pub name: Name,
    pub params: Vec<Param>,
    pub kind: FunctionKind,
    pub flags: FunctionFlags,
    pub visibility: Visibility,
    /// Set for methods; `None` for top-level functions.
    pub declaring_class: Option<ClassId>,
}

impl Function {
    /// Top-level guest function.
    pub fn guest(name: Name, params: Vec<Param>, body: StmtId) -> Self {
        Function {
            name,
            params,
            kind: FunctionKind::Guest { body },
            flags: FunctionFlags::empty(),
            visibility: Visibility::Public,
            declaring_class: None,
        }
    }

    /// Top-level native function.
    pub fn native(name: Name, params: Vec<Param>, entry: NativeFn, marshals: MarshalSet) -> Self {
        Function {
            name,
            params,
            kind: FunctionKind::Native { entry, marshals },
            flags: FunctionFlags::empty(),
            visibility: Visibility::Public,
            declaring_class: None,
        }
    }

    pub fn with_flags(mut self, flags: FunctionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn for_class(mut self, class: ClassId) -> Self {
        self.declaring_class = Some(class);
        self
    }

    /// Whether the final parameter is a variadic capture.
    pub fn variadic_param(&self) -> Option<&Param> {
        self.params.last().filter(|p| p.variadic)
    }

    /// Number of fixed (non-variadic) parameters.
    pub fn fixed_arity(&self) -> usize {
        self.params.len() - usize::from(self.variadic_param().is_some())
    }
}

/// Name lookup behavior.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct LookupPolicy {
    /// Fall back to a lowercased-name match when the exact name misses.
    pub case_insensitive_fallback: bool,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        LookupPolicy {
            case_insensitive_fallback: true,
        }
    }
}

/// Process-wide table of defined functions.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<Function>,
    by_name: FxHashMap<Name, FunctionId>,
    by_folded: FxHashMap<String, FunctionId>,
    policy: LookupPolicy,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: LookupPolicy) -> Self {
        FunctionRegistry {
            policy,
            ..Self::default()
        }
    }

    /// Define a function. A later definition under the same name replaces
    /// the earlier binding.
    pub fn define(&mut self, interner: &StringInterner, function: Function) -> FunctionId {
        let id = FunctionId(u32::try_from(self.functions.len()).unwrap_or(u32::MAX));
        let name = function.name;
        let folded = interner.resolve(name).to_lowercase();
        tracing::debug!(function = %folded, id = id.raw(), "define");
        self.functions.push(function);
        self.by_name.insert(name, id);
        self.by_folded.insert(folded, id);
        id
    }

    pub fn get(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.raw() as usize)
    }

    /// Look up by name: exact, then case-folded per policy.
    pub fn lookup(&self, interner: &StringInterner, name: Name) -> Option<FunctionId> {
        if let Some(&id) = self.by_name.get(&name) {
            return Some(id);
        }
        if !self.policy.case_insensitive_fallback {
            return None;
        }
        let folded = interner.resolve(name).to_lowercase();
        self.by_folded.get(&folded).copied()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
