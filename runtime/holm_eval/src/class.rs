//! Class definitions, the class registry, and visibility rules.
//!
//! Classes are defined once (parent before child) and read-only afterward.
//! The `instanceof` set of each class is flattened at definition time, so
//! the check is a set lookup instead of a hierarchy walk.

use bitflags::bitflags;
use holm_ir::{ExprId, Name, StringInterner, Visibility};
use holm_value::errors::{
    abstract_instantiation, interface_instantiation, undefined_class, EvalError,
};
use holm_value::ClassId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::function::{FunctionId, LookupPolicy};

bitflags! {
    /// Class attributes.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct ClassFlags: u32 {
        const ABSTRACT  = 1 << 0;
        const FINAL     = 1 << 1;
        const INTERFACE = 1 << 2;
    }
}

/// Declared field with its default initializer.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: Name,
    pub visibility: Visibility,
    /// Evaluated at instantiation; absent fields initialize to null.
    pub default: Option<ExprId>,
}

impl FieldDef {
    pub fn public(name: Name) -> Self {
        FieldDef {
            name,
            visibility: Visibility::Public,
            default: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_default(mut self, default: ExprId) -> Self {
        self.default = Some(default);
        self
    }
}

/// Input to `ClassRegistry::define`.
pub struct ClassSpec {
    pub name: Name,
    pub parent: Option<Name>,
    pub interfaces: Vec<Name>,
    pub flags: ClassFlags,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<(Name, FunctionId)>,
    pub constructor: Option<FunctionId>,
}

impl ClassSpec {
    pub fn new(name: Name) -> Self {
        ClassSpec {
            name,
            parent: None,
            interfaces: Vec::new(),
            flags: ClassFlags::empty(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructor: None,
        }
    }

    pub fn extending(mut self, parent: Name) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn implementing(mut self, interface: Name) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, name: Name, function: FunctionId) -> Self {
        self.methods.push((name, function));
        self
    }

    pub fn with_constructor(mut self, function: FunctionId) -> Self {
        self.constructor = Some(function);
        self
    }
}

/// One resolved class.
pub struct ClassDef {
    pub id: ClassId,
    pub name: Name,
    pub parent: Option<ClassId>,
    pub flags: ClassFlags,
    pub fields: Vec<FieldDef>,
    pub constructor: Option<FunctionId>,
    methods: FxHashMap<Name, FunctionId>,
    methods_folded: FxHashMap<String, FunctionId>,
    /// Flattened `instanceof` set: own name, every ancestor, every
    /// implemented interface (transitively), case-folded.
    isa: FxHashSet<String>,
}

impl ClassDef {
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }
}

/// Process-wide table of defined classes. `ClassId::BASE` is pre-defined
/// as the dynamic base class auto-vivified objects belong to.
pub struct ClassRegistry {
    classes: Vec<ClassDef>,
    by_name: FxHashMap<Name, ClassId>,
    by_folded: FxHashMap<String, ClassId>,
    policy: LookupPolicy,
}

impl ClassRegistry {
    pub fn new(interner: &StringInterner) -> Self {
        let mut registry = ClassRegistry {
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            by_folded: FxHashMap::default(),
            policy: LookupPolicy::default(),
        };
        // The dynamic base class; instantiable with no fields or methods.
        let base = interner.intern("stdClass");
        let id = registry.install(interner, ClassSpec::new(base), None);
        debug_assert_eq!(id, Ok(ClassId::BASE));
        registry
    }

    /// Define a class. The parent (when named) must already be defined.
    pub fn define(
        &mut self,
        interner: &StringInterner,
        spec: ClassSpec,
    ) -> Result<ClassId, EvalError> {
        let parent = match spec.parent {
            Some(name) => Some(
                self.lookup(interner, name)
                    .ok_or_else(|| undefined_class(interner.resolve(name).as_ref()))?,
            ),
            None => None,
        };
        self.install(interner, spec, parent)
    }

    fn install(
        &mut self,
        interner: &StringInterner,
        spec: ClassSpec,
        parent: Option<ClassId>,
    ) -> Result<ClassId, EvalError> {
        let id = ClassId::from_raw(u32::try_from(self.classes.len()).unwrap_or(u32::MAX));
        let folded_name = interner.resolve(spec.name).to_lowercase();
        tracing::debug!(class = %folded_name, id = id.raw(), "define");

        let mut isa = FxHashSet::default();
        isa.insert(folded_name.clone());
        if let Some(parent_id) = parent {
            if let Some(parent_def) = self.get(parent_id) {
                isa.extend(parent_def.isa.iter().cloned());
            }
        }
        for interface in &spec.interfaces {
            match self.lookup(interner, *interface).and_then(|i| self.get(i)) {
                Some(def) => isa.extend(def.isa.iter().cloned()),
                None => {
                    isa.insert(interner.resolve(*interface).to_lowercase());
                }
            }
        }

        let mut methods = FxHashMap::default();
        let mut methods_folded = FxHashMap::default();
        for (name, function) in &spec.methods {
            methods.insert(*name, *function);
            methods_folded.insert(interner.resolve(*name).to_lowercase(), *function);
        }

        self.classes.push(ClassDef {
            id,
            name: spec.name,
            parent,
            flags: spec.flags,
            fields: spec.fields,
            constructor: spec.constructor,
            methods,
            methods_folded,
            isa,
        });
        self.by_name.insert(spec.name, id);
        self.by_folded.insert(folded_name, id);
        Ok(id)
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.raw() as usize)
    }

    pub fn lookup(&self, interner: &StringInterner, name: Name) -> Option<ClassId> {
        if let Some(&id) = self.by_name.get(&name) {
            return Some(id);
        }
        if !self.policy.case_insensitive_fallback {
            return None;
        }
        let folded = interner.resolve(name).to_lowercase();
        self.by_folded.get(&folded).copied()
    }

    pub fn name_of(&self, interner: &StringInterner, id: ClassId) -> String {
        self.get(id)
            .map(|def| interner.resolve(def.name).to_string())
            .unwrap_or_else(|| format!("class#{}", id.raw()))
    }

    /// The single instantiability gate: abstract classes and interfaces
    /// are rejected here, before any allocation.
    pub fn check_instantiable(
        &self,
        interner: &StringInterner,
        id: ClassId,
    ) -> Result<(), EvalError> {
        let Some(def) = self.get(id) else {
            return Err(undefined_class(format!("class#{}", id.raw())));
        };
        if def.flags.contains(ClassFlags::INTERFACE) {
            return Err(interface_instantiation(interner.resolve(def.name).as_ref()));
        }
        if def.flags.contains(ClassFlags::ABSTRACT) {
            return Err(abstract_instantiation(interner.resolve(def.name).as_ref()));
        }
        Ok(())
    }

    /// Declared fields in initialization order: ancestors first, then own.
    pub fn fields_in_init_order(&self, id: ClassId) -> Vec<FieldDef> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.get(current) {
                Some(def) => {
                    chain.push(current);
                    cursor = def.parent;
                }
                None => break,
            }
        }
        let mut fields = Vec::new();
        for class in chain.into_iter().rev() {
            if let Some(def) = self.get(class) {
                fields.extend(def.fields.iter().cloned());
            }
        }
        fields
    }

    /// Resolve a method by walking the parent chain. Returns the declaring
    /// class alongside the function.
    pub fn resolve_method(
        &self,
        interner: &StringInterner,
        id: ClassId,
        name: Name,
    ) -> Option<(ClassId, FunctionId)> {
        let mut cursor = Some(id);
        let mut folded: Option<String> = None;
        while let Some(current) = cursor {
            let def = self.get(current)?;
            if let Some(&function) = def.methods.get(&name) {
                return Some((current, function));
            }
            if self.policy.case_insensitive_fallback {
                let key = folded.get_or_insert_with(|| interner.resolve(name).to_lowercase());
                if let Some(&function) = def.methods_folded.get(key.as_str()) {
                    return Some((current, function));
                }
            }
            cursor = def.parent;
        }
        None
    }

    /// The constructor reached from `id`, walking up the parent chain.
    pub fn resolve_constructor(&self, id: ClassId) -> Option<(ClassId, FunctionId)> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let def = self.get(current)?;
            if let Some(ctor) = def.constructor {
                return Some((current, ctor));
            }
            cursor = def.parent;
        }
        None
    }

    /// Whether `class` is `ancestor` or derives from it (classes only;
    /// used by the protected-visibility rule).
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut cursor = Some(class);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|def| def.parent);
        }
        false
    }

    /// `instanceof` test against a class or interface name.
    pub fn is_instance_of(&self, interner: &StringInterner, class: ClassId, name: Name) -> bool {
        let folded = interner.resolve(name).to_lowercase();
        self.get(class)
            .map(|def| def.isa.contains(&folded))
            .unwrap_or(false)
    }

    /// Visibility rule for a member declared on `declaring`:
    /// private needs the exact class, protected any class related to the
    /// declaring one, public anything.
    pub fn can_access(
        &self,
        declaring: ClassId,
        visibility: Visibility,
        calling: Option<ClassId>,
    ) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Private => calling == Some(declaring),
            Visibility::Protected => calling.is_some_and(|caller| {
                self.is_subclass_of(caller, declaring) || self.is_subclass_of(declaring, caller)
            }),
        }
    }

    /// Innermost declaration of a field along the parent chain.
    pub fn field_declaration(&self, id: ClassId, name: Name) -> Option<(ClassId, Visibility)> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let def = self.get(current)?;
            if let Some(field) = def.fields.iter().find(|f| f.name == name) {
                return Some((current, field.visibility));
            }
            cursor = def.parent;
        }
        None
    }
}
