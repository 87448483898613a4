//! Object instances: reference-semantics handles over an ordered field map.
//!
//! Unlike arrays, objects do not copy on write: assignment shares the
//! handle, and only an explicit `duplicate()` (the guest `clone` operator)
//! produces an independent instance. Fields are cells, so `=&` aliasing of
//! a field behaves exactly like aliasing an array slot.

use std::fmt;

use holm_ir::Name;
use rustc_hash::FxHashMap;

use crate::{LocalCell, Value, Var};

/// Index of a class definition in the class registry.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    /// The built-in base class every auto-vivified object belongs to.
    pub const BASE: ClassId = ClassId(0);

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> Self {
        ClassId(raw)
    }
}

struct FieldSlot {
    name: Name,
    cell: Var,
}

/// Per-instance storage: class binding plus insertion-ordered fields.
struct ObjectData {
    class: ClassId,
    /// Ordered field slots; `None` marks an unset field.
    slots: Vec<Option<FieldSlot>>,
    index: FxHashMap<Name, usize>,
}

/// Shared handle to an object instance. `Clone` shares.
#[derive(Clone)]
pub struct ObjectHandle(LocalCell<ObjectData>);

impl ObjectHandle {
    pub fn new(class: ClassId) -> Self {
        ObjectHandle(LocalCell::new(ObjectData {
            class,
            slots: Vec::new(),
            index: FxHashMap::default(),
        }))
    }

    pub fn class_id(&self) -> ClassId {
        self.0.borrow().class
    }

    /// Whether two handles are the same instance.
    pub fn same_object(&self, other: &ObjectHandle) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Read a field value. `None` when the field is absent.
    pub fn get_field(&self, name: Name) -> Option<Value> {
        let data = self.0.borrow();
        let pos = *data.index.get(&name)?;
        data.slots.get(pos)?.as_ref().map(|s| s.cell.get())
    }

    pub fn has_field(&self, name: Name) -> bool {
        self.0.borrow().index.contains_key(&name)
    }

    /// Get-or-create the field cell, for a pending write or alias.
    pub fn field_var(&self, name: Name) -> Var {
        let mut data = self.0.borrow_mut();
        if let Some(&pos) = data.index.get(&name) {
            if let Some(Some(slot)) = data.slots.get(pos) {
                return slot.cell.clone();
            }
        }
        let cell = Var::null();
        let pos = data.slots.len();
        data.index.insert(name, pos);
        data.slots.push(Some(FieldSlot {
            name,
            cell: cell.clone(),
        }));
        cell
    }

    /// Cell for an existing field, or `None` without creating it.
    pub fn existing_field_var(&self, name: Name) -> Option<Var> {
        let data = self.0.borrow();
        let pos = *data.index.get(&name)?;
        data.slots.get(pos)?.as_ref().map(|s| s.cell.clone())
    }

    /// Write a field, creating it when absent (dynamic fields allowed).
    pub fn put_field(&self, name: Name, value: Value) {
        self.field_var(name).set(value);
    }

    /// Install an existing cell as a field (reference assignment).
    pub fn put_field_var(&self, name: Name, cell: Var) {
        cell.mark_referenced();
        let mut data = self.0.borrow_mut();
        if let Some(&pos) = data.index.get(&name) {
            if let Some(entry) = data.slots.get_mut(pos) {
                if entry.is_some() {
                    *entry = Some(FieldSlot { name, cell });
                    return;
                }
            }
        }
        let pos = data.slots.len();
        data.index.insert(name, pos);
        data.slots.push(Some(FieldSlot { name, cell }));
    }

    /// Unset a field. No-op when absent.
    pub fn remove_field(&self, name: Name) {
        let mut data = self.0.borrow_mut();
        if let Some(pos) = data.index.remove(&name) {
            if let Some(entry) = data.slots.get_mut(pos) {
                *entry = None;
            }
        }
    }

    /// Snapshot of `(name, value)` pairs in declaration/insertion order.
    pub fn fields_snapshot(&self) -> Vec<(Name, Value)> {
        self.0
            .borrow()
            .slots
            .iter()
            .flatten()
            .map(|s| (s.name, s.cell.get()))
            .collect()
    }

    /// Explicit copy (the guest `clone` operator): fresh cells holding
    /// assignment copies of each field value. Referenced field cells stay
    /// shared, matching the array copy rule.
    pub fn duplicate(&self) -> ObjectHandle {
        let data = self.0.borrow();
        let slots = data
            .slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|s| FieldSlot {
                    name: s.name,
                    cell: if s.cell.is_referenced() {
                        s.cell.clone()
                    } else {
                        Var::new(s.cell.get())
                    },
                })
            })
            .collect();
        ObjectHandle(LocalCell::new(ObjectData {
            class: data.class,
            slots,
            index: data.index.clone(),
        }))
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        write!(f, "object#{}", data.class.raw())
    }
}
