//! Variable cells and the single-threaded shared-mutability wrapper.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::Value;

/// A single-threaded wrapper for reference-counted interior mutability.
///
/// Wraps `Rc<RefCell<T>>` and enforces that allocations go through the
/// `new()` factory. A value graph is owned by exactly one execution context,
/// so `Rc` (not `Arc`) is intentional.
///
/// The `#[repr(transparent)]` attribute keeps the same memory layout as
/// `Rc<RefCell<T>>`.
#[repr(transparent)]
pub struct LocalCell<T>(Rc<RefCell<T>>);

impl<T> LocalCell<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalCell(Rc::new(RefCell::new(value)))
    }

    /// Borrow the inner value immutably.
    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    /// Borrow the inner value mutably.
    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether two handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalCell<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalCell(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalCell").field(&self.0).finish()
    }
}

impl<T: Default> Default for LocalCell<T> {
    fn default() -> Self {
        LocalCell::new(T::default())
    }
}

/// Cell contents: the held value plus the one-way `referenced` mark.
#[derive(Debug)]
struct VarSlot {
    value: Value,
    /// Set when an alias of this cell has been taken (`=&`, by-ref argument).
    /// Once set it never clears, and it forces copy-on-write duplication of
    /// the owning array to share this cell instead of copying it.
    referenced: bool,
}

/// An addressable variable cell.
///
/// Owns exactly one [`Value`] at a time. `Clone` clones the *handle*: two
/// clones observe each other's writes, which is exactly the aliasing
/// contract — binding a name to an existing `Var` is `=&`.
#[derive(Clone)]
#[repr(transparent)]
pub struct Var(LocalCell<VarSlot>);

impl Var {
    /// Cell holding the given value.
    pub fn new(value: Value) -> Self {
        Var(LocalCell::new(VarSlot {
            value,
            referenced: false,
        }))
    }

    /// Unset cell (holds `Null`).
    pub fn null() -> Self {
        Var::new(Value::Null)
    }

    /// Read the held value (clone; lazy for arrays).
    pub fn get(&self) -> Value {
        self.0.borrow().value.clone()
    }

    /// Replace the held value.
    pub fn set(&self, value: Value) {
        self.0.borrow_mut().value = value;
    }

    /// `isset` classification: set unless the held value is `Null`.
    pub fn is_set(&self) -> bool {
        !self.0.borrow().value.is_null()
    }

    /// Whether an alias of this cell has ever been taken.
    pub fn is_referenced(&self) -> bool {
        self.0.borrow().referenced
    }

    /// Mark this cell as aliased. One-way; there is no unmark.
    pub fn mark_referenced(&self) {
        self.0.borrow_mut().referenced = true;
    }

    /// Whether two names resolve to the same cell.
    pub fn same_cell(&self, other: &Var) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Run `f` against a shared borrow of the held value.
    pub fn with_value<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.0.borrow().value)
    }

    /// Run `f` against a mutable borrow of the held value.
    ///
    /// This is how in-place container mutation reaches the value without
    /// replacing it: `var.with_value_mut(|v| ...)` keeps writes through an
    /// aliased cell visible to every alias.
    pub fn with_value_mut<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.borrow_mut().value)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.0.borrow();
        if slot.referenced {
            write!(f, "Var(&{:?})", slot.value)
        } else {
            write!(f, "Var({:?})", slot.value)
        }
    }
}

impl Default for Var {
    fn default() -> Self {
        Var::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alias_symmetry() {
        let x = Var::new(Value::Int(1));
        let y = x.clone();
        x.set(Value::Int(2));
        assert_eq!(y.get(), Value::Int(2));
        y.set(Value::Int(3));
        assert_eq!(x.get(), Value::Int(3));
    }

    #[test]
    fn unset_cell_reads_null() {
        let v = Var::null();
        assert_eq!(v.get(), Value::Null);
        assert!(!v.is_set());
    }

    #[test]
    fn referenced_mark_is_one_way() {
        let v = Var::null();
        assert!(!v.is_referenced());
        v.mark_referenced();
        assert!(v.is_referenced());
    }

    #[test]
    fn same_cell_distinguishes_alias_from_copy() {
        let a = Var::new(Value::Int(1));
        let alias = a.clone();
        let copy = Var::new(a.get());
        assert!(a.same_cell(&alias));
        assert!(!a.same_cell(&copy));
    }
}
