//! The ordered, copy-on-write array container.
//!
//! # Sharing model
//!
//! `ArrayValue` is a handle (`Rc<ArrayData>`). Assignment clones the handle;
//! nothing is copied until one of the holders mutates. Mutation goes through
//! `Rc::make_mut`, and `ArrayData`'s `Clone` impl *is* the copy-on-write
//! duplication rule: unreferenced cells are duplicated by value, cells whose
//! `referenced` mark is set are duplicated as shared handles, preserving
//! alias semantics across the copy.
//!
//! # Ordering
//!
//! Entries live in an insertion-ordered slot vector (tombstones on removal)
//! with a hash index beside it. Upserting an existing key keeps its
//! position; removing and reinserting moves it to the end.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::canonical_int;
use crate::{Value, Var};

/// Normalized array key: integer or string.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(Rc<str>),
}

impl ArrayKey {
    /// The empty string key (what `null` normalizes to).
    pub fn empty() -> Self {
        ArrayKey::Str(Rc::from(""))
    }

    pub fn str(s: impl Into<String>) -> Self {
        ArrayKey::Str(Rc::from(s.into()))
    }

    /// Normalize a value into a key, the single place the coercion rules
    /// live:
    ///
    /// - canonical decimal integer strings become integer keys (`"7"` → 7,
    ///   but `"07"`, `"+7"`, `"-0"` stay string keys)
    /// - bool → 0/1, float truncates toward zero, null → `""`
    /// - arrays/objects/callables are illegal offsets → `None`; the caller
    ///   reports the warning and skips the operation
    pub fn normalize(value: &Value) -> Option<ArrayKey> {
        match value {
            Value::Null => Some(ArrayKey::empty()),
            Value::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            Value::Int(i) => Some(ArrayKey::Int(*i)),
            Value::Float(f) => Some(ArrayKey::Int(crate::value::float_to_int(*f))),
            Value::Str(s) => Some(match canonical_int(s) {
                Some(i) => ArrayKey::Int(i),
                None => ArrayKey::Str(Rc::clone(s)),
            }),
            Value::Array(_) | Value::Object(_) | Value::Callable(_) => None,
        }
    }

    /// The key as a value (iteration yields keys back into guest code).
    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(i) => Value::Int(*i),
            ArrayKey::Str(s) => Value::Str(Rc::clone(s)),
        }
    }
}

impl fmt::Debug for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{i}"),
            ArrayKey::Str(s) => write!(f, "{s:?}"),
        }
    }
}

struct Slot {
    key: ArrayKey,
    cell: Var,
}

/// Backing storage for one array, shared among handles until a write.
pub struct ArrayData {
    /// Insertion-ordered slots; `None` marks a removed entry.
    slots: Vec<Option<Slot>>,
    /// Key → slot position.
    index: FxHashMap<ArrayKey, usize>,
    /// Next integer key for `append`. Never decreases on removal.
    next_key: i64,
}

impl ArrayData {
    fn new() -> Self {
        ArrayData {
            slots: Vec::new(),
            index: FxHashMap::default(),
            next_key: 0,
        }
    }
}

/// Copy-on-write duplication. Invoked by `Rc::make_mut` when a mutation
/// hits shared data: referenced cells stay shared, the rest are copied.
impl Clone for ArrayData {
    fn clone(&self) -> Self {
        let slots = self
            .slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|s| Slot {
                    key: s.key.clone(),
                    cell: if s.cell.is_referenced() {
                        s.cell.clone()
                    } else {
                        Var::new(s.cell.get())
                    },
                })
            })
            .collect();
        ArrayData {
            slots,
            index: self.index.clone(),
            next_key: self.next_key,
        }
    }
}

/// Handle to an ordered array. `Clone` is the lazy assignment copy.
#[derive(Clone)]
pub struct ArrayValue {
    data: Rc<ArrayData>,
}

impl ArrayValue {
    pub fn new() -> Self {
        ArrayValue {
            data: Rc::new(ArrayData::new()),
        }
    }

    /// Live entry count.
    pub fn len(&self) -> usize {
        self.data.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.index.is_empty()
    }

    /// Whether two handles share backing data (pre-divergence copies do).
    pub fn is_same_data(&self, other: &ArrayValue) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Read a value. Never copies, never vivifies.
    pub fn get(&self, key: &ArrayKey) -> Option<Value> {
        let pos = *self.data.index.get(key)?;
        self.data.slots.get(pos)?.as_ref().map(|s| s.cell.get())
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.data.index.contains_key(key)
    }

    /// Ordered iteration over `(key, cell)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Var)> {
        self.data
            .slots
            .iter()
            .flatten()
            .map(|s| (&s.key, &s.cell))
    }

    /// Ordered keys.
    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.iter().map(|(k, _)| k)
    }

    fn data_mut(&mut self) -> &mut ArrayData {
        // Copy-on-write trigger: Clone for ArrayData runs here when shared.
        Rc::make_mut(&mut self.data)
    }

    /// Upsert. An existing key keeps its position and its cell (so writes
    /// land through any alias of that cell); a new key appends.
    pub fn put(&mut self, key: ArrayKey, value: Value) {
        let data = self.data_mut();
        if let Some(&pos) = data.index.get(&key) {
            if let Some(Some(slot)) = data.slots.get(pos) {
                slot.cell.set(value);
                return;
            }
        }
        if let ArrayKey::Int(i) = key {
            if i >= data.next_key {
                data.next_key = i.saturating_add(1);
            }
        }
        let pos = data.slots.len();
        data.index.insert(key.clone(), pos);
        data.slots.push(Some(Slot {
            key,
            cell: Var::new(value),
        }));
    }

    /// Replace (or insert) the *cell* at a key — reference assignment into
    /// a slot. The installed cell is marked referenced.
    pub fn put_var(&mut self, key: ArrayKey, cell: Var) {
        cell.mark_referenced();
        let data = self.data_mut();
        if let Some(&pos) = data.index.get(&key) {
            if let Some(entry) = data.slots.get_mut(pos) {
                if entry.is_some() {
                    *entry = Some(Slot { key, cell });
                    return;
                }
            }
        }
        if let ArrayKey::Int(i) = key {
            if i >= data.next_key {
                data.next_key = i.saturating_add(1);
            }
        }
        let pos = data.slots.len();
        data.index.insert(key.clone(), pos);
        data.slots.push(Some(Slot { key, cell }));
    }

    /// Get-or-create the cell for a key, for a pending write through it.
    ///
    /// Triggers copy-on-write first so the write cannot leak into an
    /// undiverged copy. The returned handle aliases the slot.
    pub fn get_var(&mut self, key: ArrayKey) -> Var {
        let data = self.data_mut();
        if let Some(&pos) = data.index.get(&key) {
            if let Some(Some(slot)) = data.slots.get(pos) {
                return slot.cell.clone();
            }
        }
        if let ArrayKey::Int(i) = key {
            if i >= data.next_key {
                data.next_key = i.saturating_add(1);
            }
        }
        let cell = Var::null();
        let pos = data.slots.len();
        data.index.insert(key.clone(), pos);
        data.slots.push(Some(Slot {
            key,
            cell: cell.clone(),
        }));
        cell
    }

    /// Cell for an existing key, or `None` without creating the entry.
    /// Still triggers copy-on-write because the caller will write through
    /// the cell.
    pub fn existing_var(&mut self, key: &ArrayKey) -> Option<Var> {
        if !self.data.index.contains_key(key) {
            return None;
        }
        let data = self.data_mut();
        let pos = *data.index.get(key)?;
        data.slots.get(pos)?.as_ref().map(|s| s.cell.clone())
    }

    /// Append at the next integer key, returning the key used.
    pub fn append(&mut self, value: Value) -> ArrayKey {
        let key = ArrayKey::Int(self.data.next_key);
        self.put(key.clone(), value);
        key
    }

    /// Cell for the next integer key (`$a[] =& ...` and chained writes).
    pub fn append_var(&mut self) -> Var {
        let key = ArrayKey::Int(self.data.next_key);
        self.get_var(key)
    }

    /// Install a cell at the next integer key (`$a[] =& $x`).
    pub fn push_var(&mut self, cell: Var) -> ArrayKey {
        let key = ArrayKey::Int(self.data.next_key);
        self.put_var(key.clone(), cell);
        key
    }

    /// Remove an entry, returning its value. `next_key` is not lowered, so
    /// append after removal never reuses the key.
    pub fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        if !self.data.index.contains_key(key) {
            return None;
        }
        let data = self.data_mut();
        let pos = data.index.remove(key)?;
        data.slots.get_mut(pos)?.take().map(|s| s.cell.get())
    }

    /// Array union (`+`): keys of `self` win; keys only in `other` are
    /// appended in their order, sharing per the copy-on-write rule.
    pub fn union(&self, other: &ArrayValue) -> ArrayValue {
        let mut result = self.clone();
        for (key, cell) in other.iter() {
            if !result.contains_key(key) {
                result.put(key.clone(), cell.get());
            }
        }
        result
    }

    /// Number of handles sharing this backing data (diagnostics/tests).
    pub fn shared_count(&self) -> usize {
        Rc::strong_count(&self.data)
    }
}

impl Default for ArrayValue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, cell) in self.iter() {
            cell.with_value(|v| map.entry(key, v));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys_of(a: &ArrayValue) -> Vec<ArrayKey> {
        a.keys().cloned().collect()
    }

    #[test]
    fn key_normalization_table() {
        assert_eq!(
            ArrayKey::normalize(&Value::string("7")),
            Some(ArrayKey::Int(7))
        );
        assert_eq!(
            ArrayKey::normalize(&Value::string("07")),
            Some(ArrayKey::str("07"))
        );
        assert_eq!(
            ArrayKey::normalize(&Value::string("-3")),
            Some(ArrayKey::Int(-3))
        );
        assert_eq!(
            ArrayKey::normalize(&Value::Bool(true)),
            Some(ArrayKey::Int(1))
        );
        assert_eq!(
            ArrayKey::normalize(&Value::Float(3.9)),
            Some(ArrayKey::Int(3))
        );
        assert_eq!(
            ArrayKey::normalize(&Value::Float(-3.9)),
            Some(ArrayKey::Int(-3))
        );
        assert_eq!(ArrayKey::normalize(&Value::Null), Some(ArrayKey::empty()));
        assert_eq!(ArrayKey::normalize(&Value::empty_array()), None);
    }

    #[test]
    fn insertion_order_preserved_across_upsert() {
        let mut a = ArrayValue::new();
        a.put(ArrayKey::str("first"), Value::Int(1));
        a.put(ArrayKey::str("second"), Value::Int(2));
        a.put(ArrayKey::str("first"), Value::Int(10));
        assert_eq!(
            keys_of(&a),
            vec![ArrayKey::str("first"), ArrayKey::str("second")]
        );
        assert_eq!(a.get(&ArrayKey::str("first")), Some(Value::Int(10)));
    }

    #[test]
    fn remove_then_reinsert_moves_to_end() {
        let mut a = ArrayValue::new();
        a.put(ArrayKey::str("a"), Value::Int(1));
        a.put(ArrayKey::str("b"), Value::Int(2));
        a.remove(&ArrayKey::str("a"));
        a.put(ArrayKey::str("a"), Value::Int(3));
        assert_eq!(keys_of(&a), vec![ArrayKey::str("b"), ArrayKey::str("a")]);
    }

    #[test]
    fn append_tracks_max_int_key() {
        let mut a = ArrayValue::new();
        a.put(ArrayKey::Int(5), Value::Int(1));
        assert_eq!(a.append(Value::Int(2)), ArrayKey::Int(6));
        // String keys do not influence the counter.
        a.put(ArrayKey::str("x"), Value::Int(3));
        assert_eq!(a.append(Value::Int(4)), ArrayKey::Int(7));
    }

    #[test]
    fn next_key_does_not_regress_after_removal() {
        let mut a = ArrayValue::new();
        a.append(Value::Int(1)); // key 0
        a.append(Value::Int(2)); // key 1
        a.remove(&ArrayKey::Int(1));
        assert_eq!(a.append(Value::Int(3)), ArrayKey::Int(2));
    }

    #[test]
    fn copy_on_write_isolates_plain_entries() {
        let mut a = ArrayValue::new();
        a.put(ArrayKey::str("k"), Value::Int(1));
        let mut b = a.clone();
        assert!(a.is_same_data(&b));
        b.put(ArrayKey::str("k"), Value::Int(2));
        assert!(!a.is_same_data(&b));
        assert_eq!(a.get(&ArrayKey::str("k")), Some(Value::Int(1)));
        assert_eq!(b.get(&ArrayKey::str("k")), Some(Value::Int(2)));
    }

    #[test]
    fn referenced_cells_stay_shared_across_copy() {
        let mut a = ArrayValue::new();
        let cell = a.get_var(ArrayKey::str("k"));
        cell.set(Value::Int(1));
        cell.mark_referenced();
        let mut b = a.clone();
        b.put(ArrayKey::str("k"), Value::Int(99));
        // The write diverged the table, but the referenced cell is shared:
        // both copies and the original alias observe it.
        assert_eq!(a.get(&ArrayKey::str("k")), Some(Value::Int(99)));
        assert_eq!(cell.get(), Value::Int(99));
    }

    #[test]
    fn get_var_triggers_cow_before_handing_out_cell() {
        let mut a = ArrayValue::new();
        a.put(ArrayKey::str("k"), Value::Int(1));
        let b = a.clone();
        let cell = a.get_var(ArrayKey::str("k"));
        cell.set(Value::Int(2));
        assert_eq!(a.get(&ArrayKey::str("k")), Some(Value::Int(2)));
        assert_eq!(b.get(&ArrayKey::str("k")), Some(Value::Int(1)));
    }

    #[test]
    fn union_left_wins() {
        let mut a = ArrayValue::new();
        a.put(ArrayKey::Int(0), Value::string("a"));
        let mut b = ArrayValue::new();
        b.put(ArrayKey::Int(0), Value::string("b"));
        b.put(ArrayKey::Int(1), Value::string("c"));
        let u = a.union(&b);
        assert_eq!(u.get(&ArrayKey::Int(0)), Some(Value::string("a")));
        assert_eq!(u.get(&ArrayKey::Int(1)), Some(Value::string("c")));
        assert_eq!(u.len(), 2);
    }

    #[test]
    fn put_var_installs_alias() {
        let mut a = ArrayValue::new();
        let shared = Var::new(Value::Int(1));
        a.put_var(ArrayKey::str("k"), shared.clone());
        assert!(shared.is_referenced());
        shared.set(Value::Int(5));
        assert_eq!(a.get(&ArrayKey::str("k")), Some(Value::Int(5)));
    }
}
