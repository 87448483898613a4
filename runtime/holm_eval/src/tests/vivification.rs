//! Auto-vivification on write paths, and the non-vivifying presence modes.

use holm_diagnostic::ErrorMask;
use holm_value::Value;
use pretty_assertions::assert_eq;

use crate::test_helpers::Harness;

#[test]
fn chained_write_builds_nested_arrays() {
    // $a[0][1] = 5 with $a unset -> array(0 => array(1 => 5))
    let mut h = Harness::new();
    let a1 = h.var("a");
    let z = h.int(0);
    let inner = h.index(a1, z);
    let one = h.int(1);
    let slot = h.index(inner, one);
    let five = h.int(5);
    let write = h.assign(slot, five);
    let a2 = h.var("a");
    let z2 = h.int(0);
    let inner2 = h.index(a2, z2);
    let one2 = h.int(1);
    let read = h.index(inner2, one2);

    let mut it = h.interp();
    it.eval(write).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::Int(5));
    assert!(it.env.drain_diagnostics().is_empty());
}

#[test]
fn append_form_chains() {
    // $a[] = 1; $a[] = 2; -> keys 0 and 1
    let mut h = Harness::new();
    let a1 = h.var("a");
    let ap1 = h.append_at(a1);
    let one = h.int(1);
    let w1 = h.assign(ap1, one);
    let a2 = h.var("a");
    let ap2 = h.append_at(a2);
    let two = h.int(2);
    let w2 = h.assign(ap2, two);
    let a3 = h.var("a");
    let k1 = h.int(1);
    let read = h.index(a3, k1);

    let mut it = h.interp();
    it.eval(w1).unwrap();
    it.eval(w2).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::Int(2));
}

#[test]
fn isset_does_not_vivify() {
    // isset($a[0][1]) leaves $a unset
    let mut h = Harness::new();
    let a1 = h.var("a");
    let z = h.int(0);
    let inner = h.index(a1, z);
    let one = h.int(1);
    let slot = h.index(inner, one);
    let probe = h.isset(slot);
    let a2 = h.var("a");
    let probe_a = h.isset(a2);

    let mut it = h.interp();
    assert_eq!(it.eval(probe).unwrap(), Value::Bool(false));
    assert_eq!(it.eval(probe_a).unwrap(), Value::Bool(false));
}

#[test]
fn isset_is_false_for_null_entries() {
    // $a[0] = null; isset($a[0]) is false, empty($a[0]) is true
    let mut h = Harness::new();
    let a1 = h.var("a");
    let z1 = h.int(0);
    let slot1 = h.index(a1, z1);
    let null = h.null();
    let write = h.assign(slot1, null);
    let a2 = h.var("a");
    let z2 = h.int(0);
    let slot2 = h.index(a2, z2);
    let probe = h.isset(slot2);
    let a3 = h.var("a");
    let z3 = h.int(0);
    let slot3 = h.index(a3, z3);
    let probe_empty = h.empty(slot3);

    let mut it = h.interp();
    it.eval(write).unwrap();
    assert_eq!(it.eval(probe).unwrap(), Value::Bool(false));
    assert_eq!(it.eval(probe_empty).unwrap(), Value::Bool(true));
}

#[test]
fn empty_is_true_for_falsy_and_unset() {
    let mut h = Harness::new();
    let a1 = h.var("a");
    let zero = h.str_lit("0");
    let init = h.assign(a1, zero);
    let a2 = h.var("a");
    let probe_a = h.empty(a2);
    let m = h.var("missing");
    let probe_m = h.empty(m);

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(probe_a).unwrap(), Value::Bool(true));
    assert_eq!(it.eval(probe_m).unwrap(), Value::Bool(true));
    // empty() reads quietly even for the unset name.
    assert!(it.env.drain_diagnostics().is_empty());
}

#[test]
fn reading_missing_index_is_notice_plus_null() {
    let mut h = Harness::new();
    let a1 = h.var("a");
    let lit = h.array_lit(vec![]);
    let init = h.assign(a1, lit);
    let a2 = h.var("a");
    let k = h.int(3);
    let read = h.index(a2, k);

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::Null);
    let diagnostics = it.env.drain_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, ErrorMask::NOTICE);
}

#[test]
fn field_write_on_null_vivifies_base_object() {
    // $o->x = 1 with $o unset -> base-class object, with a notice
    let mut h = Harness::new();
    let o1 = h.var("o");
    let f1 = h.field(o1, "x");
    let one = h.int(1);
    let write = h.assign(f1, one);
    let o2 = h.var("o");
    let f2 = h.field(o2, "x");

    let mut it = h.interp();
    it.eval(write).unwrap();
    assert_eq!(it.eval(f2).unwrap(), Value::Int(1));
    let diagnostics = it.env.drain_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, ErrorMask::NOTICE);
}

#[test]
fn scalar_base_write_warns_and_leaves_scalar() {
    // $s = 3; $s[0] = 1; -> warning, $s still 3
    let mut h = Harness::new();
    let s1 = h.var("s");
    let three = h.int(3);
    let init = h.assign(s1, three);
    let s2 = h.var("s");
    let z = h.int(0);
    let slot = h.index(s2, z);
    let one = h.int(1);
    let write = h.assign(slot, one);
    let s3 = h.var("s");

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(write).unwrap();
    assert_eq!(it.eval(s3).unwrap(), Value::Int(3));
    assert_eq!(it.env.drain_diagnostics().len(), 1);
}

#[test]
fn unset_missing_entry_is_silent() {
    let mut h = Harness::new();
    let a1 = h.var("a");
    let z = h.int(0);
    let slot = h.index(a1, z);
    let drop = h.unset(slot);
    let a2 = h.var("a");
    let probe = h.isset(a2);

    let mut it = h.interp();
    it.eval(drop).unwrap();
    // unset never vivified $a.
    assert_eq!(it.eval(probe).unwrap(), Value::Bool(false));
    assert!(it.env.drain_diagnostics().is_empty());
}

#[test]
fn unset_nested_respects_copy_on_write() {
    // $a[0][0] = 1; $b = $a; unset($a[0][0]); -> $b[0][0] still 1
    let mut h = Harness::new();
    let a1 = h.var("a");
    let z1 = h.int(0);
    let i1 = h.index(a1, z1);
    let z2 = h.int(0);
    let s1 = h.index(i1, z2);
    let one = h.int(1);
    let init = h.assign(s1, one);
    let b1 = h.var("b");
    let a2 = h.var("a");
    let copy = h.assign(b1, a2);
    let a3 = h.var("a");
    let z3 = h.int(0);
    let i2 = h.index(a3, z3);
    let z4 = h.int(0);
    let s2 = h.index(i2, z4);
    let drop = h.unset(s2);
    let b2 = h.var("b");
    let z5 = h.int(0);
    let i3 = h.index(b2, z5);
    let z6 = h.int(0);
    let read_b = h.index(i3, z6);
    let a4 = h.var("a");
    let z7 = h.int(0);
    let i4 = h.index(a4, z7);
    let z8 = h.int(0);
    let s3 = h.index(i4, z8);
    let probe_a = h.isset(s3);

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(copy).unwrap();
    it.eval(drop).unwrap();
    assert_eq!(it.eval(probe_a).unwrap(), Value::Bool(false));
    assert_eq!(it.eval(read_b).unwrap(), Value::Int(1));
}

#[test]
fn eval_object_mode_vivifies_in_place() {
    // The object write mode turns a null variable into a base object and
    // returns the same cell, so the caller's pending write is visible.
    let mut h = Harness::new();
    let o1 = h.var("o");
    let o2 = h.var("o");

    let mut it = h.interp();
    let cell = it.eval_object(o1).unwrap();
    assert!(cell.with_value(Value::is_object));
    let Value::Object(seen) = it.eval(o2).unwrap() else {
        panic!("expected object");
    };
    assert!(cell.with_value(|v| matches!(v, Value::Object(h) if h.same_object(&seen))));
}

#[test]
fn string_offset_reads() {
    let mut h = Harness::new();
    let s1 = h.var("s");
    let lit = h.str_lit("abc");
    let init = h.assign(s1, lit);
    let s2 = h.var("s");
    let one = h.int(1);
    let read = h.index(s2, one);
    let s3 = h.var("s");
    let neg = h.int(-1);
    let read_neg = h.index(s3, neg);
    let s4 = h.var("s");
    let nine = h.int(9);
    let read_out = h.index(s4, nine);

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::string("b"));
    assert_eq!(it.eval(read_neg).unwrap(), Value::string("c"));
    assert_eq!(it.eval(read_out).unwrap(), Value::string(""));
    assert_eq!(it.env.drain_diagnostics().len(), 1);
}
