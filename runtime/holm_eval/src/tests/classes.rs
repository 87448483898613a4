//! Class definition, instantiation, methods, and visibility.

use holm_ir::{Param, Visibility};
use holm_value::errors::EvalErrorKind;
use holm_value::Value;
use pretty_assertions::assert_eq;

use crate::class::{ClassFlags, ClassSpec, FieldDef};
use crate::function::Function;
use crate::test_helpers::Harness;

/// class Counter { public $count = 0;
///   function bump($by) { $this->count = $this->count + $by; }
///   function value()   { return $this->count; } }
fn define_counter(h: &mut Harness) {
    let count = h.name("count");
    let zero = h.int(0);

    let by = h.name("by");
    let this1 = h.var("this");
    let read = h.field(this1, "count");
    let vby = h.var("by");
    let sum = h.binary(holm_ir::BinaryOp::Add, read, vby);
    let this2 = h.var("this");
    let target = h.field(this2, "count");
    let write = h.assign(target, sum);
    let stmt = h.expr_stmt(write);
    let bump_body = h.block(vec![stmt]);

    let this3 = h.var("this");
    let read2 = h.field(this3, "count");
    let value_body = h.ret(read2);

    {
        let mut classes = h.classes.write();
        let mut functions = h.functions.write();
        let bump = functions.define(
            &h.interner,
            Function::guest(h.interner.intern("bump"), vec![Param::by_value(by)], bump_body),
        );
        let value = functions.define(
            &h.interner,
            Function::guest(h.interner.intern("value"), vec![], value_body),
        );
        classes
            .define(
                &h.interner,
                ClassSpec::new(h.interner.intern("Counter"))
                    .with_field(FieldDef::public(count).with_default(zero))
                    .with_method(h.interner.intern("bump"), bump)
                    .with_method(h.interner.intern("value"), value),
            )
            .unwrap();
    }
}

#[test]
fn instantiation_runs_field_defaults_and_methods_see_this() {
    let mut h = Harness::new();
    define_counter(&mut h);

    let new = h.new_object("Counter", vec![]);
    let c1 = h.var("c");
    let init = h.assign(c1, new);
    let c2 = h.var("c");
    let three = h.int(3);
    let bump = h.method_call(c2, "bump", vec![three]);
    let c3 = h.var("c");
    let value = h.method_call(c3, "value", vec![]);

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(bump).unwrap();
    assert_eq!(it.eval(value).unwrap(), Value::Int(3));
}

#[test]
fn object_assignment_shares_the_instance() {
    let mut h = Harness::new();
    define_counter(&mut h);

    let new = h.new_object("Counter", vec![]);
    let a1 = h.var("a");
    let init = h.assign(a1, new);
    let b1 = h.var("b");
    let a2 = h.var("a");
    let copy = h.assign(b1, a2);
    let b2 = h.var("b");
    let one = h.int(1);
    let bump = h.method_call(b2, "bump", vec![one]);
    let a3 = h.var("a");
    let value = h.method_call(a3, "value", vec![]);

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(copy).unwrap();
    it.eval(bump).unwrap();
    assert_eq!(it.eval(value).unwrap(), Value::Int(1));
}

#[test]
fn constructor_binds_arguments() {
    // class Point { public $x; function __construct($x) { $this->x = $x; } }
    let mut h = Harness::new();
    let x_field = h.name("x");
    let px = h.name("x");
    let this = h.var("this");
    let target = h.field(this, "x");
    let vx = h.var("x");
    let write = h.assign(target, vx);
    let stmt = h.expr_stmt(write);
    let body = h.block(vec![stmt]);
    {
        let mut functions = h.functions.write();
        let ctor = functions.define(
            &h.interner,
            Function::guest(
                h.interner.intern("__construct"),
                vec![Param::by_value(px)],
                body,
            ),
        );
        h.classes
            .write()
            .define(
                &h.interner,
                ClassSpec::new(h.interner.intern("Point"))
                    .with_field(FieldDef::public(x_field))
                    .with_constructor(ctor),
            )
            .unwrap();
    }

    let nine = h.int(9);
    let new = h.new_object("Point", vec![nine]);
    let p1 = h.var("p");
    let init = h.assign(p1, new);
    let p2 = h.var("p");
    let read = h.field(p2, "x");

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::Int(9));
}

#[test]
fn child_inherits_methods_and_constructor() {
    let mut h = Harness::new();
    define_counter(&mut h);
    h.classes
        .write()
        .define(
            &h.interner,
            ClassSpec::new(h.name("FancyCounter")).extending(h.name("Counter")),
        )
        .unwrap();

    let new = h.new_object("FancyCounter", vec![]);
    let c1 = h.var("c");
    let init = h.assign(c1, new);
    let c2 = h.var("c");
    let two = h.int(2);
    let bump = h.method_call(c2, "bump", vec![two]);
    let c3 = h.var("c");
    let value = h.method_call(c3, "value", vec![]);
    let c4 = h.var("c");
    let inst = h
        .arena
        .add_expr(holm_ir::ExprKind::InstanceOf {
            expr: c4,
            class: h.interner.intern("Counter"),
        });

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(bump).unwrap();
    assert_eq!(it.eval(value).unwrap(), Value::Int(2));
    assert_eq!(it.eval(inst).unwrap(), Value::Bool(true));
}

#[test]
fn abstract_and_interface_instantiation_fail() {
    let mut h = Harness::new();
    h.classes
        .write()
        .define(
            &h.interner,
            ClassSpec::new(h.name("Shape")).with_flags(ClassFlags::ABSTRACT),
        )
        .unwrap();
    h.classes
        .write()
        .define(
            &h.interner,
            ClassSpec::new(h.name("Countable")).with_flags(ClassFlags::INTERFACE),
        )
        .unwrap();

    let new_abstract = h.new_object("Shape", vec![]);
    let new_interface = h.new_object("Countable", vec![]);
    let new_missing = h.new_object("Ghost", vec![]);

    let mut it = h.interp();
    assert!(matches!(
        it.eval(new_abstract).unwrap_err().kind,
        EvalErrorKind::AbstractInstantiation { .. }
    ));
    assert!(matches!(
        it.eval(new_interface).unwrap_err().kind,
        EvalErrorKind::InterfaceInstantiation { .. }
    ));
    assert!(matches!(
        it.eval(new_missing).unwrap_err().kind,
        EvalErrorKind::UndefinedClass { .. }
    ));
}

#[test]
fn undefined_method_is_a_hard_error() {
    let mut h = Harness::new();
    define_counter(&mut h);
    let new = h.new_object("Counter", vec![]);
    let c1 = h.var("c");
    let init = h.assign(c1, new);
    let c2 = h.var("c");
    let call = h.method_call(c2, "vanish", vec![]);

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert!(matches!(
        it.eval(call).unwrap_err().kind,
        EvalErrorKind::UndefinedMethod { .. }
    ));
}

#[test]
fn private_method_from_outside_reports_and_yields_null() {
    // class Safe { private function secret() { return 1; } }
    let mut h = Harness::new();
    let one = h.int(1);
    let body = h.ret(one);
    {
        let mut functions = h.functions.write();
        let mut classes = h.classes.write();
        // Declaring class id is assigned next; register method after.
        let placeholder = classes
            .define(&h.interner, ClassSpec::new(h.interner.intern("Safe")))
            .unwrap();
        let secret = functions.define(
            &h.interner,
            Function::guest(h.interner.intern("secret"), vec![], body)
                .with_visibility(Visibility::Private)
                .for_class(placeholder),
        );
        classes
            .define(
                &h.interner,
                ClassSpec::new(h.interner.intern("Safe"))
                    .with_method(h.interner.intern("secret"), secret),
            )
            .unwrap();
    }

    let new = h.new_object("Safe", vec![]);
    let s1 = h.var("s");
    let init = h.assign(s1, new);
    let s2 = h.var("s");
    let call = h.method_call(s2, "secret", vec![]);

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(call).unwrap(), Value::Null);
    let diagnostics = it.env.drain_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("private"));
}

/// class Box { private $hidden = 7; }
fn define_box(h: &mut Harness) {
    let hidden = h.name("hidden");
    let seven = h.int(7);
    h.classes
        .write()
        .define(
            &h.interner,
            ClassSpec::new(h.name("Box")).with_field(
                FieldDef::public(hidden)
                    .with_visibility(Visibility::Private)
                    .with_default(seven),
            ),
        )
        .unwrap();
}

#[test]
fn private_field_read_reports_and_yields_null() {
    let mut h = Harness::new();
    define_box(&mut h);

    let new = h.new_object("Box", vec![]);
    let b1 = h.var("b");
    let init = h.assign(b1, new);
    let b2 = h.var("b");
    let read = h.field(b2, "hidden");

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::Null);
    assert_eq!(it.env.drain_diagnostics().len(), 1);
}

#[test]
fn private_field_alias_reports_and_binds_a_detached_cell() {
    // $r =& $b->hidden; $r = 5; from outside the class.
    let mut h = Harness::new();
    define_box(&mut h);
    let hidden = h.name("hidden");

    let new = h.new_object("Box", vec![]);
    let b1 = h.var("b");
    let init = h.assign(b1, new);
    let r1 = h.var("r");
    let b2 = h.var("b");
    let source = h.field(b2, "hidden");
    let alias = h.assign_ref(r1, source);
    let r2 = h.var("r");
    let five = h.int(5);
    let write = h.assign(r2, five);
    let b3 = h.var("b");

    let mut it = h.interp();
    it.eval(init).unwrap();
    assert_eq!(it.eval(alias).unwrap(), Value::Null);
    assert_eq!(it.env.drain_diagnostics().len(), 1);

    // The write lands in the detached cell, never in the field.
    it.eval(write).unwrap();
    let Value::Object(handle) = it.eval(b3).unwrap() else {
        panic!("expected object");
    };
    assert_eq!(handle.get_field(hidden), Some(Value::Int(7)));
}

#[test]
fn private_field_unset_reports_and_preserves_the_field() {
    let mut h = Harness::new();
    define_box(&mut h);
    let hidden = h.name("hidden");

    let new = h.new_object("Box", vec![]);
    let b1 = h.var("b");
    let init = h.assign(b1, new);
    let b2 = h.var("b");
    let target = h.field(b2, "hidden");
    let drop_field = h.unset(target);
    let b3 = h.var("b");

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(drop_field).unwrap();
    assert_eq!(it.env.drain_diagnostics().len(), 1);
    let Value::Object(handle) = it.eval(b3).unwrap() else {
        panic!("expected object");
    };
    assert_eq!(handle.get_field(hidden), Some(Value::Int(7)));
}

#[test]
fn private_field_nested_write_reports_and_preserves_the_field() {
    // $b->hidden[0] = 1; the element write diverts to a detached array.
    let mut h = Harness::new();
    define_box(&mut h);
    let hidden = h.name("hidden");

    let new = h.new_object("Box", vec![]);
    let b1 = h.var("b");
    let init = h.assign(b1, new);
    let b2 = h.var("b");
    let base = h.field(b2, "hidden");
    let zero = h.int(0);
    let element = h.index(base, zero);
    let one = h.int(1);
    let write = h.assign(element, one);
    let b3 = h.var("b");

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(write).unwrap();
    assert_eq!(it.env.drain_diagnostics().len(), 1);
    let Value::Object(handle) = it.eval(b3).unwrap() else {
        panic!("expected object");
    };
    assert_eq!(handle.get_field(hidden), Some(Value::Int(7)));
}

#[test]
fn constructorless_new_still_evaluates_arguments() {
    let mut h = Harness::new();
    let x1 = h.var("x");
    let one = h.int(1);
    let set = h.assign(x1, one);
    let new = h.new_object("stdClass", vec![set]);
    let x2 = h.var("x");

    let mut it = h.interp();
    assert!(matches!(it.eval(new).unwrap(), Value::Object(_)));
    assert_eq!(it.eval(x2).unwrap(), Value::Int(1));
}

#[test]
fn constructing_base_class_works() {
    let mut h = Harness::new();
    let new = h.new_object("stdClass", vec![]);
    let o1 = h.var("o");
    let init = h.assign(o1, new);
    let o2 = h.var("o");
    let field = h.field(o2, "x");
    let one = h.int(1);
    let write = h.assign(field, one);
    let o3 = h.var("o");
    let read = h.field(o3, "x");

    let mut it = h.interp();
    it.eval(init).unwrap();
    it.eval(write).unwrap();
    assert_eq!(it.eval(read).unwrap(), Value::Int(1));
}
