use fathom_dfa::{Context, EffectSet, Value, ValueId, ValueTable};
use fathom_ir::{ClazzKind, Program, SpecialClazz};
use fathom_test_utils::lattice::{assert_join_laws_with, assert_semilattice_laws};

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn test_value_join_laws() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let i64 = p.special(SpecialClazz::I64);
    let choice = p.clazz().name("C").kind(ClazzKind::Choice).new();
    let point = p.clazz().name("point").kind(ClazzKind::Routine).new();

    let mut table = ValueTable::new();
    let five = table.numeric(i32, Some(5));
    let seven = table.numeric(i32, Some(7));
    let any = table.numeric(i32, None);
    let wide = table.numeric(i64, Some(5));
    let inst = table.instance(point, None, None, Context::EntryPoint);
    let point_ref = p.ref_of(point);
    let boxed = table.reference(point_ref, inst);
    let boxed_five = table.reference(point_ref, five);
    let array = table.sys_array(i32, None, Context::EntryPoint);
    let elements = [
        ValueId::UNIT,
        ValueId::UNDEFINED,
        five,
        seven,
        any,
        wide,
        inst,
        boxed,
        boxed_five,
        array,
        table.tagged(choice, 0, ValueId::UNIT),
        table.tagged(choice, 0, five),
        table.tagged(choice, 1, seven),
    ];
    assert_join_laws_with(
        &elements,
        |a, b| table.join(a, b).unwrap(),
        Some(ValueId::UNDEFINED),
    );
}

#[test]
fn test_join_is_hash_consed() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let mut table = ValueTable::new();
    let five = table.numeric(i32, Some(5));
    let seven = table.numeric(i32, Some(7));

    // same bits, same handle
    assert_eq!(table.join(five, five).unwrap(), five);
    assert!(!table.get(five).is_set());

    let any = table.join(five, seven).unwrap();
    assert_eq!(table.get(any), &Value::Numeric { clazz: i32, bits: None });

    let a = table.join(ValueId::UNIT, five).unwrap();
    let b = table.join(five, ValueId::UNIT).unwrap();
    assert_eq!(a, b);
    assert_eq!(table.components(a).len(), 2);
    assert!(table.is_subseteq(five, a).unwrap());
    assert!(!table.is_subseteq(a, five).unwrap());
}

#[test]
fn test_box_unbox_round_trip() {
    let mut p = Program::new();
    let point = p.clazz().name("point").kind(ClazzKind::Routine).new();
    let point_ref = p.ref_of(point);
    let mut table = ValueTable::new();
    let inst = table.instance(point, None, None, Context::EntryPoint);

    let boxed = table
        .box_value(inst, point_ref, None, Context::EntryPoint)
        .unwrap();
    assert_eq!(
        table.get(boxed),
        &Value::Ref {
            clazz: point_ref,
            original: inst
        }
    );
    // boxing a reference again is a no-op
    let twice = table
        .box_value(boxed, point_ref, None, Context::EntryPoint)
        .unwrap();
    assert_eq!(twice, boxed);
    assert_eq!(table.unbox(boxed).unwrap(), inst);
    assert_eq!(table.unbox(inst).unwrap(), inst);
}

#[test]
fn test_boxing_a_set_boxes_each_component() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let point = p.clazz().name("point").kind(ClazzKind::Routine).new();
    let point_ref = p.ref_of(point);
    let mut table = ValueTable::new();
    let inst = table.instance(point, None, None, Context::EntryPoint);
    let five = table.numeric(i32, Some(5));
    let set = table.join(inst, five).unwrap();

    let boxed = table
        .box_value(set, point_ref, None, Context::EntryPoint)
        .unwrap();
    let components = table.components(boxed);
    assert_eq!(components.len(), 2);
    for c in components {
        assert!(matches!(table.get(c), Value::Ref { clazz, .. } if *clazz == point_ref));
    }
    assert_eq!(table.unbox(boxed).unwrap(), set);

    // unit gets an identity of the reference clazz
    let unit = table
        .box_value(ValueId::UNIT, point_ref, None, Context::EntryPoint)
        .unwrap();
    assert!(matches!(table.get(unit), Value::Instance { clazz, .. } if *clazz == point_ref));
}

// ---------------------------------------------------------------------------
// Effect requirements
// ---------------------------------------------------------------------------

#[test]
fn test_effect_set_laws() {
    let mut p = Program::new();
    let a = p.clazz().name("a").kind(ClazzKind::Routine).new();
    let b = p.clazz().name("b").kind(ClazzKind::Routine).new();
    let c = p.clazz().name("c").kind(ClazzKind::Routine).new();
    let sets: Vec<EffectSet> = vec![
        EffectSet::new(),
        [a].into_iter().collect(),
        [b].into_iter().collect(),
        [a, b].into_iter().collect(),
        [a, b, c].into_iter().collect(),
    ];
    assert_semilattice_laws(&sets);
}
