use fathom_dfa::{Args, Context, Dfa, Diagnostic, DiagnosticKind, LogSink, Value, ValueId};
use fathom_ir::{Ir, Program, SpecialClazz};
use fathom_test_utils::programs;

#[test]
fn test_equal_numerics_stay_exact() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let mut dfa = Dfa::new(&p);
    let a = dfa.values_mut().numeric(i32, Some(5));
    let b = dfa.values_mut().numeric(i32, Some(5));
    assert_eq!(a, b);
    let joined = dfa.values_mut().join(a, b).unwrap();
    assert_eq!(joined, a);
    assert_eq!(dfa.value_string(joined), "i32:5");
}

#[test]
fn test_differing_numerics_widen_to_any() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let mut dfa = Dfa::new(&p);
    let five = dfa.values_mut().numeric(i32, Some(5));
    let seven = dfa.values_mut().numeric(i32, Some(7));
    let joined = dfa.values_mut().join(five, seven).unwrap();
    assert_eq!(dfa.value_string(joined), "i32:any");
}

#[test]
fn test_tag_and_match_binds_original() {
    let fx = programs::tag_and_match();
    let mut sink: Vec<Diagnostic> = Vec::new();
    let analyzed = Dfa::new(&fx.program).run(&mut sink).unwrap();
    assert!(sink.is_empty(), "{sink:?}");

    let dfa = analyzed.dfa();
    let main = dfa.call(dfa.main_call().unwrap());
    assert!(main.returns);
    assert_eq!(dfa.values().field(main.instance, fx.bound), Some(ValueId::UNIT));
    assert!(analyzed.called_clazzes().contains(&fx.taken));
    assert!(!analyzed.called_clazzes().contains(&fx.skipped));
    assert!(!analyzed.clazz_needs_code(fx.skipped));
    assert!(analyzed.clazz_needs_code(fx.choice));
}

#[test]
fn test_equal_requests_share_a_call() {
    let fx = programs::identity_twice();
    let mut dfa = Dfa::new(&fx.program);
    let main = dfa.seed().unwrap();
    let three = dfa.values_mut().numeric(fx.i32, Some(3));
    let args: Args = std::iter::once(three).collect();
    let first = dfa
        .new_call(fx.id, false, None, ValueId::UNIT, args.clone(), None, Context::Call(main))
        .unwrap();
    let second = dfa
        .new_call(fx.id, false, None, ValueId::UNIT, args, None, Context::Call(main))
        .unwrap();
    assert_eq!(first, second);
    let result = dfa.call_result(first).unwrap();
    assert_eq!(result, Some(three));
}

#[test]
fn test_identity_calls_merge_without_site_sensitivity() {
    let fx = programs::identity_twice();
    let count_id_calls = |site_sensitive: bool| {
        let analyzed = Dfa::new(&fx.program)
            .with_site_sensitivity(site_sensitive)
            .run(&mut LogSink)
            .unwrap();
        analyzed
            .dfa()
            .calls()
            .filter(|(_, call)| call.callee() == fx.id)
            .count()
    };
    assert_eq!(count_id_calls(false), 1);
    assert_eq!(count_id_calls(true), 2);
}

#[test]
fn test_uninitialized_field_reported_once() {
    let fx = programs::uninitialized_field();
    let mut sink: Vec<Diagnostic> = Vec::new();
    let analyzed = Dfa::new(&fx.program).run(&mut sink).unwrap();
    assert_eq!(sink.len(), 1, "{sink:?}");
    let diagnostic = &sink[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UninitializedField);
    assert!(diagnostic.context.contains(".y()"));

    let dfa = analyzed.dfa();
    assert!(dfa.field_is_read(fx.y));
    assert!(dfa.field_is_written(fx.x));
    assert!(!dfa.field_is_written(fx.y));
    assert!(analyzed.always_results_in_void(fx.read_y));
    let point = dfa
        .values()
        .iter()
        .find(|(_, v)| matches!(v, Value::Instance { clazz, .. } if *clazz == fx.point))
        .map(|(id, _)| id)
        .unwrap();
    assert_eq!(dfa.values().field(point, fx.y), None);
    assert!(!dfa.call(dfa.main_call().unwrap()).returns);
    assert!(analyzed.clazz_needs_code(fx.main));
}

#[test]
fn test_precondition_is_analyzed_as_its_own_call() {
    let fx = programs::precondition();
    let analyzed = Dfa::new(&fx.program).run(&mut LogSink).unwrap();
    let dfa = analyzed.dfa();
    let mut checked: Vec<_> = dfa
        .calls()
        .filter(|(_, call)| call.callee() == fx.checked)
        .map(|(id, call)| (call.key.pre, call.returns, dfa.call_string(id)))
        .collect();
    checked.sort();
    assert_eq!(
        checked,
        [
            (false, true, "checked()".to_string()),
            (true, true, "checked (precondition)()".to_string()),
        ]
    );
    // only the precondition calls `guard`
    let (_, guard) = dfa
        .calls()
        .find(|(_, call)| call.callee() == fx.guard)
        .unwrap();
    let Context::Call(caller) = guard.context else {
        panic!("guard called from entry point");
    };
    assert!(dfa.call(caller).key.pre);
    assert!(analyzed.clazz_needs_code(fx.guard));
}
