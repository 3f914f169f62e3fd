use fathom_dfa::{Dfa, LogSink};
use fathom_ir::{ClazzKind, Ir};
use fathom_test_utils::programs;

#[test]
fn test_dispatch_narrowed_to_reached_implementations() {
    let fx = programs::shapes();
    let analyzed = Dfa::new(&fx.program).run(&mut LogSink).unwrap();

    let statically: Vec<_> = fx
        .program
        .accessed_clazzes(fx.dispatch)
        .iter()
        .map(|a| a.callee)
        .collect();
    assert_eq!(statically, [fx.circle_area, fx.square_area]);
    let observed: Vec<_> = analyzed
        .accessed_clazzes(fx.dispatch)
        .iter()
        .map(|a| a.callee)
        .collect();
    assert_eq!(observed, [fx.circle_area]);
}

#[test]
fn test_code_needed_only_for_reached_clazzes() {
    let fx = programs::shapes();
    let analyzed = Dfa::new(&fx.program).run(&mut LogSink).unwrap();
    assert!(analyzed.clazz_needs_code(fx.main));
    assert!(analyzed.clazz_needs_code(fx.circle_area));
    assert!(!analyzed.clazz_needs_code(fx.square_area));
    assert_eq!(analyzed.clazz_kind(fx.shape), ClazzKind::Abstract);
    assert!(analyzed.clazz_needs_code(fx.shape));
    // the original program keeps everything
    assert!(fx.program.clazz_needs_code(fx.square_area));
}

#[test]
fn test_dispatch_result() {
    let fx = programs::shapes();
    let analyzed = Dfa::new(&fx.program).run(&mut LogSink).unwrap();
    assert!(!analyzed.always_results_in_void(fx.dispatch));
    let area = analyzed
        .dfa()
        .calls()
        .find(|(_, call)| call.callee() == fx.circle_area)
        .map(|(id, _)| id)
        .unwrap();

    let mut dfa = analyzed.into_dfa();
    // the reference was unboxed before the call
    assert_eq!(dfa.call_string(area), "circle@4#1.circle.area()");
    let result = dfa.call_result(area).unwrap().unwrap();
    assert_eq!(dfa.value_string(result), "i32:1");
}
