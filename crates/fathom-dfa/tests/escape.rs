use fathom_dfa::{Dfa, Diagnostic, LifeTime, LogSink};
use fathom_test_utils::programs;

#[test]
fn test_stores_into_other_objects_escape() {
    let fx = programs::escaping();
    let mut sink: Vec<Diagnostic> = Vec::new();
    let analyzed = Dfa::new(&fx.program).run(&mut sink).unwrap();
    assert!(sink.is_empty(), "{sink:?}");

    assert!(analyzed.result_escapes(fx.stored));
    // kept in a field of a `store` instance that dies with the call
    assert!(!analyzed.result_escapes(fx.kept));

    assert_eq!(analyzed.life_time(fx.store), LifeTime::Call);
    assert_eq!(analyzed.life_time(fx.register), LifeTime::Unknown);
    assert!(analyzed.instance_escapes(fx.register));
}

#[test]
fn test_constructors_escape() {
    let fx = programs::escaping();
    let analyzed = Dfa::new(&fx.program).run(&mut LogSink).unwrap();
    assert_eq!(analyzed.life_time(fx.payload), LifeTime::Unknown);
    assert_eq!(analyzed.life_time(fx.main), LifeTime::Unknown);
}

#[test]
fn test_routines_with_result_field_stay_local() {
    let fx = programs::identity_twice();
    let analyzed = Dfa::new(&fx.program).run(&mut LogSink).unwrap();
    assert_eq!(analyzed.life_time(fx.id), LifeTime::Call);
    assert!(analyzed.dfa().escapes().clazzes().all(|cl| cl != fx.id));

    let point = programs::uninitialized_field();
    let analyzed = Dfa::new(&point.program).run(&mut LogSink).unwrap();
    assert_eq!(analyzed.life_time(point.x), LifeTime::Undefined);
}

#[test]
fn test_escapes_are_stable_in_reporting_pass() {
    let fx = programs::escaping();
    let mut dfa = Dfa::new(&fx.program);
    dfa.find_fixpoint().unwrap();
    let clazzes: Vec<_> = dfa.escapes().clazzes().collect();
    let sites: Vec<_> = dfa.escapes().sites().collect();
    dfa.report().unwrap();
    assert_eq!(dfa.escapes().clazzes().collect::<Vec<_>>(), clazzes);
    assert_eq!(dfa.escapes().sites().collect::<Vec<_>>(), sites);
}
