use std::collections::BTreeSet;

use fathom_dfa::{CallId, Dfa, DfaError, Diagnostic};
use fathom_ir::Program;
use fathom_test_utils::programs;

#[test]
fn test_recursion_terminates() {
    let fx = programs::recursive_counter();
    let mut dfa = Dfa::new(&fx.program);
    let iterations = dfa.find_fixpoint().unwrap();
    assert!(iterations >= 2, "took {iterations} iteration(s)");
    assert!(dfa.call(dfa.main_call().unwrap()).returns);

    // count(0) and count(i32:any), nothing else
    let counts: Vec<String> = dfa
        .calls()
        .filter(|(_, call)| call.callee() == fx.count)
        .map(|(id, _)| dfa.call_string(id))
        .collect();
    assert_eq!(counts, ["count(i32:0)", "count(i32:any)"]);
    assert!(dfa.intrinsics_used().contains("i32.lt"));
    assert!(dfa.intrinsics_used().contains("i32.add"));
}

#[test]
fn test_iterations_only_grow() {
    let fx = programs::recursive_counter();
    let mut dfa = Dfa::new(&fx.program);
    let mut values = 0;
    let mut calls = 0;
    let mut returning: BTreeSet<CallId> = BTreeSet::new();
    for _ in 0..50 {
        let changed = dfa.step().unwrap();
        assert!(dfa.values().len() >= values);
        assert!(dfa.call_count() >= calls);
        let now: BTreeSet<CallId> = dfa
            .calls()
            .filter(|(_, call)| call.returns)
            .map(|(id, _)| id)
            .collect();
        assert!(now.is_superset(&returning));
        values = dfa.values().len();
        calls = dfa.call_count();
        returning = now;
        if !changed {
            return;
        }
    }
    panic!("no fixpoint after 50 iterations");
}

#[test]
fn test_reporting_pass_changes_nothing() {
    let fx = programs::recursive_counter();
    let mut dfa = Dfa::new(&fx.program);
    dfa.analyze().unwrap();
    assert!(dfa.is_reporting());
    let calls = dfa.call_count();
    assert!(!dfa.step().unwrap());
    assert_eq!(dfa.call_count(), calls);
}

#[test]
fn test_iteration_limit_is_an_error() {
    let fx = programs::recursive_counter();
    let err = Dfa::new(&fx.program)
        .with_max_iterations(1)
        .find_fixpoint()
        .unwrap_err();
    assert!(matches!(err, DfaError::IterationLimit { limit: 1 }));
    assert_eq!(err.to_string(), "no fixpoint after 1 iterations");
}

#[test]
fn test_missing_main() {
    let p = Program::new();
    let err = Dfa::new(&p).run(&mut Vec::<Diagnostic>::new()).err().unwrap();
    assert!(matches!(err, DfaError::MissingMain));
}

#[test]
fn test_seed_is_idempotent() {
    let fx = programs::identity_twice();
    let mut dfa = Dfa::new(&fx.program);
    let first = dfa.seed().unwrap();
    let calls = dfa.call_count();
    assert_eq!(dfa.seed().unwrap(), first);
    assert_eq!(dfa.call_count(), calls);
    assert_eq!(dfa.call(first).callee(), fx.main);
}
