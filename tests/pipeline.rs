use fathom::prelude::*;
use fathom_test_utils::programs;

#[test]
fn test_analyze_with_options() {
    let fx = programs::identity_twice();
    let options = DfaOptions::builder().max_iterations(20).build();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let analyzed = Dfa::new(&fx.program)
        .with_options(options)
        .run(&mut diagnostics)
        .unwrap();
    assert!(diagnostics.is_empty());

    let dfa = analyzed.dfa();
    let calls: Vec<String> = dfa.calls().map(|(id, _)| dfa.call_string(id)).collect();
    insta::assert_snapshot!(calls.join("\n"), @r"
    main()
    id(i32:3)
    id(i32:3)
    ");
    assert!(analyzed.clazz_needs_code(fx.id));
    assert!(analyzed.clazz_needs_code(fx.main));
}

#[test]
fn test_custom_registry_without_standard_semantics() {
    let fx = programs::recursive_counter();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let analyzed = Dfa::new(&fx.program)
        .with_intrinsics(IntrinsicRegistry::new())
        .run(&mut diagnostics)
        .unwrap();
    // unknown intrinsics widen to any value of their result
    let mut kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
    kinds.dedup();
    assert_eq!(kinds, [DiagnosticKind::MissingIntrinsic]);
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
    assert!(analyzed.is_intrinsic_used("i32.lt"));
    assert!(analyzed.clazz_needs_code(fx.count));
}
