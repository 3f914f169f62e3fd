use fathom_dfa::{AnalyzedIr, Context, Dfa, Diagnostic, LogSink};
use fathom_ir::{ClazzKind, Ir, Program, Site, SpecialClazz};
use fathom_test_utils::programs::{self, Effects};

fn analyze(fx: &Effects) -> AnalyzedIr<'_, Program> {
    Dfa::new(&fx.program).run(&mut LogSink).unwrap()
}

#[test]
fn test_later_defaults_join() {
    let fx = programs::effect_program(false);
    let analyzed = analyze(&fx);
    let dfa = analyzed.dfa();
    let installed = dfa.default_effect(fx.effect).unwrap();
    // both `E.default` sites contribute
    assert_eq!(dfa.value_string(installed), "{E@4#1, E@4#5}");
}

#[test]
fn test_defaults_from_both_branches_are_kept() {
    let fx = programs::branching_defaults();
    let mut dfa = Dfa::new(&fx.program)
        .run(&mut LogSink)
        .unwrap()
        .into_dfa();
    let installed = dfa.default_effect(fx.effect).unwrap();
    assert_eq!(dfa.values().components(installed).len(), 2);
    for block in [fx.when_true, fx.when_false] {
        let value =
            dfa.values_mut()
                .instance(fx.effect, Some(Site::new(block, 1)), None, Context::EntryPoint);
        assert!(dfa.values_mut().is_subseteq(value, installed).unwrap());
    }
}

#[test]
fn test_default_replace_default() {
    let fx = programs::effect_operations();
    let mut sink: Vec<Diagnostic> = Vec::new();
    let mut dfa = Dfa::new(&fx.program).run(&mut sink).unwrap().into_dfa();
    assert!(sink.is_empty(), "{sink:?}");

    let at = |index| Site::new(fx.body, index);
    let installed = dfa.default_effect(fx.effect).unwrap();
    assert_eq!(
        dfa.value_string(installed),
        format!("{{E@{}, E@{}, E@{}}}", at(1), at(5), at(9))
    );
    // the first writer's value is still there
    let first = dfa
        .values_mut()
        .instance(fx.effect, Some(at(1)), None, Context::EntryPoint);
    assert!(dfa.values_mut().is_subseteq(first, installed).unwrap());
}

#[test]
fn test_is_installed() {
    let fx = programs::effect_operations();
    let mut dfa = Dfa::new(&fx.program)
        .run(&mut LogSink)
        .unwrap()
        .into_dfa();
    let main = dfa.call(dfa.main_call().unwrap()).instance;
    let installed = dfa.values().field(main, fx.installed);
    let other = dfa.values().field(main, fx.other_installed);
    assert_eq!(installed, Some(dfa.bool_const(true)));
    assert_eq!(other, Some(dfa.bool_any().unwrap()));
    assert_eq!(dfa.get_effect(None, fx.other), None);
}

#[test]
fn test_equal_effect_types_share_an_environment() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let effect = p.clazz().name("E").kind(ClazzKind::Routine).new();
    let other = p.clazz().name("F").kind(ClazzKind::Routine).new();
    let mut dfa = Dfa::new(&p);
    let one = dfa.values_mut().numeric(i32, Some(1));
    let two = dfa.values_mut().numeric(i32, Some(2));

    let first = dfa.new_env(None, effect, one, None).unwrap();
    let second = dfa.new_env(None, effect, two, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(dfa.envs().len(), 1);
    let bound = dfa.get_effect(Some(first), effect).unwrap();
    assert_eq!(dfa.value_string(bound), "i32:any");

    let nested = dfa.new_env(Some(first), other, one, None).unwrap();
    assert_ne!(nested, first);
    assert_eq!(dfa.env_string(nested), "[E, F]");
    assert_eq!(dfa.get_effect(Some(nested), effect), Some(bound));
}

#[test]
fn test_installed_effects_are_not_reported() {
    let fx = programs::effect_program(false);
    let mut sink: Vec<Diagnostic> = Vec::new();
    Dfa::new(&fx.program).run(&mut sink).unwrap();
    assert!(sink.is_empty(), "{sink:?}");
}

#[test]
fn test_requirements_stop_at_abortable() {
    let fx = programs::effect_program(false);
    let analyzed = analyze(&fx);
    assert!(analyzed.effects_required_by(fx.user).contains(fx.effect));
    assert!(analyzed.effects_required_by(fx.lambda_call).contains(fx.effect));
    assert!(analyzed.effects_required_by(fx.abortable).is_empty());
    // `main` calls `user`, which relies on the default
    assert!(analyzed.effects_required_by(fx.main).contains(fx.effect));
}

#[test]
fn test_abortable_runs_code_in_new_environment() {
    let fx = programs::effect_program(false);
    let analyzed = analyze(&fx);
    let dfa = analyzed.dfa();
    let (id, lambda) = dfa
        .calls()
        .find(|(_, call)| call.callee() == fx.lambda_call)
        .unwrap();
    assert!(lambda.returns);
    let env = lambda.env().unwrap();
    assert_eq!(dfa.env_string(env), "[E]");
    let bound = dfa.get_effect(Some(env), fx.effect).unwrap();
    assert_eq!(dfa.value_string(bound), "E@4#12");
    assert!(!dfa.env(env).aborted);
    assert_eq!(dfa.call_string(id), "lambda@4#14.lambda.call() in [E]");
    assert!(dfa.call(dfa.main_call().unwrap()).returns);
}

#[test]
fn test_abort_returns_from_abortable() {
    let fx = programs::effect_program(true);
    let analyzed = analyze(&fx);
    let dfa = analyzed.dfa();
    let (_, lambda) = dfa
        .calls()
        .find(|(_, call)| call.callee() == fx.lambda_call)
        .unwrap();
    assert!(!lambda.returns);
    let env = lambda.env().unwrap();
    assert!(dfa.env(env).aborted);

    let body = fx.program.clazz_code(fx.lambda_call).unwrap();
    assert!(analyzed.always_results_in_void(Site::new(body, 1)));
    // `E.abortable` still returns, so main does too
    assert!(dfa.call(dfa.main_call().unwrap()).returns);
}
