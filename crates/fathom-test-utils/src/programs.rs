//! Small programs exercising one analysis feature each.
//!
//! Each fixture returns the [`Program`] together with the clazzes and sites
//! tests want to inspect.

use fathom_ir::{
    Clazz, ClazzKind, CodeBlock, ConstData, Expr, MatchCase, Program, Site, SourcePos,
    SpecialClazz,
};
use smallvec::smallvec;

fn i32_const(clazz: Clazz, value: i64) -> Expr {
    Expr::Const {
        clazz,
        data: ConstData::Numeric(value),
    }
}

fn routine(p: &mut Program, name: &str, outer: Option<Clazz>) -> Clazz {
    p.clazz()
        .name(name)
        .kind(ClazzKind::Routine)
        .maybe_outer(outer)
        .new()
}

pub struct Identity {
    pub program: Program,
    pub main: Clazz,
    pub id: Clazz,
    pub i32: Clazz,
}

/// `main` calls `id(3)` from two different sites.
pub fn identity_twice() -> Identity {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let id = p
        .clazz()
        .name("id")
        .kind(ClazzKind::Routine)
        .result(i32)
        .new();
    p.field().owner(id).name("x").ty(i32).arg(true).new();
    let result = p
        .field()
        .owner(id)
        .name("result")
        .ty(i32)
        .result(true)
        .new();
    let assign = p.assign(result);
    p.body(id, vec![Expr::Arg(0), Expr::Current, assign])
        .unwrap();

    let main = routine(&mut p, "main", None);
    let call = p.call(id);
    p.body(
        main,
        vec![
            Expr::Unit,
            i32_const(i32, 3),
            call.clone(),
            Expr::Pop,
            Expr::Unit,
            i32_const(i32, 3),
            call,
            Expr::Pop,
        ],
    )
    .unwrap();
    p.set_main(main);
    Identity {
        program: p,
        main,
        id,
        i32,
    }
}

pub struct Point {
    pub program: Program,
    pub main: Clazz,
    pub point: Clazz,
    pub x: Clazz,
    pub y: Clazz,
    /// Site reading `y`.
    pub read_y: Site,
}

/// `point(3).y` where the constructor only initializes `x`.
pub fn uninitialized_field() -> Point {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let point = routine(&mut p, "point", None);
    let x = p.field().owner(point).name("x").ty(i32).arg(true).new();
    let y = p.field().owner(point).name("y").ty(i32).new();
    let assign = p.assign(x);
    p.body(point, vec![Expr::Arg(0), Expr::Current, assign])
        .unwrap();

    let main = routine(&mut p, "main", None);
    let (call_point, call_y) = (p.call(point), p.call(y));
    let block = p
        .body(
            main,
            vec![
                Expr::Unit,
                i32_const(i32, 3),
                call_point,
                call_y,
                Expr::Pop,
            ],
        )
        .unwrap();
    let read_y = Site::new(block, 3);
    p.set_site_pos(read_y, SourcePos::new("main.fz", 4, 3));
    p.set_main(main);
    Point {
        program: p,
        main,
        point,
        x,
        y,
        read_y,
    }
}

pub struct Choice {
    pub program: Program,
    pub main: Clazz,
    pub choice: Clazz,
    /// Field of `main` the matched payload is bound to.
    pub bound: Clazz,
    /// Called from the taken case.
    pub taken: Clazz,
    /// Called from the case that is never taken.
    pub skipped: Clazz,
}

/// Tag unit as case 0 of a two-case choice and match on it.
pub fn tag_and_match() -> Choice {
    let mut p = Program::new();
    let unit = p.special(SpecialClazz::Unit);
    let choice = p.clazz().name("C").kind(ClazzKind::Choice).new();
    let payload = routine(&mut p, "payload", None);
    let taken = routine(&mut p, "taken", None);
    p.body(taken, vec![]).unwrap();
    let skipped = routine(&mut p, "skipped", None);
    p.body(skipped, vec![]).unwrap();

    let main = routine(&mut p, "main", None);
    let bound = p.field().owner(main).name("bound").ty(payload).new();
    let (call_taken, call_skipped) = (p.call(taken), p.call(skipped));
    let case0 = p.block(main, vec![Expr::Unit, call_taken, Expr::Pop]);
    let case1 = p.block(main, vec![Expr::Unit, call_skipped, Expr::Pop]);
    p.body(
        main,
        vec![
            Expr::Unit,
            Expr::Tag {
                value: unit,
                choice,
                tag: 0,
            },
            Expr::Match {
                subject: choice,
                cases: vec![
                    MatchCase {
                        tags: smallvec![0],
                        field: Some(bound),
                        code: case0,
                    },
                    MatchCase {
                        tags: smallvec![1],
                        field: None,
                        code: case1,
                    },
                ],
            },
        ],
    )
    .unwrap();
    p.set_main(main);
    Choice {
        program: p,
        main,
        choice,
        bound,
        taken,
        skipped,
    }
}

pub struct Counter {
    pub program: Program,
    pub main: Clazz,
    pub count: Clazz,
}

/// `count(n) => if n < 10 then count(n + 1)`, started at 0.
pub fn recursive_counter() -> Counter {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let bool = p.special(SpecialClazz::Bool);
    let unit = p.special(SpecialClazz::Unit);
    let lt = p
        .clazz()
        .name("i32.lt")
        .kind(ClazzKind::Intrinsic)
        .outer(i32)
        .result(bool)
        .new();
    p.field().owner(lt).name("other").ty(i32).arg(true).new();
    let add = p
        .clazz()
        .name("i32.add")
        .kind(ClazzKind::Intrinsic)
        .outer(i32)
        .result(i32)
        .new();
    p.field().owner(add).name("other").ty(i32).arg(true).new();

    let count = p
        .clazz()
        .name("count")
        .kind(ClazzKind::Routine)
        .result(unit)
        .new();
    p.field().owner(count).name("n").ty(i32).arg(true).new();
    let (call_lt, call_add, call_count) = (p.call(lt), p.call(add), p.call(count));
    let again = p.block(
        count,
        vec![
            Expr::Unit,
            Expr::Arg(0),
            i32_const(i32, 1),
            call_add,
            call_count.clone(),
            Expr::Pop,
        ],
    );
    let stop = p.block(count, vec![]);
    p.body(
        count,
        vec![
            Expr::Arg(0),
            i32_const(i32, 10),
            call_lt,
            Expr::Match {
                subject: bool,
                cases: vec![
                    MatchCase {
                        tags: smallvec![1],
                        field: None,
                        code: again,
                    },
                    MatchCase {
                        tags: smallvec![0],
                        field: None,
                        code: stop,
                    },
                ],
            },
        ],
    )
    .unwrap();

    let main = routine(&mut p, "main", None);
    p.body(
        main,
        vec![Expr::Unit, i32_const(i32, 0), call_count, Expr::Pop],
    )
    .unwrap();
    p.set_main(main);
    Counter {
        program: p,
        main,
        count,
    }
}

pub struct Effects {
    pub program: Program,
    pub main: Clazz,
    /// The effect type.
    pub effect: Clazz,
    /// Body of the lambda run under `effect.abortable`; reads the effect.
    pub lambda_call: Clazz,
    /// Reads the effect outside of any `effect.abortable`.
    pub user: Clazz,
    pub abortable: Clazz,
}

/// An effect `E` with `E.default`, `E.abortable` and `E.abort` operations.
///
/// `main` installs two defaults from different sites, calls `user`, and runs
/// a lambda under `E.abortable` that reads `E`. With `abort`, the lambda ends
/// in `E.abort` instead of returning.
pub fn effect_program(abort: bool) -> Effects {
    let mut p = Program::new();
    let effect = routine(&mut p, "E", None);
    p.body(effect, vec![]).unwrap();
    let intrinsic = |p: &mut Program, name: &str, intrinsic: &str| {
        p.clazz()
            .name(name)
            .kind(ClazzKind::Intrinsic)
            .outer(effect)
            .effect(effect)
            .intrinsic(intrinsic)
            .new()
    };
    let default = intrinsic(&mut p, "E.default", "effect.default");
    let abortable = intrinsic(&mut p, "E.abortable", "effect.abortable");
    let abort_op = intrinsic(&mut p, "E.abort", "effect.abort");

    let lambda = routine(&mut p, "lambda", None);
    p.body(lambda, vec![]).unwrap();
    p.field()
        .owner(abortable)
        .name("code")
        .ty(lambda)
        .arg(true)
        .new();
    let lambda_call = routine(&mut p, "lambda.call", Some(lambda));
    let last = if abort { p.call(abort_op) } else { Expr::Pop };
    p.body(lambda_call, vec![Expr::Env { effect }, last])
        .unwrap();
    p.set_call(lambda, lambda_call);

    let user = routine(&mut p, "user", None);
    p.body(user, vec![Expr::Env { effect }, Expr::Pop])
        .unwrap();

    let main = routine(&mut p, "main", None);
    let (new_effect, install, run, new_lambda, call_user) = (
        p.call(effect),
        p.call(default),
        p.call(abortable),
        p.call(lambda),
        p.call(user),
    );
    p.body(
        main,
        vec![
            Expr::Unit,
            new_effect.clone(),
            install.clone(),
            Expr::Pop,
            Expr::Unit,
            new_effect.clone(),
            install,
            Expr::Pop,
            Expr::Unit,
            call_user,
            Expr::Pop,
            Expr::Unit,
            new_effect,
            Expr::Unit,
            new_lambda,
            run,
            Expr::Pop,
        ],
    )
    .unwrap();
    p.set_main(main);
    Effects {
        program: p,
        main,
        effect,
        lambda_call,
        user,
        abortable,
    }
}

/// Reads effect `missing` that nobody installs.
pub fn missing_effect() -> (Program, Clazz) {
    let mut p = Program::new();
    let missing = routine(&mut p, "missing", None);
    let main = routine(&mut p, "main", None);
    let block: CodeBlock = p
        .body(main, vec![Expr::Env { effect: missing }, Expr::Pop])
        .unwrap();
    p.set_site_pos(Site::new(block, 0), SourcePos::new("main.fz", 2, 5));
    p.set_main(main);
    (p, missing)
}

pub struct Shapes {
    pub program: Program,
    pub main: Clazz,
    pub shape: Clazz,
    pub circle_area: Clazz,
    pub square_area: Clazz,
    /// The dynamically bound `area` call.
    pub dispatch: Site,
}

/// `(circle as ref shape).area` with `circle` and `square` implementing
/// `area`; only `circle` is ever created.
pub fn shapes() -> Shapes {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let shape = p.clazz().name("shape").kind(ClazzKind::Abstract).new();
    let shape_ref = p.ref_of(shape);

    let area = |p: &mut Program, owner: Clazz, value: i64| {
        let name = format!("{}.area", p.clazz_info(owner).map_or("", |i| i.name()));
        let area = p
            .clazz()
            .name(name)
            .kind(ClazzKind::Routine)
            .outer(owner)
            .result(i32)
            .new();
        let result = p
            .field()
            .owner(area)
            .name("result")
            .ty(i32)
            .result(true)
            .new();
        let assign = p.assign(result);
        p.body(area, vec![i32_const(i32, value), Expr::Current, assign])
            .unwrap();
        area
    };
    let circle = routine(&mut p, "circle", None);
    p.body(circle, vec![]).unwrap();
    let circle_area = area(&mut p, circle, 1);
    let square = routine(&mut p, "square", None);
    p.body(square, vec![]).unwrap();
    let square_area = area(&mut p, square, 2);
    let (circle_ref, square_ref) = (p.ref_of(circle), p.ref_of(square));

    let main = routine(&mut p, "main", None);
    let new_circle = p.call(circle);
    let dispatch = p.dynamic_call(
        shape_ref,
        &[(circle_ref, circle_area), (square_ref, square_area)],
    );
    let block = p
        .body(
            main,
            vec![
                Expr::Unit,
                new_circle,
                Expr::Box {
                    value: circle,
                    reference: circle_ref,
                },
                dispatch,
                Expr::Pop,
            ],
        )
        .unwrap();
    p.set_main(main);
    Shapes {
        program: p,
        main,
        shape,
        circle_area,
        square_area,
        dispatch: Site::new(block, 3),
    }
}

/// An effect type `E` with the given effect operations, each an intrinsic
/// declared in `E`.
fn effect_with(p: &mut Program, ops: &[(&str, &str, Option<Clazz>)]) -> (Clazz, Vec<Clazz>) {
    let effect = routine(p, "E", None);
    p.body(effect, vec![]).unwrap();
    let ops = ops
        .iter()
        .map(|&(name, intrinsic, result)| {
            p.clazz()
                .name(name)
                .kind(ClazzKind::Intrinsic)
                .outer(effect)
                .maybe_result(result)
                .effect(effect)
                .intrinsic(intrinsic)
                .new()
        })
        .collect();
    (effect, ops)
}

pub struct BranchingDefaults {
    pub program: Program,
    pub effect: Clazz,
    /// Code of the case taken when `flip` is true.
    pub when_true: CodeBlock,
    pub when_false: CodeBlock,
}

/// `if flip then E.default else E.default`, each branch on its own `E`.
///
/// `flip` is an intrinsic without registered semantics, so both branches
/// are taken.
pub fn branching_defaults() -> BranchingDefaults {
    let mut p = Program::new();
    let bool = p.special(SpecialClazz::Bool);
    let (effect, ops) = effect_with(&mut p, &[("E.default", "effect.default", None)]);
    let flip = p
        .clazz()
        .name("flip")
        .kind(ClazzKind::Intrinsic)
        .result(bool)
        .new();
    let main = routine(&mut p, "main", None);
    let (new_effect, install, call_flip) = (p.call(effect), p.call(ops[0]), p.call(flip));
    let branch = |p: &mut Program| {
        p.block(
            main,
            vec![Expr::Unit, new_effect.clone(), install.clone(), Expr::Pop],
        )
    };
    let when_true = branch(&mut p);
    let when_false = branch(&mut p);
    p.body(
        main,
        vec![
            Expr::Unit,
            call_flip,
            Expr::Match {
                subject: bool,
                cases: vec![
                    MatchCase {
                        tags: smallvec![1],
                        field: None,
                        code: when_true,
                    },
                    MatchCase {
                        tags: smallvec![0],
                        field: None,
                        code: when_false,
                    },
                ],
            },
        ],
    )
    .unwrap();
    p.set_main(main);
    BranchingDefaults {
        program: p,
        effect,
        when_true,
        when_false,
    }
}

pub struct EffectOperations {
    pub program: Program,
    pub main: Clazz,
    pub effect: Clazz,
    /// Effect type that is never installed.
    pub other: Clazz,
    /// `E.is_installed` result, stored by `main`.
    pub installed: Clazz,
    /// `F.is_installed` result, stored by `main`.
    pub other_installed: Clazz,
    pub body: CodeBlock,
}

/// `E.default`, `E.replace`, `E.default` on three fresh `E`s, followed by
/// `E.is_installed` and `F.is_installed` for an `F` nobody installs.
pub fn effect_operations() -> EffectOperations {
    let mut p = Program::new();
    let bool = p.special(SpecialClazz::Bool);
    let (effect, ops) = effect_with(
        &mut p,
        &[
            ("E.default", "effect.default", None),
            ("E.replace", "effect.replace", None),
            ("E.is_installed", "effect.is_installed", Some(bool)),
        ],
    );
    let other = routine(&mut p, "F", None);
    p.body(other, vec![]).unwrap();
    let other_is_installed = p
        .clazz()
        .name("F.is_installed")
        .kind(ClazzKind::Intrinsic)
        .outer(other)
        .result(bool)
        .effect(other)
        .intrinsic("effect.is_installed")
        .new();

    let main = routine(&mut p, "main", None);
    let installed = p.field().owner(main).name("installed").ty(bool).new();
    let other_installed = p
        .field()
        .owner(main)
        .name("other_installed")
        .ty(bool)
        .new();
    let new_effect = p.call(effect);
    let run = |p: &Program, op: Clazz| vec![Expr::Unit, new_effect.clone(), p.call(op), Expr::Pop];
    let mut code = Vec::new();
    code.extend(run(&p, ops[0]));
    code.extend(run(&p, ops[1]));
    code.extend(run(&p, ops[0]));
    code.extend([
        Expr::Unit,
        new_effect.clone(),
        p.call(ops[2]),
        Expr::Current,
        p.assign(installed),
        Expr::Unit,
        p.call(other),
        p.call(other_is_installed),
        Expr::Current,
        p.assign(other_installed),
    ]);
    let body = p.body(main, code).unwrap();
    p.set_main(main);
    EffectOperations {
        program: p,
        main,
        effect,
        other,
        installed,
        other_installed,
        body,
    }
}

pub struct Spawn {
    pub program: Program,
    /// Runs under `E.abortable` and spawns `task`.
    pub lambda_call: Clazz,
    /// Code run by the spawned thread.
    pub task_call: Clazz,
    pub task: Clazz,
}

/// A lambda run under `E.abortable` that hands `task` to
/// `sys.thread.spawn`.
pub fn spawn_in_effect() -> Spawn {
    let mut p = Program::new();
    let (effect, ops) = effect_with(&mut p, &[("E.abortable", "effect.abortable", None)]);
    let abortable = ops[0];

    let task = routine(&mut p, "task", None);
    p.body(task, vec![]).unwrap();
    let task_call = routine(&mut p, "task.call", Some(task));
    p.body(task_call, vec![]).unwrap();
    p.set_call(task, task_call);
    let spawn = p
        .clazz()
        .name("spawn")
        .kind(ClazzKind::Intrinsic)
        .intrinsic("sys.thread.spawn")
        .new();
    p.field().owner(spawn).name("code").ty(task).arg(true).new();

    let lambda = routine(&mut p, "lambda", None);
    p.body(lambda, vec![]).unwrap();
    p.field()
        .owner(abortable)
        .name("code")
        .ty(lambda)
        .arg(true)
        .new();
    let lambda_call = routine(&mut p, "lambda.call", Some(lambda));
    let (new_task, call_spawn) = (p.call(task), p.call(spawn));
    p.body(
        lambda_call,
        vec![Expr::Unit, Expr::Unit, new_task, call_spawn, Expr::Pop],
    )
    .unwrap();
    p.set_call(lambda, lambda_call);

    let main = routine(&mut p, "main", None);
    let (new_effect, new_lambda, run) = (p.call(effect), p.call(lambda), p.call(abortable));
    p.body(
        main,
        vec![
            Expr::Unit,
            new_effect,
            Expr::Unit,
            new_lambda,
            run,
            Expr::Pop,
        ],
    )
    .unwrap();
    p.set_main(main);
    Spawn {
        program: p,
        lambda_call,
        task_call,
        task,
    }
}

pub struct Precondition {
    pub program: Program,
    pub checked: Clazz,
    /// Called only from the precondition of `checked`.
    pub guard: Clazz,
}

/// `checked` with a precondition calling `guard`.
pub fn precondition() -> Precondition {
    let mut p = Program::new();
    let unit = p.special(SpecialClazz::Unit);
    let guard = p
        .clazz()
        .name("guard")
        .kind(ClazzKind::Routine)
        .result(unit)
        .new();
    p.body(guard, vec![]).unwrap();
    let checked = p
        .clazz()
        .name("checked")
        .kind(ClazzKind::Routine)
        .result(unit)
        .new();
    p.body(checked, vec![]).unwrap();
    let call_guard = p.call(guard);
    p.precondition(checked, vec![Expr::Unit, call_guard, Expr::Pop])
        .unwrap();
    let main = routine(&mut p, "main", None);
    let call_checked = p.call(checked);
    p.body(main, vec![Expr::Unit, call_checked, Expr::Pop])
        .unwrap();
    p.set_main(main);
    Precondition {
        program: p,
        checked,
        guard,
    }
}

pub struct Escaping {
    pub program: Program,
    pub main: Clazz,
    pub payload: Clazz,
    /// Stores a payload into the holder and one into a local field.
    pub store: Clazz,
    /// Stores its own instance into the holder.
    pub register: Clazz,
    /// Creates the payload stored into the holder.
    pub stored: Site,
    /// Creates the payload kept in a local field of `store`.
    pub kept: Site,
}

/// `main` creates a `holder` and passes it to `store` and `register`.
pub fn escaping() -> Escaping {
    let mut p = Program::new();
    let unit = p.special(SpecialClazz::Unit);
    let payload = routine(&mut p, "payload", None);
    p.body(payload, vec![]).unwrap();
    let holder = routine(&mut p, "holder", None);
    p.body(holder, vec![]).unwrap();
    let item = p.field().owner(holder).name("item").ty(payload).new();

    let unit_routine = |p: &mut Program, name: &str| {
        let r = p
            .clazz()
            .name(name)
            .kind(ClazzKind::Routine)
            .result(unit)
            .new();
        p.field().owner(r).name("h").ty(holder).arg(true).new();
        r
    };
    let store = unit_routine(&mut p, "store");
    let local = p.field().owner(store).name("local").ty(payload).new();
    let register = unit_routine(&mut p, "register");
    let last = p.field().owner(holder).name("last").ty(register).new();

    let (new_payload, set_item, set_local, set_last) =
        (p.call(payload), p.assign(item), p.assign(local), p.assign(last));
    let store_body = p
        .body(
            store,
            vec![
                Expr::Unit,
                new_payload.clone(),
                Expr::Arg(0),
                set_item,
                Expr::Unit,
                new_payload,
                Expr::Current,
                set_local,
            ],
        )
        .unwrap();
    p.body(register, vec![Expr::Current, Expr::Arg(0), set_last])
        .unwrap();

    let main = routine(&mut p, "main", None);
    let h = p.field().owner(main).name("h").ty(holder).new();
    let (new_holder, set_h, read_h) = (p.call(holder), p.assign(h), p.call(h));
    let (call_store, call_register) = (p.call(store), p.call(register));
    p.body(
        main,
        vec![
            Expr::Unit,
            new_holder,
            Expr::Current,
            set_h,
            Expr::Unit,
            Expr::Current,
            read_h.clone(),
            call_store,
            Expr::Pop,
            Expr::Unit,
            Expr::Current,
            read_h,
            call_register,
            Expr::Pop,
        ],
    )
    .unwrap();
    p.set_main(main);
    Escaping {
        program: p,
        main,
        payload,
        store,
        register,
        stored: Site::new(store_body, 1),
        kept: Site::new(store_body, 5),
    }
}
