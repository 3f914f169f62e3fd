use crate::*;

fn point_program() -> (Program, Clazz, Clazz) {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let point = p.clazz().name("point").kind(ClazzKind::Routine).new();
    let x = p.field().owner(point).name("x").ty(i32).arg(true).new();
    p.body(point, vec![Expr::Arg(0), Expr::Current, p.assign(x)])
        .unwrap();
    let main = p.clazz().name("main").kind(ClazzKind::Routine).new();
    p.body(
        main,
        vec![
            Expr::Unit,
            Expr::Const {
                clazz: i32,
                data: ConstData::Numeric(3),
            },
            p.call(point),
            Expr::Pop,
        ],
    )
    .unwrap();
    p.set_main(main);
    (p, point, x)
}

#[test]
fn test_clazz_queries() {
    let (p, point, x) = point_program();
    assert_eq!(p.clazz_name(point), "point");
    assert_eq!(p.clazz_kind(x), ClazzKind::Field);
    assert_eq!(p.clazz_args(point), &[x]);
    assert_eq!(p.clazz_outer(point), Some(p.universe()));
    assert_eq!(p.clazz_outer(x), Some(point));
    // constructors result in themselves
    assert_eq!(p.clazz_result_clazz(point), point);
    assert_eq!(p.clazz_result_field(point), None);
    assert!(p.clazz_is_numeric(p.clazz_result_clazz(x)));
    assert!(p.clazz_is_unit_type(p.universe()));
    assert_eq!(p.find("point"), Some(point));
}

#[test]
fn test_specials_are_created_once() {
    let mut p = Program::new();
    let a = p.special(SpecialClazz::Bool);
    let b = p.special(SpecialClazz::Bool);
    assert_eq!(a, b);
    assert_eq!(p.clazz_kind(a), ClazzKind::Choice);
    assert_eq!(p.clazz_of(SpecialClazz::Bool), Some(a));
    assert_eq!(p.clazz_of(SpecialClazz::F64), None);
}

#[test]
fn test_ref_clazz() {
    let mut p = Program::new();
    let shape = p.clazz().name("circle").kind(ClazzKind::Routine).new();
    let rc = p.ref_of(shape);
    assert_eq!(p.ref_of(shape), rc);
    assert!(p.clazz_is_ref(rc));
    assert!(!p.clazz_is_ref(shape));
    assert_eq!(p.clazz_as_value(rc), shape);
    assert_eq!(p.clazz_as_value(shape), shape);
    assert_eq!(p.clazz_name(rc), "ref circle");
}

#[test]
fn test_intrinsic_defaults() {
    let mut p = Program::new();
    let exit = p
        .clazz()
        .name("exit")
        .kind(ClazzKind::Intrinsic)
        .intrinsic("sys.exit")
        .new();
    let unit = p.clazz_of(SpecialClazz::Unit).unwrap();
    assert_eq!(p.clazz_result_clazz(exit), unit);
    assert_eq!(p.intrinsic_name(exit), Some("sys.exit"));

    let plain = p.clazz().name("i32.add").kind(ClazzKind::Intrinsic).new();
    assert_eq!(p.intrinsic_name(plain), Some("i32.add"));
    assert_eq!(p.intrinsic_name(p.universe()), None);
}

#[test]
fn test_sites_and_accesses() {
    let (p, point, x) = point_program();
    let main = p.main_clazz().unwrap();
    let body = p.clazz_code(main).unwrap();
    assert_eq!(p.code_len(body), 4);
    assert_eq!(p.code_clazz(body), main);
    let call_site = Site::new(body, 2);
    assert_eq!(p.site_clazz(call_site), main);
    assert_eq!(
        p.accessed_clazzes(call_site).as_ref(),
        &[Access {
            target: p.universe(),
            callee: point
        }]
    );
    assert!(p.accessed_clazzes(Site::new(body, 0)).is_empty());
    assert!(p.expr(Site::new(body, 4)).is_none());

    let point_body = p.clazz_code(point).unwrap();
    let assign = p.expr(Site::new(point_body, 2)).unwrap();
    assert_eq!(assign.name(), "assign");
    assert_eq!(assign.accesses()[0].callee, x);
}

#[test]
fn test_validate() {
    let (p, _, _) = point_program();
    assert_eq!(p.validate(), Ok(()));

    let mut missing_main = Program::new();
    missing_main.special(SpecialClazz::I32);
    assert_eq!(missing_main.validate(), Err(ProgramError::MissingMain));
}

#[test]
fn test_validate_arity() {
    let (mut p, point, _) = point_program();
    let main = p.main_clazz().unwrap();
    let bad = p
        .body(
            main,
            vec![
                Expr::Unit,
                Expr::Call {
                    target: p.universe(),
                    args: 0,
                    accesses: vec![Access {
                        target: p.universe(),
                        callee: point,
                    }],
                },
            ],
        )
        .unwrap();
    let err = p.validate().unwrap_err();
    assert_eq!(
        err,
        ProgramError::ArityMismatch {
            site: Site::new(bad, 1),
            callee: point,
            expected: 1,
            found: 0,
        }
    );
    assert_eq!(
        err.to_string(),
        format!(
            "call at {} passes 0 argument(s), callee expects 1",
            Site::new(bad, 1)
        )
    );
}

#[test]
fn test_body_requires_routine() {
    let mut p = Program::new();
    let i32 = p.special(SpecialClazz::I32);
    let owner = p.clazz().name("o").kind(ClazzKind::Routine).new();
    let f = p.field().owner(owner).name("f").ty(i32).new();
    assert!(matches!(
        p.body(f, vec![]),
        Err(ProgramError::NotARoutine { .. })
    ));
}

#[test]
fn test_intern_table() {
    let mut table: InternTable<&'static str, Clazz> = InternTable::new();
    let (a, fresh) = table.insert("a");
    assert!(fresh);
    let (again, fresh) = table.insert("a");
    assert!(!fresh);
    assert_eq!(a, again);
    let b = table.intern("b");
    assert_ne!(a, b);
    assert_eq!(table.resolve(b), Some(&"b"));
    assert_eq!(table.lookup(&"c"), None);
    assert_eq!(table.len(), 2);
}
