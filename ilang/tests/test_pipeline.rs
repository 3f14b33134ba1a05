use ilang::{
    ast::{ElsIf, If, RecordDecl, VarDecl},
    prelude::*,
};

fn int_ty() -> Option<TypeRef> {
    Some(TypeRef::named("integer"))
}

fn render(units: &[Unit]) -> String {
    units.iter().map(Unit::to_string).collect()
}

#[test]
fn test_minimal_program_round_trips() {
    // var x: integer is 5; routine twice(n: integer): integer ... ; print twice(x) + 1;
    let program = Program::new(vec![
        Stmt::var("x", int_ty(), Some(Expr::int(5))),
        Stmt::routine(
            "twice",
            vec![Param::new("n", TypeRef::named("integer"))],
            int_ty(),
            vec![
                Stmt::var("m", int_ty(), Some(Expr::binary(Expr::ident("n"), BinOp::Mul, Expr::int(2)))),
                Stmt::Return(Some(Expr::ident("m"))),
            ],
        ),
        Stmt::Print(Expr::binary(
            Expr::call("twice", vec![Expr::ident("x")]),
            BinOp::Add,
            Expr::int(1),
        )),
    ]);

    let optimized = ilang::optimize(program.clone());
    assert_eq!(optimized, program);
    assert!(ilang::check(&optimized).is_ok());
}

#[test]
fn test_compile_program() {
    let program = Program::new(vec![
        Stmt::var("unused", int_ty(), Some(Expr::int(9))),
        Stmt::var(
            "limit",
            int_ty(),
            Some(Expr::binary(Expr::int(2), BinOp::Mul, Expr::int(3))),
        ),
        Stmt::routine(
            "half",
            vec![Param::new("v", TypeRef::named("real"))],
            Some(TypeRef::named("real")),
            vec![
                Stmt::Return(Some(Expr::binary(Expr::ident("v"), BinOp::Div, Expr::float(2.0)))),
                Stmt::Print(Expr::string("unreachable")),
            ],
        ),
        Stmt::for_loop(
            "i",
            Expr::int(1),
            Expr::ident("limit"),
            vec![Stmt::Print(Expr::call("half", vec![Expr::ident("i")]))],
        ),
    ]);

    let units = ilang::compile(program, GenConf::default()).unwrap();
    assert_eq!(units.len(), 1);

    let text = render(&units);
    assert!(text.starts_with(".class public Main\n.super java/lang/Object\n"));
    assert!(text.contains(".method public static main([Ljava/lang/String;)V"));
    assert!(text.contains(".method public static half(D)D"));
    // Folded and pruned.
    assert!(text.contains("    ldc 6\n"));
    assert!(!text.contains("ldc 9"));
    // Dead code after the return is gone.
    assert!(!text.contains("unreachable"));
    assert!(text.contains("    invokestatic Main/half(D)D\n"));
    assert!(text.contains("    if_icmpgt L1\n"));
}

#[test]
fn test_integer_argument_to_real_parameter_keeps_call() {
    // routine id(v: real): real is return v; print id(3);
    let program = Program::new(vec![
        Stmt::routine(
            "id",
            vec![Param::new("v", TypeRef::named("real"))],
            Some(TypeRef::named("real")),
            vec![Stmt::Return(Some(Expr::ident("v")))],
        ),
        Stmt::Print(Expr::call("id", vec![Expr::int(3)])),
    ]);

    let text = render(&ilang::compile(program, GenConf::default()).unwrap());
    assert!(text.contains("    ldc 3
    i2d
    invokestatic Main/id(D)D
"));
    assert!(text.contains("    invokevirtual java/io/PrintStream/println(D)V
"));
    assert!(!text.contains("println(I)V"));
}

#[test]
fn test_primary_unit_name_configurable() {
    let program = Program::new(vec![Stmt::Print(Expr::string("hi"))]);
    let conf = GenConf {
        main_class: "Hello".into(),
    };
    let units = ilang::compile(program, conf).unwrap();
    assert_eq!(units[0].name, "Hello");
    assert_eq!(units[0].file_name(), "Hello.j");
}

#[test]
fn test_records_emitted_after_primary_unit() {
    let field = |name: &str, ty: &str| VarDecl {
        name: name.into(),
        ty: Some(TypeRef::named(ty)),
        init: None,
    };
    let program = Program::new(vec![
        Stmt::Record(RecordDecl {
            name: "Point".into(),
            fields: vec![field("x", "real"), field("y", "real")],
        }),
        Stmt::Record(RecordDecl {
            name: "Tag".into(),
            fields: vec![field("label", "string")],
        }),
        Stmt::var("p", Some(TypeRef::named("Point")), None),
        Stmt::assign(Expr::field(Expr::ident("p"), "x"), Expr::float(1.5)),
        Stmt::Print(Expr::field(Expr::ident("p"), "x")),
    ]);

    let units = ilang::compile(program, GenConf::default()).unwrap();
    let names: Vec<_> = units.iter().map(|unit| unit.name.as_str()).collect();
    assert_eq!(names, vec!["Main", "Point", "Tag"]);

    let point = units[1].to_string();
    assert!(point.contains(".field public x D\n.field public y D\n"));
    assert!(point.contains("    dconst_0\n    putfield Point/x D\n"));

    let main = units[0].to_string();
    assert!(main.contains("    getfield Point/x D\n    invokevirtual java/io/PrintStream/println(D)V\n"));
}

#[test]
fn test_elsif_chain() {
    let cmp = |op, val| Expr::binary(Expr::ident("n"), op, Expr::int(val));
    let program = Program::new(vec![
        Stmt::var("n", int_ty(), Some(Expr::int(4))),
        Stmt::If(If {
            cond: cmp(BinOp::Less, 0),
            then_block: vec![Stmt::Print(Expr::string("negative"))],
            elsif: vec![ElsIf {
                cond: cmp(BinOp::Eq, 0),
                body: vec![Stmt::Print(Expr::string("zero"))],
            }],
            else_block: vec![Stmt::Print(Expr::string("positive"))],
        }),
    ]);

    let units = ilang::compile(program, GenConf::default()).unwrap();
    let text = units[0].to_string();
    assert!(text.contains("    ifge L1\n"));
    assert!(text.contains("L1:\n"));
    assert!(text.contains("    ifne L2\n"));
    assert!(text.contains("L2:\n"));
    assert_eq!(text.matches("goto L0").count(), 2);
}

#[test]
fn test_errors_abort_pipeline() {
    let program = Program::new(vec![Stmt::Return(None)]);
    let err = ilang::compile(program, GenConf::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Context);

    let program = Program::new(vec![Stmt::Print(Expr::ident("ghost"))]);
    let err = ilang::compile(program, GenConf::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Context);

    let program = Program::new(vec![Stmt::while_loop(Expr::boolean(true), vec![])]);
    let err = ilang::compile(program, GenConf::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Condition);
}

#[test]
fn test_recursive_call_is_unregistered() {
    let program = Program::new(vec![
        Stmt::routine(
            "loop_forever",
            vec![],
            None,
            vec![Stmt::call("loop_forever", vec![]), Stmt::Print(Expr::int(1))],
        ),
        Stmt::call("loop_forever", vec![]),
    ]);
    let err = ilang::compile(program, GenConf::default()).unwrap_err();
    assert!(matches!(err, IlangError::UnregisteredRoutine(_)));
}

#[test]
fn test_write_units() {
    let dir = std::env::temp_dir().join(format!("ilang-test-{}", std::process::id()));
    let program = Program::new(vec![Stmt::Print(Expr::int(1))]);
    let units = ilang::compile(program, GenConf::default()).unwrap();

    let paths = write_units(&dir, &units).unwrap();
    assert_eq!(paths, vec![dir.join("Main.j")]);
    assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), units[0].to_string());

    std::fs::remove_dir_all(&dir).unwrap();
}
