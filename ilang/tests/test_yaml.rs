use ilang::prelude::*;
use serde_yaml::with::singleton_map_recursive;

const SOURCE: &str = include_str!("../../demos/fib.yaml");

fn parse(source: &str) -> Program {
    singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(source)).unwrap()
}

#[test]
fn test_parse_demo() {
    let program = parse(SOURCE);
    assert_eq!(program.stmts.len(), 9);
    assert!(matches!(&program.stmts[0], Stmt::Record(record) if record.name == "Point"));
}

#[test]
fn test_compile_demo() {
    let units = ilang::compile(parse(SOURCE), GenConf::default()).unwrap();
    let names: Vec<_> = units.iter().map(|unit| unit.name.as_str()).collect();
    assert_eq!(names, vec!["Main", "Point"]);

    let main = units[0].to_string();
    assert!(main.contains(".method public static fib(I)I"));
    assert!(main.contains("    invokestatic Main/fib(I)I\n    iastore\n"));
    // `square` is inlined at its only call site.
    assert!(main.contains("    ldc2_w 0.5\n    dadd\n"));
    assert!(!main.contains("invokestatic Main/square"));
    assert!(main.contains("    ldc2_w 3.0\n    putfield Point/x D\n"));
    assert!(!main.contains("ldc 42"));
    assert!(!main.contains("never printed"));
}

#[test]
fn test_tree_survives_yaml_round_trip() {
    let program = parse(SOURCE);

    let mut out = Vec::new();
    let mut serializer = serde_yaml::Serializer::new(&mut out);
    singleton_map_recursive::serialize(&program, &mut serializer).unwrap();
    drop(serializer);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(parse(&text), program);
}

#[test]
fn test_integer_literal_range() {
    let expr = |source: &str| -> Result<Expr, serde_yaml::Error> {
        singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(source))
    };

    assert_eq!(expr("literal: -7").unwrap(), Expr::int(-7));
    assert_eq!(expr("literal: 2.5").unwrap(), Expr::float(2.5));
    assert!(expr("literal: 3000000000").is_err());
    assert!(expr("literal: 18446744073709551615").is_err());
}
