// Parser integration tests: AST shapes, sugar desugaring, and the grammar's
// quirks (semicolons as trivia, Daddy calls, default Void return types).

use sigh::parser::parse;
use sigh::syntax::{Ast, BinaryOp, NodeId, NodeKind};

fn parse_ok(source: &str) -> Ast {
    let (ast, diagnostics) = parse(source);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics for {:?}:\n{:#?}",
        source,
        diagnostics
    );
    ast
}

fn root_statements(ast: &Ast) -> Vec<NodeId> {
    let root = ast.root.expect("parse produces a root");
    match ast.kind(root) {
        NodeKind::Root { statements } => statements.clone(),
        other => panic!("root is {:?}", other),
    }
}

fn single_statement(ast: &Ast) -> NodeId {
    let statements = root_statements(ast);
    assert_eq!(statements.len(), 1, "expected a single statement");
    statements[0]
}

#[test]
fn semicolons_do_not_separate_anything() {
    let ast = parse_ok("return 1; return 2");
    assert_eq!(root_statements(&ast).len(), 2);

    let ast = parse_ok("return 1 return 2");
    assert_eq!(root_statements(&ast).len(), 2);
}

#[test]
fn var_declaration_shape() {
    let ast = parse_ok("var x: Int = 1");
    let stmt = single_statement(&ast);
    let NodeKind::VarDeclaration { name, ty, initializer } = ast.kind(stmt) else {
        panic!("not a var declaration: {:?}", ast.kind(stmt));
    };
    assert_eq!(name, "x");
    assert!(matches!(ast.kind(*ty), NodeKind::SimpleType { name } if name == "Int"));
    assert!(matches!(ast.kind(*initializer), NodeKind::IntLiteral(1)));
}

#[test]
fn array_and_unborn_types() {
    let ast = parse_ok("var x: Int[][] = null");
    let stmt = single_statement(&ast);
    let NodeKind::VarDeclaration { ty, .. } = ast.kind(stmt) else {
        panic!();
    };
    let NodeKind::ArrayType { element } = ast.kind(*ty) else {
        panic!("expected an array type");
    };
    assert!(matches!(ast.kind(*element), NodeKind::ArrayType { .. }));

    let ast = parse_ok("fun f(): Unborn<Int[]> { }");
    let stmt = single_statement(&ast);
    let NodeKind::FunDeclaration { return_type, .. } = ast.kind(stmt) else {
        panic!();
    };
    let NodeKind::UnbornType { inner } = ast.kind(*return_type) else {
        panic!("expected an Unborn type");
    };
    assert!(matches!(ast.kind(*inner), NodeKind::ArrayType { .. }));
}

#[test]
fn missing_return_type_means_void() {
    let ast = parse_ok("fun f() { }");
    let stmt = single_statement(&ast);
    let NodeKind::FunDeclaration { return_type, is_method, .. } = ast.kind(stmt) else {
        panic!();
    };
    assert!(!is_method);
    assert!(matches!(ast.kind(*return_type), NodeKind::SimpleType { name } if name == "Void"));
}

#[test]
fn class_members_are_methods() {
    let ast = parse_ok("class C sonOf D { var x: Int = 0 fun C() {} }");
    let stmt = single_statement(&ast);
    let NodeKind::ClassDeclaration { name, parent, body } = ast.kind(stmt) else {
        panic!();
    };
    assert_eq!(name, "C");
    assert_eq!(parent.as_deref(), Some("D"));
    assert_eq!(body.len(), 2);
    assert!(matches!(ast.kind(body[0]), NodeKind::VarDeclaration { .. }));
    assert!(matches!(
        ast.kind(body[1]),
        NodeKind::FunDeclaration { is_method: true, .. }
    ));
}

#[test]
fn precedence_ladder() {
    // The multiplication binds tighter than the addition.
    let ast = parse_ok("return 1 + 2 * 3");
    let stmt = single_statement(&ast);
    let NodeKind::Return { expression: Some(expr) } = ast.kind(stmt) else {
        panic!();
    };
    let NodeKind::Binary { op: BinaryOp::Add, right, .. } = ast.kind(*expr) else {
        panic!("expected the addition at the top");
    };
    assert!(matches!(
        ast.kind(*right),
        NodeKind::Binary { op: BinaryOp::Mul, .. }
    ));

    // Assignment is right-associative and loosest.
    let ast = parse_ok("a = b = 1 < 2");
    let stmt = single_statement(&ast);
    let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
        panic!();
    };
    let NodeKind::Assignment { right, .. } = ast.kind(*expression) else {
        panic!("expected an assignment");
    };
    assert!(matches!(ast.kind(*right), NodeKind::Assignment { .. }));
}

#[test]
fn siblings_is_an_operator() {
    for spelling in ["ciblingsOf", "siblingsOf"] {
        let ast = parse_ok(&format!("return a {} b", spelling));
        let stmt = single_statement(&ast);
        let NodeKind::Return { expression: Some(expr) } = ast.kind(stmt) else {
            panic!();
        };
        assert!(matches!(
            ast.kind(*expr),
            NodeKind::Binary { op: BinaryOp::Siblings, .. }
        ));
    }
}

#[test]
fn daddy_calls_get_their_own_node() {
    let ast = parse_ok("Daddy(1, 2)");
    let stmt = single_statement(&ast);
    let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
        panic!();
    };
    let NodeKind::DaddyCall { arguments } = ast.kind(*expression) else {
        panic!("expected a Daddy call, got {:?}", ast.kind(*expression));
    };
    assert_eq!(arguments.len(), 2);
}

#[test]
fn quick_statements_desugar_to_assignments() {
    let cases = [
        ("i++", BinaryOp::Add),
        ("i--", BinaryOp::Sub),
        ("i += 2", BinaryOp::Add),
        ("i *= 3", BinaryOp::Mul),
        ("i %= 4", BinaryOp::Rem),
    ];
    for (source, expected_op) in cases {
        let ast = parse_ok(source);
        let stmt = single_statement(&ast);
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("{:?}", source);
        };
        let NodeKind::Assignment { left, right } = ast.kind(*expression) else {
            panic!("{:?} should desugar to an assignment", source);
        };
        assert!(matches!(ast.kind(*left), NodeKind::Reference { name } if name == "i"));
        let NodeKind::Binary { op, .. } = ast.kind(*right) else {
            panic!("{:?} should desugar to a binary value", source);
        };
        assert_eq!(*op, expected_op);
    }
}

#[test]
fn born_forms() {
    let ast = parse_ok("born(f) born(f, v)");
    let statements = root_statements(&ast);
    assert_eq!(statements.len(), 2);
    assert!(matches!(
        ast.kind(statements[0]),
        NodeKind::Born { variable: None, .. }
    ));
    assert!(matches!(
        ast.kind(statements[1]),
        NodeKind::Born { variable: Some(_), .. }
    ));
}

#[test]
fn negative_literals_fold() {
    let ast = parse_ok("return -42");
    let stmt = single_statement(&ast);
    let NodeKind::Return { expression: Some(expr) } = ast.kind(stmt) else {
        panic!();
    };
    assert!(matches!(ast.kind(*expr), NodeKind::IntLiteral(-42)));

    // In operand position the minus stays a subtraction.
    let ast = parse_ok("return 2 - 1");
    let stmt = single_statement(&ast);
    let NodeKind::Return { expression: Some(expr) } = ast.kind(stmt) else {
        panic!();
    };
    assert!(matches!(
        ast.kind(*expr),
        NodeKind::Binary { op: BinaryOp::Sub, .. }
    ));
}

#[test]
fn expression_statements_must_be_calls_or_assignments() {
    let (_, diagnostics) = parse("1 + 2");
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("only calls and assignments")),
        "{:#?}",
        diagnostics
    );
}

#[test]
fn born_requires_identifiers() {
    let (_, diagnostics) = parse("born(1 + 2)");
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("born(...) arguments must be plain identifiers")),
        "{:#?}",
        diagnostics
    );
}
