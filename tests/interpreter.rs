// Integration tests for the interpreter.
//
// `run_source` drives the full pipeline and captures `print` output; the
// program value is whatever a top-level `return` produced.

use sigh::interp::{RuntimeError, Value};
use sigh::pipeline::{run_source, PipelineError};

fn eval(source: &str) -> Option<Value> {
    match run_source(source) {
        Ok(run) => run.value,
        Err(error) => panic!("run failed for {:?}: {:?}", source, error.messages()),
    }
}

fn output(source: &str) -> String {
    match run_source(source) {
        Ok(run) => run.output,
        Err(error) => panic!("run failed for {:?}: {:?}", source, error.messages()),
    }
}

fn runtime_error(source: &str) -> RuntimeError {
    match run_source(source) {
        Ok(_) => panic!("expected a runtime error for {:?}", source),
        Err(PipelineError::Runtime(error)) => error,
        Err(other) => panic!("expected a runtime error, got {:?}", other.messages()),
    }
}

#[test]
fn arithmetic() {
    assert_eq!(eval("return 1 + 2"), Some(Value::Int(3)));
    assert_eq!(eval("return 7 - 2 - 1"), Some(Value::Int(4)));
    assert_eq!(eval("return 2 * 3"), Some(Value::Int(6)));
    assert_eq!(eval("return 3 / 2"), Some(Value::Int(1)));
    assert_eq!(eval("return 7 % 3"), Some(Value::Int(1)));
    assert_eq!(eval("return 2 * (4-1) * 3"), Some(Value::Int(18)));
    assert_eq!(eval("return -5 + 2"), Some(Value::Int(-3)));
    assert_eq!(eval("return 1.5 + 1.5"), Some(Value::Float(3.0)));
    assert_eq!(eval("return 3 / 2.0"), Some(Value::Float(1.5)));
    assert_eq!(eval("return 3.0 % 2"), Some(Value::Float(1.0)));
}

#[test]
fn comparison_logic_equality() {
    assert_eq!(eval("return 1 < 2"), Some(Value::Bool(true)));
    assert_eq!(eval("return 2 <= 1"), Some(Value::Bool(false)));
    assert_eq!(eval("return 2.0 > 1"), Some(Value::Bool(true)));
    assert_eq!(eval("return true && false"), Some(Value::Bool(false)));
    assert_eq!(eval("return true || false"), Some(Value::Bool(true)));
    assert_eq!(eval("return !true"), Some(Value::Bool(false)));
    assert_eq!(eval("return 1 == 1.0"), Some(Value::Bool(true)));
    assert_eq!(eval("return \"hi\" == \"hi\""), Some(Value::Bool(true)));
    // Arrays compare by identity, not by contents.
    assert_eq!(eval("return [1] == [1]"), Some(Value::Bool(false)));
    assert_eq!(
        eval("var a: Int[] = [1]; var b: Int[] = a; return a == b"),
        Some(Value::Bool(true))
    );
}

#[test]
fn short_circuit() {
    // The right operand of `&&` must not run when the left is false;
    // otherwise this would index out of bounds.
    assert_eq!(
        eval("var a: Int[] = []; return false && a[0] == 1"),
        Some(Value::Bool(false))
    );
    assert_eq!(
        eval("var a: Int[] = []; return true || a[0] == 1"),
        Some(Value::Bool(true))
    );
}

#[test]
fn strings() {
    assert_eq!(eval("return \"a\" + 1"), Some(Value::string("a1")));
    assert_eq!(eval("return 1 + \"a\""), Some(Value::string("1a")));
    assert_eq!(eval("return \"\" + 2.0"), Some(Value::string("2.0")));
    assert_eq!(eval("return \"\" + true"), Some(Value::string("true")));
    assert_eq!(
        eval("var s: String = null; return s + \"!\""),
        Some(Value::string("null!"))
    );
}

#[test]
fn variables_and_blocks() {
    assert_eq!(eval("var x: Int = 1; return x"), Some(Value::Int(1)));
    assert_eq!(eval("var x: Int = 0; return x = 3"), Some(Value::Int(3)));
    assert_eq!(eval("var x: Float = 1; return x"), Some(Value::Float(1.0)));
    assert_eq!(
        eval("var x: Float = 1 ; x = 2 ; return x"),
        Some(Value::Float(2.0))
    );
    assert_eq!(
        output(
            "var x: Int = 1;\
             { print(\"\" + x); var x: Int = 2; print(\"\" + x) }\
             print(\"\" + x)"
        ),
        "1\n2\n1\n"
    );
}

#[test]
fn print_writes_and_returns() {
    assert_eq!(output("print(\"a\"); print(\"b\")"), "a\nb\n");
    assert_eq!(eval("return print(\"ab\")"), Some(Value::string("ab")));
    assert_eq!(output("print(\"a\" + 1)"), "a1\n");
}

#[test]
fn control_flow() {
    assert_eq!(eval("if (true) return 1 else return 2"), Some(Value::Int(1)));
    assert_eq!(eval("if (false) return 1 else return 2"), Some(Value::Int(2)));
    assert_eq!(
        eval("if (false) return 1 else if (true) return 2 else return 3"),
        Some(Value::Int(2))
    );
    assert_eq!(
        output("var i: Int = 0; while (i < 3) { print(\"\" + i); i = i + 1 }"),
        "0\n1\n2\n"
    );
    assert_eq!(eval("return 1; return 2"), Some(Value::Int(1)));
    assert_eq!(eval("return"), None);
    assert_eq!(eval("print(\"no return\")"), None);
}

#[test]
fn functions() {
    assert_eq!(
        eval("fun add (a: Int, b: Int): Int { return a + b } return add(4, 7)"),
        Some(Value::Int(11))
    );
    assert_eq!(
        eval(
            "fun fib (n: Int): Int { if (n < 2) return n; return fib(n-1) + fib(n-2) }\
             return fib(10)"
        ),
        Some(Value::Int(55))
    );
    // A Void function call yields nothing.
    assert_eq!(output("fun hello() { print(\"hi\") } hello()"), "hi\n");
}

#[test]
fn sugar_statements() {
    assert_eq!(
        eval("var i: Int = 12 i++ i-- i += 5 i -= 1 i *= 2 i /= 4 return i"),
        Some(Value::Int(8))
    );
}

#[test]
fn arrays() {
    assert_eq!(eval("return [1, 2][1]"), Some(Value::Int(2)));
    assert_eq!(eval("return [1.0][0]"), Some(Value::Float(1.0)));
    assert_eq!(eval("return [1, 2, 3].length"), Some(Value::Int(3)));
    assert_eq!(
        eval("var x: Int[] = [0, 1]; x[0] = 3; return x[0]"),
        Some(Value::Int(3))
    );
    assert_eq!(eval("return \"\" + [1, 2]"), Some(Value::string("[1, 2]")));
}

#[test]
fn structs() {
    assert_eq!(
        eval(
            "struct P { var x: Int; var y: Int }\
             var p: P = $P(1, 2);\
             return p.y"
        ),
        Some(Value::Int(2))
    );
    assert_eq!(
        eval(
            "struct P { var x: Int; var y: Int }\
             var p: P = $P(1, 2);\
             p.y = 42;\
             return p.y"
        ),
        Some(Value::Int(42))
    );
}

#[test]
fn runtime_errors() {
    assert!(matches!(
        runtime_error("return 1 / 0"),
        RuntimeError::DivisionByZero { .. }
    ));
    assert!(matches!(
        runtime_error("return 1 % 0"),
        RuntimeError::DivisionByZero { .. }
    ));
    assert!(matches!(
        runtime_error("return 9223372036854775807 + 1"),
        RuntimeError::IntegerOverflow { .. }
    ));

    let negative = runtime_error("return [1][-1]");
    assert!(negative.to_string().contains("Negative index: -1"));

    let out_of_bounds = runtime_error("return [1][5]");
    assert!(out_of_bounds
        .to_string()
        .contains("Index 5 out of bounds for length 1"));

    assert!(matches!(
        runtime_error("var a: Int[] = null; return a[0]"),
        RuntimeError::NullPointer { .. }
    ));
    assert!(matches!(
        runtime_error("struct P { var x: Int } var p: P = null; return p.x"),
        RuntimeError::NullPointer { .. }
    ));
}
