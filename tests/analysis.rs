// Integration tests for semantic analysis.
//
// Each case feeds concrete syntax through the parser and the analyzer and
// asserts either a clean run or specific error messages. All errors are
// collected in one pass, so a failing case can assert several needles.

use sigh::pipeline::check_source;

fn assert_ok(source: &str) {
    let diagnostics = check_source(source);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics for {:?}:\n{:#?}",
        source,
        diagnostics
    );
}

fn assert_errors(source: &str, needles: &[&str]) {
    let diagnostics = check_source(source);
    assert!(
        !diagnostics.is_empty(),
        "expected errors for {:?}, found none",
        source
    );
    for needle in needles {
        assert!(
            diagnostics.iter().any(|d| d.message.contains(needle)),
            "expected an error containing {:?} for {:?}, got:\n{:#?}",
            needle,
            source,
            diagnostics
        );
    }
}

#[test]
fn literals_and_unary() {
    assert_ok("return 42");
    assert_ok("return 42.0");
    assert_ok("return \"hello\"");
    assert_ok("return (42)");
    assert_ok("return [1, 2, 3]");
    assert_ok("return true");
    assert_ok("return false");
    assert_ok("return null");
    assert_ok("return !false");
    assert_ok("return !!true");

    assert_errors("return !1", &["Trying to negate type: Int"]);
}

#[test]
fn numeric_binary() {
    assert_ok("return 1 + 2");
    assert_ok("return 2 - 1");
    assert_ok("return 2 * 3");
    assert_ok("return 3 / 2");
    assert_ok("return 2 % 3");
    assert_ok("return 1.0 + 2.0");
    assert_ok("return 2.0 % 3.0");
    assert_ok("return 1 + 2.0");
    assert_ok("return 3 / 2.0");
    assert_ok("return 2.0 * 3");
    assert_ok("return 3.0 % 2");

    assert_errors("return 2 + true", &["Trying to add Int with Bool"]);
    assert_errors("return true + 2", &["Trying to add Bool with Int"]);
    assert_errors("return 2 + [1]", &["Trying to add Int with Int[]"]);
    assert_errors("return [1] + 2", &["Trying to add Int[] with Int"]);
}

#[test]
fn logic_equality_and_comparison() {
    assert_ok("return true && false");
    assert_ok("return false || true");
    assert_errors(
        "return false || 1",
        &["Attempting to perform binary logic on non-boolean type: Int"],
    );
    assert_errors(
        "return 2 || true",
        &["Attempting to perform binary logic on non-boolean type: Int"],
    );

    assert_ok("return 1 + \"a\"");
    assert_ok("return \"a\" + 1");
    assert_ok("return \"a\" + true");

    assert_ok("return 1 == 1");
    assert_ok("return 1.0 == 2.0");
    assert_ok("return true == false");
    assert_ok("return 1 == 1.0");
    assert_ok("return \"hi\" == \"hi\"");
    assert_ok("return [1] == [1]");
    assert_ok("return 1 != 2");

    assert_errors(
        "return true == 1",
        &["Trying to compare incomparable types Bool and Int"],
    );
    assert_errors(
        "return 2 != false",
        &["Trying to compare incomparable types Int and Bool"],
    );

    assert_ok("return 1 < 2");
    assert_ok("return 1.0 >= 2");
    assert_errors(
        "return true < 1",
        &["Attempting to perform arithmetic comparison on non-numeric type: Bool"],
    );
}

#[test]
fn var_declarations() {
    assert_ok("var x: Int = 1; return x");
    assert_ok("var x: Float = 2.0; return x");
    assert_ok("var x: Int = 0; return x = 3");
    assert_ok("var x: String = \"0\"; return x = \"S\"");
    assert_ok("var s: String = null; return s");

    // Implicit Int to Float conversion.
    assert_ok("var x: Float = 1 ; x = 2");

    assert_errors("var x: Int = true", &["expected Int but got Bool"]);
    assert_errors("return x + 1", &["Could not resolve: x"]);
    assert_errors(
        "return x + 1; var x: Int = 2",
        &["Variable used before declaration: x"],
    );
}

#[test]
fn auto_inference() {
    assert_ok("var a: Auto = 12; return a + 1");
    assert_errors(
        "var a: Auto = []",
        &["Cannot infer the type of variable `a`"],
    );
    assert_errors(
        "var a: Auto = [1]",
        &["Auto is not allowed for array variables"],
    );
}

#[test]
fn roots_and_blocks() {
    assert_ok("return");
    assert_ok("return 1");
    assert_ok("return 1; return 2");
    assert_ok("print(\"a\")");
    assert_ok("print(\"a\" + 1)");
    assert_ok("print(\"a\"); print(\"b\")");
    assert_ok("{ print(\"a\"); print(\"b\") }");
    assert_ok(
        "var x: Int = 1;\
         { print(\"\" + x); var x: Int = 2; print(\"\" + x) }\
         print(\"\" + x)",
    );
}

#[test]
fn calls() {
    assert_ok(
        "fun add (a: Int, b: Int): Int { return a + b } \
         return add(4, 7)",
    );
    assert_ok(
        "struct Point { var x: Int; var y: Int }\
         return $Point(1, 2)",
    );
    assert_ok("var str: String = null; return print(str + 1)");

    assert_errors(
        "return print(1)",
        &["argument 0 in print: expected String but got Int"],
    );
    assert_errors(
        "fun f() {} return f(1)",
        &["wrong number of arguments, expected 0 but got 1"],
    );
    assert_errors(
        "return 1(2)",
        &["trying to call a non-function/non-class expression"],
    );
}

#[test]
fn array_and_struct_access() {
    assert_ok("return [1][0]");
    assert_ok("return [1.0][0]");
    assert_ok("return [1, 2][1]");
    assert_ok("return [1].length");
    assert_ok("var array: Int[] = null; return array[0]");
    assert_ok("var array: Int[] = null; return array.length");
    assert_ok("var x: Int[] = [0, 1]; x[0] = 3; return x[0]");
    assert_ok("var x: Int[] = []; x[0] = 3; return x[0]");

    assert_errors(
        "return [1][true]",
        &["Indexing an array using a non-Int-valued expression"],
    );
    assert_errors(
        "return [1].foo",
        &["Trying to access a non-length field on an array"],
    );
    assert_errors(
        "return 1[0]",
        &["Trying to index a non-array expression of type Int"],
    );

    assert_ok(
        "struct P { var x: Int; var y: Int }\
         return $P(1, 2).y",
    );
    assert_ok(
        "struct P { var x: Int; var y: Int }\
         var p: P = $P(1, 2);\
         p.y = 42;\
         return p.y",
    );
    assert_ok(
        "struct P { var x: Int; var y: Int }\
         var p: P = null;\
         return p.y",
    );

    assert_errors(
        "struct P { var x: Int; var y: Int }\
         return $P(1, true)",
        &["argument 1 in $P: expected Int but got Bool"],
    );
    assert_errors(
        "struct P { var x: Int; var y: Int }\
         return $P(1, 2).z",
        &["Trying to access missing field z on struct P"],
    );
    assert_errors(
        "var x: Int = 0; return $x(1)",
        &["Applying the constructor operator ($) to non-struct reference"],
    );
}

#[test]
fn if_and_while() {
    assert_ok("if (true) return 1 else return 2");
    assert_ok("if (false) return 1 else if (true) return 2 else return 3");
    assert_ok("var i: Int = 0; while (i < 3) { print(\"\" + i); i = i + 1 }");

    assert_errors(
        "if 1 return 1",
        &["If statement with a non-boolean condition of type: Int"],
    );
    assert_errors(
        "while 1 return 1",
        &["While statement with a non-boolean condition of type: Int"],
    );
}

#[test]
fn empty_array_inference() {
    assert_ok("var array: Int[] = []");
    assert_ok("var array: String[] = []");
    assert_ok("fun use_array (array: Int[]) {} ; use_array([])");
}

#[test]
fn types_as_values() {
    assert_ok("struct S{} ; return \"\" + S");
    assert_ok("struct S{} ; var type: Type = S ; return \"\" + type");
}

#[test]
fn unconditional_return() {
    assert_ok("fun f(): Int { if (true) return 1 else return 2 } ; return f()");
    assert_errors(
        "fun f(): Int { if (true) return 1 } ; return f()",
        &["Missing return in function"],
    );
    assert_errors(
        "fun f(): Int { return } ; return f()",
        &["Return without value in a function with a return type"],
    );
    assert_errors(
        "fun f() { return 1 } ; f()",
        &["Return with value in a Void function"],
    );
    assert_errors(
        "fun f(): Int { return \"s\" } ; return f()",
        &["Incompatible return type, expected Int but got String"],
    );
}

#[test]
fn classes() {
    // Plain declaration, with the constructor named after the class.
    assert_ok(
        "class Point { var X: Int = 0 var Y: Int = 0 fun Point(x: Int, y: Int) { X = x Y = y } }",
    );
    // Inheritance.
    assert_ok(
        "class Obj { fun Obj() {}}  class Point sonOf Obj { var X: Int = 0 var Y: Int = 0 fun Point(x: Int, y: Int) { X = x Y = y } }",
    );
    // Members of the parent class are visible.
    assert_ok(
        "class Obj { var X : Int = 0 fun Obj() {} } class Obj2 sonOf Obj {  fun Obj2() { X = 1 } }",
    );
    // Duck typing: same shape, unrelated classes.
    assert_ok(
        "class Obj { var X : Int = 0 fun Obj() {} } class Obj2 { var X : Int = 0  fun Obj2() { } } var myVar: Obj2 = Obj()",
    );
    // Instantiation through the class name.
    assert_ok(
        "class Point { var X : Int = 0 var Y : Int = 0 fun Point(x : Int, y : Int) {X = x Y = y} } var myVar: Point = Point(12, 13)",
    );
    // Member call and member assignment.
    assert_ok(
        "class Point { var X : Int = 0 var Y : Int = 0 fun Point(x : Int, y : Int) {X = x Y = y} fun getX() : Int { return X } } var myVar: Point = Point(12, 13) var myX : Int = myVar.getX()",
    );
    assert_ok(
        "class Point { var X : Int = 0 var Y : Int = 0 fun Point(x : Int, y : Int) {X = x Y = y} } var myVar: Point = Point(12, 13) myVar.Y = 14",
    );
    // The siblings operator.
    assert_ok(
        "class Obj { var X : Int = 0 fun Obj() {} } class Obj2 { var X : Int = 0  fun Obj2() { } } var myVar: Obj2 = Obj() if (myVar siblingsOf Obj){}",
    );
    // Daddy calls.
    assert_ok(
        "class Obj { var X : Int = 0 fun Obj() {} fun method(){print(\"Method\")}} class Obj2 sonOf Obj {fun Obj2() { } fun method(){Daddy()}}",
    );

    assert_errors(
        "class Point { var X : Int = 0 var Y : Int = 0 fun Point(x : Int, y : Int) {X = x Y = y} } var myVar: Point = Point(12)",
        &["wrong number of arguments"],
    );
    assert_errors(
        "class Obj { var X : Int = 0 fun Obj() {} } class Obj2 { var Y : Int = 0  fun Obj2() { } } var myVar: Obj2 = Obj()",
        &["Field", "is missing"],
    );
    assert_errors(
        "class Point sonOf Obj { var X: Int = 0 var Y: Int = 0 fun Point(x: Int, y: Int) { X = x Y = y } }",
        &["Undeclared ancestor"],
    );
    assert_errors(
        "class Point sonOf Int { var X: Int = 0 var Y: Int = 0 fun Point(x: Int, y: Int) { X = x Y = y } }",
        &["not a class"],
    );
    assert_errors(
        "class Class1 sonOf Class2 { fun Class1() {}} class Class2 sonOf Class1 { fun Class2() {}}",
        &["Cyclic inheritance"],
    );
    assert_errors(
        "class Point { var X: Int = 0 var Y: Int = 0 }",
        &["Missing constructor for class `Point`"],
    );
    assert_errors(
        "class lower { fun lower() {} }",
        &["Class name must start with a capital letter"],
    );
    assert_errors(
        "class C { fun C(): Int { return 1 } }",
        &["constructor must return void"],
    );
    assert_errors(
        "class Obj { var X : Int = 0 fun Obj() {} } class Obj2 { var X : Int = 0  fun Obj2() { } } var myVar: Obj2 = Obj() if (myVar siblingsOf Int){}",
        &["Trying to check if two non-classes are siblings."],
    );
    assert_errors(
        "class Obj { var X : Int = 0 fun Obj(){}} class Obj2 sonOf Obj {fun Obj2() { } fun method(){Daddy()}}",
        &["no parent", "Cannot find the parent method type.", "missing attribute"],
    );
    assert_errors(
        "fun f(){ Daddy() }",
        &["Daddy calls must be located inside a method"],
    );
    assert_errors(
        "fun Daddy() {}",
        &["Functions and methods can't be named 'Daddy'"],
    );
    // Overriding a variable is not allowed; only methods override.
    assert_errors(
        "class A { var x: Int = 0 fun A() {} } class B sonOf A { var x: Int = 1 fun B() {} }",
        &["Cannot override variable `x`"],
    );
    // Overriding with a different signature is not allowed.
    assert_errors(
        "class A { fun A() {} fun m(a: Int) {} } class B sonOf A { fun B() {} fun m(a: String) {} }",
        &["Cannot override method `m`"],
    );
}

#[test]
fn syntactic_sugar() {
    assert_ok(
        "class SomeLongAndBoringClassNameThatNeverEnds {fun SomeLongAndBoringClassNameThatNeverEnds(){}} var a : Auto = SomeLongAndBoringClassNameThatNeverEnds()",
    );
    assert_ok("var i : Int = 12 i++ i-- i += 1 i -= 1 i *= 1 i /= 1");
}

#[test]
fn async_rules() {
    assert_ok("fun f(): Unborn<Int> { var v: Int = 0; return v } f() born(f)");
    assert_ok(
        "fun f(): Unborn<Int> { return 1 } var x: Int = 0; f(); born(f, x); x = x + 1",
    );
    assert_ok("fun f(): Unborn<Int> { return 1 } var x: Unborn<Int> = f()");

    assert_errors(
        "fun g(): Int { return 1 } g() born(g)",
        &["Trying to born a non-Unborn function."],
    );
    assert_errors(
        "var x: Int = 0 born(x)",
        &["First parameter of born must refer to a declared function."],
    );
    assert_errors(
        "fun f(): Unborn<Void> { print(\"side effect\") } var x: Int = 0 f() born(f, x)",
        &["Cannot assign the return value of a Void Unborn function"],
    );
    assert_errors(
        "fun f(): Unborn<Int> { return 1 } var s: String = \"\" f() born(f, s)",
        &["Variable type does not match the Unborn function inner type (expected Int but got String)"],
    );
    assert_errors(
        "class C { fun C(){} fun work(): Unborn<Int> { return 1 } } var c: C = C() c.work()",
        &["Async methods can only be called from within the class"],
    );
    assert_errors(
        "fun f(): Unborn<Int> { return \"no\" }",
        &["Incompatible return type, expected Int but got String"],
    );
}
