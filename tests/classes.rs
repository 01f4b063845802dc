// End-to-end class scenarios: inheritance, overriding, duck typing, nested
// classes, inherited construction, Daddy calls, and the siblings operator.

use sigh::pipeline::run_source;

fn output(source: &str) -> String {
    match run_source(source) {
        Ok(run) => run.output,
        Err(error) => panic!("run failed:\n{:#?}", error.messages()),
    }
}

#[test]
fn inherited_method_call() {
    let out = output(
        "class FatherClass {
             fun FatherClass(){}

             fun printHello(){
                 print(\"Hello\")
             }
         }

         class MyClass sonOf FatherClass {
             fun MyClass (){}
         }

         var instance : MyClass = MyClass()
         instance.printHello()",
    );
    assert_eq!(out, "Hello\n");
}

#[test]
fn method_overriding() {
    let out = output(
        "class FatherClass {
             fun FatherClass(){}
             fun printHello(){
                 print(\"Hello\")
             }
         }
         class MyClass sonOf FatherClass {
             fun MyClass (){}
             fun printHello(){
                 print(\"Hello World !\")
             }
         }
         var instance : MyClass = MyClass() // create an instance of MyClass
         instance.printHello() // calls the override",
    );
    assert_eq!(out, "Hello World !\n");
}

#[test]
fn duck_typing() {
    // MyClass implements every member of FatherClass with the same types,
    // so the assignment is allowed even without inheritance.
    let out = output(
        "class FatherClass {
             var SomeVar : Int = 0
             fun FatherClass(){}
             fun printHello(){
                 print(\"Hello\")
             }
         }
         class MyClass {
             var SomeVar : Int = 12
             var someOtherVar : String = \"A nice string\"
             fun MyClass (){}
             fun printHello(){
                 print(\"Hello World !\")
             }
         }
         var instance : FatherClass = MyClass()
         print(\"\"+instance.SomeVar)",
    );
    assert_eq!(out, "12\n");
}

#[test]
fn nested_classes() {
    let out = output(
        "class RootClass {
             class ImbricatedClass{
                 var a : Int = 0
                 fun ImbricatedClass(initialVal : Int){
                     a = initialVal
                 }
             }
             var imbricatedClass : ImbricatedClass = ImbricatedClass(0)
             fun RootClass(init : Int){
                 imbricatedClass = ImbricatedClass(init)
             }
         }
         var instance : RootClass = RootClass(456)
         print(\"\"+instance.imbricatedClass.a)",
    );
    assert_eq!(out, "456\n");
}

#[test]
fn per_class_constructor() {
    // The subclass constructor takes different parameters than the parent's
    // and writes an inherited field.
    let out = output(
        "class ClassOne {
             var name : String = \" ClassOne \"
             fun ClassOne () {}
             fun printName () {
                 print ( name ) ;
             }
         }
         class ClassTwo sonOf ClassOne {
             fun ClassTwo ( newName : String ) {
                 name = newName
             }
         }
         var instance : ClassOne = ClassTwo ( \" ClassTwo \" )
         instance.printName ()",
    );
    assert_eq!(out, " ClassTwo \n");
}

#[test]
fn daddy_call() {
    let out = output(
        "class ClassOne {
             var a : Int = 0
             fun ClassOne() {}
             fun setA(value : Int) {
                 a = value
             }
         }
         class ClassTwo sonOf ClassOne {
             fun ClassTwo() {}
             fun setA(value : Int) {
                 Daddy(value)
             }
         }
         var instance : ClassTwo = ClassTwo()
         instance.setA(12)
         print(\"\"+instance.a)",
    );
    assert_eq!(out, "12\n");
}

#[test]
fn siblings_dispatch_over_an_array() {
    // An array of duck-compatible classes; the siblings operator picks the
    // shape at run time and method calls return their values to the caller.
    let out = output(
        "class GenericClass {
             fun GenericClass(){
             }
             fun getArea() : Int {
                 return 0
             }
         }
         class SquareClass {
             var size: Int = 0
             fun SquareClass(squareSize: Int){
                 size = squareSize
             }
             fun getArea(): Int {
                 return size * size
             }
         }
         class RectangleClass {
             var width: Int = 0
             var height: Int = 0
             fun RectangleClass(rectangleWidth: Int, rectangleHeight: Int){
                 width = rectangleWidth
                 height = rectangleHeight
             }
             fun getArea(): Int {
                 return width * height
             }
         }
         var classArray: GenericClass[] = [GenericClass(),GenericClass(),GenericClass(),GenericClass()]
         // fill the array
         var i : Int = 0
         while (i < classArray.length) {
             if (i % 2 == 0) {
                 classArray[i] = SquareClass(i)
             } else {
                 classArray[i] = RectangleClass(i, i*2)
             }i++
         }
         // print the content
         i = 0
         while (i < classArray.length) {
             if (classArray[i] siblingsOf RectangleClass) {
                 print(\"Rectangle of area : \" + classArray[i].getArea())
             } else {
                 print(\"Square of area : \" + classArray[i].getArea())
             }
             i++
         }",
    );
    assert_eq!(
        out,
        "Square of area : 0\n\
         Rectangle of area : 2\n\
         Square of area : 4\n\
         Rectangle of area : 18\n"
    );
}

#[test]
fn method_call_returns_value_to_caller() {
    let run = run_source(
        "class Counter {
             var count: Int = 0
             fun Counter(start: Int) { count = start }
             fun bump(): Int { count = count + 1 return count }
         }
         var c: Counter = Counter(5)
         c.bump()
         var v: Int = c.bump()
         print(\"\" + v)
         print(\"\" + c.count)",
    )
    .unwrap_or_else(|e| panic!("{:#?}", e.messages()));
    assert_eq!(run.output, "7\n7\n");
}
