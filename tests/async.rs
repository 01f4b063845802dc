// End-to-end tests for Unborn functions and born.
//
// An async call spawns a thread and returns immediately; `born(f[, v])`
// joins it and optionally stores the recorded return value. Writes made by
// the async function become visible to the caller after the join.

use sigh::interp::{RuntimeError, Value};
use sigh::pipeline::{run_source, PipelineError};

fn eval(source: &str) -> Option<Value> {
    match run_source(source) {
        Ok(run) => run.value,
        Err(error) => panic!("run failed:\n{:#?}", error.messages()),
    }
}

#[test]
fn born_stores_the_async_result() {
    assert_eq!(
        eval(
            "fun myFunc(): Unborn<Int> {
                 var v: Int = 41
                 return v
             }
             var x: Int = 0
             myFunc()
             born(myFunc, x)
             x = x + 1
             return x"
        ),
        Some(Value::Int(42))
    );
}

#[test]
fn async_functions_take_arguments() {
    assert_eq!(
        eval(
            "fun add(a: Int, b: Int): Unborn<Int> { return a + b }
             var r: Int = 0
             add(1, 2)
             born(add, r)
             return r"
        ),
        Some(Value::Int(3))
    );
}

#[test]
fn born_int_result_widens_into_float_variable() {
    assert_eq!(
        eval(
            "fun f(): Unborn<Float> { return 2 }
             var r: Float = 0.0
             f()
             born(f, r)
             return r"
        ),
        Some(Value::Float(2.0))
    );
}

#[test]
fn join_makes_async_output_visible() {
    let run = run_source(
        "fun worker(): Unborn<Void> { print(\"worker\") }
         worker()
         born(worker)
         print(\"done\")",
    )
    .unwrap_or_else(|e| panic!("{:#?}", e.messages()));
    assert_eq!(run.output, "worker\ndone\n");
}

#[test]
fn unborn_values_can_be_held_in_variables() {
    // The call's value has type Unborn<Int>; only born delivers the Int.
    assert_eq!(
        eval(
            "fun f(): Unborn<Int> { return 7 }
             var pending: Unborn<Int> = f()
             var r: Int = 0
             born(f, r)
             return r"
        ),
        Some(Value::Int(7))
    );
}

#[test]
fn program_exit_joins_unborn_threads() {
    // No born: the root still waits for the thread before finishing, so the
    // worker's output is captured.
    let run = run_source(
        "fun worker(): Unborn<Void> { print(\"late\") }
         worker()",
    )
    .unwrap_or_else(|e| panic!("{:#?}", e.messages()));
    assert_eq!(run.output, "late\n");
}

#[test]
fn born_before_call_is_a_runtime_error() {
    let error = match run_source("fun f(): Unborn<Int> { return 1 }\nborn(f)") {
        Err(PipelineError::Runtime(error)) => error,
        other => panic!("expected a runtime error, got {:?}", other.map(|r| r.output)),
    };
    assert!(matches!(error, RuntimeError::Born { .. }));
    assert!(error
        .to_string()
        .contains("Please call the async function before trying to born it."));
}

#[test]
fn borning_twice_is_a_runtime_error() {
    // The first born consumes the thread handle.
    let error = match run_source(
        "fun f(): Unborn<Int> { return 1 }
         var x: Int = 0
         f()
         born(f, x)
         born(f, x)",
    ) {
        Err(PipelineError::Runtime(error)) => error,
        other => panic!("expected a runtime error, got {:?}", other.map(|r| r.output)),
    };
    assert!(matches!(error, RuntimeError::Born { .. }));
}
