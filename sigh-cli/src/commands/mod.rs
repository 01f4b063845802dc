//! CLI command implementations.

pub mod check;
pub mod run;

use sigh_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode};
use sigh_interp::RuntimeError;

/// Read a source file, reporting a friendly error.
pub fn read_source(file: &str) -> Result<String, String> {
    std::fs::read_to_string(file).map_err(|error| format!("cannot read `{}`: {}", file, error))
}

/// Render a batch of diagnostics and produce the failure summary.
pub fn report(source: &str, file: &str, diagnostics: &[Diagnostic]) -> String {
    for diagnostic in diagnostics {
        sigh_diagnostic::emit(source, file, diagnostic);
    }
    let errors = diagnostics.len();
    if errors == 1 {
        "1 error found".to_string()
    } else {
        format!("{} errors found", errors)
    }
}

/// Wrap a runtime error into a renderable diagnostic.
pub fn runtime_diagnostic(error: &RuntimeError) -> Diagnostic {
    let code = match error {
        RuntimeError::DivisionByZero { .. } => ErrorCode::DivisionByZero,
        RuntimeError::IntegerOverflow { .. } => ErrorCode::IntegerOverflow,
        RuntimeError::NullPointer { .. } => ErrorCode::NullDereference,
        RuntimeError::IndexOutOfBounds { .. } => ErrorCode::IndexOutOfBounds,
        RuntimeError::Born { .. } => ErrorCode::BornBeforeCall,
        RuntimeError::Interpreter { .. } => ErrorCode::InterpreterError,
    };
    Diagnostic::error(DiagnosticKind::Runtime, error.span(), error.to_string()).with_code(code)
}
