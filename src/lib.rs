//! The Sigh language: a statically typed, imperative toy language with
//! single-inheritance classes, structural ("duck") class compatibility, a
//! parent-call mechanism (`Daddy`), and asynchronous values (`Unborn<T>` /
//! `born`).
//!
//! This crate re-exports the workspace members and offers a small pipeline
//! for embedding: source text in, analyzed diagnostics or an interpreted
//! result out.

pub use sigh_analysis as analysis;
pub use sigh_common as common;
pub use sigh_diagnostic as diagnostic;
pub use sigh_interp as interp;
pub use sigh_lexer as lexer;
pub use sigh_parser as parser;
pub use sigh_syntax as syntax;
pub use sigh_types as types;

pub mod pipeline {
    //! Source-to-result convenience drivers, used by the integration tests
    //! and by embedders that do not need phase-by-phase control.

    use sigh_diagnostic::Diagnostic;
    use sigh_interp::{Interpreter, RuntimeError, Value};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Where a pipeline run failed.
    #[derive(Debug)]
    pub enum PipelineError {
        Parse(Vec<Diagnostic>),
        Analysis(Vec<Diagnostic>),
        Runtime(RuntimeError),
    }

    impl PipelineError {
        /// All diagnostic messages, for assertions and reporting.
        pub fn messages(&self) -> Vec<String> {
            match self {
                PipelineError::Parse(diagnostics) | PipelineError::Analysis(diagnostics) => {
                    diagnostics.iter().map(|d| d.message.clone()).collect()
                }
                PipelineError::Runtime(error) => vec![error.to_string()],
            }
        }
    }

    /// A completed run: the top-level `return` value (if any) and everything
    /// `print` wrote.
    pub struct Run {
        pub value: Option<Value>,
        pub output: String,
    }

    /// A `Write` sink that can be read back after the interpreter is done.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Parse, analyze and interpret a program, capturing its output.
    pub fn run_source(source: &str) -> Result<Run, PipelineError> {
        let (mut ast, diagnostics) = sigh_parser::parse(source);
        if !diagnostics.is_empty() {
            return Err(PipelineError::Parse(diagnostics));
        }

        let analysis = sigh_analysis::analyze(&mut ast);
        if analysis.has_errors() {
            return Err(PipelineError::Analysis(analysis.diagnostics));
        }

        let buffer = SharedBuffer::default();
        let interpreter = Interpreter::with_output(ast, analysis, Box::new(buffer.clone()));
        let value = interpreter.interpret().map_err(PipelineError::Runtime)?;

        let output = {
            let bytes = buffer
                .0
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            String::from_utf8_lossy(&bytes).into_owned()
        };
        Ok(Run { value, output })
    }

    /// Parse and analyze a program, returning every diagnostic found.
    pub fn check_source(source: &str) -> Vec<Diagnostic> {
        let (mut ast, mut diagnostics) = sigh_parser::parse(source);
        let analysis = sigh_analysis::analyze(&mut ast);
        diagnostics.extend(analysis.diagnostics);
        diagnostics
    }
}
