//! `sigh run <file>`: parse, analyze, interpret.

use crate::commands::{read_source, report, runtime_diagnostic};
use sigh_interp::Interpreter;

pub fn run(file: &str, verbose: bool) -> Result<(), String> {
    let source = read_source(file)?;

    let (mut ast, diagnostics) = sigh_parser::parse(&source);
    if !diagnostics.is_empty() {
        return Err(report(&source, file, &diagnostics));
    }

    let analysis = sigh_analysis::analyze(&mut ast);
    if analysis.has_errors() {
        return Err(report(&source, file, &analysis.diagnostics));
    }
    if verbose {
        eprintln!("analysis ok, running {}", file);
    }

    let interpreter = Interpreter::new(ast, analysis);
    match interpreter.interpret() {
        Ok(Some(value)) => {
            println!("{:?}", value);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(error) => {
            sigh_diagnostic::emit(&source, file, &runtime_diagnostic(&error));
            Err("the program stopped with a runtime error".to_string())
        }
    }
}
