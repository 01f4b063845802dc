//! `sigh check <file>`: parse and analyze only.

use crate::commands::{read_source, report};

pub fn run(file: &str, verbose: bool) -> Result<(), String> {
    let source = read_source(file)?;

    let (mut ast, mut diagnostics) = sigh_parser::parse(&source);
    let analysis = sigh_analysis::analyze(&mut ast);
    diagnostics.extend(analysis.diagnostics);

    if !diagnostics.is_empty() {
        return Err(report(&source, file, &diagnostics));
    }
    if verbose {
        println!("{}: no errors found", file);
    }
    Ok(())
}
