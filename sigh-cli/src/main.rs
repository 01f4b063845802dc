//! Sigh CLI - the Sigh language command line driver.

mod commands;

use clap::{Parser, Subcommand};

/// Main CLI structure.
#[derive(Parser)]
#[command(name = "sigh")]
#[command(author, version, about = "Sigh - a small language with duck-typed classes and Unborn values", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output.
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a Sigh file.
    Run {
        /// The file to run.
        file: String,
    },

    /// Analyze a file without running it.
    Check {
        /// The file to check.
        file: String,
    },
}

/// Main entry point.
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file } => commands::run::run(&file, cli.verbose),
        Commands::Check { file } => commands::check::run(&file, cli.verbose),
    };

    if let Err(error) = result {
        if !cli.quiet {
            eprintln!("error: {}", error);
        }
        std::process::exit(1);
    }
}
