//! The main entry point for the `clonemill` command-line application.
//!
//! This file is responsible for parsing command-line arguments and dispatching
//! to the appropriate subcommand handler in the `clonemill` library.

use clonemill::cli::{self, Commands};
use clonemill::config::ForkConfig;
use clonemill::errors::Result;
use clonemill::processor::Processor;
use clonemill::{Fork, sets};
use std::env;
use std::process;

fn main() -> Result<()> {
    // Check if no arguments provided (just 'clonemill')
    let args_vec: Vec<String> = env::args().collect();
    if args_vec.len() == 1 {
        println!("Scripted, idempotent rebranding of a forked codebase\n");
        println!("QUICK START EXAMPLES:");
        println!("  clonemill fork                         # Run the full pipeline in .");
        println!("  clonemill fork --fork-branch master    # Also merge .clonemill config");
        println!("  clonemill file doc/README.md           # Rename identifiers in one file");
        println!("  clonemill substitute --set naming      # Apply one named set");
        println!("  clonemill diff --fork-branch master --upstream-branch upstream/master\n");
        println!("Run 'clonemill --help' for the full command list");
        println!("Run 'clonemill <command> --help' for detailed command help");
        process::exit(0);
    }

    let args = cli::parse_args();

    match args.command {
        Commands::Fork {
            dir,
            fork_branch,
            upstream_branch,
        } => {
            let fork = Fork::new(dir, fork_branch, upstream_branch)?;
            fork.run()
        }
        Commands::File { dir, path } => {
            let fork = Fork::new(dir, None, None)?;
            fork.process_file(&path)
        }
        Commands::Substitute { dir, set } => {
            let processor = Processor::new(dir, ForkConfig::default());
            sets::apply(&processor, &set)
        }
        Commands::Diff {
            dir,
            fork_branch,
            upstream_branch,
        } => {
            let fork = Fork::new(dir, Some(fork_branch), Some(upstream_branch))?;
            fork.show_upstream_diff()
        }
    }
}
