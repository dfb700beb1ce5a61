use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A batch rebranding tool for forked codebases.
///
/// `clonemill` rewrites a fork's working tree away from its upstream
/// project: identifiers, ports, currency units, URLs and file paths, with a
/// git commit checkpointing each transformation step. Re-running the
/// pipeline against its own output changes nothing and commits nothing.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scripted, idempotent rebranding of a forked codebase",
    long_about = "clonemill - scripted, idempotent rebranding of a forked codebase.

Renames a derived project's identifiers, ports, currency units and URLs away
from its upstream project, committing each logical transformation as a
separate git checkpoint. Case-aware substitution with a context blacklist
keeps copyright notices, upstream URLs and test fixtures untouched.

QUICK EXAMPLES:
  clonemill fork                          # Run the full pipeline in .
  clonemill fork --fork-branch master     # Also merge .clonemill config
  clonemill file doc/README.md            # Rename identifiers in one file
  clonemill substitute --set naming       # Apply one named substitution set

For detailed help on any command, use: clonemill <command> --help"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Named follow-up substitution sets, for migrating trees produced by an
/// earlier rename catalog.
#[derive(ValueEnum, Clone, Debug)]
pub enum SubstitutionSet {
    /// Correct the camel-case project name to its hyphenated form.
    Naming,
    /// Point too-eagerly rewritten URLs back at their upstream targets.
    Urls,
}

/// The set of available commands for the `clonemill` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full fork pipeline, committing after each step
    ///
    /// EXAMPLES:
    ///   clonemill fork                                   # Pipeline in .
    ///   clonemill fork -d ../unit-e                      # Explicit tree
    ///   clonemill fork --fork-branch master              # Merge branch config
    ///
    /// When --fork-branch is given, the YAML document `.clonemill` on that
    /// branch extends the built-in lists of appropriated and removed files:
    ///   appropriated_files:
    ///     - README.md
    ///   removed_files:
    ///     - .github/ISSUE_TEMPLATE.md
    Fork {
        /// The working tree to transform (a git checkout).
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Branch holding the fork's `.clonemill` config and appropriated files.
        #[arg(long)]
        fork_branch: Option<String>,

        /// Upstream branch name, e.g. `upstream/master`.
        #[arg(long)]
        upstream_branch: Option<String>,
    },

    /// Apply the identifier substitution passes to a single file
    ///
    /// EXAMPLES:
    ///   clonemill file doc/README.md
    ///   clonemill file -d ../unit-e src/init.cpp
    File {
        /// The working tree the file lives in.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// File to process, relative to the working tree.
        path: PathBuf,
    },

    /// Apply one named substitution set to the whole tree
    ///
    /// EXAMPLES:
    ///   clonemill substitute --set naming   # UnitE -> Unit-e corrections
    ///   clonemill substitute --set urls     # URL corrections
    ///
    /// Sets do not commit; review the tree and commit by hand.
    Substitute {
        /// The working tree to transform.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// The substitution set to apply.
        #[arg(short, long, value_enum)]
        set: SubstitutionSet,
    },

    /// Show upstream changes of appropriated and removed files since the last merge
    ///
    /// EXAMPLES:
    ///   clonemill diff --fork-branch master --upstream-branch upstream/master
    Diff {
        /// The working tree to inspect.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Branch the fork is maintained on.
        #[arg(long)]
        fork_branch: String,

        /// Upstream branch to diff against.
        #[arg(long)]
        upstream_branch: String,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
