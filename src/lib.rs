//! `clonemill` is a library for scripted, idempotent rebranding of a forked
//! codebase.
//!
//! It provides the core logic for the `clonemill` command-line tool but can
//! also be used as a standalone library. The main components are:
//!
//! - `Substitution`: case-aware, context-sensitive, blacklist-guarded string
//!   replacement. A pure function over a string; every rename in the tool
//!   goes through it.
//! - `Processor`: applies substitutions and arbitrary per-file transforms
//!   across a working tree, with hidden-directory and exclusion filtering.
//! - `Fork`: the fixed sequence of transformation steps, each checkpointed
//!   with a git commit. Re-running the sequence against its own output
//!   changes nothing and commits nothing.
//! - `config`: the built-in rename catalog plus the optional `.clonemill`
//!   document read from the fork branch.
//!
//! The tool is sequential and single-threaded: it owns the working tree
//! exclusively for the duration of a run.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fork;
pub mod git;
pub mod identifiers;
pub mod processor;
pub mod sets;
pub mod substitute;

// Re-export main types for easier access by library users.
pub use errors::{Error, Result};
pub use fork::Fork;
pub use processor::{Discovery, Processor};
pub use substitute::{ContextGuard, Substitution};
