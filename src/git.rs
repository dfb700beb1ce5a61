//! Thin wrappers around the `git` command line.
//!
//! The rest of the crate depends only on this command surface: list files
//! matching a pattern, show content at a revision, compute a merge base,
//! move a file, stage-and-commit, show log messages. Every call runs
//! against an explicit working-tree root; nothing here consults the
//! process current directory.

use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn run(root: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new("git").args(args).current_dir(root).output()?)
}

fn check(args: &[&str], output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        eprint!("{stderr}");
    }
    Err(Error::Subprocess {
        command: format!("git {}", args.join(" ")),
        status: output.status,
    })
}

/// Tracked files containing the literal `needle`, via `git grep -l`.
///
/// Exit status 1 with empty output means "no matches" and yields an empty
/// list; anything else non-zero is an error.
pub fn grep_files(root: &Path, needle: &str, ignore_case: bool) -> Result<Vec<PathBuf>> {
    let mut args = vec!["grep", "--fixed-strings", "-l"];
    if ignore_case {
        args.push("-i");
    }
    args.push(needle);
    let output = run(root, &args)?;
    let stdout = String::from_utf8(output.stdout)?;
    if !output.status.success() {
        if output.status.code() == Some(1) && stdout.is_empty() {
            return Ok(Vec::new());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            eprint!("{stderr}");
        }
        return Err(Error::Subprocess {
            command: format!("git {}", args.join(" ")),
            status: output.status,
        });
    }
    Ok(stdout.lines().map(PathBuf::from).collect())
}

/// Content of `spec` (a `revision:path` reference). Returns `None` when git
/// cannot resolve it, e.g. the file does not exist on that branch.
pub fn show(root: &Path, spec: &str) -> Result<Option<String>> {
    let output = run(root, &["show", spec])?;
    if output.status.success() {
        Ok(Some(String::from_utf8(output.stdout)?))
    } else {
        Ok(None)
    }
}

/// The merge base of two revisions.
pub fn merge_base(root: &Path, a: &str, b: &str) -> Result<String> {
    let args = ["merge-base", a, b];
    let output = run(root, &args)?;
    check(&args, &output)?;
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// The commit id a revision resolves to.
pub fn rev_parse(root: &Path, revision: &str) -> Result<String> {
    let args = ["rev-parse", revision];
    let output = run(root, &args)?;
    check(&args, &output)?;
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Moves a tracked file. Non-zero exit is an error.
pub fn mv(root: &Path, from: &Path, to: &Path) -> Result<()> {
    let from = from.to_string_lossy();
    let to = to.to_string_lossy();
    let args = ["mv", from.as_ref(), to.as_ref()];
    let output = run(root, &args)?;
    check(&args, &output)
}

/// Removes a tracked file. Non-zero exit is an error.
pub fn rm(root: &Path, path: &str) -> Result<()> {
    let args = ["rm", "-q", path];
    let output = run(root, &args)?;
    check(&args, &output)
}

/// Checks out one file from a branch into the working tree.
pub fn checkout_file(root: &Path, branch: &str, path: &str) -> Result<()> {
    let args = ["checkout", branch, "--", path];
    let output = run(root, &args)?;
    check(&args, &output)
}

/// Stages tracked modifications and commits them. Returns `false` without
/// committing when the tree has no staged-able changes, so re-running a
/// pipeline that changed nothing creates no commits. An actual commit
/// failure is an error.
pub fn commit_all(root: &Path, message: &str) -> Result<bool> {
    let status_args = ["status", "--porcelain", "--untracked-files=no"];
    let status_output = run(root, &status_args)?;
    check(&status_args, &status_output)?;
    if status_output.stdout.is_empty() {
        return Ok(false);
    }
    let args = ["commit", "-am", message];
    let output = run(root, &args)?;
    check(&args, &output)?;
    Ok(true)
}

/// Streams `git log -p <range> -- <path>` to the terminal.
pub fn log_patch(root: &Path, range: &str, path: &str) -> Result<()> {
    let args = ["log", "-p", range, "--", path];
    let status = Command::new("git").args(args).current_dir(root).status()?;
    if !status.success() {
        return Err(Error::Subprocess {
            command: format!("git {}", args.join(" ")),
            status,
        });
    }
    Ok(())
}
