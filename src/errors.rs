use std::process::ExitStatus;
use thiserror::Error;

/// The primary error type for all operations in the `clonemill` application.
///
/// This enum uses `thiserror` to neatly wrap various kinds of errors that can occur,
/// from I/O issues to subprocess failures.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred during regex compilation.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),

    /// An error that occurred while parsing a YAML configuration document.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error from the `ignore` crate, which is used for directory traversal.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// An error that occurred converting subprocess output to a UTF-8 string.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// An identifier occurrence matched the needle but none of the known
    /// casing templates. Surfaced immediately so the occurrence can be
    /// triaged by hand instead of being silently mis-rewritten.
    #[error("Don't know how to handle '{0}'")]
    UnhandledCase(String),

    /// A required subprocess (a move, a commit, the whitespace cleanup)
    /// returned a non-zero exit status.
    #[error("Command `{command}` failed with {status}")]
    Subprocess { command: String, status: ExitStatus },

    /// The whitespace-cleanup step has no known stream editor for this host.
    #[error("Unsupported platform: '{0}'")]
    UnsupportedPlatform(String),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),
}

/// A convenient type alias for `Result<T, clonemill::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
