//! Error types for the CLI

use core_types::{ProgsError, RuntimeError};
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O error
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be loaded, or a host-side VM operation failed
    #[error("{0}")]
    Progs(#[from] ProgsError),

    /// Fatal error while running bytecode
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Config or snapshot JSON
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command line value
    #[error("invalid argument: {0}")]
    Argument(String),

    /// REPL error
    #[error("repl error: {0}")]
    Repl(String),
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Repl(err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
