//! Progs command line tool
//!
//! Provides the [`Runtime`] and supporting modules behind the `progs`
//! binary: image summaries, disassembly, running a function, and an
//! interactive REPL.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod repl;
pub mod runtime;

pub use cli::{Cli, Command, ReturnKind, RunArgs};
pub use error::{CliError, CliResult};
pub use runtime::{ProgramInfo, Runtime};
