//! Command line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Load, inspect and run progs images
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "progs")]
#[command(version, about = "Progs bytecode VM")]
pub struct Cli {
    /// JSON file with VM limits (any subset of the config keys)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Header checksum the image must carry
    #[arg(long, global = true)]
    pub crc: Option<u16>,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a summary of an image
    Info {
        /// Image file
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Disassemble one function or the whole statement table
    Disasm {
        /// Image file
        file: PathBuf,

        /// Function name
        function: Option<String>,
    },

    /// Call a function and print its result
    Run(RunArgs),

    /// Interactive session against a loaded image
    Repl {
        /// Image file
        file: PathBuf,
    },
}

/// Arguments of `progs run`
#[derive(Args, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Image file
    pub file: PathBuf,

    /// Function to call
    #[arg(default_value = "main")]
    pub function: String,

    /// Arguments: a number, 'x y z' for a vector, or text for a string
    #[arg(short, long = "arg")]
    pub args: Vec<String>,

    /// How to read the return area
    #[arg(long, value_enum, default_value_t = ReturnKind::Float)]
    pub returns: ReturnKind,

    /// Trace every executed statement
    #[arg(long)]
    pub trace: bool,

    /// Print the N busiest functions afterwards
    #[arg(long, value_name = "N")]
    pub profile: Option<usize>,

    /// Maximum call depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Statement budget for the call
    #[arg(long)]
    pub runaway_limit: Option<u64>,

    /// Reject writes into the world entity
    #[arg(long)]
    pub protect_world: bool,

    /// Restore persistent globals from a JSON snapshot before the call
    #[arg(long, value_name = "FILE")]
    pub load_globals: Option<PathBuf>,

    /// Write persistent globals to a JSON snapshot after the call
    #[arg(long, value_name = "FILE")]
    pub save_globals: Option<PathBuf>,
}

/// Type of a function result
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// Float
    Float,
    /// Three floats
    Vector,
    /// String reference, printed as its text
    String,
    /// Entity number
    Entity,
    /// Raw integer slot
    Int,
    /// Do not print anything
    Void,
}
