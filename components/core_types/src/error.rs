//! Progs error types and error handling.
//!
//! [`ProgsError`] is the taxonomy shared by the loader, the memory model and
//! the interpreter. [`RuntimeError`] is what a host sees when a call into the
//! VM aborts: the underlying error plus the statement, function and call stack
//! at the time of the failure.

use std::fmt;

use thiserror::Error;

use crate::StackFrame;

/// Result alias used throughout the progs components.
pub type ProgsResult<T> = Result<T, ProgsError>;

/// Everything that can go wrong while loading or running a program.
///
/// All variants are fatal to the execution that raised them. Floating-point
/// division by zero is deliberately absent: it follows IEEE-754 and yields
/// an infinity or NaN instead of an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgsError {
    /// Malformed image (bad version, truncated header, bad record contents)
    #[error("bad program format: {0}")]
    Format(String),

    /// Header checksum does not match the declaration set the host expects
    #[error("checksum mismatch: image has {found}, host expects {expected}")]
    ChecksumMismatch {
        /// Checksum the host was built against
        expected: i32,
        /// Checksum stored in the image header
        found: i32,
    },

    /// A table (or a reference into one) falls outside its bounds
    #[error("{table} table out of bounds: offset {offset}, count {count}, limit {limit}")]
    TableBounds {
        /// Which table was being read
        table: &'static str,
        /// Offset of the table or of the offending reference
        offset: i64,
        /// Record count of the table or width of the reference
        count: i64,
        /// Size the reference had to fit into
        limit: i64,
    },

    /// Statement carries an opcode outside the instruction set
    #[error("unknown opcode {0}")]
    UnknownOpcode(u16),

    /// Field offset is not inside the entity record
    #[error("invalid field offset {offset} (entity has {limit} fields)")]
    InvalidFieldOffset {
        /// Offending field offset
        offset: i32,
        /// Number of slots in an entity record
        limit: usize,
    },

    /// Call reached a builtin number with no registered native function
    #[error("unresolved builtin #{number} ({name})")]
    UnresolvedBuiltin {
        /// Builtin number taken from the function descriptor
        number: usize,
        /// Function name, for diagnostics
        name: String,
    },

    /// Call depth bound exceeded
    #[error("stack overflow: call depth limit {limit} reached")]
    StackOverflow {
        /// Configured maximum depth
        limit: usize,
    },

    /// Local save stack is full
    #[error("locals stack overflow: {needed} slots needed, limit {limit}")]
    LocalStackOverflow {
        /// Slots that would be in use after the push
        needed: usize,
        /// Configured capacity
        limit: usize,
    },

    /// Global segment access outside the segment
    #[error("global offset {offset} out of range (segment has {len} slots)")]
    GlobalOutOfRange {
        /// Offending slot offset
        offset: usize,
        /// Segment size
        len: usize,
    },

    /// Program counter left the statement table
    #[error("statement {0} out of range")]
    StatementOutOfRange(i64),

    /// Function reference outside the function table
    #[error("bad function number {0}")]
    BadFunction(i32),

    /// Host call staged more arguments than there are parameter blocks
    #[error("{0} arguments passed (at most 8)")]
    TooManyArguments(usize),

    /// Call through function reference 0
    #[error("NULL function")]
    NullFunction,

    /// Entity reference outside the live entity range
    #[error("bad entity number {0}")]
    BadEntity(i32),

    /// Every entity record up to the configured maximum is in use
    #[error("no free entities (limit {0})")]
    EntityLimit(usize),

    /// Pointer produced by ADDRESS does not address entity storage
    #[error("bad pointer {0}")]
    BadPointer(i32),

    /// String reference outside the string table
    #[error("bad string reference {0}")]
    BadString(i32),

    /// Statement budget of a single host call exhausted
    #[error("runaway loop: {0} statements executed")]
    RunawayLoop(u64),

    /// STATE executed but the program lacks the global or field it needs
    #[error("STATE needs `{0}`, which the program does not declare")]
    UnboundState(&'static str),

    /// Write through an address inside the world entity while it is protected
    #[error("assignment to world entity")]
    WorldAssignment,

    /// Name lookup failed
    #[error("`{0}` not found")]
    NotFound(String),

    /// Builtin-reported failure
    #[error("{0}")]
    Builtin(String),

    /// Snapshot import could not be applied
    #[error("save data: {0}")]
    Save(String),

    /// Underlying I/O failure
    #[error("i/o: {0}")]
    Io(String),
}

impl ProgsError {
    /// Shorthand for [`ProgsError::Format`]
    pub fn format(message: impl Into<String>) -> Self {
        ProgsError::Format(message.into())
    }

    /// Shorthand for [`ProgsError::Builtin`]
    pub fn builtin(message: impl Into<String>) -> Self {
        ProgsError::Builtin(message.into())
    }
}

impl From<std::io::Error> for ProgsError {
    fn from(err: std::io::Error) -> Self {
        ProgsError::Io(err.to_string())
    }
}

/// A fatal error surfaced from a call into the VM.
///
/// # Examples
///
/// ```
/// use core_types::{ProgsError, RuntimeError, StackFrame};
///
/// let err = RuntimeError {
///     error: ProgsError::NullFunction,
///     statement: Some(12),
///     function: Some("monster_think".to_string()),
///     stack: vec![StackFrame::new("monster_think", "monsters.qc", 12)],
/// };
/// assert!(err.to_string().contains("monster_think"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// What went wrong
    pub error: ProgsError,
    /// Statement index being executed, if execution had started
    pub statement: Option<usize>,
    /// Name of the function executing at the time
    pub function: Option<String>,
    /// Call stack, innermost frame first
    pub stack: Vec<StackFrame>,
}

impl RuntimeError {
    /// Error raised before any statement ran (bad entry point, host misuse)
    pub fn detached(error: ProgsError) -> Self {
        Self {
            error,
            statement: None,
            function: None,
            stack: Vec::new(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        match (&self.function, self.statement) {
            (Some(func), Some(st)) => write!(f, " in {} at statement {}", func, st)?,
            (Some(func), None) => write!(f, " in {}", func)?,
            (None, Some(st)) => write!(f, " at statement {}", st)?,
            (None, None) => {}
        }
        for frame in &self.stack {
            write!(f, "\n    {}", frame)?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ProgsError> for RuntimeError {
    fn from(error: ProgsError) -> Self {
        RuntimeError::detached(error)
    }
}
