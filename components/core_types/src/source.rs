//! Stack frame type for progs error tracking.

use std::fmt;

/// One entry of a progs call stack, as reported in error traces.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame::new("PlayerPreThink", "client.qc", 1042);
/// assert_eq!(frame.to_string(), "client.qc : PlayerPreThink (statement 1042)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function
    pub function_name: String,
    /// Source file the compiler recorded for the function
    pub source_file: String,
    /// Statement index being executed in this frame
    pub statement: usize,
}

impl StackFrame {
    /// Create a new stack frame entry
    pub fn new(
        function_name: impl Into<String>,
        source_file: impl Into<String>,
        statement: usize,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            source_file: source_file.into(),
            statement,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {} (statement {})",
            self.source_file, self.function_name, self.statement
        )
    }
}
