//! Call frame for function call stack management

/// Call frame representing a function invocation
///
/// Stored on the call stack to track function execution state. The callee's
/// local window is saved on the local stack at `saved_at` and written back
/// when the frame is popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Function being executed (index into the function table)
    pub function_id: usize,
    /// Statement the caller was executing: the CALL to resume after, or the
    /// statement whose builtin re-entered the VM. `None` when the host entered
    /// with nothing running.
    pub return_address: Option<usize>,
    /// First slot of the function's local window
    pub locals_start: usize,
    /// Slots in the local window
    pub locals_len: usize,
    /// Position of the saved window on the local stack
    pub saved_at: usize,
}

impl CallFrame {
    /// Create a new call frame
    pub fn new(
        function_id: usize,
        return_address: Option<usize>,
        locals_start: usize,
        locals_len: usize,
        saved_at: usize,
    ) -> Self {
        Self {
            function_id,
            return_address,
            locals_start,
            locals_len,
            saved_at,
        }
    }
}
