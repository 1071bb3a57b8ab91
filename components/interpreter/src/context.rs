//! Execution context: the call stack and the local save stack
//!
//! There is one global segment, so a function's locals live at fixed
//! absolute offsets. Recursion works by saving the callee's window before
//! the parameters are copied in and restoring it on return.

use core_types::{ProgsError, ProgsResult};

use crate::call_frame::CallFrame;

/// Call stack state of one VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Active frames, innermost last
    frames: Vec<CallFrame>,
    /// Saved local windows
    local_stack: Vec<u32>,
    max_depth: usize,
    local_limit: usize,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new(max_depth: usize, local_limit: usize) -> Self {
        Self {
            frames: Vec::with_capacity(max_depth.min(64)),
            local_stack: Vec::with_capacity(local_limit.min(4096)),
            max_depth,
            local_limit,
        }
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Active frames, outermost first
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Innermost frame
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Slots in use on the local stack
    pub fn local_stack_len(&self) -> usize {
        self.local_stack.len()
    }

    /// Fail if another frame would exceed the depth bound
    pub fn check_depth(&self) -> ProgsResult<()> {
        if self.frames.len() >= self.max_depth {
            Err(ProgsError::StackOverflow {
                limit: self.max_depth,
            })
        } else {
            Ok(())
        }
    }

    /// Save a local window and return where it was stored
    pub fn save_locals(&mut self, window: &[u32]) -> ProgsResult<usize> {
        let saved_at = self.local_stack.len();
        let needed = saved_at + window.len();
        if needed > self.local_limit {
            return Err(ProgsError::LocalStackOverflow {
                needed,
                limit: self.local_limit,
            });
        }
        self.local_stack.extend_from_slice(window);
        Ok(saved_at)
    }

    /// Push a frame whose locals were saved with [`save_locals`](Self::save_locals)
    pub fn push(&mut self, frame: CallFrame) -> ProgsResult<()> {
        self.check_depth()?;
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the innermost frame along with its saved local window
    pub fn pop(&mut self) -> Option<(CallFrame, Vec<u32>)> {
        let frame = self.frames.pop()?;
        let saved = self.local_stack.split_off(frame.saved_at.min(self.local_stack.len()));
        Some((frame, saved))
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.frames.clear();
        self.local_stack.clear();
    }
}
