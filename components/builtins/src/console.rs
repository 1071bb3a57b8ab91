//! Console output for builtins
//!
//! Printing builtins write through the host's [`Console`]. A VM whose host
//! state is `()` has no console; its output goes to the log instead.

use std::io::Write;

use tracing::info;

/// Console output writer trait
pub trait Console {
    /// Write text exactly as the program produced it
    fn print(&mut self, text: &str);
}

impl Console for () {
    fn print(&mut self, text: &str) {
        info!(target: "progs::console", "{}", text.trim_end_matches('\n'));
    }
}

/// Console that writes to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        // Nothing useful can be done about a closed stdout.
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// Console that captures everything printed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedConsole {
    output: String,
}

impl BufferedConsole {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far
    pub fn contents(&self) -> &str {
        &self.output
    }

    /// Printed text split into lines
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }

    /// Take the buffered text, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl Console for BufferedConsole {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }
}
