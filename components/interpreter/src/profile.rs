//! Per-function execution counters

use bytecode_system::Program;
use serde::Serialize;

/// Counters for one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FunctionProfile {
    /// Times the function was entered (or, for builtins, called)
    pub calls: u64,
    /// Statements executed while the function was innermost
    pub statements: u64,
}

/// One line of a profile report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    /// Function number
    pub function: usize,
    /// Function name
    pub name: String,
    /// Counters
    pub profile: FunctionProfile,
}

/// Profiling data for every function of a program
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profiler {
    functions: Vec<FunctionProfile>,
}

impl Profiler {
    /// Create zeroed counters for `num_functions` functions
    pub fn new(num_functions: usize) -> Self {
        Self {
            functions: vec![FunctionProfile::default(); num_functions],
        }
    }

    /// Record one entry into a function
    #[inline]
    pub fn record_call(&mut self, function: usize) {
        if let Some(p) = self.functions.get_mut(function) {
            p.calls += 1;
        }
    }

    /// Record one executed statement
    #[inline]
    pub fn record_statement(&mut self, function: usize) {
        if let Some(p) = self.functions.get_mut(function) {
            p.statements += 1;
        }
    }

    /// Counters of a function
    pub fn get(&self, function: usize) -> FunctionProfile {
        self.functions.get(function).copied().unwrap_or_default()
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        self.functions.iter_mut().for_each(|p| *p = FunctionProfile::default());
    }

    /// The `limit` busiest functions by statements executed, then by calls
    ///
    /// Functions that never ran are left out.
    pub fn report(&self, program: &Program, limit: usize) -> Vec<ProfileEntry> {
        let mut entries: Vec<ProfileEntry> = self
            .functions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.calls > 0 || p.statements > 0)
            .map(|(i, p)| ProfileEntry {
                function: i,
                name: display_name(program, i),
                profile: *p,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.profile
                .statements
                .cmp(&a.profile.statements)
                .then(b.profile.calls.cmp(&a.profile.calls))
                .then(a.function.cmp(&b.function))
        });
        entries.truncate(limit);
        entries
    }
}

fn display_name(program: &Program, function: usize) -> String {
    let name = program.function_name(function);
    if name.is_empty() {
        format!("#{}", function)
    } else {
        name.into_owned()
    }
}
