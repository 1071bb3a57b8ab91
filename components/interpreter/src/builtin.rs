//! Builtin dispatch table
//!
//! A function whose descriptor has `first_statement < 0` is builtin number
//! `-first_statement`. Hosts register native functions by number, or by the
//! name the program gives the builtin so the program's own numbering is used.

use crate::vm::Vm;
use core_types::ProgsResult;

/// A host-native function
///
/// Arguments are read from the parameter blocks with the `parm_*` helpers on
/// [`Vm`]; results go in the return area through the `return_*` helpers.
pub type BuiltinFn<H> = fn(&mut Vm<H>) -> ProgsResult<()>;

/// A registered builtin
pub struct Builtin<H> {
    /// Name used in diagnostics
    pub name: String,
    /// Native implementation
    pub func: BuiltinFn<H>,
}

impl<H> Clone for Builtin<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: self.func,
        }
    }
}

impl<H> std::fmt::Debug for Builtin<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// Builtins indexed by number
pub struct BuiltinTable<H> {
    entries: Vec<Option<Builtin<H>>>,
}

impl<H> BuiltinTable<H> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register (or replace) builtin `number`
    pub fn register(&mut self, number: usize, name: impl Into<String>, func: BuiltinFn<H>) {
        if self.entries.len() <= number {
            self.entries.resize_with(number + 1, || None);
        }
        self.entries[number] = Some(Builtin {
            name: name.into(),
            func,
        });
    }

    /// Look a builtin up by number
    pub fn get(&self, number: usize) -> Option<&Builtin<H>> {
        self.entries.get(number).and_then(Option::as_ref)
    }

    /// Number of registered builtins
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered numbers with their names, ascending
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(n, e)| e.as_ref().map(|b| (n, b.name.as_str())))
    }
}

impl<H> Default for BuiltinTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for BuiltinTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
