//! Standard builtins for progs programs
//!
//! This crate provides the host-native functions most programs expect:
//! - Console output and error reporting
//! - Number, vector and entity to string conversion
//! - Temporary-string concatenation
//! - Entity spawn, removal and iteration
//! - Statement trace toggles
//!
//! Programs declare builtins by name with their own numbers, so [`install`]
//! looks each name up in the loaded program and registers it under the
//! number found there.
//!
//! # Example
//!
//! ```
//! use builtins::{install, BufferedConsole};
//! use bytecode_system::{ImageBuilder, Opcode};
//! use core_types::layout::ofs_parm;
//! use interpreter::{Vm, VmConfig};
//!
//! let mut b = ImageBuilder::new();
//! let dprint = b.builtin("dprint", 25, &[1]);
//! let hello = b.string_const("hello\n");
//! b.begin_function("main", &[]);
//! b.emit(Opcode::StoreS, hello, ofs_parm(0) as u16, 0);
//! b.emit(Opcode::Call1, dprint.global, 0, 0);
//! b.emit(Opcode::Done, 0, 0, 0);
//! b.end_function();
//!
//! let mut vm = Vm::new(b.build().unwrap(), VmConfig::default(), BufferedConsole::new());
//! let installed = install(&mut vm);
//! assert_eq!(installed, vec![("dprint", 25)]);
//! vm.call_by_name("main", &[]).unwrap();
//! assert_eq!(vm.host().contents(), "hello\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod console;
pub mod diagnostics;
pub mod entity;
pub mod format;
pub mod strings;

use interpreter::{BuiltinFn, Vm};
use tracing::debug;

// Re-export main types for convenience
pub use console::{BufferedConsole, Console, StdoutConsole};

fn entry<H>(
    name: &'static str,
    number: usize,
    func: BuiltinFn<H>,
) -> (&'static str, usize, BuiltinFn<H>) {
    (name, number, func)
}

/// Name, classic number and implementation of every standard builtin
pub fn standard<H: Console>() -> Vec<(&'static str, usize, BuiltinFn<H>)> {
    vec![
        entry("error", 10, diagnostics::error),
        entry("objerror", 11, diagnostics::objerror),
        entry("spawn", 14, entity::spawn),
        entry("remove", 15, entity::remove),
        entry("dprint", 25, diagnostics::dprint),
        entry("ftos", 26, strings::ftos),
        entry("vtos", 27, strings::vtos),
        entry("traceon", 29, diagnostics::traceon),
        entry("traceoff", 30, diagnostics::traceoff),
        entry("eprint", 31, entity::eprint),
        entry("nextent", 47, entity::nextent),
        entry("etos", 65, strings::etos),
        entry("stof", 81, strings::stof),
        entry("strcat", 115, strings::strcat),
    ]
}

/// Register every standard builtin the program declares, under the
/// program's own numbers
///
/// Returns the names installed with their numbers. Builtins the program does
/// not declare are skipped.
pub fn install<H: Console>(vm: &mut Vm<H>) -> Vec<(&'static str, usize)> {
    let mut installed = Vec::new();
    for (name, _, func) in standard::<H>() {
        if let Ok(number) = vm.register_builtin_by_name(name, func) {
            installed.push((name, number));
        }
    }
    debug!(count = installed.len(), "standard builtins installed");
    installed
}

/// Register every standard builtin under its classic number, whether or not
/// the program declares it
pub fn install_classic<H: Console>(vm: &mut Vm<H>) {
    for (name, number, func) in standard::<H>() {
        vm.register_builtin(number, name, func);
    }
}
