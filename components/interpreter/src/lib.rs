//! Bytecode interpreter for progs programs
//!
//! This crate provides the execution context that runs a loaded program:
//! - Opcode dispatch over the flat global segment
//! - Calls with a bounded call stack and saved local windows
//! - A builtin table for host-native functions
//! - Per-function profiling and statement tracing
//! - Save and restore of persistent globals and entity fields
//!
//! # Example
//!
//! ```
//! use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
//! use core_types::Value;
//! use interpreter::Vm;
//!
//! let mut b = ImageBuilder::new();
//! let f = b.begin_function("add", &[1, 1]);
//! let (x, y) = (b.parm(f, 0), b.parm(f, 1));
//! let sum = b.local(1);
//! b.emit(Opcode::AddF, x, y, sum);
//! b.emit(Opcode::Return, sum, 0, 0);
//! b.end_function();
//!
//! let program = Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap();
//! let mut vm = Vm::with_program(program);
//! let ret = vm.call(f.index, &[Value::Float(2.0), Value::Float(3.0)]).unwrap();
//! assert_eq!(ret.as_f32(), 5.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod call_frame;
pub mod config;
pub mod context;
mod dispatch;
pub mod profile;
pub mod save;
pub mod vm;

// Re-export main types at crate root
pub use builtin::{Builtin, BuiltinFn, BuiltinTable};
pub use call_frame::CallFrame;
pub use config::VmConfig;
pub use context::ExecutionContext;
pub use profile::{FunctionProfile, ProfileEntry, Profiler};
pub use save::{EntitySnapshot, GlobalSnapshot, SavedValue};
pub use vm::Vm;
