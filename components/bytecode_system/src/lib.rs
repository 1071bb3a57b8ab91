//! Program image format for the progs VM
//!
//! This crate defines the instruction set and the binary `progs.dat` layout,
//! and provides the loader, a validating in-memory [`Program`], an
//! [`ImageBuilder`] for assembling programs by hand, and a disassembler.
//!
//! # Example
//!
//! ```
//! use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
//!
//! let mut b = ImageBuilder::new();
//! let main = b.begin_function("main", &[]);
//! b.emit(Opcode::Done, 0, 0, 0);
//! b.end_function();
//!
//! let bytes = b.to_bytes();
//! let program = Program::load(&bytes, &LoadOptions::default()).unwrap();
//! assert_eq!(program.find_function("main"), Some(main.index));
//! assert_eq!(program.to_bytes(), bytes);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod crc;
pub mod defs;
pub mod disasm;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export main types at crate root
pub use builder::{FieldSymbol, FunctionSymbol, ImageBuilder};
pub use crc::{crc16, Crc16, PROGHEADER_CRC};
pub use defs::{Def, Function, FunctionKind};
pub use disasm::{disassemble_function, disassemble_statement, format_statement};
pub use instruction::Statement;
pub use opcode::Opcode;
pub use program::{Header, LoadOptions, Lump, Program, HEADER_SIZE, PROG_VERSION};
