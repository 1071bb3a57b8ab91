//! Global, field and function definition records

use arrayvec::ArrayVec;
use core_types::layout::{DEF_SAVEGLOBAL, MAX_PARMS};
use core_types::EType;

/// Size of one global/field definition record in the image
pub const DEF_SIZE: usize = 8;
/// Size of one function record in the image
pub const FUNCTION_SIZE: usize = 36;

/// A named global or field definition.
///
/// For globals `ofs` is a slot in the global segment; for fields it is a slot
/// within every entity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Def {
    /// Type tag including the persist flag
    pub type_tag: u16,
    /// Slot offset
    pub ofs: u16,
    /// Name, as an offset into the string table
    pub name: i32,
}

impl Def {
    /// Declared type, `None` for tags this VM does not know
    pub fn etype(&self) -> Option<EType> {
        EType::from_tag(self.type_tag & !DEF_SAVEGLOBAL)
    }

    /// Whether the definition is written to save games
    pub fn is_saved(&self) -> bool {
        self.type_tag & DEF_SAVEGLOBAL != 0
    }

    /// Slots covered by the definition
    pub fn width(&self) -> usize {
        self.etype().map(EType::width).unwrap_or(1)
    }
}

/// How a function executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Bytecode body starting at the given statement
    Bytecode(usize),
    /// Host builtin with the given number
    Builtin(usize),
}

/// A function descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// First statement; negative values name builtin `-first_statement`
    pub first_statement: i32,
    /// First slot of the function's local window (parameters come first)
    pub parm_start: i32,
    /// Slots in the local window, parameters included
    pub locals: i32,
    /// Profiling counter as stored in the image
    pub profile: i32,
    /// Name, as an offset into the string table
    pub name: i32,
    /// Source file, as an offset into the string table
    pub file: i32,
    /// Width of each declared (fixed) parameter
    pub parm_size: ArrayVec<u8, MAX_PARMS>,
    /// Accepts extra arguments past the fixed ones (builtins only)
    pub variadic: bool,
}

impl Function {
    /// Bytecode or builtin
    pub fn kind(&self) -> FunctionKind {
        if self.first_statement < 0 {
            FunctionKind::Builtin(self.first_statement.unsigned_abs() as usize)
        } else {
            FunctionKind::Bytecode(self.first_statement as usize)
        }
    }

    /// Declared parameter count
    pub fn num_parms(&self) -> usize {
        self.parm_size.len()
    }

    /// Slots occupied by the parameters once packed into the local window
    pub fn parm_slots(&self) -> usize {
        self.parm_size.iter().map(|w| *w as usize).sum()
    }
}
