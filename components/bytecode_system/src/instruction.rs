//! Statement records
//!
//! A statement is an opcode number plus three 16-bit operands. The opcode is
//! kept raw so that a corrupt statement only fails when it is executed.

use core_types::ProgsResult;

use crate::opcode::Opcode;

/// Size of one statement record in the image
pub const STATEMENT_SIZE: usize = 8;

/// A single bytecode statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    /// Raw opcode number
    pub op: u16,
    /// First operand
    pub a: i16,
    /// Second operand
    pub b: i16,
    /// Third operand
    pub c: i16,
}

impl Statement {
    /// Create a statement from a decoded opcode
    pub fn new(op: Opcode, a: i16, b: i16, c: i16) -> Self {
        Self {
            op: op.number(),
            a,
            b,
            c,
        }
    }

    /// Decode the opcode
    pub fn opcode(&self) -> ProgsResult<Opcode> {
        Opcode::try_from(self.op)
    }

    /// Operand `a` as a global offset
    ///
    /// Offsets are read unsigned so programs can address the full 16-bit
    /// segment; branch deltas use the signed field directly.
    pub fn a_ofs(&self) -> usize {
        self.a as u16 as usize
    }

    /// Operand `b` as a global offset
    pub fn b_ofs(&self) -> usize {
        self.b as u16 as usize
    }

    /// Operand `c` as a global offset
    pub fn c_ofs(&self) -> usize {
        self.c as u16 as usize
    }
}
