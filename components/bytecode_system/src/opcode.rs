//! Progs opcodes
//!
//! The instruction set is closed: every opcode number a statement may carry
//! maps to one variant, and the interpreter matches on all of them.

use std::fmt;

use core_types::ProgsError;

/// Instruction set of the progs VM, numbered as stored in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum Opcode {
    Done = 0,
    MulF,
    MulV,
    MulFV,
    MulVF,
    DivF,
    AddF,
    AddV,
    SubF,
    SubV,

    EqF,
    EqV,
    EqS,
    EqE,
    EqFnc,

    NeF,
    NeV,
    NeS,
    NeE,
    NeFnc,

    Le,
    Ge,
    Lt,
    Gt,

    LoadF,
    LoadV,
    LoadS,
    LoadEnt,
    LoadFld,
    LoadFnc,

    Address,

    StoreF,
    StoreV,
    StoreS,
    StoreEnt,
    StoreFld,
    StoreFnc,

    StorePF,
    StorePV,
    StorePS,
    StorePEnt,
    StorePFld,
    StorePFnc,

    Return,
    NotF,
    NotV,
    NotS,
    NotEnt,
    NotFnc,
    If,
    IfNot,
    Call0,
    Call1,
    Call2,
    Call3,
    Call4,
    Call5,
    Call6,
    Call7,
    Call8,
    State,
    Goto,
    And,
    Or,

    BitAnd,
    BitOr,
}

/// Every opcode, indexed by its number
const ALL: [Opcode; 66] = [
    Opcode::Done,
    Opcode::MulF,
    Opcode::MulV,
    Opcode::MulFV,
    Opcode::MulVF,
    Opcode::DivF,
    Opcode::AddF,
    Opcode::AddV,
    Opcode::SubF,
    Opcode::SubV,
    Opcode::EqF,
    Opcode::EqV,
    Opcode::EqS,
    Opcode::EqE,
    Opcode::EqFnc,
    Opcode::NeF,
    Opcode::NeV,
    Opcode::NeS,
    Opcode::NeE,
    Opcode::NeFnc,
    Opcode::Le,
    Opcode::Ge,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::LoadF,
    Opcode::LoadV,
    Opcode::LoadS,
    Opcode::LoadEnt,
    Opcode::LoadFld,
    Opcode::LoadFnc,
    Opcode::Address,
    Opcode::StoreF,
    Opcode::StoreV,
    Opcode::StoreS,
    Opcode::StoreEnt,
    Opcode::StoreFld,
    Opcode::StoreFnc,
    Opcode::StorePF,
    Opcode::StorePV,
    Opcode::StorePS,
    Opcode::StorePEnt,
    Opcode::StorePFld,
    Opcode::StorePFnc,
    Opcode::Return,
    Opcode::NotF,
    Opcode::NotV,
    Opcode::NotS,
    Opcode::NotEnt,
    Opcode::NotFnc,
    Opcode::If,
    Opcode::IfNot,
    Opcode::Call0,
    Opcode::Call1,
    Opcode::Call2,
    Opcode::Call3,
    Opcode::Call4,
    Opcode::Call5,
    Opcode::Call6,
    Opcode::Call7,
    Opcode::Call8,
    Opcode::State,
    Opcode::Goto,
    Opcode::And,
    Opcode::Or,
    Opcode::BitAnd,
    Opcode::BitOr,
];

impl Opcode {
    /// Number of opcodes in the instruction set
    pub const COUNT: usize = ALL.len();

    /// Numeric value stored in a statement record
    pub fn number(self) -> u16 {
        self as u16
    }

    /// Argument count for `CALL0`..`CALL8`, `None` for everything else
    pub fn call_argc(self) -> Option<usize> {
        let n = self as u16;
        if (Opcode::Call0 as u16..=Opcode::Call8 as u16).contains(&n) {
            Some((n - Opcode::Call0 as u16) as usize)
        } else {
            None
        }
    }

    /// `CALLn` for a given argument count
    pub fn call(argc: usize) -> Option<Opcode> {
        if argc > 8 {
            return None;
        }
        Some(ALL[Opcode::Call0 as usize + argc])
    }

    /// Mnemonic used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Done => "DONE",
            Opcode::MulF => "MUL_F",
            Opcode::MulV => "MUL_V",
            Opcode::MulFV => "MUL_FV",
            Opcode::MulVF => "MUL_VF",
            Opcode::DivF => "DIV_F",
            Opcode::AddF => "ADD_F",
            Opcode::AddV => "ADD_V",
            Opcode::SubF => "SUB_F",
            Opcode::SubV => "SUB_V",
            Opcode::EqF => "EQ_F",
            Opcode::EqV => "EQ_V",
            Opcode::EqS => "EQ_S",
            Opcode::EqE => "EQ_E",
            Opcode::EqFnc => "EQ_FNC",
            Opcode::NeF => "NE_F",
            Opcode::NeV => "NE_V",
            Opcode::NeS => "NE_S",
            Opcode::NeE => "NE_E",
            Opcode::NeFnc => "NE_FNC",
            Opcode::Le => "LE",
            Opcode::Ge => "GE",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::LoadF => "LOAD_F",
            Opcode::LoadV => "LOAD_V",
            Opcode::LoadS => "LOAD_S",
            Opcode::LoadEnt => "LOAD_ENT",
            Opcode::LoadFld => "LOAD_FLD",
            Opcode::LoadFnc => "LOAD_FNC",
            Opcode::Address => "ADDRESS",
            Opcode::StoreF => "STORE_F",
            Opcode::StoreV => "STORE_V",
            Opcode::StoreS => "STORE_S",
            Opcode::StoreEnt => "STORE_ENT",
            Opcode::StoreFld => "STORE_FLD",
            Opcode::StoreFnc => "STORE_FNC",
            Opcode::StorePF => "STOREP_F",
            Opcode::StorePV => "STOREP_V",
            Opcode::StorePS => "STOREP_S",
            Opcode::StorePEnt => "STOREP_ENT",
            Opcode::StorePFld => "STOREP_FLD",
            Opcode::StorePFnc => "STOREP_FNC",
            Opcode::Return => "RETURN",
            Opcode::NotF => "NOT_F",
            Opcode::NotV => "NOT_V",
            Opcode::NotS => "NOT_S",
            Opcode::NotEnt => "NOT_ENT",
            Opcode::NotFnc => "NOT_FNC",
            Opcode::If => "IF",
            Opcode::IfNot => "IFNOT",
            Opcode::Call0 => "CALL0",
            Opcode::Call1 => "CALL1",
            Opcode::Call2 => "CALL2",
            Opcode::Call3 => "CALL3",
            Opcode::Call4 => "CALL4",
            Opcode::Call5 => "CALL5",
            Opcode::Call6 => "CALL6",
            Opcode::Call7 => "CALL7",
            Opcode::Call8 => "CALL8",
            Opcode::State => "STATE",
            Opcode::Goto => "GOTO",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::BitAnd => "BITAND",
            Opcode::BitOr => "BITOR",
        }
    }

    /// Look an opcode up by mnemonic (case-insensitive)
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        ALL.iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u16> for Opcode {
    type Error = ProgsError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ALL.get(value as usize)
            .copied()
            .ok_or(ProgsError::UnknownOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
