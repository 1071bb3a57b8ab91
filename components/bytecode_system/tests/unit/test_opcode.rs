//! Tests for Opcode numbering and decoding

use bytecode_system::{Opcode, Statement};
use core_types::ProgsError;

#[test]
fn test_classic_numbering() {
    assert_eq!(Opcode::Done.number(), 0);
    assert_eq!(Opcode::AddF.number(), 6);
    assert_eq!(Opcode::EqS.number(), 12);
    assert_eq!(Opcode::LoadF.number(), 24);
    assert_eq!(Opcode::Address.number(), 30);
    assert_eq!(Opcode::StorePF.number(), 37);
    assert_eq!(Opcode::Return.number(), 43);
    assert_eq!(Opcode::If.number(), 49);
    assert_eq!(Opcode::Call0.number(), 51);
    assert_eq!(Opcode::State.number(), 60);
    assert_eq!(Opcode::Goto.number(), 61);
    assert_eq!(Opcode::BitOr.number(), 65);
    assert_eq!(Opcode::COUNT, 66);
}

#[test]
fn test_try_from_roundtrips_every_number() {
    for n in 0..Opcode::COUNT as u16 {
        let op = Opcode::try_from(n).unwrap();
        assert_eq!(op.number(), n);
    }
}

#[test]
fn test_out_of_range_number_is_unknown() {
    assert_eq!(Opcode::try_from(200), Err(ProgsError::UnknownOpcode(200)));
}

#[test]
fn test_mnemonic_lookup() {
    assert_eq!(Opcode::from_mnemonic("storep_f"), Some(Opcode::StorePF));
    assert_eq!(Opcode::from_mnemonic("CALL2"), Some(Opcode::Call2));
    assert_eq!(Opcode::from_mnemonic("NOPE"), None);
    assert_eq!(Opcode::MulVF.to_string(), "MUL_VF");
}

#[test]
fn test_statement_with_unknown_opcode_decodes_lazily() {
    let st = Statement {
        op: 99,
        a: 0,
        b: 0,
        c: 0,
    };
    assert!(matches!(st.opcode(), Err(ProgsError::UnknownOpcode(99))));
}
