//! Contract compliance tests for bytecode_system
//! Verifies the image layout other components rely on

use bytecode_system::defs::{DEF_SIZE, FUNCTION_SIZE};
use bytecode_system::instruction::STATEMENT_SIZE;
use bytecode_system::{ImageBuilder, Lump, Opcode, Program, HEADER_SIZE, PROG_VERSION};
use core_types::EType;

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn lump(bytes: &[u8], n: usize) -> Lump {
    Lump {
        offset: read_i32(bytes, 8 + n * 8),
        count: read_i32(bytes, 12 + n * 8),
    }
}

/// Record sizes fixed by the file format
#[test]
fn test_contract_record_sizes() {
    assert_eq!(HEADER_SIZE, 60);
    assert_eq!(STATEMENT_SIZE, 8);
    assert_eq!(DEF_SIZE, 8);
    assert_eq!(FUNCTION_SIZE, 36);
    assert_eq!(PROG_VERSION, 6);
}

/// Header lumps describe tables of the advertised size
#[test]
fn test_contract_header_layout() {
    let mut b = ImageBuilder::new();
    b.global("g", EType::Vector);
    b.field("f", EType::Float);
    b.begin_function("main", &[1]);
    b.emit(Opcode::Done, 0, 0, 0);
    let program = b.build().unwrap();
    let bytes = program.to_bytes();

    assert_eq!(read_i32(&bytes, 0), PROG_VERSION);
    let sizes = [STATEMENT_SIZE, DEF_SIZE, DEF_SIZE, FUNCTION_SIZE, 1, 4];
    let counts = [
        program.statements.len(),
        program.globaldefs.len(),
        program.fielddefs.len(),
        program.functions.len(),
        program.strings.len(),
        program.globals.len(),
    ];
    for n in 0..6 {
        let l = lump(&bytes, n);
        assert_eq!(l.count as usize, counts[n]);
        assert!(l.offset as usize + sizes[n] * counts[n] <= bytes.len());
    }
    assert_eq!(read_i32(&bytes, 56), 1);
}

/// Statement records are little-endian op, a, b, c
#[test]
fn test_contract_statement_encoding() {
    let mut b = ImageBuilder::new();
    b.emit_raw(Opcode::AddF.number(), 28, -2, 300);
    let bytes = b.to_bytes();
    let ofs = lump(&bytes, 0).offset as usize + STATEMENT_SIZE;
    assert_eq!(&bytes[ofs..ofs + 8], &[6, 0, 28, 0, 0xfe, 0xff, 0x2c, 0x01]);
}

/// Function records encode the parameter count and widths
#[test]
fn test_contract_function_encoding() {
    let mut b = ImageBuilder::new();
    b.begin_function("f", &[3, 1]);
    b.emit(Opcode::Done, 0, 0, 0);
    let bytes = b.to_bytes();
    let ofs = lump(&bytes, 3).offset as usize + FUNCTION_SIZE;
    assert_eq!(read_i32(&bytes, ofs + 24), 2);
    assert_eq!(&bytes[ofs + 28..ofs + 36], &[3, 1, 0, 0, 0, 0, 0, 0]);
}

/// Variadic functions store -1 - fixed in the count field
#[test]
fn test_contract_variadic_count() {
    let mut b = ImageBuilder::new();
    let f = b.builtin("dprint", 25, &[1]);
    let mut program = b.build().unwrap();
    program.functions[f.index].variadic = true;
    let bytes = program.to_bytes();
    let ofs = lump(&bytes, 3).offset as usize + FUNCTION_SIZE * f.index;
    assert_eq!(read_i32(&bytes, ofs + 24), -2);

    let loaded = Program::load(&bytes, &Default::default()).unwrap();
    assert!(loaded.functions[f.index].variadic);
    assert_eq!(loaded.functions[f.index].num_parms(), 1);
}
