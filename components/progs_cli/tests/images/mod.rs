//! Sample images shared by the CLI tests

use bytecode_system::{ImageBuilder, Opcode};
use core_types::layout::{ofs_parm, OFS_RETURN};
use core_types::EType;
use std::path::PathBuf;
use tempfile::TempDir;

/// A small program:
///
/// * `main()` returns 42
/// * `fact(n)` recursive factorial
/// * `greet(name)` returns `strcat("hello ", name)`
/// * `bump()` increments the saved global `score`, prints, returns it
/// * `crash()` calls the null function
pub fn sample() -> ImageBuilder {
    let mut b = ImageBuilder::new();
    b.global("self", EType::Entity);
    let score = b.saved_global("score", EType::Float);
    let dprint = b.builtin("dprint", 25, &[1]);
    let strcat = b.builtin("strcat", 115, &[1, 1]);
    b.builtin("makevectors", 1, &[3]);
    let one = b.float_const(1.0);
    let answer = b.float_const(42.0);
    let hello = b.string_const("hello ");
    let bumped = b.string_const("bumped\n");

    b.begin_function("main", &[]);
    b.emit(Opcode::Return, answer, 0, 0);
    b.end_function();

    let fact = b.begin_function("fact", &[1]);
    let n = b.parm(fact, 0);
    let t = b.local(1);
    let r = b.local(1);
    b.emit(Opcode::Le, n, one, t);
    b.emit_branch(Opcode::IfNot, t, 2);
    b.emit(Opcode::Return, one, 0, 0);
    b.emit(Opcode::SubF, n, one, ofs_parm(0) as u16);
    b.emit(Opcode::Call1, fact.global, 0, 0);
    b.emit(Opcode::MulF, n, OFS_RETURN as u16, r);
    b.emit(Opcode::Return, r, 0, 0);
    b.end_function();

    let greet = b.begin_function("greet", &[1]);
    let name = b.parm(greet, 0);
    b.emit(Opcode::StoreS, hello, ofs_parm(0) as u16, 0);
    b.emit(Opcode::StoreS, name, ofs_parm(1) as u16, 0);
    b.emit(Opcode::Call2, strcat.global, 0, 0);
    b.emit(Opcode::Return, OFS_RETURN as u16, 0, 0);
    b.end_function();

    b.begin_function("bump", &[]);
    b.emit(Opcode::AddF, score, one, score);
    b.emit(Opcode::StoreS, bumped, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, dprint.global, 0, 0);
    b.emit(Opcode::Return, score, 0, 0);
    b.end_function();

    b.begin_function("crash", &[]);
    b.emit(Opcode::Call0, 0, 0, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    b
}

/// Write an image into a fresh temporary directory
#[allow(dead_code)]
pub fn write_temp(b: &ImageBuilder) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("progs.dat");
    std::fs::write(&path, b.to_bytes()).unwrap();
    (dir, path)
}
