//! Statement disassembly for traces, error reports and the CLI

use std::fmt::Write;

use crate::defs::FunctionKind;
use crate::instruction::Statement;
use crate::opcode::Opcode;
use crate::program::Program;

/// Render one operand: the global's name when it has one, otherwise its
/// offset and the float view of its initial contents
fn operand(program: &Program, ofs: usize) -> String {
    if let Some(def) = program.global_at(ofs as u16) {
        let name = program.string_lossy(def.name);
        if !name.is_empty() {
            return name.into_owned();
        }
    }
    match program.globals.get(ofs) {
        Some(bits) if *bits != 0 => format!("{}({})", ofs, f32::from_bits(*bits)),
        _ => ofs.to_string(),
    }
}

/// Format a single statement
///
/// Unknown opcodes are shown by number so corrupt programs can still be
/// listed.
pub fn format_statement(program: &Program, index: usize, st: &Statement) -> String {
    let mut out = format!("{:5} ", index);
    let op = match st.opcode() {
        Ok(op) => op,
        Err(_) => {
            let _ = write!(out, "?{} {} {} {}", st.op, st.a, st.b, st.c);
            return out;
        }
    };
    let _ = write!(out, "{:<10}", op.mnemonic());
    match op {
        Opcode::Goto => {
            let _ = write!(out, " -> {}", index as i64 + st.a as i64);
        }
        Opcode::If | Opcode::IfNot => {
            let _ = write!(
                out,
                " {} -> {}",
                operand(program, st.a_ofs()),
                index as i64 + st.b as i64
            );
        }
        Opcode::Done => {}
        _ => {
            for (ofs, used) in [(st.a_ofs(), true), (st.b_ofs(), st.b != 0), (st.c_ofs(), st.c != 0)] {
                if used {
                    let _ = write!(out, " {}", operand(program, ofs));
                }
            }
        }
    }
    out
}

/// Format a statement by index, `None` when out of range
pub fn disassemble_statement(program: &Program, index: usize) -> Option<String> {
    program
        .statements
        .get(index)
        .map(|st| format_statement(program, index, st))
}

/// List a function body, from its first statement up to and including the
/// first `DONE`
pub fn disassemble_function(program: &Program, fnum: usize) -> Option<String> {
    let func = program.functions.get(fnum)?;
    let mut out = format!(
        "{} ({}):\n",
        program.function_name(fnum),
        program.function_file(fnum)
    );
    match func.kind() {
        FunctionKind::Builtin(number) => {
            let _ = writeln!(out, "  builtin #{}", number);
        }
        FunctionKind::Bytecode(first) => {
            for (index, st) in program.statements.iter().enumerate().skip(first) {
                let _ = writeln!(out, "  {}", format_statement(program, index, st));
                if st.op == Opcode::Done.number() {
                    break;
                }
            }
        }
    }
    Some(out)
}
