//! Program image builder
//!
//! Assembles statements, definitions and functions in memory and produces a
//! [`Program`] or a binary image. Used by tests and tools to create programs
//! without a compiler; the output goes through the same loader as any
//! compiled `progs.dat`.
//!
//! # Example
//!
//! ```
//! use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
//!
//! let mut b = ImageBuilder::new();
//! let two = b.float_const(2.0);
//! let three = b.float_const(3.0);
//! let main = b.begin_function("main", &[]);
//! let sum = b.local(1);
//! b.emit(Opcode::AddF, two, three, sum);
//! b.emit(Opcode::Return, sum, 0, 0);
//! b.end_function();
//!
//! let program = Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap();
//! assert_eq!(program.find_function("main"), Some(main.index));
//! ```

use std::collections::HashMap;

use core_types::layout::{DEF_SAVEGLOBAL, RESERVED_OFS};
use core_types::{EType, ProgsResult, Vec3};

use crate::defs::{Def, Function};
use crate::instruction::Statement;
use crate::opcode::Opcode;
use crate::program::Program;

/// A function added to the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSymbol {
    /// Function number
    pub index: usize,
    /// Global holding the function number, usable as a CALL operand
    pub global: u16,
}

/// A field added to the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSymbol {
    /// Slot within the entity record
    pub ofs: u16,
    /// Global holding the field offset, usable as a LOAD/ADDRESS operand
    pub global: u16,
}

/// Incremental program assembler
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    crc: i32,
    statements: Vec<Statement>,
    globaldefs: Vec<Def>,
    fielddefs: Vec<Def>,
    functions: Vec<Function>,
    strings: Vec<u8>,
    string_index: HashMap<String, i32>,
    globals: Vec<u32>,
    entity_fields: usize,
    current: Option<usize>,
}

impl ImageBuilder {
    /// Create a builder holding the reserved global region, an empty string
    /// at offset 0, the null function and a terminating statement 0
    pub fn new() -> Self {
        let mut functions = Vec::new();
        functions.push(Function {
            first_statement: 0,
            parm_start: 0,
            locals: 0,
            profile: 0,
            name: 0,
            file: 0,
            parm_size: Default::default(),
            variadic: false,
        });
        Self {
            crc: 0,
            statements: vec![Statement::new(Opcode::Done, 0, 0, 0)],
            globaldefs: Vec::new(),
            fielddefs: Vec::new(),
            functions,
            strings: vec![0],
            string_index: HashMap::from([(String::new(), 0)]),
            globals: vec![0; RESERVED_OFS],
            entity_fields: 0,
            current: None,
        }
    }

    /// Header checksum to write
    pub fn set_crc(&mut self, crc: u16) -> &mut Self {
        self.crc = crc as i32;
        self
    }

    /// Add a string to the string table and return its offset
    pub fn string(&mut self, text: &str) -> i32 {
        if let Some(ofs) = self.string_index.get(text) {
            return *ofs;
        }
        let ofs = self.strings.len() as i32;
        self.strings.extend_from_slice(text.as_bytes());
        self.strings.push(0);
        self.string_index.insert(text.to_string(), ofs);
        ofs
    }

    fn alloc(&mut self, width: usize) -> u16 {
        let ofs = self.globals.len() as u16;
        self.globals.extend(std::iter::repeat(0).take(width));
        if let Some(current) = self.current {
            let func = &mut self.functions[current];
            func.locals = self.globals.len() as i32 - func.parm_start;
        }
        ofs
    }

    fn add_def(&mut self, name: &str, ty: EType, ofs: u16, saved: bool) {
        let name = self.string(name);
        let mut type_tag = ty as u16;
        if saved {
            type_tag |= DEF_SAVEGLOBAL;
        }
        self.globaldefs.push(Def { type_tag, ofs, name });
    }

    /// Declare a named global
    pub fn global(&mut self, name: &str, ty: EType) -> u16 {
        let ofs = self.alloc(ty.width());
        self.add_def(name, ty, ofs, false);
        ofs
    }

    /// Declare a named global that is written to save games
    pub fn saved_global(&mut self, name: &str, ty: EType) -> u16 {
        let ofs = self.alloc(ty.width());
        self.add_def(name, ty, ofs, true);
        ofs
    }

    /// Set the initial raw value of a slot
    pub fn set_global(&mut self, ofs: u16, bits: u32) -> &mut Self {
        if let Some(slot) = self.globals.get_mut(ofs as usize) {
            *slot = bits;
        }
        self
    }

    /// Unnamed global holding a float constant
    pub fn float_const(&mut self, value: f32) -> u16 {
        let ofs = self.alloc(1);
        self.globals[ofs as usize] = value.to_bits();
        ofs
    }

    /// Unnamed global holding a vector constant
    pub fn vector_const(&mut self, value: Vec3) -> u16 {
        let ofs = self.alloc(3);
        let start = ofs as usize;
        self.globals[start..start + 3].copy_from_slice(&value.to_bits());
        ofs
    }

    /// Unnamed global holding a string constant
    pub fn string_const(&mut self, text: &str) -> u16 {
        let s = self.string(text);
        let ofs = self.alloc(1);
        self.globals[ofs as usize] = s as u32;
        ofs
    }

    /// Unnamed global holding a raw integer (entity number, function number)
    pub fn int_const(&mut self, value: i32) -> u16 {
        let ofs = self.alloc(1);
        self.globals[ofs as usize] = value as u32;
        ofs
    }

    /// Declare an entity field and the global that names it
    pub fn field(&mut self, name: &str, ty: EType) -> FieldSymbol {
        let field_ofs = self.entity_fields as u16;
        self.entity_fields += ty.width();
        let name_ofs = self.string(name);
        self.fielddefs.push(Def {
            type_tag: ty as u16,
            ofs: field_ofs,
            name: name_ofs,
        });
        let global = self.alloc(1);
        self.globals[global as usize] = field_ofs as u32;
        self.add_def(name, EType::Field, global, false);
        FieldSymbol {
            ofs: field_ofs,
            global,
        }
    }

    /// Start a bytecode function; parameters occupy the start of its window
    pub fn begin_function(&mut self, name: &str, parm_size: &[u8]) -> FunctionSymbol {
        self.end_function();
        let index = self.functions.len();
        let name_ofs = self.string(name);
        let file = self.string("builder.qc");

        let global = self.alloc(1);
        self.globals[global as usize] = index as u32;
        self.add_def(name, EType::Function, global, false);

        let parm_start = self.globals.len() as i32;
        self.functions.push(Function {
            first_statement: self.statements.len() as i32,
            parm_start,
            locals: 0,
            profile: 0,
            name: name_ofs,
            file,
            parm_size: parm_size.iter().copied().collect(),
            variadic: false,
        });
        self.current = Some(index);
        let parm_slots: usize = parm_size.iter().map(|w| *w as usize).sum();
        self.alloc(parm_slots);
        FunctionSymbol { index, global }
    }

    /// Offset of parameter `n` of a function inside its local window
    pub fn parm(&self, func: FunctionSymbol, n: usize) -> u16 {
        let f = &self.functions[func.index];
        let before: usize = f.parm_size.iter().take(n).map(|w| *w as usize).sum();
        (f.parm_start as usize + before) as u16
    }

    /// Allocate a local in the current function (a plain global outside one)
    pub fn local(&mut self, width: usize) -> u16 {
        self.alloc(width)
    }

    /// Close the current function
    pub fn end_function(&mut self) {
        self.current = None;
    }

    /// Declare a builtin with the given number
    pub fn builtin(&mut self, name: &str, number: usize, parm_size: &[u8]) -> FunctionSymbol {
        self.end_function();
        let index = self.functions.len();
        let name_ofs = self.string(name);
        let global = self.alloc(1);
        self.globals[global as usize] = index as u32;
        self.add_def(name, EType::Function, global, false);
        self.functions.push(Function {
            first_statement: -(number as i32),
            parm_start: 0,
            locals: 0,
            profile: 0,
            name: name_ofs,
            file: 0,
            parm_size: parm_size.iter().copied().collect(),
            variadic: false,
        });
        FunctionSymbol { index, global }
    }

    /// Append a statement with global-offset operands and return its index
    pub fn emit(&mut self, op: Opcode, a: u16, b: u16, c: u16) -> usize {
        self.emit_raw(op.number(), a as i16, b as i16, c as i16)
    }

    /// Append a statement with raw operand values
    pub fn emit_raw(&mut self, op: u16, a: i16, b: i16, c: i16) -> usize {
        let index = self.statements.len();
        self.statements.push(Statement { op, a, b, c });
        index
    }

    /// Append `IF`/`IFNOT` testing `cond`, with a relative delta
    pub fn emit_branch(&mut self, op: Opcode, cond: u16, delta: i16) -> usize {
        self.emit_raw(op.number(), cond as i16, delta, 0)
    }

    /// Append `GOTO` with a relative delta
    pub fn emit_goto(&mut self, delta: i16) -> usize {
        self.emit_raw(Opcode::Goto.number(), delta, 0, 0)
    }

    /// Index the next emitted statement will get
    pub fn here(&self) -> usize {
        self.statements.len()
    }

    /// Point the branch at `at` to `target`
    pub fn patch_branch(&mut self, at: usize, target: usize) {
        let delta = (target as i64 - at as i64) as i16;
        if let Some(st) = self.statements.get_mut(at) {
            if st.op == Opcode::Goto.number() {
                st.a = delta;
            } else {
                st.b = delta;
            }
        }
    }

    /// Finish into an in-memory program, checked the way the loader checks
    /// an image
    ///
    /// # Errors
    ///
    /// The `ProgsError` that [`Program::load`] would report for the same tables.
    pub fn build(&self) -> ProgsResult<Program> {
        let program = self.assemble();
        program.validate()?;
        Ok(program)
    }

    /// Unchecked tables, so broken images can still be written out
    fn assemble(&self) -> Program {
        Program::from_tables(
            self.crc,
            self.statements.clone(),
            self.globaldefs.clone(),
            self.fielddefs.clone(),
            self.functions.clone(),
            self.strings.clone(),
            self.globals.clone(),
            self.entity_fields,
        )
    }

    /// Finish into a binary image
    pub fn to_bytes(&self) -> Vec<u8> {
        self.assemble().to_bytes()
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
