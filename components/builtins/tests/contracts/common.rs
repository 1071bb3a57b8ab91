//! Program scaffolding shared by the builtin tests

use builtins::{install_classic, BufferedConsole};
use bytecode_system::{FunctionSymbol, ImageBuilder, LoadOptions, Opcode, Program};
use core_types::layout::ofs_parm;
use core_types::EType;
use interpreter::{Vm, VmConfig};

/// An argument staged before the call
#[derive(Debug, Clone, Copy)]
pub enum Arg {
    /// One-slot value (float, string, entity)
    Scalar(u16),
    /// Three-slot value
    Vector(u16),
}

/// A builder that declares every standard builtin under its classic number
pub struct Fixture {
    pub b: ImageBuilder,
}

impl Fixture {
    pub fn new() -> Self {
        let mut b = ImageBuilder::new();
        b.global("self", EType::Entity);
        for (name, number, _) in builtins::standard::<BufferedConsole>() {
            b.builtin(name, number, &[1, 1, 1]);
        }
        Self { b }
    }

    /// Global holding the function number of a declared builtin
    pub fn builtin(&self, name: &str) -> u16 {
        self.b.build().unwrap().find_global(name).map(|d| d.ofs).unwrap_or(0)
    }

    /// `main` stages `args` and calls `name` with them, returning its result
    pub fn call_main(&mut self, name: &str, args: &[Arg]) -> FunctionSymbol {
        let target = self.builtin(name);
        let main = self.b.begin_function("main", &[]);
        for (i, arg) in args.iter().enumerate() {
            let (op, ofs) = match *arg {
                Arg::Scalar(ofs) => (Opcode::StoreF, ofs),
                Arg::Vector(ofs) => (Opcode::StoreV, ofs),
            };
            self.b.emit(op, ofs, ofs_parm(i) as u16, 0);
        }
        let call = Opcode::call(args.len()).unwrap_or(Opcode::Call0);
        self.b.emit(call, target, 0, 0);
        self.b.emit(Opcode::Return, 1, 0, 0);
        self.b.end_function();
        main
    }

    pub fn vm(&self) -> Vm<BufferedConsole> {
        let program = Program::load(&self.b.to_bytes(), &LoadOptions::default()).unwrap();
        let mut vm = Vm::new(program, VmConfig::default(), BufferedConsole::new());
        install_classic(&mut vm);
        vm
    }
}
