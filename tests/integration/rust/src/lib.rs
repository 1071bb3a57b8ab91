//! Integration test suite for the progs VM
//!
//! This crate provides integration tests that verify components work
//! together across component boundaries: images built and serialized by
//! `bytecode_system`, loaded and executed by `interpreter`, with the
//! standard `builtins` and the `progs_cli` runtime on top.

use builtins::BufferedConsole;
use bytecode_system::{FieldSymbol, FunctionSymbol, ImageBuilder, LoadOptions, Opcode, Program};
use core_types::layout::{ofs_parm, OFS_RETURN};
use core_types::{EType, ProgsResult};
use interpreter::{Vm, VmConfig};

/// Re-export components for test convenience
pub mod components {
    pub use builtins;
    pub use bytecode_system;
    pub use core_types;
    pub use interpreter;
    pub use memory_manager;
    pub use progs_cli;
}

/// Symbols of the world program
#[derive(Debug, Clone, Copy)]
pub struct World {
    /// `spawn_monsters(n)`: spawn `n` entities with health 100 and a think function
    pub spawn_monsters: FunctionSymbol,
    /// `count_live()`: walk the entity list with `nextent`
    pub count_live: FunctionSymbol,
    /// `monster_think()`: advance `self` one animation frame with STATE
    pub monster_think: FunctionSymbol,
    /// `report(f)`: `dprint(strcat("count ", ftos(f), "\n"))`
    pub report: FunctionSymbol,
    /// `fail()`: `error("bad monster")`
    pub fail: FunctionSymbol,
    /// The `remove` builtin
    pub remove: FunctionSymbol,
    /// `.float health`
    pub health: FieldSymbol,
    /// `.float nextthink`
    pub nextthink: FieldSymbol,
    /// `.float frame`
    pub frame: FieldSymbol,
    /// `.void() think`
    pub think: FieldSymbol,
    /// `.string netname`
    pub netname: FieldSymbol,
}

/// Assemble the world program
pub fn world() -> (ImageBuilder, World) {
    let mut b = ImageBuilder::new();
    b.global("self", EType::Entity);
    b.global("time", EType::Float);
    b.saved_global("kills", EType::Float);
    b.saved_global("mapname", EType::String);
    b.saved_global("next_map", EType::Function);

    let health = b.field("health", EType::Float);
    let nextthink = b.field("nextthink", EType::Float);
    let frame = b.field("frame", EType::Float);
    let think = b.field("think", EType::Function);
    let netname = b.field("netname", EType::String);
    b.field("origin", EType::Vector);

    let error = b.builtin("error", 10, &[1]);
    let spawn = b.builtin("spawn", 14, &[]);
    let remove = b.builtin("remove", 15, &[1]);
    let dprint = b.builtin("dprint", 25, &[1]);
    let ftos = b.builtin("ftos", 26, &[1]);
    let nextent = b.builtin("nextent", 47, &[1]);
    let strcat = b.builtin("strcat", 115, &[1, 1]);

    let zero = b.float_const(0.0);
    let one = b.float_const(1.0);
    let hundred = b.float_const(100.0);
    let third_frame = b.float_const(3.0);
    let world_ent = b.int_const(0);
    let label = b.string_const("count ");
    let newline = b.string_const("\n");
    let bad = b.string_const("bad monster");
    let grunt = b.string_const("grunt");

    let monster_think = b.begin_function("monster_think", &[]);
    b.emit(Opcode::State, third_frame, monster_think.global, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let spawn_monsters = b.begin_function("spawn_monsters", &[1]);
    let n = b.parm(spawn_monsters, 0);
    let i = b.local(1);
    let t = b.local(1);
    let e = b.local(1);
    let p = b.local(1);
    b.emit(Opcode::StoreF, zero, i, 0);
    let top = b.emit(Opcode::Lt, i, n, t);
    let exit = b.emit_branch(Opcode::IfNot, t, 0);
    b.emit(Opcode::Call0, spawn.global, 0, 0);
    b.emit(Opcode::StoreEnt, OFS_RETURN as u16, e, 0);
    b.emit(Opcode::Address, e, health.global, p);
    b.emit(Opcode::StorePF, hundred, p, 0);
    b.emit(Opcode::Address, e, think.global, p);
    b.emit(Opcode::StorePFnc, monster_think.global, p, 0);
    b.emit(Opcode::Address, e, netname.global, p);
    b.emit(Opcode::StorePS, grunt, p, 0);
    b.emit(Opcode::AddF, i, one, i);
    let back = b.emit_goto(0);
    b.patch_branch(back, top);
    let done = b.emit(Opcode::Return, i, 0, 0);
    b.patch_branch(exit, done);
    b.end_function();

    let count_live = b.begin_function("count_live", &[]);
    let n = b.local(1);
    let e = b.local(1);
    b.emit(Opcode::StoreF, zero, n, 0);
    b.emit(Opcode::StoreEnt, world_ent, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, nextent.global, 0, 0);
    b.emit(Opcode::StoreEnt, OFS_RETURN as u16, e, 0);
    let top = b.emit_branch(Opcode::IfNot, e, 0);
    b.emit(Opcode::AddF, n, one, n);
    b.emit(Opcode::StoreEnt, e, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, nextent.global, 0, 0);
    b.emit(Opcode::StoreEnt, OFS_RETURN as u16, e, 0);
    let back = b.emit_goto(0);
    b.patch_branch(back, top);
    let done = b.emit(Opcode::Return, n, 0, 0);
    b.patch_branch(top, done);
    b.end_function();

    let report = b.begin_function("report", &[1]);
    let f = b.parm(report, 0);
    let text = b.local(1);
    b.emit(Opcode::StoreF, f, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, ftos.global, 0, 0);
    b.emit(Opcode::StoreS, OFS_RETURN as u16, text, 0);
    b.emit(Opcode::StoreS, label, ofs_parm(0) as u16, 0);
    b.emit(Opcode::StoreS, text, ofs_parm(1) as u16, 0);
    b.emit(Opcode::StoreS, newline, ofs_parm(2) as u16, 0);
    b.emit(Opcode::Call3, strcat.global, 0, 0);
    b.emit(Opcode::StoreS, OFS_RETURN as u16, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, dprint.global, 0, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let fail = b.begin_function("fail", &[]);
    b.emit(Opcode::StoreS, bad, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, error.global, 0, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let symbols = World {
        spawn_monsters,
        count_live,
        monster_think,
        report,
        fail,
        remove,
        health,
        nextthink,
        frame,
        think,
        netname,
    };
    (b, symbols)
}

/// Load an image through the binary loader into a VM with the standard
/// builtins and a capturing console
pub fn load_world(bytes: &[u8], config: VmConfig) -> ProgsResult<Vm<BufferedConsole>> {
    let program = Program::load(bytes, &LoadOptions::default())?;
    let mut vm = Vm::new(program, config, BufferedConsole::new());
    builtins::install(&mut vm);
    Ok(vm)
}

/// Run every due think function once, the way a server frame does
///
/// Returns the number of think functions called.
pub fn run_thinks<H>(vm: &mut Vm<H>, world: &World, time: f32) -> Result<usize, core_types::RuntimeError> {
    vm.set_global_f32("time", time)?;
    let mut ran = 0;
    let mut ent = 0;
    while let Some(next) = vm.entities().next_live(ent) {
        ent = next;
        let due = vm.entities().get_f32(ent, world.nextthink.ofs as i32)?;
        let think = vm.entities().get_u32(ent, world.think.ofs as i32)?;
        if think == 0 || due > time {
            continue;
        }
        vm.set_global_i32("self", ent)?;
        vm.call(think as usize, &[])?;
        ran += 1;
    }
    Ok(ran)
}
