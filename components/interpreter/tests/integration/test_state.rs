//! STATE scheduling

use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
use core_types::{EType, ProgsError};
use interpreter::{Vm, VmConfig};

struct Monster {
    b: ImageBuilder,
    nextthink: i32,
    frame: i32,
    think: i32,
}

fn monster(with_time: bool) -> Monster {
    let mut b = ImageBuilder::new();
    b.global("self", EType::Entity);
    if with_time {
        b.global("time", EType::Float);
    }
    let nextthink = b.field("nextthink", EType::Float);
    let frame = b.field("frame", EType::Float);
    let think = b.field("think", EType::Function);
    let walk = b.begin_function("walk", &[]);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    let frame_no = b.float_const(7.0);
    b.begin_function("stand", &[]);
    b.emit(Opcode::State, frame_no, walk.global, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    Monster {
        b,
        nextthink: nextthink.ofs as i32,
        frame: frame.ofs as i32,
        think: think.ofs as i32,
    }
}

fn load(b: &ImageBuilder, config: VmConfig) -> Vm {
    let program = Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap();
    Vm::new(program, config, ())
}

#[test]
fn test_state_sets_frame_think_and_nextthink() {
    let m = monster(true);
    let mut vm = load(&m.b, VmConfig::default().with_state_interval(0.5));
    let ent = vm.entities_mut().spawn().unwrap();
    vm.set_global_i32("self", ent).unwrap();
    vm.set_global_f32("time", 10.0).unwrap();
    vm.call_by_name("stand", &[]).unwrap();

    let walk = vm.program().find_function("walk").unwrap() as u32;
    assert_eq!(vm.entities().get_f32(ent, m.nextthink).unwrap(), 10.5);
    assert_eq!(vm.entities().get_f32(ent, m.frame).unwrap(), 7.0);
    assert_eq!(vm.entities().get_u32(ent, m.think).unwrap(), walk);
}

#[test]
fn test_state_without_time_global() {
    let m = monster(false);
    let mut vm = load(&m.b, VmConfig::default());
    let err = vm.call_by_name("stand", &[]).unwrap_err();
    assert_eq!(err.error, ProgsError::UnboundState("time"));
}

#[test]
fn test_state_on_bad_self_writes_nothing() {
    let m = monster(true);
    let mut vm = load(&m.b, VmConfig::default());
    vm.set_global_i32("self", 9).unwrap();
    let err = vm.call_by_name("stand", &[]).unwrap_err();
    assert_eq!(err.error, ProgsError::BadEntity(9));
    assert!(vm.entities().record(0).unwrap().iter().all(|s| *s == 0));
}
