//! Builtins seen from running programs

use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
use core_types::layout::ofs_parm;
use core_types::{EType, ProgsError, ProgsResult, Vec3};
use interpreter::{Vm, VmConfig};

/// Host state recording every call the builtin saw
#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<(usize, f32, Vec3)>,
}

fn record(vm: &mut Vm<Recorder>) -> ProgsResult<()> {
    let entry = (vm.argc(), vm.parm_f32(0)?, vm.parm_vector(1)?);
    vm.host_mut().calls.push(entry);
    vm.return_f32(1.0)
}

fn load<H>(b: &ImageBuilder, host: H) -> Vm<H> {
    let program = Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap();
    Vm::new(program, VmConfig::default(), host)
}

#[test]
fn test_builtin_called_once_per_call_with_staged_parameters() {
    let mut b = ImageBuilder::new();
    let native = b.builtin("record", 12, &[1, 3]);
    let x = b.float_const(3.0);
    let v = b.vector_const(Vec3::new(1.0, 2.0, 3.0));
    b.begin_function("main", &[]);
    b.emit(Opcode::StoreF, x, ofs_parm(0) as u16, 0);
    b.emit(Opcode::StoreV, v, ofs_parm(1) as u16, 0);
    b.emit(Opcode::Call2, native.global, 0, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let mut vm = load(&b, Recorder::default());
    vm.register_builtin_by_name("record", record).unwrap();
    vm.call_by_name("main", &[]).unwrap();
    assert_eq!(vm.host().calls, vec![(2, 3.0, Vec3::new(1.0, 2.0, 3.0))]);
}

fn concat(vm: &mut Vm) -> ProgsResult<()> {
    let mut text = String::new();
    for i in 0..vm.argc() {
        text.push_str(&vm.parm_string(i)?);
    }
    vm.return_temp_string(&text)?;
    Ok(())
}

#[test]
fn test_temporary_results_differ_by_identity() {
    let mut b = ImageBuilder::new();
    let cat = b.builtin("strcat", 115, &[1, 1]);
    let hello = b.string_const("hel");
    let lo = b.string_const("lo");
    let second = b.global("second", EType::String);
    b.begin_function("main", &[]);
    let first = b.local(1);
    let out = b.local(1);
    b.emit(Opcode::StoreS, hello, ofs_parm(0) as u16, 0);
    b.emit(Opcode::StoreS, lo, ofs_parm(1) as u16, 0);
    b.emit(Opcode::Call2, cat.global, 0, 0);
    b.emit(Opcode::StoreS, 1, first, 0);
    b.emit(Opcode::Call2, cat.global, 0, 0);
    b.emit(Opcode::StoreS, 1, second, 0);
    b.emit(Opcode::EqS, first, second, out);
    b.emit(Opcode::Return, out, 0, 0);
    b.end_function();

    let mut vm = load(&b, ());
    vm.register_builtin(115, "strcat", concat);
    assert_eq!(vm.call_by_name("main", &[]).unwrap().as_f32(), 0.0);
    let last = vm.global_i32("second").unwrap();
    assert!(last < 0);
    assert_eq!(vm.strings().get(last).unwrap(), b"hello");
}

fn call_back(vm: &mut Vm) -> ProgsResult<()> {
    let target = vm.parm_i32(0)?;
    vm.globals_mut().set_f32(ofs_parm(0), 10.0)?;
    vm.invoke(target as usize)?;
    let inner = vm.return_value().as_f32();
    vm.return_f32(inner + 1.0)
}

#[test]
fn test_builtin_reenters_interpreter() {
    let mut b = ImageBuilder::new();
    let result = b.global("result", EType::Float);
    let two = b.float_const(2.0);
    let double = b.begin_function("double", &[1]);
    let n = b.parm(double, 0);
    let r = b.local(1);
    b.emit(Opcode::MulF, n, two, r);
    b.emit(Opcode::Return, r, 0, 0);
    b.end_function();
    let apply = b.builtin("apply", 40, &[1]);
    b.begin_function("main", &[]);
    b.emit(Opcode::StoreFnc, double.global, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, apply.global, 0, 0);
    b.emit(Opcode::StoreF, 1, result, 0);
    b.emit(Opcode::Return, result, 0, 0);
    b.end_function();

    let mut vm = load(&b, ());
    vm.register_builtin(40, "apply", call_back);
    assert_eq!(vm.call_by_name("main", &[]).unwrap().as_f32(), 21.0);
    assert_eq!(vm.depth(), 0);
}

fn fail(_: &mut Vm) -> ProgsResult<()> {
    Err(ProgsError::builtin("no"))
}

#[test]
fn test_builtin_error_aborts_the_call() {
    let mut b = ImageBuilder::new();
    let native = b.builtin("fail", 2, &[]);
    let marker = b.global("marker", EType::Float);
    let one = b.float_const(1.0);
    b.begin_function("main", &[]);
    b.emit(Opcode::Call0, native.global, 0, 0);
    b.emit(Opcode::StoreF, one, marker, 0);
    b.end_function();

    let mut vm = load(&b, ());
    vm.register_builtin(2, "fail", fail);
    let err = vm.call_by_name("main", &[]).unwrap_err();
    assert_eq!(err.error, ProgsError::Builtin("no".to_string()));
    assert_eq!(err.function.as_deref(), Some("main"));
    assert_eq!(vm.global_f32("marker").unwrap(), 0.0);
}

fn reenter_failing(vm: &mut Vm) -> ProgsResult<()> {
    let target = vm.parm_i32(0)?;
    let before = vm.depth();
    let result = vm.invoke(target as usize);
    // the nested frames are gone, ours is still there
    assert_eq!(vm.depth(), before);
    assert!(matches!(result, Err(ProgsError::StackOverflow { .. })));
    vm.return_f32(-1.0)
}

#[test]
fn test_nested_failure_unwinds_only_nested_frames() {
    let mut b = ImageBuilder::new();
    let forever = b.begin_function("forever", &[]);
    b.emit(Opcode::Call0, forever.global, 0, 0);
    b.end_function();
    let guard = b.builtin("guard", 5, &[1]);
    b.begin_function("main", &[]);
    b.emit(Opcode::StoreFnc, forever.global, ofs_parm(0) as u16, 0);
    b.emit(Opcode::Call1, guard.global, 0, 0);
    b.emit(Opcode::Return, 1, 0, 0);
    b.end_function();

    let mut vm = Vm::new(
        Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap(),
        VmConfig::default().with_max_depth(6),
        (),
    );
    vm.register_builtin(5, "guard", reenter_failing);
    assert_eq!(vm.call_by_name("main", &[]).unwrap().as_f32(), -1.0);
}
