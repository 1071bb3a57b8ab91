//! dprint, error, objerror and the trace toggles

use core_types::{EType, ProgsError};

use crate::common::{Arg, Fixture};

#[test]
fn test_dprint_writes_to_console() {
    let mut fx = Fixture::new();
    let a = fx.b.string_const("health ");
    let b = fx.b.string_const("low\n");
    fx.call_main("dprint", &[Arg::Scalar(a), Arg::Scalar(b)]);
    let mut vm = fx.vm();
    vm.call_by_name("main", &[]).unwrap();
    assert_eq!(vm.host().contents(), "health low\n");
}

#[test]
fn test_error_aborts_with_message() {
    let mut fx = Fixture::new();
    let msg = fx.b.string_const("bad spawn");
    fx.call_main("error", &[Arg::Scalar(msg)]);
    let mut vm = fx.vm();
    let err = vm.call_by_name("main", &[]).unwrap_err();
    match &err.error {
        ProgsError::Builtin(text) => assert!(text.contains("bad spawn")),
        other => panic!("unexpected error {:?}", other),
    }
    let out = vm.host().contents();
    assert!(out.contains("SERVER ERROR in main"));
    assert!(out.contains("EDICT 0:"));
    assert_eq!(vm.depth(), 0);
}

#[test]
fn test_objerror_removes_self() {
    let mut fx = Fixture::new();
    fx.b.field("health", EType::Float);
    let msg = fx.b.string_const("stuck");
    fx.call_main("objerror", &[Arg::Scalar(msg)]);
    let mut vm = fx.vm();
    let ent = vm.entities_mut().spawn().unwrap();
    vm.set_global_i32("self", ent).unwrap();
    let err = vm.call_by_name("main", &[]).unwrap_err();
    assert!(matches!(err.error, ProgsError::Builtin(_)));
    assert!(vm.host().contents().contains("OBJECT ERROR"));
    assert!(vm.entities().is_free(ent));
}

#[test]
fn test_trace_toggles() {
    let mut fx = Fixture::new();
    fx.call_main("traceon", &[]);
    let mut vm = fx.vm();
    vm.call_by_name("main", &[]).unwrap();
    assert!(vm.is_tracing());

    let mut fx = Fixture::new();
    fx.call_main("traceoff", &[]);
    let mut vm = fx.vm();
    vm.set_trace(true);
    vm.call_by_name("main", &[]).unwrap();
    assert!(!vm.is_tracing());
}
