//! Unit tests for StackFrame

use core_types::StackFrame;

#[test]
fn test_stack_frame_display() {
    let frame = StackFrame::new("SUB_UseTargets", "subs.qc", 88);
    assert_eq!(frame.to_string(), "subs.qc : SUB_UseTargets (statement 88)");
}

#[test]
fn test_stack_frame_equality() {
    let a = StackFrame::new("main", "a.qc", 1);
    let b = StackFrame::new("main", "a.qc", 1);
    let c = StackFrame::new("main", "a.qc", 2);
    assert_eq!(a, b);
    assert_ne!(a, c);
}
