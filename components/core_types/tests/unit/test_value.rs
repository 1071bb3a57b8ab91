//! Unit tests for Value, ReturnValue, EType and Vec3

use core_types::{EType, ReturnValue, Value, Vec3};

#[test]
fn test_float_value_slots() {
    let slots = Value::Float(2.5).to_slots();
    assert_eq!(f32::from_bits(slots[0]), 2.5);
    assert_eq!(slots[1], 0);
}

#[test]
fn test_vector_width() {
    assert_eq!(Value::Vector(Vec3::ZERO).width(), 3);
    assert_eq!(Value::Entity(1).width(), 1);
}

#[test]
fn test_return_value_int_view() {
    let ret = ReturnValue([(-3i32) as u32, 0, 0]);
    assert_eq!(ret.as_i32(), -3);
}

#[test]
fn test_vec3_display_matches_vtos() {
    assert_eq!(Vec3::new(1.0, 2.0, 3.0).to_string(), "'  1.0   2.0   3.0'");
}

#[test]
fn test_etype_serde_names() {
    let json = serde_json::to_string(&EType::Vector).unwrap();
    assert_eq!(json, "\"vector\"");
    let back: EType = serde_json::from_str("\"entity\"").unwrap();
    assert_eq!(back, EType::Entity);
}

#[test]
fn test_vec3_negation() {
    assert_eq!(-Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 2.0, -0.5));
}
