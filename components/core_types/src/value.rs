//! Host-boundary value representation.
//!
//! Inside the VM a slot is just 32 raw bits whose meaning comes from the
//! declaration that names it. [`Value`] exists only where the host hands
//! arguments in or reads results out, so it can say which bits it means.

use std::fmt;

use crate::Vec3;

/// A typed value crossing the host/VM boundary.
///
/// # Examples
///
/// ```
/// use core_types::{Value, Vec3};
///
/// let arg = Value::Vector(Vec3::new(1.0, 2.0, 3.0));
/// assert_eq!(arg.width(), 3);
/// assert_eq!(Value::Float(4.0).to_slots()[0], 4.0f32.to_bits());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Float argument or result
    Float(f32),
    /// Vector argument or result
    Vector(Vec3),
    /// String reference (static offset or temporary handle)
    String(i32),
    /// Entity number
    Entity(i32),
    /// Function number
    Function(i32),
    /// Raw integer slot (field offsets, pointers, integer types)
    Int(i32),
}

impl Value {
    /// Number of slots the value occupies
    pub fn width(&self) -> usize {
        match self {
            Value::Vector(_) => 3,
            _ => 1,
        }
    }

    /// Raw slot bits; slots past [`Value::width`] are zero
    pub fn to_slots(&self) -> [u32; 3] {
        match *self {
            Value::Float(f) => [f.to_bits(), 0, 0],
            Value::Vector(v) => v.to_bits(),
            Value::String(i) | Value::Entity(i) | Value::Function(i) | Value::Int(i) => {
                [i as u32, 0, 0]
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Vector(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "string#{}", s),
            Value::Entity(e) => write!(f, "entity {}", e),
            Value::Function(n) => write!(f, "function#{}", n),
            Value::Int(i) => write!(f, "{}", i),
        }
    }
}

/// The three slots of the return area, read back as whatever type the
/// caller knows the function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReturnValue(pub [u32; 3]);

impl ReturnValue {
    /// First slot as a float
    pub fn as_f32(&self) -> f32 {
        f32::from_bits(self.0[0])
    }

    /// All three slots as a vector
    pub fn as_vector(&self) -> Vec3 {
        Vec3::from_bits(self.0)
    }

    /// First slot as an integer (entity, function, string reference)
    pub fn as_i32(&self) -> i32 {
        self.0[0] as i32
    }
}
