//! Declared value types and the vector representation.
//!
//! The interpreter never tags slots at runtime. An [`EType`] only exists in
//! the global/field definition tables and tells tools and the save/restore
//! code how to read the raw bits at an offset.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Type tag of a global or field definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u16)]
pub enum EType {
    /// No value (also used for labels and unnamed temporaries)
    Void = 0,
    /// String reference
    String = 1,
    /// 32-bit float
    Float = 2,
    /// Three consecutive floats
    Vector = 3,
    /// Entity number
    Entity = 4,
    /// Field offset within an entity record
    Field = 5,
    /// Function number
    Function = 6,
    /// Address produced by ADDRESS
    Pointer = 7,
    /// 32-bit signed integer (later format revisions)
    Integer = 8,
    /// 32-bit unsigned integer (later format revisions)
    UInteger = 9,
    /// 64-bit signed integer (later format revisions)
    Int64 = 10,
    /// 64-bit unsigned integer (later format revisions)
    UInt64 = 11,
    /// 64-bit float (later format revisions)
    Double = 12,
}

impl EType {
    /// Decode a type tag with the persist flag already masked off
    pub fn from_tag(tag: u16) -> Option<Self> {
        let ty = match tag {
            0 => EType::Void,
            1 => EType::String,
            2 => EType::Float,
            3 => EType::Vector,
            4 => EType::Entity,
            5 => EType::Field,
            6 => EType::Function,
            7 => EType::Pointer,
            8 => EType::Integer,
            9 => EType::UInteger,
            10 => EType::Int64,
            11 => EType::UInt64,
            12 => EType::Double,
            _ => return None,
        };
        Some(ty)
    }

    /// Number of 32-bit slots a value of this type occupies
    pub fn width(self) -> usize {
        match self {
            EType::Vector => 3,
            EType::Int64 | EType::UInt64 | EType::Double => 2,
            _ => 1,
        }
    }

    /// Name as written in progs source
    pub fn name(self) -> &'static str {
        match self {
            EType::Void => "void",
            EType::String => "string",
            EType::Float => "float",
            EType::Vector => "vector",
            EType::Entity => "entity",
            EType::Field => "field",
            EType::Function => "function",
            EType::Pointer => "pointer",
            EType::Integer => "int",
            EType::UInteger => "uint",
            EType::Int64 => "int64",
            EType::UInt64 => "uint64",
            EType::Double => "double",
        }
    }
}

impl fmt::Display for EType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A three-component float vector, the layout of `ev_vector` slots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3(pub [f32; 3]);

impl Vec3 {
    /// The zero vector
    pub const ZERO: Vec3 = Vec3([0.0; 3]);

    /// Create a vector from its components
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3([x, y, z])
    }

    /// Dot product, the meaning of `MUL_V`
    pub fn dot(self, other: Vec3) -> f32 {
        self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2]
    }

    /// True when all components are zero
    pub fn is_zero(self) -> bool {
        self.0.iter().all(|c| *c == 0.0)
    }

    /// Raw slot bits, in memory order
    pub fn to_bits(self) -> [u32; 3] {
        [self.0[0].to_bits(), self.0[1].to_bits(), self.0[2].to_bits()]
    }

    /// Build from raw slot bits
    pub fn from_bits(bits: [u32; 3]) -> Self {
        Vec3([
            f32::from_bits(bits[0]),
            f32::from_bits(bits[1]),
            f32::from_bits(bits[2]),
        ])
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl fmt::Display for Vec3 {
    /// Formats the way `vtos` does: `'x y z'` with one decimal
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{:5.1} {:5.1} {:5.1}'", self.0[0], self.0[1], self.0[2])
    }
}
