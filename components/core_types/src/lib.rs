//! Core progs types and error handling.
//!
//! This crate provides the foundational types shared by every component of
//! the progs virtual machine.
//!
//! # Overview
//!
//! - [`ProgsError`] - Error taxonomy for loading and execution
//! - [`RuntimeError`] - A fatal execution error with its call stack
//! - [`EType`] - Declared type of a global or field
//! - [`Vec3`] - Vector slot layout
//! - [`Value`] - Typed value at the host boundary
//! - [`layout`] - Fixed offsets of the return and parameter areas
//!
//! # Examples
//!
//! ```
//! use core_types::{layout, ProgsError, Value, Vec3};
//!
//! let arg = Value::Vector(Vec3::new(0.0, 0.0, 1.0));
//! assert_eq!(arg.width(), 3);
//! assert_eq!(layout::OFS_RETURN, 1);
//!
//! let err = ProgsError::UnknownOpcode(200);
//! assert_eq!(err.to_string(), "unknown opcode 200");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
pub mod layout;
mod source;
mod types;
mod value;

pub use error::{ProgsError, ProgsResult, RuntimeError};
pub use source::StackFrame;
pub use types::{EType, Vec3};
pub use value::{ReturnValue, Value};
