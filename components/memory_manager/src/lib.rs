//! Memory Manager - storage model of the progs VM
//!
//! This component provides:
//! - The flat global data segment addressed by slot offset
//! - The string heap: static table plus a ring of temporary strings
//! - Entity storage with fixed-stride field addressing
//!
//! Nothing here knows about opcodes; the interpreter layers instruction
//! semantics on top of these checked accessors.
//!
//! # Example
//!
//! ```
//! use memory_manager::{EntityStore, GlobalSegment, StringHeap};
//!
//! let mut globals = GlobalSegment::new(vec![0; 32]);
//! globals.set_f32(28, 2.0).unwrap();
//!
//! let mut strings = StringHeap::new(b"\0hi\0".to_vec(), 16);
//! let temp = strings.alloc_temp("made at runtime");
//! assert!(StringHeap::is_temp(temp));
//!
//! let mut entities = EntityStore::new(4, 64, 1);
//! let ent = entities.spawn().unwrap();
//! assert_eq!(entities.address(ent, 2, 1).unwrap(), 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entities;
pub mod globals;
pub mod strings;

// Re-export main types
pub use entities::EntityStore;
pub use globals::GlobalSegment;
pub use strings::StringHeap;
