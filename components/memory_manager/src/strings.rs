//! String heap
//!
//! A string reference is an `i32` stored in a slot:
//!
//! - `>= 0` is a byte offset into the static table (the program's string blob
//!   plus anything interned later). Static strings live as long as the program.
//! - `< 0` is a temporary handle `-serial`. Temporaries live in a small ring;
//!   serial `n` occupies slot `(n - 1) % ring_size` and stays readable until a
//!   later allocation lands in the same slot.

use std::borrow::Cow;
use std::collections::HashMap;

use core_types::{ProgsError, ProgsResult};
use tracing::trace;

#[derive(Debug, Clone, Default)]
struct TempSlot {
    serial: i32,
    text: Vec<u8>,
}

/// Static string table plus the temporary ring
#[derive(Debug, Clone)]
pub struct StringHeap {
    statics: Vec<u8>,
    interned: HashMap<Vec<u8>, i32>,
    ring: Vec<TempSlot>,
    last_serial: i32,
}

impl StringHeap {
    /// Create a heap over a program's string blob
    ///
    /// # Arguments
    ///
    /// * `statics` - NUL-separated static strings
    /// * `ring_size` - number of temporary slots (at least one is kept)
    pub fn new(statics: Vec<u8>, ring_size: usize) -> Self {
        let mut statics = statics;
        if statics.is_empty() {
            statics.push(0);
        }
        Self {
            statics,
            interned: HashMap::new(),
            ring: vec![TempSlot::default(); ring_size.max(1)],
            last_serial: 0,
        }
    }

    /// Whether a reference names a temporary string
    #[inline]
    pub fn is_temp(handle: i32) -> bool {
        handle < 0
    }

    /// Number of temporary slots
    pub fn ring_size(&self) -> usize {
        self.ring.len()
    }

    /// Size of the static table in bytes
    pub fn static_len(&self) -> usize {
        self.statics.len()
    }

    fn ring_index(&self, serial: i32) -> usize {
        (serial as usize - 1) % self.ring.len()
    }

    /// Bytes of a string, without the terminator
    ///
    /// A temporary whose slot has since been reused reads as empty.
    ///
    /// # Errors
    ///
    /// `ProgsError::BadString` for a static offset outside the table.
    pub fn get(&self, handle: i32) -> ProgsResult<&[u8]> {
        if Self::is_temp(handle) {
            let serial = handle.checked_neg().unwrap_or(i32::MAX);
            let slot = &self.ring[self.ring_index(serial)];
            if slot.serial == serial {
                return Ok(&slot.text);
            }
            trace!(handle, "stale temporary string");
            return Ok(&[]);
        }
        let start = handle as usize;
        let tail = self
            .statics
            .get(start..)
            .filter(|t| !t.is_empty())
            .ok_or(ProgsError::BadString(handle))?;
        let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
        Ok(&tail[..end])
    }

    /// String contents decoded lossily
    pub fn get_lossy(&self, handle: i32) -> ProgsResult<Cow<'_, str>> {
        self.get(handle).map(String::from_utf8_lossy)
    }

    /// Store a temporary string and return its handle
    pub fn alloc_temp(&mut self, text: impl AsRef<[u8]>) -> i32 {
        self.last_serial = if self.last_serial == i32::MAX {
            1
        } else {
            self.last_serial + 1
        };
        let serial = self.last_serial;
        let index = self.ring_index(serial);
        let slot = &mut self.ring[index];
        slot.serial = serial;
        slot.text.clear();
        slot.text.extend_from_slice(text.as_ref());
        -serial
    }

    /// Add a string to the static table, reusing an earlier copy
    ///
    /// The result never expires, so hosts use this for text that must outlive
    /// the temporary ring (save-game strings, spawn data).
    pub fn intern(&mut self, text: &str) -> i32 {
        if text.is_empty() {
            return 0;
        }
        if let Some(ofs) = self.interned.get(text.as_bytes()) {
            return *ofs;
        }
        let ofs = self.statics.len() as i32;
        self.statics.extend_from_slice(text.as_bytes());
        self.statics.push(0);
        self.interned.insert(text.as_bytes().to_vec(), ofs);
        ofs
    }

    /// `EQ_S` semantics: content comparison when both sides are static,
    /// handle identity as soon as either side is temporary
    pub fn equal(&self, a: i32, b: i32) -> ProgsResult<bool> {
        if Self::is_temp(a) || Self::is_temp(b) {
            return Ok(a == b);
        }
        Ok(a == b || self.get(a)? == self.get(b)?)
    }

    /// `NOT_S` semantics: true for the null reference or empty text
    pub fn is_null(&self, handle: i32) -> ProgsResult<bool> {
        Ok(handle == 0 || self.get(handle)?.is_empty())
    }
}
