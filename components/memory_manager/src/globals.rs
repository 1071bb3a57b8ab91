//! Flat global data segment
//!
//! One contiguous buffer of 32-bit slots addressed by integer offset. Slot
//! meaning comes from the program's declarations; the segment only stores
//! raw bits and checks bounds.

use core_types::{ProgsError, ProgsResult, Vec3};

/// The global data segment of one execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSegment {
    slots: Vec<u32>,
}

impl GlobalSegment {
    /// Create a segment holding the program's initial global data
    pub fn new(initial: Vec<u32>) -> Self {
        Self { slots: initial }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the segment has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots
    pub fn as_slice(&self) -> &[u32] {
        &self.slots
    }

    #[inline]
    fn range(&self, ofs: usize, width: usize) -> ProgsResult<std::ops::Range<usize>> {
        match ofs.checked_add(width) {
            Some(end) if end <= self.slots.len() => Ok(ofs..end),
            _ => Err(ProgsError::GlobalOutOfRange {
                offset: ofs,
                len: self.slots.len(),
            }),
        }
    }

    /// Slots `[ofs, ofs + width)`
    pub fn slice(&self, ofs: usize, width: usize) -> ProgsResult<&[u32]> {
        let range = self.range(ofs, width)?;
        Ok(&self.slots[range])
    }

    /// Mutable slots `[ofs, ofs + width)`
    pub fn slice_mut(&mut self, ofs: usize, width: usize) -> ProgsResult<&mut [u32]> {
        let range = self.range(ofs, width)?;
        Ok(&mut self.slots[range])
    }

    /// Raw slot value
    #[inline]
    pub fn get_u32(&self, ofs: usize) -> ProgsResult<u32> {
        self.slots
            .get(ofs)
            .copied()
            .ok_or(ProgsError::GlobalOutOfRange {
                offset: ofs,
                len: self.slots.len(),
            })
    }

    /// Write a raw slot value
    #[inline]
    pub fn set_u32(&mut self, ofs: usize, value: u32) -> ProgsResult<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(ofs)
            .ok_or(ProgsError::GlobalOutOfRange { offset: ofs, len })?;
        *slot = value;
        Ok(())
    }

    /// Slot as an integer (string, entity, field, function or pointer reference)
    #[inline]
    pub fn get_i32(&self, ofs: usize) -> ProgsResult<i32> {
        self.get_u32(ofs).map(|v| v as i32)
    }

    /// Write an integer reference
    #[inline]
    pub fn set_i32(&mut self, ofs: usize, value: i32) -> ProgsResult<()> {
        self.set_u32(ofs, value as u32)
    }

    /// Slot as a float
    #[inline]
    pub fn get_f32(&self, ofs: usize) -> ProgsResult<f32> {
        self.get_u32(ofs).map(f32::from_bits)
    }

    /// Write a float
    #[inline]
    pub fn set_f32(&mut self, ofs: usize, value: f32) -> ProgsResult<()> {
        self.set_u32(ofs, value.to_bits())
    }

    /// Three consecutive slots as a vector
    pub fn get_vector(&self, ofs: usize) -> ProgsResult<Vec3> {
        let s = self.slice(ofs, 3)?;
        Ok(Vec3::from_bits([s[0], s[1], s[2]]))
    }

    /// Write a vector
    pub fn set_vector(&mut self, ofs: usize, value: Vec3) -> ProgsResult<()> {
        self.slice_mut(ofs, 3)?.copy_from_slice(&value.to_bits());
        Ok(())
    }

    /// Copy `width` slots from `src` to `dst`; the ranges may overlap
    pub fn copy(&mut self, src: usize, dst: usize, width: usize) -> ProgsResult<()> {
        let from = self.range(src, width)?;
        self.range(dst, width)?;
        self.slots.copy_within(from, dst);
        Ok(())
    }

    /// Read up to three slots, zero-filling whatever lies past the end
    ///
    /// Used for `RETURN`, which always copies a vector's worth of slots even
    /// when the operand is a scalar declared last in the segment.
    pub fn read_padded(&self, ofs: usize) -> ProgsResult<[u32; 3]> {
        let first = self.get_u32(ofs)?;
        let mut out = [first, 0, 0];
        for (i, slot) in out.iter_mut().enumerate().skip(1) {
            *slot = self.slots.get(ofs + i).copied().unwrap_or(0);
        }
        Ok(out)
    }
}
