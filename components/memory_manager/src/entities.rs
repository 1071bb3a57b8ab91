//! Entity storage and field addressing
//!
//! Entities are fixed-stride records of `entity_fields` slots laid out back
//! to back. A field offset means the same slot in every record, so the
//! address of a field is `entity * entity_fields + field`. Pointers produced
//! by `ADDRESS` are such slot addresses.

use core_types::{ProgsError, ProgsResult, Vec3};
use tracing::debug;

/// Storage for every entity of one execution context
#[derive(Debug, Clone)]
pub struct EntityStore {
    stride: usize,
    data: Vec<u32>,
    free: Vec<bool>,
    max_entities: usize,
    reserved: usize,
}

impl EntityStore {
    /// Create a store holding only the world entity
    ///
    /// # Arguments
    ///
    /// * `entity_fields` - slots per record, from the program header
    /// * `max_entities` - upper bound on records, world included
    /// * `reserved` - leading records `spawn` never hands out (at least the world)
    pub fn new(entity_fields: usize, max_entities: usize, reserved: usize) -> Self {
        Self {
            stride: entity_fields,
            data: vec![0; entity_fields],
            free: vec![false],
            max_entities: max_entities.max(1),
            reserved: reserved.max(1),
        }
    }

    /// Slots per record
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Records allocated so far, free ones included
    pub fn num_entities(&self) -> usize {
        self.free.len()
    }

    /// Records currently in use
    pub fn live_count(&self) -> usize {
        self.free.iter().filter(|f| !**f).count()
    }

    /// Configured maximum
    pub fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// Whether a record has been removed and not yet reused
    pub fn is_free(&self, ent: i32) -> bool {
        ent < 0 || self.free.get(ent as usize).copied().unwrap_or(true)
    }

    /// Allocate an entity, reusing a freed record when there is one
    ///
    /// # Errors
    ///
    /// `ProgsError::EntityLimit` when every record up to the maximum is live.
    pub fn spawn(&mut self) -> ProgsResult<i32> {
        let reused = self
            .free
            .iter()
            .enumerate()
            .skip(self.reserved)
            .find(|(_, free)| **free)
            .map(|(i, _)| i);
        let ent = match reused {
            Some(ent) => {
                self.zero(ent);
                self.free[ent] = false;
                ent
            }
            None => {
                // Records below the reserved prefix exist before any spawn.
                let ent = self.free.len().max(self.reserved);
                if ent >= self.max_entities {
                    return Err(ProgsError::EntityLimit(self.max_entities));
                }
                while self.free.len() <= ent {
                    self.free.push(false);
                    self.data.extend(std::iter::repeat(0).take(self.stride));
                }
                ent
            }
        };
        debug!(entity = ent, "spawned");
        Ok(ent as i32)
    }

    /// Free an entity; its record is zeroed and may be reused by `spawn`
    ///
    /// # Errors
    ///
    /// `ProgsError::BadEntity` for the world or a number outside the store.
    pub fn remove(&mut self, ent: i32) -> ProgsResult<()> {
        let index = self.check_entity(ent)?;
        if index == 0 {
            return Err(ProgsError::BadEntity(ent));
        }
        self.zero(index);
        self.free[index] = true;
        debug!(entity = ent, "removed");
        Ok(())
    }

    /// Drop every entity but the world and clear the world record
    pub fn clear(&mut self) {
        self.data.truncate(self.stride);
        self.data.iter_mut().for_each(|s| *s = 0);
        self.free.truncate(1);
    }

    /// Next live entity after `ent`, for iteration
    pub fn next_live(&self, ent: i32) -> Option<i32> {
        let start = (ent.max(0) as usize).saturating_add(1);
        (start..self.free.len())
            .find(|i| !self.free[*i])
            .map(|i| i as i32)
    }

    fn zero(&mut self, index: usize) {
        let base = index * self.stride;
        self.data[base..base + self.stride]
            .iter_mut()
            .for_each(|s| *s = 0);
    }

    /// Validate an entity number and return it as an index
    pub fn check_entity(&self, ent: i32) -> ProgsResult<usize> {
        if ent >= 0 && (ent as usize) < self.free.len() {
            Ok(ent as usize)
        } else {
            Err(ProgsError::BadEntity(ent))
        }
    }

    /// Validate that `width` slots starting at `field` lie inside a record
    pub fn check_field(&self, field: i32, width: usize) -> ProgsResult<usize> {
        if field >= 0 && field as usize + width <= self.stride {
            Ok(field as usize)
        } else {
            Err(ProgsError::InvalidFieldOffset {
                offset: field,
                limit: self.stride,
            })
        }
    }

    /// Address of a field of an entity
    pub fn address(&self, ent: i32, field: i32, width: usize) -> ProgsResult<i32> {
        let ent = self.check_entity(ent)?;
        let field = self.check_field(field, width)?;
        Ok((ent * self.stride + field) as i32)
    }

    /// A pointer access must stay inside the record it starts in
    fn pointer_range(&self, ptr: i32, width: usize) -> ProgsResult<std::ops::Range<usize>> {
        if ptr < 0 || ptr as usize + width > self.data.len() {
            return Err(ProgsError::BadPointer(ptr));
        }
        let start = ptr as usize;
        if self.stride > 0 {
            let field = start % self.stride;
            if field + width > self.stride {
                return Err(ProgsError::InvalidFieldOffset {
                    offset: field as i32,
                    limit: self.stride,
                });
            }
        }
        Ok(start..start + width)
    }

    /// Slots at a pointer
    pub fn read(&self, ptr: i32, width: usize) -> ProgsResult<&[u32]> {
        let range = self.pointer_range(ptr, width)?;
        Ok(&self.data[range])
    }

    /// Write slots at a pointer
    pub fn write(&mut self, ptr: i32, values: &[u32]) -> ProgsResult<()> {
        let range = self.pointer_range(ptr, values.len())?;
        self.data[range].copy_from_slice(values);
        Ok(())
    }

    /// The whole record of an entity
    pub fn record(&self, ent: i32) -> ProgsResult<&[u32]> {
        let index = self.check_entity(ent)?;
        let base = index * self.stride;
        Ok(&self.data[base..base + self.stride])
    }

    /// Raw field value
    pub fn get_u32(&self, ent: i32, field: i32) -> ProgsResult<u32> {
        let ptr = self.address(ent, field, 1)?;
        Ok(self.data[ptr as usize])
    }

    /// Write a raw field value
    pub fn set_u32(&mut self, ent: i32, field: i32, value: u32) -> ProgsResult<()> {
        let ptr = self.address(ent, field, 1)?;
        self.data[ptr as usize] = value;
        Ok(())
    }

    /// Float field
    pub fn get_f32(&self, ent: i32, field: i32) -> ProgsResult<f32> {
        self.get_u32(ent, field).map(f32::from_bits)
    }

    /// Write a float field
    pub fn set_f32(&mut self, ent: i32, field: i32, value: f32) -> ProgsResult<()> {
        self.set_u32(ent, field, value.to_bits())
    }

    /// Vector field
    pub fn get_vector(&self, ent: i32, field: i32) -> ProgsResult<Vec3> {
        let ptr = self.address(ent, field, 3)?;
        let s = self.read(ptr, 3)?;
        Ok(Vec3::from_bits([s[0], s[1], s[2]]))
    }

    /// Write a vector field
    pub fn set_vector(&mut self, ent: i32, field: i32, value: Vec3) -> ProgsResult<()> {
        let ptr = self.address(ent, field, 3)?;
        self.write(ptr, &value.to_bits())
    }
}
