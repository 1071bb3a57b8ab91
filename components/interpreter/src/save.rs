//! Save and restore of program state
//!
//! Globals flagged persistent and entity fields are exported by name, so a
//! snapshot survives a recompiled program as long as the names and types it
//! mentions still exist. Strings and function references are written as
//! text and resolved again on import.

use std::collections::BTreeMap;

use bytecode_system::Def;
use core_types::{EType, ProgsError, ProgsResult, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vm::Vm;

/// One saved slot value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SavedValue {
    /// Float
    Float(f32),
    /// Vector components
    Vector([f32; 3]),
    /// String contents
    String(String),
    /// Entity number
    Entity(i32),
    /// Function name, empty for the null function
    Function(String),
}

impl SavedValue {
    fn etype(&self) -> EType {
        match self {
            SavedValue::Float(_) => EType::Float,
            SavedValue::Vector(_) => EType::Vector,
            SavedValue::String(_) => EType::String,
            SavedValue::Entity(_) => EType::Entity,
            SavedValue::Function(_) => EType::Function,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            SavedValue::Float(f) => *f == 0.0,
            SavedValue::Vector(v) => v.iter().all(|c| *c == 0.0),
            SavedValue::String(s) | SavedValue::Function(s) => s.is_empty(),
            SavedValue::Entity(e) => *e == 0,
        }
    }
}

/// Persistent globals by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSnapshot {
    /// Saved values
    pub values: BTreeMap<String, SavedValue>,
}

/// Non-zero fields of one entity by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Saved values
    pub fields: BTreeMap<String, SavedValue>,
}

fn saveable(ty: EType) -> bool {
    matches!(
        ty,
        EType::Float | EType::Vector | EType::String | EType::Entity | EType::Function
    )
}

/// Compilers emit `origin_x`, `origin_y`, `origin_z` alongside `origin`
fn is_component(name: &str) -> bool {
    name.ends_with("_x") || name.ends_with("_y") || name.ends_with("_z")
}

impl<H> Vm<H> {
    fn decode(&self, ty: EType, slots: &[u32]) -> ProgsResult<SavedValue> {
        Ok(match ty {
            EType::Float => SavedValue::Float(f32::from_bits(slots[0])),
            EType::Vector => SavedValue::Vector(Vec3::from_bits([slots[0], slots[1], slots[2]]).0),
            EType::String => {
                SavedValue::String(self.strings.get_lossy(slots[0] as i32)?.into_owned())
            }
            EType::Entity => SavedValue::Entity(slots[0] as i32),
            EType::Function => {
                SavedValue::Function(self.program.function_name(slots[0] as usize).into_owned())
            }
            other => return Err(ProgsError::Save(format!("cannot save {} values", other))),
        })
    }

    fn encode(&mut self, name: &str, ty: EType, value: &SavedValue) -> ProgsResult<[u32; 3]> {
        if value.etype() != ty {
            return Err(ProgsError::Save(format!(
                "`{}` is {}, snapshot has {}",
                name,
                ty,
                value.etype()
            )));
        }
        Ok(match value {
            SavedValue::Float(f) => [f.to_bits(), 0, 0],
            SavedValue::Vector(v) => Vec3(*v).to_bits(),
            SavedValue::String(s) => [self.strings.intern(s) as u32, 0, 0],
            SavedValue::Entity(e) => [*e as u32, 0, 0],
            SavedValue::Function(f) if f.is_empty() => [0; 3],
            SavedValue::Function(f) => {
                let index = self
                    .program
                    .find_function(f)
                    .ok_or_else(|| ProgsError::Save(format!("no function `{}`", f)))?;
                [index as u32, 0, 0]
            }
        })
    }

    fn named_def(&self, def: &Def) -> Option<(String, EType)> {
        let ty = def.etype().filter(|t| saveable(*t))?;
        let name = self.program.string_lossy(def.name);
        if name.is_empty() {
            return None;
        }
        Some((name.into_owned(), ty))
    }

    /// Capture every persistent global
    pub fn export_globals(&self) -> ProgsResult<GlobalSnapshot> {
        let mut snapshot = GlobalSnapshot::default();
        for def in self.program.globaldefs.iter().filter(|d| d.is_saved()) {
            let Some((name, ty)) = self.named_def(def) else {
                continue;
            };
            let slots = self.globals.slice(def.ofs as usize, ty.width())?;
            let value = self.decode(ty, slots)?;
            snapshot.values.insert(name, value);
        }
        debug!(globals = snapshot.values.len(), "exported globals");
        Ok(snapshot)
    }

    /// Write a snapshot back into the persistent globals
    ///
    /// # Errors
    ///
    /// `ProgsError::Save` when a name is not a persistent global of the
    /// program or a value has the wrong type. Nothing is written past the
    /// first error.
    pub fn import_globals(&mut self, snapshot: &GlobalSnapshot) -> ProgsResult<()> {
        for (name, value) in &snapshot.values {
            let def = self
                .program
                .find_global(name)
                .filter(|d| d.is_saved())
                .copied()
                .ok_or_else(|| ProgsError::Save(format!("no saved global `{}`", name)))?;
            let ty = def
                .etype()
                .filter(|t| saveable(*t))
                .ok_or_else(|| ProgsError::Save(format!("`{}` cannot be saved", name)))?;
            let bits = self.encode(name, ty, value)?;
            self.globals
                .slice_mut(def.ofs as usize, ty.width())?
                .copy_from_slice(&bits[..ty.width()]);
        }
        debug!(globals = snapshot.values.len(), "imported globals");
        Ok(())
    }

    /// Capture the non-zero named fields of an entity
    pub fn export_entity(&self, ent: i32) -> ProgsResult<EntitySnapshot> {
        self.entities.check_entity(ent)?;
        let mut snapshot = EntitySnapshot::default();
        for def in &self.program.fielddefs {
            let Some((name, ty)) = self.named_def(def) else {
                continue;
            };
            if is_component(&name) {
                continue;
            }
            let ptr = self.entities.address(ent, def.ofs as i32, ty.width())?;
            let value = self.decode(ty, self.entities.read(ptr, ty.width())?)?;
            if !value.is_zero() {
                snapshot.fields.insert(name, value);
            }
        }
        Ok(snapshot)
    }

    /// Load fields into an entity
    ///
    /// Every record except the world's is cleared first, so fields missing
    /// from the snapshot read as zero.
    pub fn import_entity(&mut self, ent: i32, snapshot: &EntitySnapshot) -> ProgsResult<()> {
        self.entities.check_entity(ent)?;
        let stride = self.entities.stride();
        if ent != 0 && stride > 0 {
            let base = self.entities.address(ent, 0, stride)?;
            self.entities.write(base, &vec![0; stride])?;
        }
        for (name, value) in &snapshot.fields {
            let def = self
                .program
                .find_field(name)
                .copied()
                .ok_or_else(|| ProgsError::Save(format!("no field `{}`", name)))?;
            let ty = def
                .etype()
                .filter(|t| saveable(*t))
                .ok_or_else(|| ProgsError::Save(format!("`{}` cannot be saved", name)))?;
            let bits = self.encode(name, ty, value)?;
            let ptr = self.entities.address(ent, def.ofs as i32, ty.width())?;
            self.entities.write(ptr, &bits[..ty.width()])?;
        }
        Ok(())
    }
}
