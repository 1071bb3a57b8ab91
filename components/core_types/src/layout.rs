//! Fixed layout of the low global region.
//!
//! Slot 0 is unused, slots 1..4 hold the return value, and eight parameter
//! blocks of three slots follow. Compiled programs place their own globals
//! from [`RESERVED_OFS`] upwards.

/// Unused slot; an operand of 0 means "no operand"
pub const OFS_NULL: usize = 0;
/// Start of the three-slot return area
pub const OFS_RETURN: usize = 1;
/// Start of the first parameter block
pub const OFS_PARM0: usize = 4;
/// Slots reserved for every parameter block, scalar or vector
pub const PARM_STRIDE: usize = 3;
/// Maximum number of parameters a function may declare
pub const MAX_PARMS: usize = 8;
/// First slot available to program globals
pub const RESERVED_OFS: usize = OFS_PARM0 + MAX_PARMS * PARM_STRIDE;

/// Persist-across-save flag in a definition's type field
pub const DEF_SAVEGLOBAL: u16 = 1 << 15;

/// Offset of parameter block `n`
///
/// # Examples
///
/// ```
/// use core_types::layout::{ofs_parm, OFS_PARM0};
///
/// assert_eq!(ofs_parm(0), OFS_PARM0);
/// assert_eq!(ofs_parm(1), 7);
/// ```
pub const fn ofs_parm(n: usize) -> usize {
    OFS_PARM0 + n * PARM_STRIDE
}
