//! CRC-16/CCITT checksum used for program headers
//!
//! Compilers checksum the text of the shared entity/global declaration file
//! and store the result in the header; the host computes the same value over
//! the declarations it was built with.

/// Header checksum of the classic declaration set
pub const PROGHEADER_CRC: u16 = 5927;

const CRC_INIT: u16 = 0xffff;
const CRC_POLY: u16 = 0x1021;

/// Incremental checksum state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16(u16);

impl Crc16 {
    /// Start a new checksum
    pub fn new() -> Self {
        Crc16(CRC_INIT)
    }

    /// Feed one byte
    pub fn update(&mut self, byte: u8) {
        let mut crc = self.0 ^ ((byte as u16) << 8);
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
        self.0 = crc;
    }

    /// Feed a block of bytes
    pub fn update_block(&mut self, data: &[u8]) {
        for byte in data {
            self.update(*byte);
        }
    }

    /// Current checksum value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum a block in one call
///
/// # Examples
///
/// ```
/// use bytecode_system::crc16;
///
/// assert_eq!(crc16(b"123456789"), 0x29b1);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update_block(data);
    crc.value()
}
