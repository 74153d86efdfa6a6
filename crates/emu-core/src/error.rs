//! Machine-build configuration errors.
//!
//! Nothing on the emulation path fails: unmapped reads float, unmapped
//! writes vanish. Only a badly described memory layout is an error, and it
//! surfaces while the machine is being assembled.

use thiserror::Error;

/// Error raised while building a bank, a map or a mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Banks are 1K to 64K, powers of two.
    #[error("bank size {0:#X} is not a power of two between 1K and 64K")]
    InvalidBankSize(usize),

    /// A map's address range does not cover exactly its device.
    #[error("map {start:#06X}-{end:#06X} does not match device size {size:#X}")]
    RangeMismatch { start: u16, end: u16, size: usize },

    /// `start + size - 1` runs past `$FFFF`.
    #[error("device of size {size:#X} at {start:#06X} overflows the 16-bit address space")]
    AddressOverflow { start: u16, size: usize },

    /// No device was registered under this id.
    #[error("unknown device id {0}")]
    UnknownDevice(usize),

    /// No map was registered under this id.
    #[error("unknown map id {0}")]
    UnknownMap(usize),

    /// Shift-mask slots must be between 1 byte and 64K.
    #[error("shift {0} is out of range for a 16-bit bus")]
    InvalidShift(u8),

    /// Shift-mask mapping needs slot-aligned, power-of-two sized maps.
    #[error("map {start:#06X}-{end:#06X} cannot be expressed with {slot_size:#X}-byte slots")]
    UnalignedMap { start: u16, end: u16, slot_size: usize },
}
