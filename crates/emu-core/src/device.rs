//! Anything that can sit behind a bus map.

use crate::MemoryBank;

/// A device mapped into an address space.
///
/// Offsets are local to the device: the bus subtracts the map's start
/// address before calling in. ROM/RAM banks, peripheral chips and
/// memory-mapped registers all implement this.
pub trait Device {
    /// Number of addressable bytes.
    fn size(&self) -> usize;

    /// Read the byte at `offset`.
    fn read(&mut self, offset: u16) -> u8;

    /// Write `value` at `offset`. Read-only devices ignore it.
    fn write(&mut self, offset: u16, value: u8);

    /// Side-effect-free read for debuggers. Defaults to open bus.
    fn peek(&self, _offset: u16) -> u8 {
        0xFF
    }

    /// Power-on initialisation.
    fn init(&mut self) {}

    /// Reset line asserted.
    fn reset(&mut self) {}

    /// Direct view of the backing bank, if this device is plain memory.
    fn as_bank(&self) -> Option<&MemoryBank> {
        None
    }

    /// Mutable view of the backing bank, for ROM loading and save states.
    fn as_bank_mut(&mut self) -> Option<&mut MemoryBank> {
        None
    }
}
