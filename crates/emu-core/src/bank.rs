//! Fixed-size ROM/RAM banks.

use crate::{BusError, Device};

/// Smallest bank the bus accepts.
pub const MIN_BANK_SIZE: usize = 0x400;
/// Largest bank the bus accepts (the whole address space).
pub const MAX_BANK_SIZE: usize = 0x1_0000;

/// A block of addressable storage.
///
/// The size is fixed at construction. Bus writes honour `readonly`;
/// [`MemoryBank::load`] does not, so ROM images can be installed after the
/// machine is built.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryBank {
    data: Box<[u8]>,
    readonly: bool,
}

impl MemoryBank {
    /// Zero-filled, writable bank.
    pub fn new(size: usize) -> Result<Self, BusError> {
        if !size.is_power_of_two() || !(MIN_BANK_SIZE..=MAX_BANK_SIZE).contains(&size) {
            return Err(BusError::InvalidBankSize(size));
        }
        Ok(Self {
            data: vec![0; size].into_boxed_slice(),
            readonly: false,
        })
    }

    /// Read-only bank holding `image`. The image length is the bank size.
    pub fn rom(image: &[u8]) -> Result<Self, BusError> {
        let mut bank = Self::new(image.len())?;
        bank.data.copy_from_slice(image);
        bank.readonly = true;
        Ok(bank)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Bulk write starting at `offset`, ignoring the read-only flag.
    ///
    /// Bytes past the end of the bank are dropped.
    pub fn load(&mut self, offset: usize, bytes: &[u8]) {
        if offset >= self.data.len() {
            return;
        }
        let len = bytes.len().min(self.data.len() - offset);
        self.data[offset..offset + len].copy_from_slice(&bytes[..len]);
    }

    /// Copy of the bank contents.
    #[must_use]
    pub fn save(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Borrow the contents (renderers read video memory through this).
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    fn index(&self, offset: u16) -> usize {
        usize::from(offset) & (self.data.len() - 1)
    }
}

impl Device for MemoryBank {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn read(&mut self, offset: u16) -> u8 {
        self.data[self.index(offset)]
    }

    fn write(&mut self, offset: u16, value: u8) {
        if !self.readonly {
            let i = self.index(offset);
            self.data[i] = value;
        }
    }

    fn peek(&self, offset: u16) -> u8 {
        self.data[self.index(offset)]
    }

    fn as_bank(&self) -> Option<&MemoryBank> {
        Some(self)
    }

    fn as_bank_mut(&mut self) -> Option<&mut MemoryBank> {
        Some(self)
    }
}
