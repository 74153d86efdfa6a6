//! Address-range to device bindings.

use std::fmt;

use crate::Clock;

/// Index of a device registered with a [`CompositeBus`](crate::CompositeBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub(crate) usize);

impl DeviceId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index of a map registered with a [`CompositeBus`](crate::CompositeBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(pub(crate) usize);

impl MapId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Timing hook run around a bus access.
///
/// Receives the clock and the full 16-bit address. Machines use it to add
/// contention wait states (`clock.add(n)`) based on `clock.tstates()`.
pub type AccessCallback = Box<dyn FnMut(&mut Clock, u16)>;

/// One mapping entry: a device visible at `start..=end`.
///
/// Maps may overlap. Which one answers depends on the mapper; the linear
/// mapper picks the first active entry that matches (and, for writes, is
/// not read-only).
pub struct BusMap {
    pub(crate) device: DeviceId,
    pub(crate) start: u16,
    pub(crate) end: u16,
    pub(crate) active: bool,
    pub(crate) initial_active: bool,
    pub(crate) readonly: bool,
    pub(crate) on_access: Option<AccessCallback>,
    pub(crate) on_post_access: Option<AccessCallback>,
}

impl BusMap {
    /// Map `device` at `start..=end`, active and writable.
    ///
    /// The range is checked against the device size when the map is added
    /// to a bus.
    #[must_use]
    pub fn new(device: DeviceId, start: u16, end: u16) -> Self {
        Self {
            device,
            start,
            end,
            active: true,
            initial_active: true,
            readonly: false,
            on_access: None,
            on_post_access: None,
        }
    }

    /// Writes through this map are dropped.
    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Start (and come back from reset) paged out.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self.initial_active = false;
        self
    }

    /// Run `callback` before every access resolved to this map.
    #[must_use]
    pub fn on_access(mut self, callback: impl FnMut(&mut Clock, u16) + 'static) -> Self {
        self.on_access = Some(Box::new(callback));
        self
    }

    /// Run `callback` after every access resolved to this map.
    #[must_use]
    pub fn on_post_access(mut self, callback: impl FnMut(&mut Clock, u16) + 'static) -> Self {
        self.on_post_access = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn device(&self) -> DeviceId {
        self.device
    }

    #[must_use]
    pub fn start(&self) -> u16 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of bytes covered.
    #[must_use]
    pub fn size(&self) -> usize {
        usize::from(self.end) - usize::from(self.start) + 1
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[must_use]
    pub fn contains(&self, address: u16) -> bool {
        (self.start..=self.end).contains(&address)
    }

    /// Active and covering `address`.
    pub(crate) fn selects_read(&self, address: u16) -> bool {
        self.active && self.contains(address)
    }

    /// Active, writable and covering `address`.
    pub(crate) fn selects_write(&self, address: u16) -> bool {
        self.active && !self.readonly && self.contains(address)
    }

    pub(crate) fn restore(&mut self) {
        self.active = self.initial_active;
    }
}

impl fmt::Debug for BusMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusMap")
            .field("device", &self.device)
            .field("start", &format_args!("{:#06X}", self.start))
            .field("end", &format_args!("{:#06X}", self.end))
            .field("active", &self.active)
            .field("initial_active", &self.initial_active)
            .field("readonly", &self.readonly)
            .field("on_access", &self.on_access.is_some())
            .field("on_post_access", &self.on_post_access.is_some())
            .finish()
    }
}
