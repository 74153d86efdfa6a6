//! A 16-bit address space assembled from mapped devices.
//!
//! # Paging
//!
//! Machines page ROM and RAM by mapping several devices over the same range
//! and flipping `active` on the maps. Contents are never copied; a paged-out
//! bank keeps its data until it is paged back in. `init()` and `reset()` put
//! every map back to its power-on visibility.
//!
//! # Timing
//!
//! A map may carry an access hook and a post-access hook. Both receive the
//! clock, so the owning machine can inject contention without the CPU
//! knowing anything about it.

use log::debug;

use crate::{
    AccessCallback, Bus, BusError, BusMap, Clock, Device, DeviceId, MapId, Mapper, MapperKind,
    MemoryBank,
};

/// Value seen when nothing answers a read.
pub const OPEN_BUS: u8 = 0xFF;

/// Devices plus the maps that place them in the address space.
pub struct CompositeBus {
    devices: Vec<Box<dyn Device>>,
    maps: Vec<BusMap>,
    mapper: Mapper,
}

impl CompositeBus {
    /// Empty bus: every read floats until maps are added.
    pub fn new(kind: MapperKind) -> Result<Self, BusError> {
        let mut mapper = Mapper::new(kind)?;
        mapper.rebuild(&[]);
        Ok(Self {
            devices: Vec::new(),
            maps: Vec::new(),
            mapper,
        })
    }

    /// Register a device. It is invisible until a map points at it.
    pub fn add_device(&mut self, device: impl Device + 'static) -> DeviceId {
        self.devices.push(Box::new(device));
        DeviceId(self.devices.len() - 1)
    }

    /// Add a map. Later maps lose to earlier ones where they overlap.
    pub fn add_map(&mut self, map: BusMap) -> Result<MapId, BusError> {
        let device = self
            .devices
            .get(map.device.0)
            .ok_or(BusError::UnknownDevice(map.device.0))?;
        let size = device.size();
        if usize::from(map.start) + size > 0x1_0000 {
            return Err(BusError::AddressOverflow {
                start: map.start,
                size,
            });
        }
        if map.size() != size {
            return Err(BusError::RangeMismatch {
                start: map.start,
                end: map.end,
                size,
            });
        }
        self.mapper.validate(&map)?;

        debug!(
            "map device {} at {:#06X}-{:#06X}{}{}",
            map.device.0,
            map.start,
            map.end,
            if map.readonly { " (ro)" } else { "" },
            if map.active { "" } else { " (paged out)" },
        );
        self.maps.push(map);
        self.mapper.rebuild(&self.maps);
        Ok(MapId(self.maps.len() - 1))
    }

    /// Map a whole device starting at `start`.
    pub fn map_device(&mut self, device: DeviceId, start: u16) -> Result<MapId, BusError> {
        let size = self
            .devices
            .get(device.0)
            .ok_or(BusError::UnknownDevice(device.0))?
            .size();
        let end = usize::from(start) + size - 1;
        let end = u16::try_from(end).map_err(|_| BusError::AddressOverflow { start, size })?;
        self.add_map(BusMap::new(device, start, end))
    }

    /// Power-on: initialise every device and restore map visibility.
    pub fn init(&mut self) {
        for device in &mut self.devices {
            device.init();
        }
        self.restore_maps();
        debug!("bus init: {} devices, {} maps", self.devices.len(), self.maps.len());
    }

    /// Reset line: reset every device and restore map visibility.
    pub fn reset(&mut self) {
        for device in &mut self.devices {
            device.reset();
        }
        self.restore_maps();
        debug!("bus reset");
    }

    fn restore_maps(&mut self) {
        for map in &mut self.maps {
            map.restore();
        }
        self.mapper.rebuild(&self.maps);
    }

    /// Page a map in or out.
    pub fn set_active(&mut self, map: MapId, active: bool) {
        if let Some(entry) = self.maps.get_mut(map.0) {
            if entry.active != active {
                entry.active = active;
                self.mapper.rebuild(&self.maps);
            }
        }
    }

    #[must_use]
    pub fn is_active(&self, map: MapId) -> bool {
        self.maps.get(map.0).is_some_and(BusMap::is_active)
    }

    /// Install (or replace) the pre-access hook of a map.
    pub fn set_access_callback(&mut self, map: MapId, callback: AccessCallback) {
        if let Some(entry) = self.maps.get_mut(map.0) {
            entry.on_access = Some(callback);
        }
    }

    /// Install (or replace) the post-access hook of a map.
    pub fn set_post_access_callback(&mut self, map: MapId, callback: AccessCallback) {
        if let Some(entry) = self.maps.get_mut(map.0) {
            entry.on_post_access = Some(callback);
        }
    }

    #[must_use]
    pub fn map(&self, map: MapId) -> Option<&BusMap> {
        self.maps.get(map.0)
    }

    #[must_use]
    pub fn maps(&self) -> &[BusMap] {
        &self.maps
    }

    #[must_use]
    pub fn mapper_kind(&self) -> MapperKind {
        self.mapper.kind()
    }

    #[must_use]
    pub fn device(&self, device: DeviceId) -> Option<&dyn Device> {
        self.devices.get(device.0).map(AsRef::as_ref)
    }

    pub fn device_mut(&mut self, device: DeviceId) -> Option<&mut (dyn Device + 'static)> {
        self.devices.get_mut(device.0).map(AsMut::as_mut)
    }

    /// Read-only view of a memory bank, for renderers.
    #[must_use]
    pub fn bank(&self, device: DeviceId) -> Option<&MemoryBank> {
        self.devices.get(device.0).and_then(|d| d.as_bank())
    }

    pub fn bank_mut(&mut self, device: DeviceId) -> Option<&mut MemoryBank> {
        self.devices.get_mut(device.0).and_then(|d| d.as_bank_mut())
    }

    /// Read without hooks or device side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        match self.mapper.select_read(&self.maps, address) {
            Some(i) => {
                let map = &self.maps[i];
                self.devices[map.device.0].peek(address - map.start)
            }
            None => OPEN_BUS,
        }
    }

    fn no_req(&mut self, clock: &mut Clock, index: Option<usize>, address: u16, cycles: u32) {
        let hook = index.and_then(|i| self.maps[i].on_access.as_mut());
        match hook {
            Some(hook) => {
                for _ in 0..cycles {
                    hook(clock, address);
                    clock.inc();
                }
            }
            None => clock.add(cycles),
        }
    }
}

impl Bus for CompositeBus {
    fn read(&mut self, clock: &mut Clock, address: u16) -> u8 {
        let Some(i) = self.mapper.select_read(&self.maps, address) else {
            return OPEN_BUS;
        };
        let map = &mut self.maps[i];
        if let Some(hook) = map.on_access.as_mut() {
            hook(clock, address);
        }
        let value = self.devices[map.device.0].read(address - map.start);
        if let Some(hook) = map.on_post_access.as_mut() {
            hook(clock, address);
        }
        value
    }

    fn write(&mut self, clock: &mut Clock, address: u16, value: u8) {
        let Some(i) = self.mapper.select_write(&self.maps, address) else {
            return;
        };
        let map = &mut self.maps[i];
        if let Some(hook) = map.on_access.as_mut() {
            hook(clock, address);
        }
        self.devices[map.device.0].write(address - map.start, value);
        if let Some(hook) = map.on_post_access.as_mut() {
            hook(clock, address);
        }
    }

    fn read_no_req(&mut self, clock: &mut Clock, address: u16, cycles: u32) {
        let index = self.mapper.select_read(&self.maps, address);
        self.no_req(clock, index, address, cycles);
    }

    fn write_no_req(&mut self, clock: &mut Clock, address: u16, cycles: u32) {
        let index = self.mapper.select_write(&self.maps, address);
        self.no_req(clock, index, address, cycles);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn spectrum_like(kind: MapperKind) -> (CompositeBus, MapId, MapId, DeviceId, DeviceId) {
        let mut bus = CompositeBus::new(kind).expect("valid mapper");
        let mut image = vec![0u8; 0x4000];
        image[0] = 0xF3;
        let rom = bus.add_device(MemoryBank::rom(&image).expect("rom"));
        let alt_rom = bus.add_device(MemoryBank::rom(&[0x3E; 0x4000]).expect("rom"));
        let ram = bus.add_device(MemoryBank::new(0x4000).expect("ram"));
        let rom_map = bus
            .add_map(BusMap::new(rom, 0x0000, 0x3FFF).readonly())
            .expect("rom map");
        let alt_map = bus
            .add_map(BusMap::new(alt_rom, 0x0000, 0x3FFF).readonly().inactive())
            .expect("alt map");
        bus.map_device(ram, 0x4000).expect("ram map");
        (bus, rom_map, alt_map, rom, ram)
    }

    #[test]
    fn unmapped_reads_float_and_writes_vanish() {
        let (mut bus, _, _, _, ram) = spectrum_like(MapperKind::Linear);
        let mut clock = Clock::new();
        assert_eq!(bus.read(&mut clock, 0x9000), OPEN_BUS);
        bus.write(&mut clock, 0x9000, 0x12);
        assert_eq!(bus.read(&mut clock, 0x9000), OPEN_BUS);
        assert!(bus.bank(ram).is_some_and(|b| b.as_slice().iter().all(|&x| x == 0)));
    }

    #[test]
    fn rom_writes_are_dropped() {
        let (mut bus, _, _, rom, _) = spectrum_like(MapperKind::Linear);
        let mut clock = Clock::new();
        bus.write(&mut clock, 0x0000, 0x00);
        assert_eq!(bus.read(&mut clock, 0x0000), 0xF3);
        assert_eq!(bus.bank(rom).map(|b| b.as_slice()[0]), Some(0xF3));
    }

    #[test]
    fn paging_swaps_without_copying() {
        let (mut bus, rom_map, alt_map, _, _) = spectrum_like(MapperKind::ShiftMask { shift: 14 });
        bus.set_active(rom_map, false);
        bus.set_active(alt_map, true);
        assert_eq!(bus.peek(0x0000), 0x3E);
        bus.set_active(alt_map, false);
        bus.set_active(rom_map, true);
        assert_eq!(bus.peek(0x0000), 0xF3);
    }

    #[test]
    fn reset_restores_power_on_paging() {
        let (mut bus, rom_map, alt_map, _, _) = spectrum_like(MapperKind::Linear);
        bus.set_active(rom_map, false);
        bus.set_active(alt_map, true);
        bus.reset();
        assert!(bus.is_active(rom_map));
        assert!(!bus.is_active(alt_map));
        bus.set_active(alt_map, true);
        bus.init();
        assert!(!bus.is_active(alt_map));
    }

    #[test]
    fn range_must_match_device() {
        let mut bus = CompositeBus::new(MapperKind::Linear).expect("valid mapper");
        let ram = bus.add_device(MemoryBank::new(0x4000).expect("ram"));
        assert_eq!(
            bus.add_map(BusMap::new(ram, 0x4000, 0x4FFF)).err(),
            Some(BusError::RangeMismatch {
                start: 0x4000,
                end: 0x4FFF,
                size: 0x4000
            })
        );
        assert_eq!(
            bus.map_device(ram, 0xF000).err(),
            Some(BusError::AddressOverflow {
                start: 0xF000,
                size: 0x4000
            })
        );
        assert_eq!(
            bus.map_device(DeviceId(9), 0).err(),
            Some(BusError::UnknownDevice(9))
        );
    }

    #[test]
    fn shift_mask_rejects_unaligned_layout() {
        let mut bus = CompositeBus::new(MapperKind::ShiftMask { shift: 14 }).expect("valid mapper");
        let ram = bus.add_device(MemoryBank::new(0x2000).expect("ram"));
        assert!(matches!(
            bus.map_device(ram, 0x2000),
            Err(BusError::UnalignedMap { .. })
        ));
    }

    #[test]
    fn hooks_run_around_access() {
        let (mut bus, _, _, _, _) = spectrum_like(MapperKind::Linear);
        let ram_map = MapId(2);
        let order = Rc::new(Cell::new(0u8));
        let seen = Rc::clone(&order);
        bus.set_access_callback(
            ram_map,
            Box::new(move |clock: &mut Clock, _: u16| {
                seen.set(seen.get() * 10 + 1);
                clock.add(6);
            }),
        );
        let seen = Rc::clone(&order);
        bus.set_post_access_callback(
            ram_map,
            Box::new(move |_: &mut Clock, _: u16| seen.set(seen.get() * 10 + 2)),
        );

        let mut clock = Clock::new();
        bus.write(&mut clock, 0x4000, 0x99);
        assert_eq!(order.get(), 12);
        assert_eq!(clock.tstates(), 6);
        assert_eq!(bus.read(&mut clock, 0x4000), 0x99);
        assert_eq!(clock.tstates(), 12);
        assert_eq!(bus.read(&mut clock, 0x0000), 0xF3);
        assert_eq!(clock.tstates(), 12);
    }

    #[test]
    fn no_req_cycles_run_the_access_hook_per_cycle() {
        let (mut bus, _, _, _, _) = spectrum_like(MapperKind::Linear);
        bus.set_access_callback(MapId(2), Box::new(|clock: &mut Clock, _: u16| clock.add(1)));
        let mut clock = Clock::new();
        bus.read_no_req(&mut clock, 0x4000, 3);
        assert_eq!(clock.tstates(), 6);
        bus.write_no_req(&mut clock, 0x8000, 2);
        assert_eq!(clock.tstates(), 8);
    }
}
