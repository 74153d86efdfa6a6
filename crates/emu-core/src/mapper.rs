//! Address resolution strategies.
//!
//! Both strategies answer the same question: which map serves this address
//! for a read, and which for a write. They must agree on every layout the
//! shift-mask scheme can express.

use log::debug;

use crate::{BusError, BusMap};

/// Mapper selection, chosen when the bus is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    /// First active matching map wins. Any layout, O(n) per access.
    Linear,
    /// Slot tables indexed by `address >> shift`. O(1) per access; maps
    /// must be power-of-two sized, at least one slot, and slot aligned.
    ShiftMask { shift: u8 },
}

/// Resolves addresses to map indices.
#[derive(Debug, Clone)]
pub enum Mapper {
    Linear,
    ShiftMask {
        shift: u8,
        read: Vec<Option<usize>>,
        write: Vec<Option<usize>>,
    },
}

impl Mapper {
    pub fn new(kind: MapperKind) -> Result<Self, BusError> {
        match kind {
            MapperKind::Linear => Ok(Self::Linear),
            MapperKind::ShiftMask { shift } => {
                if shift > 16 {
                    return Err(BusError::InvalidShift(shift));
                }
                let slots = 1usize << (16 - shift);
                Ok(Self::ShiftMask {
                    shift,
                    read: vec![None; slots],
                    write: vec![None; slots],
                })
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> MapperKind {
        match self {
            Self::Linear => MapperKind::Linear,
            Self::ShiftMask { shift, .. } => MapperKind::ShiftMask { shift: *shift },
        }
    }

    /// Check that `map` can be resolved by this strategy.
    pub fn validate(&self, map: &BusMap) -> Result<(), BusError> {
        match self {
            Self::Linear => Ok(()),
            Self::ShiftMask { shift, .. } => {
                let slot_size = 1usize << shift;
                let size = map.size();
                if !size.is_power_of_two()
                    || size < slot_size
                    || usize::from(map.start()) % slot_size != 0
                {
                    return Err(BusError::UnalignedMap {
                        start: map.start(),
                        end: map.end(),
                        slot_size,
                    });
                }
                Ok(())
            }
        }
    }

    /// Recompute lookup tables after the map set or any `active` flag
    /// changed. The linear mapper has nothing to cache.
    pub fn rebuild(&mut self, maps: &[BusMap]) {
        if let Self::ShiftMask { shift, read, write } = self {
            for (slot, (r, w)) in read.iter_mut().zip(write.iter_mut()).enumerate() {
                let base = (slot << *shift) as u16;
                *r = maps.iter().position(|m| m.selects_read(base));
                *w = maps.iter().position(|m| m.selects_write(base));
            }
            debug!("shift-mask mapper rebuilt: {} slots", read.len());
        }
    }

    /// Map serving a read of `address`.
    #[must_use]
    pub fn select_read(&self, maps: &[BusMap], address: u16) -> Option<usize> {
        match self {
            Self::Linear => maps.iter().position(|m| m.selects_read(address)),
            Self::ShiftMask { shift, read, .. } => read[usize::from(address) >> shift],
        }
    }

    /// Map serving a write of `address`. Read-only maps are skipped.
    #[must_use]
    pub fn select_write(&self, maps: &[BusMap], address: u16) -> Option<usize> {
        match self {
            Self::Linear => maps.iter().position(|m| m.selects_write(address)),
            Self::ShiftMask { shift, write, .. } => write[usize::from(address) >> shift],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceId;

    fn layout() -> Vec<BusMap> {
        vec![
            BusMap::new(DeviceId(0), 0x0000, 0x3FFF).readonly(),
            BusMap::new(DeviceId(1), 0x0000, 0x3FFF).inactive(),
            BusMap::new(DeviceId(2), 0x4000, 0x7FFF),
            BusMap::new(DeviceId(3), 0xC000, 0xFFFF),
        ]
    }

    #[test]
    fn rejects_oversized_shift() {
        assert_eq!(
            Mapper::new(MapperKind::ShiftMask { shift: 17 }).err(),
            Some(BusError::InvalidShift(17))
        );
    }

    #[test]
    fn shift_mask_rejects_misaligned_maps() {
        let mapper = Mapper::new(MapperKind::ShiftMask { shift: 14 }).expect("valid shift");
        let odd = BusMap::new(DeviceId(0), 0x2000, 0x5FFF);
        assert!(matches!(mapper.validate(&odd), Err(BusError::UnalignedMap { .. })));
        let small = BusMap::new(DeviceId(0), 0x4000, 0x43FF);
        assert!(mapper.validate(&small).is_err());
        assert!(Mapper::Linear.validate(&odd).is_ok());
    }

    #[test]
    fn linear_write_falls_through_readonly() {
        let mut maps = layout();
        maps[1].active = true;
        assert_eq!(Mapper::Linear.select_read(&maps, 0x0010), Some(0));
        assert_eq!(Mapper::Linear.select_write(&maps, 0x0010), Some(1));
    }

    #[test]
    fn strategies_agree() {
        let maps = layout();
        let mut shift = Mapper::new(MapperKind::ShiftMask { shift: 14 }).expect("valid shift");
        for map in &maps {
            shift.validate(map).expect("aligned layout");
        }
        shift.rebuild(&maps);
        for address in (0..=0xFFFFu16).step_by(0x100) {
            assert_eq!(
                Mapper::Linear.select_read(&maps, address),
                shift.select_read(&maps, address)
            );
            assert_eq!(
                Mapper::Linear.select_write(&maps, address),
                shift.select_write(&maps, address)
            );
        }
        assert_eq!(shift.select_read(&maps, 0x9000), None);
    }
}
