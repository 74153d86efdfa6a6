//! Core types for cycle-accurate emulation.
//!
//! One [`Clock`] counts T-states. The CPU advances it on every bus access;
//! the bus hands it to per-map hooks so a machine can inject contention
//! without the CPU knowing which machine it is in.

mod bank;
mod bus;
mod clock;
mod composite;
mod cpu;
mod device;
mod error;
mod map;
mod mapper;
mod observable;

pub use bank::{MAX_BANK_SIZE, MIN_BANK_SIZE, MemoryBank};
pub use bus::{Bus, DualBus, IoBus, SimpleBus};
pub use clock::{Clock, MasterClock, Ticks};
pub use composite::{CompositeBus, OPEN_BUS};
pub use cpu::Cpu;
pub use device::Device;
pub use error::BusError;
pub use map::{AccessCallback, BusMap, DeviceId, MapId};
pub use mapper::{Mapper, MapperKind};
pub use observable::{Observable, Value};
