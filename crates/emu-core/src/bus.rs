//! CPU-facing bus contracts.
//!
//! The CPU charges its own base cycles (3 T-states per memory access, 4 per
//! I/O access). The bus only adds what the machine injects on top, through
//! the clock it is handed on every call.

use crate::Clock;

/// Byte-wide memory bus with a 16-bit address space.
pub trait Bus {
    /// Read the byte at `address`. Unmapped addresses float to `0xFF`.
    fn read(&mut self, clock: &mut Clock, address: u16) -> u8;

    /// Write `value` at `address`. Unmapped or read-only targets drop it.
    fn write(&mut self, clock: &mut Clock, address: u16, value: u8);

    /// `cycles` internal T-states with `address` on the bus and no read
    /// strobe. Nothing is transferred; only timing hooks run.
    fn read_no_req(&mut self, clock: &mut Clock, _address: u16, cycles: u32) {
        clock.add(cycles);
    }

    /// As [`Bus::read_no_req`], resolved the way a write would be.
    fn write_no_req(&mut self, clock: &mut Clock, _address: u16, cycles: u32) {
        clock.add(cycles);
    }
}

/// A bus with a separate I/O port space, as seen by `IN`/`OUT`.
pub trait IoBus: Bus {
    /// Read from `port` (full 16-bit address, B or A on the high byte).
    fn read_io(&mut self, clock: &mut Clock, port: u16) -> u8;

    /// Write `value` to `port`.
    fn write_io(&mut self, clock: &mut Clock, port: u16, value: u8);
}

/// Flat 64K of RAM with an empty port space.
///
/// Handy for exercisers and tests that only need memory.
pub struct SimpleBus {
    ram: Box<[u8; 0x1_0000]>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x1_0000]),
        }
    }

    /// Copy `data` to `address`, wrapping at the top of memory.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, _clock: &mut Clock, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn write(&mut self, _clock: &mut Clock, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}

impl IoBus for SimpleBus {
    fn read_io(&mut self, _clock: &mut Clock, _port: u16) -> u8 {
        0xFF
    }

    fn write_io(&mut self, _clock: &mut Clock, _port: u16, _value: u8) {}
}

/// A memory bus and an I/O bus driven as one.
///
/// Lets two independently built buses (usually two
/// [`CompositeBus`](crate::CompositeBus)es) serve the CPU.
pub struct DualBus<M, I> {
    pub memory: M,
    pub io: I,
}

impl<M: Bus, I: Bus> DualBus<M, I> {
    pub fn new(memory: M, io: I) -> Self {
        Self { memory, io }
    }
}

impl<M: Bus, I: Bus> Bus for DualBus<M, I> {
    fn read(&mut self, clock: &mut Clock, address: u16) -> u8 {
        self.memory.read(clock, address)
    }

    fn write(&mut self, clock: &mut Clock, address: u16, value: u8) {
        self.memory.write(clock, address, value);
    }

    fn read_no_req(&mut self, clock: &mut Clock, address: u16, cycles: u32) {
        self.memory.read_no_req(clock, address, cycles);
    }

    fn write_no_req(&mut self, clock: &mut Clock, address: u16, cycles: u32) {
        self.memory.write_no_req(clock, address, cycles);
    }
}

impl<M: Bus, I: Bus> IoBus for DualBus<M, I> {
    fn read_io(&mut self, clock: &mut Clock, port: u16) -> u8 {
        self.io.read(clock, port)
    }

    fn write_io(&mut self, clock: &mut Clock, port: u16, value: u8) {
        self.io.write(clock, port, value);
    }
}
