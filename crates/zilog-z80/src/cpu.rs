//! Z80 CPU core with per-instruction execution.
//!
//! Each call to [`Z80::step`] runs one whole instruction. Timing is still
//! exact: every memory and I/O access goes through the bus at the T-state it
//! happens on, and the bus gets the clock so it can add wait states.

mod cb;
mod ed;
mod execute;
mod index;

use emu_core::{Clock, Cpu, IoBus, Observable, Value};
use log::{debug, trace};

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::{Reg8, Reg16, Registers};

/// Z80 CPU.
///
/// The CPU owns the clock but not the bus. The bus is passed to `step()`
/// so the machine can share it with the video and sound hardware between
/// instructions.
pub struct Z80 {
    pub(crate) regs: Registers,
    pub(crate) clock: Clock,
}

impl Z80 {
    /// Create a Z80 in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            clock: Clock::new(),
        }
    }

    #[must_use]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The machine restarts the frame counter through this.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Replace the register file (state restore).
    pub fn set_registers(&mut self, regs: &Registers) {
        self.regs.copy_from(regs);
    }

    /// Power-on: registers and both clock counters cleared.
    pub fn hard_reset(&mut self) {
        self.regs.hard_reset();
        self.clock.reset();
        debug!("z80 hard reset");
    }

    /// RESET line: see [`Registers::soft_reset`].
    pub fn soft_reset(&mut self) {
        self.regs.soft_reset();
        debug!("z80 reset");
    }

    /// True while the instruction just executed was `LD A,I` or `LD A,R`.
    #[must_use]
    pub const fn read_iff2(&self) -> bool {
        self.regs.read_iff2
    }

    /// Drive the INT line. It stays asserted until an interrupt is
    /// accepted or the line is released.
    pub fn request_interrupt(&mut self, level: bool) {
        self.regs.int_pending = level;
    }

    /// Latch an NMI edge.
    pub fn request_nmi(&mut self) {
        self.regs.nmi_pending = true;
    }

    // === Bus cycles ===

    /// Memory read: 3 T-states plus whatever the bus injects.
    pub(crate) fn read<B: IoBus>(&mut self, bus: &mut B, addr: u16) -> u8 {
        let value = bus.read(&mut self.clock, addr);
        self.clock.add(3);
        value
    }

    /// Memory write: 3 T-states plus whatever the bus injects.
    pub(crate) fn write<B: IoBus>(&mut self, bus: &mut B, addr: u16, value: u8) {
        bus.write(&mut self.clock, addr, value);
        self.clock.add(3);
    }

    pub(crate) fn read_no_req<B: IoBus>(&mut self, bus: &mut B, addr: u16, cycles: u32) {
        bus.read_no_req(&mut self.clock, addr, cycles);
    }

    pub(crate) fn write_no_req<B: IoBus>(&mut self, bus: &mut B, addr: u16, cycles: u32) {
        bus.write_no_req(&mut self.clock, addr, cycles);
    }

    /// Internal cycles with IR on the address bus (refresh address).
    pub(crate) fn ir_cycles<B: IoBus>(&mut self, bus: &mut B, cycles: u32) {
        let ir = self.regs.ir();
        self.read_no_req(bus, ir, cycles);
    }

    /// I/O read: 4 T-states plus whatever the bus injects.
    pub(crate) fn io_read<B: IoBus>(&mut self, bus: &mut B, port: u16) -> u8 {
        let value = bus.read_io(&mut self.clock, port);
        self.clock.add(4);
        value
    }

    /// I/O write: 4 T-states plus whatever the bus injects.
    pub(crate) fn io_write<B: IoBus>(&mut self, bus: &mut B, port: u16, value: u8) {
        bus.write_io(&mut self.clock, port, value);
        self.clock.add(4);
    }

    /// M1 cycle: read at PC (3 T-states), refresh (1), PC+1, R+1.
    pub(crate) fn fetch<B: IoBus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.regs.pc;
        let opcode = bus.read(&mut self.clock, pc);
        self.clock.add(3);
        self.clock.inc();
        self.regs.pc = pc.wrapping_add(1);
        self.regs.inc_r();
        opcode
    }

    /// Operand byte at PC.
    pub(crate) fn fetch_byte<B: IoBus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.regs.pc;
        self.regs.pc = pc.wrapping_add(1);
        self.read(bus, pc)
    }

    /// Little-endian operand word at PC.
    pub(crate) fn fetch_word<B: IoBus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn read_word<B: IoBus>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = self.read(bus, addr);
        let hi = self.read(bus, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn write_word<B: IoBus>(&mut self, bus: &mut B, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(bus, addr, lo);
        self.write(bus, addr.wrapping_add(1), hi);
    }

    /// High byte first, as the hardware does.
    pub(crate) fn push<B: IoBus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, lo);
    }

    pub(crate) fn pop<B: IoBus>(&mut self, bus: &mut B) -> u16 {
        let value = self.read_word(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// Condition by opcode bits 5-3: NZ Z NC C PO PE P M.
    pub(crate) fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f();
        match cc & 7 {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }

    /// 8-bit register by opcode field, with H/L redirected to the halves of
    /// `index`. Field 6 is `(HL)` and is handled by the caller.
    pub(crate) fn reg(&self, r: u8, index: Reg16) -> u8 {
        match r & 7 {
            0 => self.regs.get(Reg8::B),
            1 => self.regs.get(Reg8::C),
            2 => self.regs.get(Reg8::D),
            3 => self.regs.get(Reg8::E),
            4 => self.regs.get_h(index),
            5 => self.regs.get_l(index),
            _ => self.regs.a(),
        }
    }

    pub(crate) fn set_reg(&mut self, r: u8, index: Reg16, value: u8) {
        match r & 7 {
            0 => self.regs.set(Reg8::B, value),
            1 => self.regs.set(Reg8::C, value),
            2 => self.regs.set(Reg8::D, value),
            3 => self.regs.set(Reg8::E, value),
            4 => self.regs.set_h(index, value),
            5 => self.regs.set_l(index, value),
            _ => self.regs.set_a(value),
        }
    }

    /// Register pair by opcode bits 5-4: BC DE HL SP. `SP` is not a cell
    /// pair, so `None` stands for it.
    pub(crate) fn pair_rp(p: u8, index: Reg16) -> Option<Reg16> {
        match p & 3 {
            0 => Some(Reg16::Bc),
            1 => Some(Reg16::De),
            2 => Some(index),
            _ => None,
        }
    }

    pub(crate) fn get_rp(&self, p: u8, index: Reg16) -> u16 {
        Self::pair_rp(p, index).map_or(self.regs.sp, |pair| self.regs.get16(pair))
    }

    pub(crate) fn set_rp(&mut self, p: u8, index: Reg16, value: u16) {
        match Self::pair_rp(p, index) {
            Some(pair) => self.regs.set16(pair, value),
            None => self.regs.sp = value,
        }
    }

    /// Register pair for PUSH/POP by opcode bits 5-4: BC DE HL AF.
    pub(crate) fn pair_rp2(p: u8, index: Reg16) -> Reg16 {
        match p & 3 {
            0 => Reg16::Bc,
            1 => Reg16::De,
            2 => index,
            _ => Reg16::Af,
        }
    }

    // === Execution ===

    /// Execute one instruction. Returns the T-states it took, wait states
    /// included.
    ///
    /// While halted, each step is one 4 T-state fetch of the `HALT` opcode
    /// with PC held on it.
    pub fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let start = self.clock.total();

        // EI and LD A,I/R only affect the boundary right after them.
        self.regs.active_ei = false;
        self.regs.read_iff2 = false;

        if self.regs.halted {
            self.fetch(bus);
            self.regs.pc = self.regs.pc.wrapping_sub(1);
        } else if let Some(index) = self.regs.prefix.take() {
            self.execute_index(bus, index);
        } else {
            let opcode = self.fetch(bus);
            self.execute(bus, opcode, Reg16::Hl);
        }

        (self.clock.total() - start).get() as u32
    }

    /// Offer a maskable interrupt.
    ///
    /// Refused without calling `ack` when IFF1 is clear, the previous
    /// instruction was `EI`, or a prefix is still pending. `ack` may still veto. On acceptance: IFF1 and
    /// IFF2 cleared, HALT left, R bumped, 7 T-states, PC pushed, then the
    /// mode's vector (IM 0/1: `$0038`, 13 T-states; IM 2: the word at
    /// `I << 8 | $FF`, 19 T-states).
    pub fn interrupt<B: IoBus>(&mut self, bus: &mut B, mut ack: impl FnMut() -> bool) -> bool {
        if !self.regs.iff1 || self.regs.active_ei || self.regs.prefix.is_some() {
            return false;
        }
        if !ack() {
            trace!("int vetoed at {:#06X}", self.regs.pc);
            return false;
        }

        // NMOS: LD A,I/R interrupted reads IFF2 after it was cleared.
        if self.regs.read_iff2 {
            let f = self.regs.f();
            self.regs.set_f(f & !PF);
        }

        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.leave_halt();
        self.regs.inc_r();
        self.clock.add(7);
        self.push(bus, self.regs.pc);

        self.regs.pc = if self.regs.im == 2 {
            let vector = (u16::from(self.regs.get(Reg8::I)) << 8) | 0xFF;
            self.read_word(bus, vector)
        } else {
            0x0038
        };
        self.regs.set_wz(self.regs.pc);
        trace!("int accepted, im {} -> {:#06X}", self.regs.im, self.regs.pc);
        true
    }

    /// Non-maskable interrupt: IFF1 cleared (IFF2 keeps the old state for
    /// `RETN`), 5 T-states, PC pushed, jump to `$0066`. 11 T-states total.
    /// Not taken while a prefix is pending.
    pub fn nmi<B: IoBus>(&mut self, bus: &mut B, mut ack: impl FnMut() -> bool) -> bool {
        if self.regs.prefix.is_some() {
            return false;
        }
        if !ack() {
            trace!("nmi vetoed at {:#06X}", self.regs.pc);
            return false;
        }
        self.regs.iff1 = false;
        self.leave_halt();
        self.regs.inc_r();
        self.clock.add(5);
        self.push(bus, self.regs.pc);
        self.regs.pc = 0x0066;
        self.regs.set_wz(0x0066);
        trace!("nmi accepted");
        true
    }

    fn leave_halt(&mut self) {
        if self.regs.halted {
            self.regs.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    /// Service latched request lines: NMI first, then INT. Returns true if
    /// either was taken. An accepted INT releases the line.
    pub fn service_interrupts<B: IoBus>(
        &mut self,
        bus: &mut B,
        mut ack: impl FnMut() -> bool,
    ) -> bool {
        // Nothing is taken between a prefix and its opcode; the NMI edge
        // stays latched.
        if self.regs.prefix.is_some() {
            return false;
        }
        if self.regs.nmi_pending {
            self.regs.nmi_pending = false;
            if self.nmi(bus, &mut ack) {
                return true;
            }
        }
        if self.regs.int_pending && self.interrupt(bus, &mut ack) {
            self.regs.int_pending = false;
            return true;
        }
        false
    }

    /// Run whole instructions until the frame counter reaches `limit`,
    /// servicing request lines between instructions. Returns T-states used.
    ///
    /// The last instruction may overshoot `limit`; the machine folds the
    /// excess into the next frame with [`Clock::restart`].
    pub fn run_until<B: IoBus>(
        &mut self,
        bus: &mut B,
        limit: u32,
        mut ack: impl FnMut() -> bool,
    ) -> u32 {
        let start = self.clock.total();
        while self.clock.tstates() < limit {
            self.service_interrupts(bus, &mut ack);
            self.step(bus);
        }
        (self.clock.total() - start).get() as u32
    }

    /// Pop the return address into PC.
    ///
    /// Used by test harnesses to return from trapped system calls (e.g.
    /// CP/M BDOS). Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn force_ret<B: IoBus>(&mut self, bus: &mut B) {
        self.regs.pc = self.pop(bus);
    }

    /// Set the program counter.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_pc(&mut self, value: u16) {
        self.regs.pc = value;
    }

    /// Set the stack pointer.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_sp(&mut self, value: u16) {
        self.regs.sp = value;
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        Z80::step(self, bus)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }

    fn interrupt<B: IoBus>(&mut self, bus: &mut B, ack: impl FnMut() -> bool) -> bool {
        Z80::interrupt(self, bus, ack)
    }

    fn nmi<B: IoBus>(&mut self, bus: &mut B, ack: impl FnMut() -> bool) -> bool {
        Z80::nmi(self, bus, ack)
    }

    fn reset(&mut self) {
        self.soft_reset();
    }
}

/// All query paths supported by the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl",
    // Alternate registers
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    "af'", "bc'", "de'", "hl'",
    // Index registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    // Other registers
    "sp", "pc", "i", "r", "wz",
    // Flags (individual)
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    // Interrupt state
    "iff1", "iff2", "im", "active_ei", "read_iff2", "int_pending", "nmi_pending",
    "prefix_pending",
    // CPU state
    "halted", "tstates", "ticks",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        let value: Value = match path {
            "a" => r.a().into(),
            "f" => r.f().into(),
            "b" => r.get(Reg8::B).into(),
            "c" => r.get(Reg8::C).into(),
            "d" => r.get(Reg8::D).into(),
            "e" => r.get(Reg8::E).into(),
            "h" => r.get(Reg8::H).into(),
            "l" => r.get(Reg8::L).into(),

            "af" => r.af().into(),
            "bc" => r.bc().into(),
            "de" => r.de().into(),
            "hl" => r.hl().into(),

            "a'" => r.get(Reg8::AltA).into(),
            "f'" => r.get(Reg8::AltF).into(),
            "b'" => r.get(Reg8::AltB).into(),
            "c'" => r.get(Reg8::AltC).into(),
            "d'" => r.get(Reg8::AltD).into(),
            "e'" => r.get(Reg8::AltE).into(),
            "h'" => r.get(Reg8::AltH).into(),
            "l'" => r.get(Reg8::AltL).into(),
            "af'" => r.get16(Reg16::AltAf).into(),
            "bc'" => r.get16(Reg16::AltBc).into(),
            "de'" => r.get16(Reg16::AltDe).into(),
            "hl'" => r.get16(Reg16::AltHl).into(),

            "ix" => r.ix().into(),
            "iy" => r.iy().into(),
            "ixh" => r.get(Reg8::Ixh).into(),
            "ixl" => r.get(Reg8::Ixl).into(),
            "iyh" => r.get(Reg8::Iyh).into(),
            "iyl" => r.get(Reg8::Iyl).into(),

            "sp" => r.sp.into(),
            "pc" => r.pc.into(),
            "i" => r.get(Reg8::I).into(),
            "r" => r.get(Reg8::R).into(),
            "wz" => r.wz().into(),

            "flags.s" => (r.f() & SF != 0).into(),
            "flags.z" => (r.f() & ZF != 0).into(),
            "flags.y" => (r.f() & YF != 0).into(),
            "flags.h" => (r.f() & HF != 0).into(),
            "flags.x" => (r.f() & XF != 0).into(),
            "flags.p" => (r.f() & PF != 0).into(),
            "flags.n" => (r.f() & NF != 0).into(),
            "flags.c" => (r.f() & CF != 0).into(),

            "iff1" => r.iff1.into(),
            "iff2" => r.iff2.into(),
            "im" => r.im.into(),
            "active_ei" => r.active_ei.into(),
            "read_iff2" => r.read_iff2.into(),
            "int_pending" => r.int_pending.into(),
            "nmi_pending" => r.nmi_pending.into(),
            "prefix_pending" => r.prefix.is_some().into(),

            "halted" => r.halted.into(),
            "tstates" => self.clock.tstates().into(),
            "ticks" => self.clock.total().get().into(),

            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
