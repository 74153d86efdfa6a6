//! DD/FD prefixes and the DDCB/FDCB family.

use emu_core::IoBus;

use crate::registers::Reg16;

use super::Z80;

impl Z80 {
    /// Run the instruction after a DD or FD prefix byte.
    ///
    /// A second prefix ends the step: it becomes the pending prefix and the
    /// next step carries on from it, so a run of prefixes costs 4 T-states
    /// per byte and every step returns. ED drops the index prefix entirely.
    pub(super) fn execute_index<B: IoBus>(&mut self, bus: &mut B, index: Reg16) {
        let op = self.fetch(bus);
        match op {
            0xDD => self.regs.prefix = Some(Reg16::Ix),
            0xFD => self.regs.prefix = Some(Reg16::Iy),
            0xCB => self.execute_index_cb(bus, index),
            0xED => {
                let op = self.fetch(bus);
                self.execute_ed(bus, op);
            }
            _ => self.execute(bus, op, index),
        }
    }

    /// `index + d`, with `d` read from PC. Sets MEMPTR to the result.
    pub(super) fn displaced<B: IoBus>(&mut self, bus: &mut B, index: Reg16) -> u16 {
        let d = self.fetch_byte(bus) as i8;
        let addr = self.regs.get16(index).wrapping_add_signed(i16::from(d));
        self.regs.set_wz(addr);
        addr
    }

    /// Address of the `(HL)` operand. Indexed forms add the displacement
    /// read and 5 internal cycles on its address.
    pub(super) fn operand_addr<B: IoBus>(&mut self, bus: &mut B, index: Reg16) -> u16 {
        if index == Reg16::Hl {
            return self.regs.hl();
        }
        let addr = self.displaced(bus, index);
        self.read_no_req(bus, self.regs.pc.wrapping_sub(1), 5);
        addr
    }

    /// DD CB d op / FD CB d op.
    ///
    /// `d` and `op` are plain reads, not M1 cycles, so R only moves twice.
    /// Anything but BIT also copies the result into the register named by
    /// the low three bits (undocumented).
    fn execute_index_cb<B: IoBus>(&mut self, bus: &mut B, index: Reg16) {
        let addr = self.displaced(bus, index);
        let pc = self.regs.pc;
        let op = self.read(bus, pc);
        self.read_no_req(bus, pc, 2);
        self.regs.pc = pc.wrapping_add(1);

        let value = self.read(bus, addr);
        self.read_no_req(bus, addr, 1);

        let n = (op >> 3) & 7;
        let result = match op >> 6 {
            // BIT n, (IX+d): X/Y from the address high byte
            1 => {
                self.regs.bit(n, value, (addr >> 8) as u8);
                return;
            }
            0 => self.regs.shift_op(n, value),
            2 => value & !(1 << n),
            _ => value | (1 << n),
        };
        self.write(bus, addr, result);

        let r = op & 7;
        if r != 6 {
            self.set_reg(r, Reg16::Hl, result);
        }
    }
}
