//! CB-prefixed opcodes: rotates, shifts, BIT, RES, SET.

use emu_core::IoBus;

use crate::registers::{Reg8, Reg16};

use super::Z80;

impl Z80 {
    /// Bits 7-6 pick the group, 5-3 the operation or bit number, 2-0 the
    /// operand. Register forms take 8 T-states, `BIT n,(HL)` 12, the other
    /// `(HL)` forms 15.
    pub(super) fn execute_cb<B: IoBus>(&mut self, bus: &mut B, op: u8) {
        let n = (op >> 3) & 7;
        let r = op & 7;

        if r == 6 {
            let hl = self.regs.hl();
            let value = self.read(bus, hl);
            self.read_no_req(bus, hl, 1);
            match op >> 6 {
                // RLC/RRC/RL/RR/SLA/SRA/SLL/SRL (HL)
                0 => {
                    let result = self.regs.shift_op(n, value);
                    self.write(bus, hl, result);
                }
                // BIT n, (HL): X/Y leak from MEMPTR
                1 => {
                    let w = self.regs.get(Reg8::W);
                    self.regs.bit(n, value, w);
                }
                // RES n, (HL)
                2 => self.write(bus, hl, value & !(1 << n)),
                // SET n, (HL)
                _ => self.write(bus, hl, value | (1 << n)),
            }
            return;
        }

        let value = self.reg(r, Reg16::Hl);
        match op >> 6 {
            0 => {
                let result = self.regs.shift_op(n, value);
                self.set_reg(r, Reg16::Hl, result);
            }
            1 => self.regs.bit(n, value, value),
            2 => self.set_reg(r, Reg16::Hl, value & !(1 << n)),
            _ => self.set_reg(r, Reg16::Hl, value | (1 << n)),
        }
    }
}
