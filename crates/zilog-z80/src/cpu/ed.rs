//! ED-prefixed opcodes.

use emu_core::IoBus;

use crate::flags::{CF, HALFCARRY_SUB, HF, NF, PARITY, PF, SF, SZ53, SZ53P, XF, YF, ZF, lookup};
use crate::registers::{Reg8, Reg16};

use super::Z80;

impl Z80 {
    pub(super) fn execute_ed<B: IoBus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // IN r, (C) / IN F, (C)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let bc = self.regs.bc();
                self.regs.set_wz(bc.wrapping_add(1));
                let value = self.io_read(bus, bc);
                self.regs
                    .set_f(self.regs.carry() | SZ53P[usize::from(value)]);
                let r = (op >> 3) & 7;
                if r != 6 {
                    self.set_reg(r, Reg16::Hl, value);
                }
            }

            // OUT (C), r / OUT (C), 0
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let r = (op >> 3) & 7;
                let value = if r == 6 { 0 } else { self.reg(r, Reg16::Hl) };
                let bc = self.regs.bc();
                self.io_write(bus, bc, value);
                self.regs.set_wz(bc.wrapping_add(1));
            }

            // SBC HL, rr
            0x42 | 0x52 | 0x62 | 0x72 => {
                self.ir_cycles(bus, 7);
                let value = self.get_rp(op >> 4, Reg16::Hl);
                self.regs.sbc16(value);
            }

            // ADC HL, rr
            0x4A | 0x5A | 0x6A | 0x7A => {
                self.ir_cycles(bus, 7);
                let value = self.get_rp(op >> 4, Reg16::Hl);
                self.regs.adc16(value);
            }

            // LD (nn), rr
            0x43 | 0x53 | 0x63 | 0x73 => {
                let nn = self.fetch_word(bus);
                let value = self.get_rp(op >> 4, Reg16::Hl);
                self.write_word(bus, nn, value);
                self.regs.set_wz(nn.wrapping_add(1));
            }

            // LD rr, (nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let nn = self.fetch_word(bus);
                let value = self.read_word(bus, nn);
                self.set_rp(op >> 4, Reg16::Hl, value);
                self.regs.set_wz(nn.wrapping_add(1));
            }

            // NEG
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => self.regs.neg(),

            // RETN / RETI: both copy IFF2 back into IFF1
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.regs.iff1 = self.regs.iff2;
                self.ret(bus);
            }

            // IM 0
            0x46 | 0x4E | 0x66 | 0x6E => self.regs.im = 0,

            // IM 1
            0x56 | 0x76 => self.regs.im = 1,

            // IM 2 (5E and its mirror 7E)
            0x5E | 0x7E => self.regs.im = 2,

            // LD I, A
            0x47 => {
                self.ir_cycles(bus, 1);
                self.regs.set(Reg8::I, self.regs.a());
            }

            // LD R, A (sets bit 7 too)
            0x4F => {
                self.ir_cycles(bus, 1);
                self.regs.set(Reg8::R, self.regs.a());
            }

            // LD A, I / LD A, R
            0x57 | 0x5F => {
                self.ir_cycles(bus, 1);
                let src = if op == 0x57 { Reg8::I } else { Reg8::R };
                let value = self.regs.get(src);
                self.regs.set_a(value);
                self.regs.set_f(
                    self.regs.carry()
                        | SZ53[usize::from(value)]
                        | if self.regs.iff2 { PF } else { 0 },
                );
                self.regs.read_iff2 = true;
            }

            // RRD
            0x67 => {
                let hl = self.regs.hl();
                let value = self.read(bus, hl);
                self.read_no_req(bus, hl, 4);
                self.regs.set_wz(hl.wrapping_add(1));
                let a = self.regs.a();
                self.write(bus, hl, (a << 4) | (value >> 4));
                self.set_a_digit(value & 0x0F);
            }

            // RLD
            0x6F => {
                let hl = self.regs.hl();
                let value = self.read(bus, hl);
                self.read_no_req(bus, hl, 4);
                self.regs.set_wz(hl.wrapping_add(1));
                let a = self.regs.a();
                self.write(bus, hl, (value << 4) | (a & 0x0F));
                self.set_a_digit(value >> 4);
            }

            // LDI / LDD
            0xA0 | 0xA8 => {
                self.block_load(bus, op == 0xA0);
            }

            // CPI / CPD
            0xA1 | 0xA9 => {
                self.block_compare(bus, op == 0xA1);
            }

            // INI / IND
            0xA2 | 0xAA => {
                self.block_in(bus, op == 0xA2);
            }

            // OUTI / OUTD
            0xA3 | 0xAB => {
                self.block_out(bus, op == 0xA3);
            }

            // LDIR / LDDR
            0xB0 | 0xB8 => {
                let de = self.regs.de();
                if self.block_load(bus, op == 0xB0) {
                    self.write_no_req(bus, de, 5);
                    self.repeat();
                }
            }

            // CPIR / CPDR
            0xB1 | 0xB9 => {
                let hl = self.regs.hl();
                if self.block_compare(bus, op == 0xB1) {
                    self.read_no_req(bus, hl, 5);
                    self.repeat();
                }
            }

            // INIR / INDR
            0xB2 | 0xBA => {
                let hl = self.regs.hl();
                if self.block_in(bus, op == 0xB2) {
                    self.write_no_req(bus, hl, 5);
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                }
            }

            // OTIR / OTDR
            0xB3 | 0xBB => {
                if self.block_out(bus, op == 0xB3) {
                    let bc = self.regs.bc();
                    self.read_no_req(bus, bc, 5);
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                }
            }

            // Undefined: 8 T-state NOPs
            0x00..=0x3F
            | 0x77
            | 0x7F
            | 0x80..=0x9F
            | 0xA4..=0xA7
            | 0xAC..=0xAF
            | 0xB4..=0xB7
            | 0xBC..=0xFF => {}
        }
    }

    /// Low nibble of A replaced by `digit`; flags from the new A.
    fn set_a_digit(&mut self, digit: u8) {
        let a = (self.regs.a() & 0xF0) | digit;
        self.regs.set_a(a);
        self.regs.set_f(self.regs.carry() | SZ53P[usize::from(a)]);
    }

    /// Back up over the two opcode bytes to run the instruction again.
    fn repeat(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.set_wz(self.regs.pc.wrapping_add(1));
    }

    fn step_hl(&mut self, increment: bool) {
        if increment {
            self.regs.inc16(Reg16::Hl);
        } else {
            self.regs.dec16(Reg16::Hl);
        }
    }

    /// LDI/LDD. Returns true while BC is non-zero.
    fn block_load<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.read(bus, hl);
        self.write(bus, de, value);
        self.write_no_req(bus, de, 2);

        self.regs.dec16(Reg16::Bc);
        self.step_hl(increment);
        if increment {
            self.regs.inc16(Reg16::De);
        } else {
            self.regs.dec16(Reg16::De);
        }

        let n = value.wrapping_add(self.regs.a());
        let more = !self.regs.is_zero(Reg16::Bc);
        self.regs.set_f(
            (self.regs.f() & (CF | ZF | SF))
                | if more { PF } else { 0 }
                | (n & XF)
                | if n & 0x02 != 0 { YF } else { 0 },
        );
        more
    }

    /// CPI/CPD. Returns true if a repeating form should go round again
    /// (BC non-zero and no match).
    fn block_compare<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let hl = self.regs.hl();
        let value = self.read(bus, hl);
        let a = self.regs.a();
        let mut result = a.wrapping_sub(value);
        let half = HALFCARRY_SUB[lookup(a, value, result) & 7];
        self.read_no_req(bus, hl, 5);

        self.step_hl(increment);
        self.regs.dec16(Reg16::Bc);

        let mut f = self.regs.carry()
            | NF
            | if self.regs.is_zero(Reg16::Bc) { 0 } else { PF }
            | half
            | if result == 0 { ZF } else { 0 }
            | (result & SF);
        if f & HF != 0 {
            result = result.wrapping_sub(1);
        }
        f |= (result & XF) | if result & 0x02 != 0 { YF } else { 0 };
        self.regs.set_f(f);

        let wz = self.regs.wz();
        self.regs
            .set_wz(if increment { wz.wrapping_add(1) } else { wz.wrapping_sub(1) });

        f & (PF | ZF) == PF
    }

    /// Flags shared by the block I/O instructions. `k` is the transferred
    /// byte plus C±1 (input) or L (output), truncated to 8 bits.
    fn block_io_flags(&mut self, value: u8, k: u8) {
        let b = self.regs.get(Reg8::B);
        self.regs.set_f(
            (if value & 0x80 != 0 { NF } else { 0 })
                | (if k < value { HF | CF } else { 0 })
                | PARITY[usize::from((k & 0x07) ^ b)]
                | SZ53[usize::from(b)],
        );
    }

    /// INI/IND. Returns true while B is non-zero.
    fn block_in<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        self.ir_cycles(bus, 1);
        let bc = self.regs.bc();
        let value = self.io_read(bus, bc);
        let hl = self.regs.hl();
        self.write(bus, hl, value);

        self.regs
            .set_wz(if increment { bc.wrapping_add(1) } else { bc.wrapping_sub(1) });
        let b = self.regs.get(Reg8::B).wrapping_sub(1);
        self.regs.set(Reg8::B, b);
        self.step_hl(increment);

        let c = self.regs.get(Reg8::C);
        let c = if increment { c.wrapping_add(1) } else { c.wrapping_sub(1) };
        self.block_io_flags(value, value.wrapping_add(c));
        b != 0
    }

    /// OUTI/OUTD. B is decremented before it goes on the bus. Returns true
    /// while B is non-zero.
    fn block_out<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        self.ir_cycles(bus, 1);
        let hl = self.regs.hl();
        let value = self.read(bus, hl);
        let b = self.regs.get(Reg8::B).wrapping_sub(1);
        self.regs.set(Reg8::B, b);

        let bc = self.regs.bc();
        self.regs
            .set_wz(if increment { bc.wrapping_add(1) } else { bc.wrapping_sub(1) });
        self.io_write(bus, bc, value);
        self.step_hl(increment);

        let l = self.regs.get(Reg8::L);
        self.block_io_flags(value, value.wrapping_add(l));
        b != 0
    }
}
