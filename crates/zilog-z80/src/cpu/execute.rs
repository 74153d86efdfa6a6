//! Base opcode table.
//!
//! The same table serves unprefixed code and the DD/FD families: `index`
//! is `Hl` when unprefixed and `Ix`/`Iy` after a prefix. Opcodes that never
//! touch H, L or HL behave identically either way, which is exactly what
//! the hardware does with a prefix it has no use for.

use emu_core::IoBus;

use crate::registers::{Reg8, Reg16};

use super::Z80;

impl Z80 {
    pub(super) fn execute<B: IoBus>(&mut self, bus: &mut B, op: u8, index: Reg16) {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let nn = self.fetch_word(bus);
                self.set_rp(op >> 4, index, nn);
            }

            // LD (BC), A / LD (DE), A
            0x02 | 0x12 => {
                let addr = if op == 0x02 { self.regs.bc() } else { self.regs.de() };
                let a = self.regs.a();
                self.write(bus, addr, a);
                self.regs.set_wz(u16::from_le_bytes([addr.wrapping_add(1) as u8, a]));
            }

            // INC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.ir_cycles(bus, 2);
                let p = op >> 4;
                let value = self.get_rp(p, index).wrapping_add(1);
                self.set_rp(p, index, value);
            }

            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = op >> 3;
                let value = self.reg(r, index);
                let value = self.regs.inc8(value);
                self.set_reg(r, index, value);
            }

            // INC (HL)
            0x34 => {
                let addr = self.operand_addr(bus, index);
                let value = self.read(bus, addr);
                self.read_no_req(bus, addr, 1);
                let value = self.regs.inc8(value);
                self.write(bus, addr, value);
            }

            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = op >> 3;
                let value = self.reg(r, index);
                let value = self.regs.dec8(value);
                self.set_reg(r, index, value);
            }

            // DEC (HL)
            0x35 => {
                let addr = self.operand_addr(bus, index);
                let value = self.read(bus, addr);
                self.read_no_req(bus, addr, 1);
                let value = self.regs.dec8(value);
                self.write(bus, addr, value);
            }

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let n = self.fetch_byte(bus);
                self.set_reg(op >> 3, index, n);
            }

            // LD (HL), n
            0x36 => {
                if index == Reg16::Hl {
                    let n = self.fetch_byte(bus);
                    let hl = self.regs.hl();
                    self.write(bus, hl, n);
                } else {
                    // Displacement and operand are both read before the
                    // two internal cycles.
                    let addr = self.displaced(bus, index);
                    let n = self.fetch_byte(bus);
                    self.read_no_req(bus, self.regs.pc.wrapping_sub(1), 2);
                    self.write(bus, addr, n);
                }
            }

            // RLCA
            0x07 => self.regs.rlca(),

            // EX AF, AF'
            0x08 => self.regs.ex_af(),

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.ir_cycles(bus, 7);
                let value = self.get_rp(op >> 4, index);
                self.regs.add16(index, value);
            }

            // LD A, (BC) / LD A, (DE)
            0x0A | 0x1A => {
                let addr = if op == 0x0A { self.regs.bc() } else { self.regs.de() };
                let value = self.read(bus, addr);
                self.regs.set_a(value);
                self.regs.set_wz(addr.wrapping_add(1));
            }

            // DEC rr
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.ir_cycles(bus, 2);
                let p = op >> 4;
                let value = self.get_rp(p, index).wrapping_sub(1);
                self.set_rp(p, index, value);
            }

            // RRCA
            0x0F => self.regs.rrca(),

            // DJNZ e
            0x10 => {
                self.ir_cycles(bus, 1);
                let b = self.regs.get(Reg8::B).wrapping_sub(1);
                self.regs.set(Reg8::B, b);
                if b == 0 {
                    self.fetch_byte(bus);
                } else {
                    self.jump_relative(bus);
                }
            }

            // RLA
            0x17 => self.regs.rla(),

            // JR e
            0x18 => self.jump_relative(bus),

            // RRA
            0x1F => self.regs.rra(),

            // JR NZ/Z/NC/C, e
            0x20 | 0x28 | 0x30 | 0x38 => {
                if self.condition((op >> 3) & 3) {
                    self.jump_relative(bus);
                } else {
                    self.fetch_byte(bus);
                }
            }

            // LD (nn), HL
            0x22 => {
                let nn = self.fetch_word(bus);
                let value = self.regs.get16(index);
                self.write_word(bus, nn, value);
                self.regs.set_wz(nn.wrapping_add(1));
            }

            // DAA
            0x27 => self.regs.daa(),

            // LD HL, (nn)
            0x2A => {
                let nn = self.fetch_word(bus);
                let value = self.read_word(bus, nn);
                self.regs.set16(index, value);
                self.regs.set_wz(nn.wrapping_add(1));
            }

            // CPL
            0x2F => self.regs.cpl(),

            // LD (nn), A
            0x32 => {
                let nn = self.fetch_word(bus);
                let a = self.regs.a();
                self.write(bus, nn, a);
                self.regs.set_wz(u16::from_le_bytes([nn.wrapping_add(1) as u8, a]));
            }

            // SCF
            0x37 => self.regs.scf(),

            // LD A, (nn)
            0x3A => {
                let nn = self.fetch_word(bus);
                let value = self.read(bus, nn);
                self.regs.set_a(value);
                self.regs.set_wz(nn.wrapping_add(1));
            }

            // CCF
            0x3F => self.regs.ccf(),

            // HALT: PC stays on the opcode until an interrupt.
            0x76 => {
                self.regs.halted = true;
                self.regs.pc = self.regs.pc.wrapping_sub(1);
            }

            // LD r, r' / LD r, (HL) / LD (HL), r
            0x40..=0x75 | 0x77..=0x7F => {
                let dst = (op >> 3) & 7;
                let src = op & 7;
                if src == 6 {
                    // LD H, (IX+d) loads the real H.
                    let addr = self.operand_addr(bus, index);
                    let value = self.read(bus, addr);
                    self.set_reg(dst, Reg16::Hl, value);
                } else if dst == 6 {
                    let value = self.reg(src, Reg16::Hl);
                    let addr = self.operand_addr(bus, index);
                    self.write(bus, addr, value);
                } else {
                    let value = self.reg(src, index);
                    self.set_reg(dst, index, value);
                }
            }

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP r
            0x80..=0xBF => {
                let src = op & 7;
                let value = if src == 6 {
                    let addr = self.operand_addr(bus, index);
                    self.read(bus, addr)
                } else {
                    self.reg(src, index)
                };
                self.regs.alu_op(op >> 3, value);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.ir_cycles(bus, 1);
                if self.condition(op >> 3) {
                    self.ret(bus);
                }
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop(bus);
                self.regs.set16(Self::pair_rp2(op >> 4, index), value);
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let nn = self.fetch_word(bus);
                self.regs.set_wz(nn);
                if self.condition(op >> 3) {
                    self.regs.pc = nn;
                }
            }

            // JP nn
            0xC3 => {
                let nn = self.fetch_word(bus);
                self.regs.set_wz(nn);
                self.regs.pc = nn;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let nn = self.fetch_word(bus);
                self.regs.set_wz(nn);
                if self.condition(op >> 3) {
                    self.call(bus, nn);
                }
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.ir_cycles(bus, 1);
                let value = self.regs.get16(Self::pair_rp2(op >> 4, index));
                self.push(bus, value);
            }

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let n = self.fetch_byte(bus);
                self.regs.alu_op(op >> 3, n);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.ir_cycles(bus, 1);
                self.push(bus, self.regs.pc);
                self.regs.pc = u16::from(op & 0x38);
                self.regs.set_wz(self.regs.pc);
            }

            // RET
            0xC9 => self.ret(bus),

            // CB prefix
            0xCB => {
                let op = self.fetch(bus);
                self.execute_cb(bus, op);
            }

            // CALL nn
            0xCD => {
                let nn = self.fetch_word(bus);
                self.regs.set_wz(nn);
                self.call(bus, nn);
            }

            // OUT (n), A
            0xD3 => {
                let n = self.fetch_byte(bus);
                let a = self.regs.a();
                self.io_write(bus, u16::from_le_bytes([n, a]), a);
                self.regs.set_wz(u16::from_le_bytes([n.wrapping_add(1), a]));
            }

            // EXX
            0xD9 => self.regs.exx(),

            // IN A, (n)
            0xDB => {
                let n = self.fetch_byte(bus);
                let port = u16::from_le_bytes([n, self.regs.a()]);
                let value = self.io_read(bus, port);
                self.regs.set_a(value);
                self.regs.set_wz(port.wrapping_add(1));
            }

            // DD prefix
            0xDD => self.execute_index(bus, Reg16::Ix),

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let value = self.read_word(bus, sp);
                self.read_no_req(bus, sp.wrapping_add(1), 1);
                let [lo, hi] = self.regs.get16(index).to_le_bytes();
                self.write(bus, sp.wrapping_add(1), hi);
                self.write(bus, sp, lo);
                self.write_no_req(bus, sp, 2);
                self.regs.set16(index, value);
                self.regs.set_wz(value);
            }

            // JP (HL)
            0xE9 => self.regs.pc = self.regs.get16(index),

            // EX DE, HL (never indexed)
            0xEB => self.regs.swap(Reg16::De, Reg16::Hl),

            // ED prefix
            0xED => {
                let op = self.fetch(bus);
                self.execute_ed(bus, op);
            }

            // DI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }

            // LD SP, HL
            0xF9 => {
                self.ir_cycles(bus, 2);
                self.regs.sp = self.regs.get16(index);
            }

            // EI
            0xFB => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.regs.active_ei = true;
            }

            // FD prefix
            0xFD => self.execute_index(bus, Reg16::Iy),
        }
    }

    /// JR body: read the displacement, 5 internal cycles, jump.
    fn jump_relative<B: IoBus>(&mut self, bus: &mut B) {
        let pc = self.regs.pc;
        let offset = self.read(bus, pc) as i8;
        self.read_no_req(bus, pc, 5);
        self.regs.pc = pc.wrapping_add(1).wrapping_add_signed(i16::from(offset));
        self.regs.set_wz(self.regs.pc);
    }

    /// Taken CALL: one internal cycle on the high operand byte, then push.
    fn call<B: IoBus>(&mut self, bus: &mut B, target: u16) {
        self.read_no_req(bus, self.regs.pc.wrapping_sub(1), 1);
        self.push(bus, self.regs.pc);
        self.regs.pc = target;
    }

    pub(super) fn ret<B: IoBus>(&mut self, bus: &mut B) {
        self.regs.pc = self.pop(bus);
        self.regs.set_wz(self.regs.pc);
    }
}
