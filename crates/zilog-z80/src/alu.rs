//! ALU operations for the Z80.
//!
//! Flags come from the lookup tables in [`crate::flags`]: raw carry out of
//! the widened result, half-carry and overflow from the bit 3/7 digest, and
//! S/Z/5/3(/P) from `SZ53`/`SZ53P`.

use crate::flags::{
    CF, HALFCARRY_ADD, HALFCARRY_SUB, HF, NF, OVERFLOW_ADD, OVERFLOW_SUB, PARITY, PF, SF, SZ53,
    SZ53P, XF, YF, ZF, lookup,
};
use crate::registers::{Reg16, Registers};

impl Registers {
    fn add_with_carry(&mut self, value: u8, carry: u8) {
        let a = self.a();
        let wide = u16::from(a) + u16::from(value) + u16::from(carry);
        let result = wide as u8;
        let i = lookup(a, value, result);
        self.set_a(result);
        self.set_f(
            (if wide & 0x100 != 0 { CF } else { 0 })
                | HALFCARRY_ADD[i & 7]
                | OVERFLOW_ADD[i >> 4]
                | SZ53[usize::from(result)],
        );
    }

    /// Subtract without storing. Returns the 8-bit result and its flags.
    fn sub_with_carry(&self, value: u8, carry: u8) -> (u8, u8) {
        let a = self.a();
        let wide = u16::from(a)
            .wrapping_sub(u16::from(value))
            .wrapping_sub(u16::from(carry));
        let result = wide as u8;
        let i = lookup(a, value, result);
        let flags = (if wide & 0x100 != 0 { CF } else { 0 })
            | NF
            | HALFCARRY_SUB[i & 7]
            | OVERFLOW_SUB[i >> 4]
            | SZ53[usize::from(result)];
        (result, flags)
    }

    // ADD A, v
    pub fn add_a(&mut self, value: u8) {
        self.add_with_carry(value, 0);
    }

    // ADC A, v
    pub fn adc_a(&mut self, value: u8) {
        self.add_with_carry(value, self.carry());
    }

    // SUB v
    pub fn sub_a(&mut self, value: u8) {
        let (result, flags) = self.sub_with_carry(value, 0);
        self.set_a(result);
        self.set_f(flags);
    }

    // SBC A, v
    pub fn sbc_a(&mut self, value: u8) {
        let (result, flags) = self.sub_with_carry(value, self.carry());
        self.set_a(result);
        self.set_f(flags);
    }

    // AND v
    pub fn and_a(&mut self, value: u8) {
        let result = self.a() & value;
        self.set_a(result);
        self.set_f(HF | SZ53P[usize::from(result)]);
    }

    // OR v
    pub fn or_a(&mut self, value: u8) {
        let result = self.a() | value;
        self.set_a(result);
        self.set_f(SZ53P[usize::from(result)]);
    }

    // XOR v
    pub fn xor_a(&mut self, value: u8) {
        let result = self.a() ^ value;
        self.set_a(result);
        self.set_f(SZ53P[usize::from(result)]);
    }

    /// CP v. Bits 5 and 3 come from the operand, not the result.
    pub fn cp_a(&mut self, value: u8) {
        let (_, flags) = self.sub_with_carry(value, 0);
        self.set_f((flags & !(YF | XF)) | (value & (YF | XF)));
    }

    /// One of the eight accumulator ops, by opcode bits 5-3:
    /// ADD ADC SUB SBC AND XOR OR CP.
    pub fn alu_op(&mut self, op: u8, value: u8) {
        match op & 7 {
            0 => self.add_a(value),
            1 => self.adc_a(value),
            2 => self.sub_a(value),
            3 => self.sbc_a(value),
            4 => self.and_a(value),
            5 => self.xor_a(value),
            6 => self.or_a(value),
            _ => self.cp_a(value),
        }
    }

    /// INC r. Carry is preserved.
    pub fn inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_f(
            self.carry()
                | (if result == 0x80 { PF } else { 0 })
                | (if result & 0x0F == 0 { HF } else { 0 })
                | SZ53[usize::from(result)],
        );
        result
    }

    /// DEC r. Carry is preserved.
    pub fn dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_f(
            self.carry()
                | NF
                | (if value & 0x0F == 0 { HF } else { 0 })
                | (if result == 0x7F { PF } else { 0 })
                | SZ53[usize::from(result)],
        );
        result
    }

    pub fn rlc(&mut self, value: u8) -> u8 {
        let result = value.rotate_left(1);
        self.set_f((result & CF) | SZ53P[usize::from(result)]);
        result
    }

    pub fn rrc(&mut self, value: u8) -> u8 {
        let result = value.rotate_right(1);
        self.set_f((value & CF) | SZ53P[usize::from(result)]);
        result
    }

    pub fn rl(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.carry();
        self.set_f((value >> 7) | SZ53P[usize::from(result)]);
        result
    }

    pub fn rr(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | (self.carry() << 7);
        self.set_f((value & CF) | SZ53P[usize::from(result)]);
        result
    }

    pub fn sla(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.set_f((value >> 7) | SZ53P[usize::from(result)]);
        result
    }

    pub fn sra(&mut self, value: u8) -> u8 {
        let result = (value & 0x80) | (value >> 1);
        self.set_f((value & CF) | SZ53P[usize::from(result)]);
        result
    }

    /// Undocumented: shift left, bit 0 set.
    pub fn sll(&mut self, value: u8) -> u8 {
        let result = (value << 1) | 1;
        self.set_f((value >> 7) | SZ53P[usize::from(result)]);
        result
    }

    pub fn srl(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.set_f((value & CF) | SZ53P[usize::from(result)]);
        result
    }

    /// CB rotate/shift by opcode bits 5-3: RLC RRC RL RR SLA SRA SLL SRL.
    pub fn shift_op(&mut self, op: u8, value: u8) -> u8 {
        match op & 7 {
            0 => self.rlc(value),
            1 => self.rrc(value),
            2 => self.rl(value),
            3 => self.rr(value),
            4 => self.sla(value),
            5 => self.sra(value),
            6 => self.sll(value),
            _ => self.srl(value),
        }
    }

    /// BIT n. Bits 5 and 3 come from `xy`: the operand for registers, W for
    /// `(HL)`, the address high byte for `(IX+d)`.
    pub fn bit(&mut self, n: u8, value: u8, xy: u8) {
        let mut f = self.carry() | HF | (xy & (YF | XF));
        if value & (1 << n) == 0 {
            f |= PF | ZF;
        }
        if n == 7 && value & 0x80 != 0 {
            f |= SF;
        }
        self.set_f(f);
    }

    // DAA
    pub fn daa(&mut self) {
        let a = self.a();
        let f = self.f();
        let mut correction = 0;
        let mut carry = f & CF;
        if f & HF != 0 || a & 0x0F > 9 {
            correction = 6;
        }
        if carry != 0 || a > 0x99 {
            correction |= 0x60;
        }
        if a > 0x99 {
            carry = CF;
        }
        if f & NF != 0 {
            self.sub_a(correction);
        } else {
            self.add_a(correction);
        }
        let result = self.a();
        self.set_f((self.f() & !(CF | PF)) | carry | PARITY[usize::from(result)]);
    }

    /// ADD HL/IX/IY, rr. S, Z and P/V survive; WZ = old value + 1.
    pub fn add16(&mut self, pair: Reg16, value: u16) {
        let base = self.get16(pair);
        let wide = u32::from(base) + u32::from(value);
        let result = wide as u16;
        let i = lookup((base >> 8) as u8, (value >> 8) as u8, (result >> 8) as u8);
        self.set_wz(base.wrapping_add(1));
        self.set16(pair, result);
        self.set_f(
            (self.f() & (PF | ZF | SF))
                | (if wide & 0x1_0000 != 0 { CF } else { 0 })
                | ((result >> 8) as u8 & (YF | XF))
                | HALFCARRY_ADD[i & 7],
        );
    }

    // ADC HL, rr
    pub fn adc16(&mut self, value: u16) {
        let hl = self.hl();
        let wide = u32::from(hl) + u32::from(value) + u32::from(self.carry());
        let result = wide as u16;
        let i = lookup((hl >> 8) as u8, (value >> 8) as u8, (result >> 8) as u8);
        self.set_wz(hl.wrapping_add(1));
        self.set16(Reg16::Hl, result);
        self.set_f(
            (if wide & 0x1_0000 != 0 { CF } else { 0 })
                | OVERFLOW_ADD[i >> 4]
                | ((result >> 8) as u8 & (YF | XF | SF))
                | HALFCARRY_ADD[i & 7]
                | (if result == 0 { ZF } else { 0 }),
        );
    }

    // SBC HL, rr
    pub fn sbc16(&mut self, value: u16) {
        let hl = self.hl();
        let wide = u32::from(hl)
            .wrapping_sub(u32::from(value))
            .wrapping_sub(u32::from(self.carry()));
        let result = wide as u16;
        let i = lookup((hl >> 8) as u8, (value >> 8) as u8, (result >> 8) as u8);
        self.set_wz(hl.wrapping_add(1));
        self.set16(Reg16::Hl, result);
        self.set_f(
            (if wide & 0x1_0000 != 0 { CF } else { 0 })
                | NF
                | OVERFLOW_SUB[i >> 4]
                | ((result >> 8) as u8 & (YF | XF | SF))
                | HALFCARRY_SUB[i & 7]
                | (if result == 0 { ZF } else { 0 }),
        );
    }

    // RLCA
    pub fn rlca(&mut self) {
        let a = self.a().rotate_left(1);
        self.set_a(a);
        self.set_f((self.f() & (PF | ZF | SF)) | (a & (CF | YF | XF)));
    }

    // RRCA
    pub fn rrca(&mut self) {
        let old = self.a();
        let a = old.rotate_right(1);
        self.set_a(a);
        self.set_f((self.f() & (PF | ZF | SF)) | (old & CF) | (a & (YF | XF)));
    }

    // RLA
    pub fn rla(&mut self) {
        let old = self.a();
        let a = (old << 1) | self.carry();
        self.set_a(a);
        self.set_f((self.f() & (PF | ZF | SF)) | (a & (YF | XF)) | (old >> 7));
    }

    // RRA
    pub fn rra(&mut self) {
        let old = self.a();
        let a = (old >> 1) | (self.carry() << 7);
        self.set_a(a);
        self.set_f((self.f() & (PF | ZF | SF)) | (a & (YF | XF)) | (old & CF));
    }

    // CPL
    pub fn cpl(&mut self) {
        let a = !self.a();
        self.set_a(a);
        self.set_f((self.f() & (CF | PF | ZF | SF)) | (a & (YF | XF)) | NF | HF);
    }

    // NEG
    pub fn neg(&mut self) {
        let value = self.a();
        self.set_a(0);
        self.sub_a(value);
    }

    // SCF
    pub fn scf(&mut self) {
        self.set_f((self.f() & (PF | ZF | SF)) | (self.a() & (YF | XF)) | CF);
    }

    // CCF
    pub fn ccf(&mut self) {
        let f = self.f();
        self.set_f(
            (f & (PF | ZF | SF)) | (if f & CF != 0 { HF } else { CF }) | (self.a() & (YF | XF)),
        );
    }
}
