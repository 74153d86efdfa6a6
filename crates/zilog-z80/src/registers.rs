//! Z80 register file.
//!
//! Every 8-bit register lives in one flat cell array. A 16-bit pair is the
//! two adjacent cells `[hi, lo]`, so writing a pair writes both halves and a
//! half written on its own shows through the pair straight away.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};

/// 8-bit register cells, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    AltA,
    AltF,
    AltB,
    AltC,
    AltD,
    AltE,
    AltH,
    AltL,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
    I,
    R,
    W,
    Z,
}

/// 16-bit views. Each pair covers the cells `2n` (high) and `2n + 1` (low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reg16 {
    Af,
    Bc,
    De,
    Hl,
    AltAf,
    AltBc,
    AltDe,
    AltHl,
    Ix,
    Iy,
    Ir,
    /// MEMPTR. Leaks into X/Y of `BIT n,(HL)`.
    Wz,
}

impl Reg16 {
    const fn hi(self) -> usize {
        self as usize * 2
    }

    const fn lo(self) -> usize {
        self as usize * 2 + 1
    }
}

const CELLS: usize = 24;

/// Z80 register file plus interrupt and halt state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    cells: [u8; CELLS],

    pub sp: u16,
    pub pc: u16,

    /// Interrupt mode, 0 to 2.
    pub im: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub halted: bool,
    /// Set by `EI` for the instruction that follows it; blocks INT.
    pub active_ei: bool,
    /// Set by `LD A,I` / `LD A,R` for the instruction that follows.
    pub read_iff2: bool,
    /// INT line level.
    pub int_pending: bool,
    /// NMI edge latched, not yet serviced.
    pub nmi_pending: bool,
    /// A DD/FD prefix was fetched by the last step and applies to the next
    /// opcode. Interrupts wait until it has been used.
    pub prefix: Option<Reg16>,
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn get(&self, reg: Reg8) -> u8 {
        self.cells[reg as usize]
    }

    pub fn set(&mut self, reg: Reg8, value: u8) {
        self.cells[reg as usize] = value;
    }

    #[must_use]
    pub const fn get16(&self, pair: Reg16) -> u16 {
        (self.cells[pair.hi()] as u16) << 8 | self.cells[pair.lo()] as u16
    }

    pub fn set16(&mut self, pair: Reg16, value: u16) {
        self.cells[pair.hi()] = (value >> 8) as u8;
        self.cells[pair.lo()] = value as u8;
    }

    #[must_use]
    pub const fn get_h(&self, pair: Reg16) -> u8 {
        self.cells[pair.hi()]
    }

    #[must_use]
    pub const fn get_l(&self, pair: Reg16) -> u8 {
        self.cells[pair.lo()]
    }

    pub fn set_h(&mut self, pair: Reg16, value: u8) {
        self.cells[pair.hi()] = value;
    }

    pub fn set_l(&mut self, pair: Reg16, value: u8) {
        self.cells[pair.lo()] = value;
    }

    /// Wrapping increment, no flags.
    pub fn inc16(&mut self, pair: Reg16) {
        self.set16(pair, self.get16(pair).wrapping_add(1));
    }

    /// Wrapping decrement, no flags.
    pub fn dec16(&mut self, pair: Reg16) {
        self.set16(pair, self.get16(pair).wrapping_sub(1));
    }

    #[must_use]
    pub const fn is_zero(&self, pair: Reg16) -> bool {
        self.get16(pair) == 0
    }

    /// Exchange two pairs.
    pub fn swap(&mut self, a: Reg16, b: Reg16) {
        let tmp = self.get16(a);
        self.set16(a, self.get16(b));
        self.set16(b, tmp);
    }

    // EX AF,AF'
    pub fn ex_af(&mut self) {
        self.swap(Reg16::Af, Reg16::AltAf);
    }

    // EXX
    pub fn exx(&mut self) {
        self.swap(Reg16::Bc, Reg16::AltBc);
        self.swap(Reg16::De, Reg16::AltDe);
        self.swap(Reg16::Hl, Reg16::AltHl);
    }

    /// Overwrite everything from a saved copy.
    pub fn copy_from(&mut self, other: &Registers) {
        *self = *other;
    }

    /// Power-on state: every register, pointer and flag cleared.
    pub fn hard_reset(&mut self) {
        *self = Self::default();
    }

    /// RESET line: PC, I, R, interrupt mode and interrupt flip-flops only.
    /// The rest of the register file survives.
    pub fn soft_reset(&mut self) {
        self.pc = 0;
        self.set(Reg8::I, 0);
        self.set(Reg8::R, 0);
        self.im = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.active_ei = false;
        self.read_iff2 = false;
        self.halted = false;
        self.int_pending = false;
        self.nmi_pending = false;
        self.prefix = None;
    }

    /// Bump the refresh counter. Bit 7 only changes through `LD R,A`.
    pub fn inc_r(&mut self) {
        let r = self.get(Reg8::R);
        self.set(Reg8::R, (r & 0x80) | (r.wrapping_add(1) & 0x7F));
    }

    // Shorthands used all over the decoder.

    #[must_use]
    pub const fn a(&self) -> u8 {
        self.get(Reg8::A)
    }

    pub fn set_a(&mut self, value: u8) {
        self.set(Reg8::A, value);
    }

    #[must_use]
    pub const fn f(&self) -> u8 {
        self.get(Reg8::F)
    }

    pub fn set_f(&mut self, value: u8) {
        self.set(Reg8::F, value);
    }

    /// True if every bit of `mask` is set in F.
    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.f() & mask == mask
    }

    #[must_use]
    pub const fn carry(&self) -> u8 {
        self.f() & CF
    }

    #[must_use]
    pub const fn af(&self) -> u16 {
        self.get16(Reg16::Af)
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        self.get16(Reg16::Bc)
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        self.get16(Reg16::De)
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        self.get16(Reg16::Hl)
    }

    #[must_use]
    pub const fn ix(&self) -> u16 {
        self.get16(Reg16::Ix)
    }

    #[must_use]
    pub const fn iy(&self) -> u16 {
        self.get16(Reg16::Iy)
    }

    #[must_use]
    pub const fn ir(&self) -> u16 {
        self.get16(Reg16::Ir)
    }

    #[must_use]
    pub const fn wz(&self) -> u16 {
        self.get16(Reg16::Wz)
    }

    pub fn set_wz(&mut self, value: u16) {
        self.set16(Reg16::Wz, value);
    }

    /// F rendered as `SZ5H3PNC`, with `-` for clear bits.
    #[must_use]
    pub fn flags_string(&self) -> String {
        let f = self.f();
        [
            (SF, 'S'),
            (ZF, 'Z'),
            (YF, '5'),
            (HF, 'H'),
            (XF, '3'),
            (PF, 'P'),
            (NF, 'N'),
            (CF, 'C'),
        ]
        .iter()
        .map(|&(mask, c)| if f & mask != 0 { c } else { '-' })
        .collect()
    }
}
