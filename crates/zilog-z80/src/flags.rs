//! Z80 flag register bits and precomputed flag tables.

/// Sign flag (bit 7) - set if result is negative.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Undocumented flag (bit 5) - copy of bit 5 of result.
pub const YF: u8 = 0b0010_0000;

/// Half-carry flag (bit 4) - carry from bit 3 to bit 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented flag (bit 3) - copy of bit 3 of result.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow flag (bit 2) - parity or overflow depending on instruction.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract flag (bit 1) - set if last operation was subtraction.
pub const NF: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7.
pub const CF: u8 = 0b0000_0001;

/// Half-carry after an add, indexed by [`lookup`]` & 7`.
pub const HALFCARRY_ADD: [u8; 8] = [0, HF, HF, HF, 0, 0, 0, HF];

/// Half-carry after a subtract, indexed by [`lookup`]` & 7`.
pub const HALFCARRY_SUB: [u8; 8] = [0, 0, HF, 0, HF, 0, HF, HF];

/// Overflow after an add, indexed by [`lookup`]` >> 4`.
pub const OVERFLOW_ADD: [u8; 8] = [0, 0, 0, PF, PF, 0, 0, 0];

/// Overflow after a subtract, indexed by [`lookup`]` >> 4`.
pub const OVERFLOW_SUB: [u8; 8] = [0, PF, 0, 0, 0, 0, PF, 0];

/// Digest of bits 3 and 7 of both operands and the result.
///
/// Bits 0-2 hold bit 3 of `a`, `b`, `result`; bits 4-6 hold bit 7 of the
/// same. For 16-bit ops pass the high bytes.
#[must_use]
pub const fn lookup(a: u8, b: u8, result: u8) -> usize {
    (((a & 0x88) >> 3) | ((b & 0x88) >> 2) | ((result & 0x88) >> 1)) as usize
}

/// True if `value` has an even number of set bits.
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones().is_multiple_of(2)
}

/// S, Z and the two undocumented bits for a result.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let mut f = value & (SF | YF | XF);
    if value == 0 {
        f |= ZF;
    }
    f
}

/// [`sz53`] plus parity in P/V.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    let mut f = sz53(value);
    if parity(value) {
        f |= PF;
    }
    f
}

const fn build_sz53(with_parity: bool) -> [u8; 256] {
    let mut t = [0; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = if with_parity { sz53p(i as u8) } else { sz53(i as u8) };
        i += 1;
    }
    t
}

const fn build_parity() -> [u8; 256] {
    let mut t = [0; 256];
    let mut i = 0;
    while i < 256 {
        if parity(i as u8) {
            t[i] = PF;
        }
        i += 1;
    }
    t
}

/// `sz53(n)` for every byte.
pub const SZ53: [u8; 256] = build_sz53(false);

/// `sz53p(n)` for every byte.
pub const SZ53P: [u8; 256] = build_sz53(true);

/// `PF` where the byte has even parity, else 0.
pub const PARITY: [u8; 256] = build_parity();
