//! Cycle-exact Zilog Z80 CPU emulator.
//!
//! Each call to `step()` runs one instruction. Every bus access is charged
//! to the clock at the T-state it happens on, so a bus that adds wait
//! states (memory contention) sees the right timing.

mod alu;
mod cpu;
mod flags;
mod registers;

pub use cpu::Z80;
pub use flags::{
    CF, HALFCARRY_ADD, HALFCARRY_SUB, HF, NF, OVERFLOW_ADD, OVERFLOW_SUB, PARITY, PF, SF, SZ53,
    SZ53P, XF, YF, ZF, lookup, parity, sz53, sz53p,
};
pub use registers::{Reg8, Reg16, Registers};
