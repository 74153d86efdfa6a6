//! CPU core trait.

use crate::IoBus;

/// A CPU core.
///
/// The bus is passed in, not owned, so the machine can keep using it
/// between instructions (paging, video reads). Execution is
/// instruction-granular; the machine polls interrupts between steps.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction (or one HALT fetch). Returns T-states used,
    /// including any wait states the bus injected.
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Current program counter.
    fn pc(&self) -> u16;

    /// Snapshot of all registers.
    fn registers(&self) -> Self::Registers;

    fn is_halted(&self) -> bool;

    /// Offer a maskable interrupt. `ack` runs only if the CPU would accept
    /// it and may veto by returning `false`. Returns true if taken.
    fn interrupt<B: IoBus>(&mut self, bus: &mut B, ack: impl FnMut() -> bool) -> bool;

    /// Assert NMI. Returns true if taken. Only a veto from `ack` or a
    /// boundary inside an instruction refuses it.
    fn nmi<B: IoBus>(&mut self, bus: &mut B, ack: impl FnMut() -> bool) -> bool;

    /// Reset line asserted.
    fn reset(&mut self);
}
