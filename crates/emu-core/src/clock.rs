//! Cycle clock.
//!
//! Every bus access the CPU makes advances the clock. Devices that need to
//! timestamp their own state (video beam position, tape edges, audio
//! samples) read it but never advance it.

/// A count of CPU T-states.
///
/// Used for cumulative totals that must never wrap within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign<u32> for Ticks {
    fn add_assign(&mut self, rhs: u32) {
        self.0 += u64::from(rhs);
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

/// The T-state clock shared by the CPU and the bus.
///
/// `tstates` is frame-relative: the owning machine calls [`Clock::restart`]
/// once per frame so contention tables can be indexed directly. `total`
/// only ever grows until a hard reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clock {
    tstates: u32,
    total: Ticks,
}

impl Clock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tstates: 0,
            total: Ticks::ZERO,
        }
    }

    /// Advance by `n` T-states.
    pub fn add(&mut self, n: u32) {
        self.tstates = self.tstates.wrapping_add(n);
        self.total += n;
    }

    /// Advance by one T-state.
    pub fn inc(&mut self) {
        self.add(1);
    }

    /// Fold `tstates` back into the frame that has just started.
    ///
    /// A zero frame length leaves the counter untouched.
    pub fn restart(&mut self, frame_length: u32) {
        if frame_length != 0 {
            self.tstates %= frame_length;
        }
    }

    /// T-states elapsed in the current frame.
    #[must_use]
    pub const fn tstates(&self) -> u32 {
        self.tstates
    }

    /// Overwrite the frame-relative counter (state restore only).
    pub fn set_tstates(&mut self, tstates: u32) {
        self.tstates = tstates;
    }

    /// T-states since the last hard reset.
    #[must_use]
    pub const fn total(&self) -> Ticks {
        self.total
    }

    /// Hard reset: both counters back to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Crystal frequency of a machine, used to size frames.
#[derive(Debug, Clone, Copy)]
pub struct MasterClock {
    /// CPU clock in Hz (e.g. `3_500_000` for a 48K Spectrum).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// T-states per frame at the given frame rate (integer division).
    ///
    /// A zero frame rate has no frame and yields 0, which
    /// [`Clock::restart`] treats as "never wrap".
    #[must_use]
    pub const fn tstates_per_frame(&self, frames_per_second: u64) -> u32 {
        if frames_per_second == 0 {
            return 0;
        }
        (self.frequency_hz / frames_per_second) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_inc_advance_both_counters() {
        let mut clock = Clock::new();
        clock.add(7);
        clock.inc();
        assert_eq!(clock.tstates(), 8);
        assert_eq!(clock.total(), Ticks::new(8));
    }

    #[test]
    fn restart_keeps_overshoot() {
        let mut clock = Clock::new();
        clock.add(69_890);
        clock.restart(69_888);
        assert_eq!(clock.tstates(), 2);
        assert_eq!(clock.total().get(), 69_890);
    }

    #[test]
    fn restart_with_zero_frame_is_noop() {
        let mut clock = Clock::new();
        clock.add(10);
        clock.restart(0);
        assert_eq!(clock.tstates(), 10);
    }

    #[test]
    fn set_tstates_leaves_total_alone() {
        let mut clock = Clock::new();
        clock.add(100);
        clock.set_tstates(5);
        assert_eq!(clock.tstates(), 5);
        assert_eq!(clock.total().get(), 100);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut clock = Clock::new();
        clock.add(1234);
        clock.reset();
        assert_eq!(clock, Clock::new());
    }

    #[test]
    fn frame_length_from_crystal() {
        let crystal = MasterClock::new(3_500_000);
        assert_eq!(crystal.tstates_per_frame(50), 70_000);
    }

    #[test]
    fn zero_frame_rate_gives_no_frame() {
        let crystal = MasterClock::new(3_500_000);
        assert_eq!(crystal.tstates_per_frame(0), 0);

        let mut clock = Clock::new();
        clock.add(123);
        clock.restart(crystal.tstates_per_frame(0));
        assert_eq!(clock.tstates(), 123);
    }

    #[test]
    fn ticks_subtraction_saturates() {
        assert_eq!(Ticks::new(3) - Ticks::new(5), Ticks::ZERO);
        assert_eq!(Ticks::new(3) + Ticks::new(5), Ticks::new(8));
    }
}
