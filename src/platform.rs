// SPDX-License-Identifier: Apache-2.0

//! Platform surface consumed by the counter.
//!
//! Implement these for a concrete chip (see `testapps/` for an STM32 TIM3
//! implementation). None of the operations can fail: they are plain register
//! writes and reads.

/// Width of the hardware count register.
pub trait CountRegister: Copy {
    /// Number of bits before the register wraps back to zero.
    const BITS: u32;

    /// Zero-extends the raw register value.
    fn widen(self) -> u64;
}

macro_rules! impl_count_register {
    ($t:ty) => {
        impl CountRegister for $t {
            const BITS: u32 = <$t>::BITS;

            #[inline(always)]
            fn widen(self) -> u64 {
                self as u64
            }
        }
    };
}
impl_count_register!(u8);
impl_count_register!(u16);
impl_count_register!(u32);

/// Clock source selection for the timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    /// No clock, the count register holds its value.
    Stopped,
    /// Count edges on the external input pin.
    External,
}

/// Input pin carrying the pulses.
pub trait PulseInput {
    /// Put the pin in input mode, routed to the timer's external clock.
    fn configure_input(&mut self);
}

/// Free-running millisecond clock. Wraps to zero after `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    #[inline]
    fn now_ms(&self) -> u32 {
        self()
    }
}

/// Timer peripheral used as an edge counter.
///
/// The overflow interrupt itself is routed by the platform: its handler must
/// call [`OverflowTracker::on_overflow`](crate::OverflowTracker::on_overflow)
/// on the tracker given to the matching [`Counter`](crate::Counter), and
/// clear the pending flag if the hardware does not do so on entry.
pub trait CounterTimer {
    /// Count register type, e.g. `u16` for a 16-bit timer.
    type Count: CountRegister;

    /// Select what drives the count register. Switching to
    /// [`ClockSource::Stopped`] and back is used as a gate around reads.
    fn set_clock_source(&mut self, source: ClockSource);

    /// Zero the count register.
    fn reset_count(&mut self);

    /// Current value of the count register.
    fn read_count(&self) -> Self::Count;

    /// Unmask the overflow interrupt.
    fn enable_overflow_interrupt(&mut self);

    /// Mask the overflow interrupt.
    fn disable_overflow_interrupt(&mut self);

    /// Clear a latched overflow that has not been serviced yet.
    fn clear_overflow_pending(&mut self);

    /// Whether an overflow has latched without its handler having run.
    fn is_overflow_pending(&self) -> bool;
}
