// SPDX-License-Identifier: Apache-2.0
//! Overflow-corrected event counter on top of a narrow hardware timer.
//!
//! The timer peripheral counts edges on an external pin into a small register
//! (16 bits on most 8-bit parts) that wraps silently. Every wrap raises an
//! overflow interrupt; the interrupt handler bumps an [`OverflowTracker`], and
//! [`Counter::count`] folds the wrap count and the raw register into one wide
//! value.
//!
//! ```
//! # use pulse_counter::{ClockSource, Counter, CounterConfig, CounterTimer, OverflowTracker, PulseInput};
//! # struct Pin;
//! # impl PulseInput for Pin { fn configure_input(&mut self) {} }
//! # struct Tim(u16);
//! # impl CounterTimer for Tim {
//! #     type Count = u16;
//! #     fn set_clock_source(&mut self, _: ClockSource) {}
//! #     fn reset_count(&mut self) { self.0 = 0 }
//! #     fn read_count(&self) -> u16 { self.0 }
//! #     fn enable_overflow_interrupt(&mut self) {}
//! #     fn disable_overflow_interrupt(&mut self) {}
//! #     fn clear_overflow_pending(&mut self) {}
//! #     fn is_overflow_pending(&self) -> bool { false }
//! # }
//! static TRACKER: OverflowTracker = OverflowTracker::new();
//!
//! let mut geiger = Counter::new(
//!     CounterConfig::new(Pin, 60_000),
//!     Tim(0),
//!     || 0u32,
//!     &TRACKER,
//! );
//! geiger.start();
//! // From the timer's overflow vector: TRACKER.on_overflow();
//! if geiger.available() {
//!     let _cpm = geiger.count();
//! }
//! ```
#![cfg_attr(not(test), no_std)]

mod clock;
mod counter;
mod overflow;
mod platform;

#[cfg(test)]
mod testing;

#[cfg(feature = "embassy-time-driver")]
pub use clock::EmbassyMillis;
#[cfg(feature = "cortex-m")]
pub use clock::SysTickMillis;
pub use counter::{Counter, CounterConfig};
pub use overflow::OverflowTracker;
pub use platform::{Clock, ClockSource, CountRegister, CounterTimer, PulseInput};
