// SPDX-License-Identifier: Apache-2.0

use core::sync::atomic::{AtomicU32, Ordering};

/// Number of hardware register wraps since the last [`Counter::start`].
///
/// One tracker belongs to one timer unit. Put it in a `static` so the
/// timer's overflow vector can reach it, and hand the same reference to the
/// [`Counter`] driving that timer.
///
/// The interrupt handler is the only writer, so the increment is a plain
/// load and store. That keeps it usable on cores without atomic
/// read-modify-write (Cortex-M0, AVR).
///
/// [`Counter`]: crate::Counter
/// [`Counter::start`]: crate::Counter::start
pub struct OverflowTracker {
    wraps: AtomicU32,
}

impl OverflowTracker {
    pub const fn new() -> Self {
        OverflowTracker {
            wraps: AtomicU32::new(0),
        }
    }

    /// Overflow handler.
    ///
    /// Call this from the timer's overflow interrupt, once per wrap. Wraps
    /// silently after `u32::MAX` overflows.
    #[inline]
    pub fn on_overflow(&self) {
        let wraps = self.wraps.load(Ordering::Relaxed);
        self.wraps.store(wraps.wrapping_add(1), Ordering::SeqCst);
    }

    /// Interrupt handler for nested interrupts.
    ///
    /// Call this instead of `on_overflow` if a higher priority interrupt
    /// may also bump this tracker.
    #[cfg(feature = "cortex-m")]
    pub fn on_overflow_nested(&self) {
        cortex_m::interrupt::free(|_| {
            self.on_overflow();
        })
    }

    /// Wraps counted so far.
    #[inline]
    pub fn wraps(&self) -> u32 {
        self.wraps.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.wraps.store(0, Ordering::SeqCst);
    }
}

impl OverflowTracker {
    // -------- test-only helpers ----------
    #[cfg(test)]
    pub(crate) fn set_wraps(&self, wraps: u32) {
        self.wraps.store(wraps, Ordering::SeqCst);
    }
}

impl Default for OverflowTracker {
    fn default() -> Self {
        Self::new()
    }
}
