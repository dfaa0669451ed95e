// SPDX-License-Identifier: Apache-2.0

#[cfg(feature = "cortex-m")]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "cortex-m")]
use crate::Clock;

/// Millisecond clock driven by the SysTick exception.
///
/// SysTick is programmed to fire once per millisecond; each exception bumps
/// a 32-bit counter which wraps after ~49.7 days, the same way Arduino's
/// `millis()` does.
#[cfg(feature = "cortex-m")]
pub struct SysTickMillis {
    millis: AtomicU32,
    reload_value: u32, // SysTick reload value (max 2^24 - 1)
}

#[cfg(feature = "cortex-m")]
impl SysTickMillis {
    /// Creates a millisecond clock for a SysTick running at `core_hz`.
    ///
    /// # Panics
    ///
    /// * If `core_hz` is below 2 kHz (reload value would be 0)
    /// * If the reload value for one millisecond exceeds 2^24-1, i.e.
    ///   `core_hz` above ~16.7 GHz
    ///
    /// # Examples
    ///
    /// ```
    /// # use pulse_counter::SysTickMillis;
    /// static CLOCK: SysTickMillis = SysTickMillis::new(48_000_000);
    /// assert_eq!(CLOCK.reload_value(), 47_999);
    /// ```
    pub const fn new(core_hz: u32) -> Self {
        if core_hz < 2_000 {
            panic!("Reload value cannot be 0");
        }
        let reload_value = core_hz / 1_000 - 1;
        if reload_value > (1 << 24) - 1 {
            panic!("Reload value too large");
        }
        SysTickMillis {
            millis: AtomicU32::new(0),
            reload_value,
        }
    }

    pub const fn reload_value(&self) -> u32 {
        self.reload_value
    }

    /// SysTick handler.
    ///
    /// Call this from the SysTick exception handler.
    pub fn systick_handler(&self) {
        // Load and store, thumbv6m has no atomic fetch_add
        let millis = self.millis.load(Ordering::Relaxed);
        self.millis.store(millis.wrapping_add(1), Ordering::SeqCst);
    }

    /// Interrupt handler for nested interrupts.
    ///
    /// Call this instead of systick_handler from the interrupt handler, if
    /// you have nested interrupts enabled.
    pub fn systick_interrupt_for_nested(&self) {
        cortex_m::interrupt::free(|_| {
            self.systick_handler();
        })
    }

    /// Call this once before the clock is read.
    pub fn start(&self, syst: &mut cortex_m::peripheral::SYST) {
        syst.set_clock_source(cortex_m::peripheral::syst::SystClkSource::Core);
        syst.set_reload(self.reload_value);
        syst.clear_current();
        syst.enable_interrupt();
        syst.enable_counter();
    }
}

#[cfg(feature = "cortex-m")]
impl Clock for SysTickMillis {
    #[inline]
    fn now_ms(&self) -> u32 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(feature = "cortex-m")]
impl Clock for &SysTickMillis {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Millisecond clock on top of the registered embassy time driver.
///
/// The driver's 64-bit tick count is scaled to milliseconds and truncated,
/// so the result wraps like any other [`Clock`](crate::Clock).
#[cfg(feature = "embassy-time-driver")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyMillis;

#[cfg(feature = "embassy-time-driver")]
impl crate::Clock for EmbassyMillis {
    fn now_ms(&self) -> u32 {
        ticks_to_millis(embassy_time_driver::now(), embassy_time_driver::TICK_HZ)
    }
}

#[cfg(any(test, feature = "embassy-time-driver"))]
const fn ticks_to_millis(ticks: u64, tick_hz: u64) -> u32 {
    let (scaled, overflow) = ticks.overflowing_mul(1_000);
    if !overflow {
        (scaled / tick_hz) as u32
    } else {
        ((ticks as u128 * 1_000) / tick_hz as u128) as u32
    }
}
