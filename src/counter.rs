// SPDX-License-Identifier: Apache-2.0

use crate::{Clock, ClockSource, CountRegister, CounterTimer, OverflowTracker, PulseInput};

/// Pin and observation window of a [`Counter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterConfig<P> {
    pub pin: P,
    /// Observation window in milliseconds.
    pub window_ms: u32,
}

impl<P> CounterConfig<P> {
    pub const fn new(pin: P, window_ms: u32) -> Self {
        CounterConfig { pin, window_ms }
    }
}

/// Overflow-corrected pulse counter.
///
/// Counts edges on `config.pin` with the timer `T`, folding every hardware
/// wrap recorded by the [`OverflowTracker`] into a 64-bit result. The
/// observation window is measured with the clock `C`.
///
/// # Numeric limits
///
/// The wrap count is 32 bits wide. With a 16-bit register the result stays
/// exact for up to 2^48 pulses per session; past that the wrap count rolls
/// over silently. Size the window against the expected pulse rate.
pub struct Counter<'a, P, T, C> {
    config: CounterConfig<P>,
    timer: T,
    clock: C,
    tracker: &'a OverflowTracker,
    start_ms: u32,   // clock reading at the last start()
    last_count: u64, // result of the last count()
}

impl<'a, P, T, C> Counter<'a, P, T, C>
where
    P: PulseInput,
    T: CounterTimer,
    C: Clock,
{
    /// Creates a counter. Does not touch the hardware until [`start`](Self::start).
    ///
    /// `tracker` must be the one bumped by `timer`'s overflow interrupt.
    pub fn new(
        config: CounterConfig<P>,
        timer: T,
        clock: C,
        tracker: &'a OverflowTracker,
    ) -> Self {
        Counter {
            config,
            timer,
            clock,
            tracker,
            start_ms: 0,
            last_count: 0,
        }
    }

    /// Resets everything and starts counting.
    ///
    /// Can be called again at any time to begin a new session.
    pub fn start(&mut self) {
        log::debug!(
            "starting pulse counter: {} bit register, {} ms window",
            <T::Count as CountRegister>::BITS,
            self.config.window_ms
        );

        self.config.pin.configure_input();

        // Nothing may be counted or notified until the state is zeroed
        self.timer.disable_overflow_interrupt();
        self.timer.set_clock_source(ClockSource::Stopped);

        self.timer.reset_count();
        self.tracker.reset();
        self.last_count = 0;

        // A stale flag would turn into a phantom wrap on enable
        self.timer.clear_overflow_pending();
        self.timer.enable_overflow_interrupt();

        self.start_ms = self.clock.now_ms();

        // Counting begins here
        self.timer.set_clock_source(ClockSource::External);
    }

    /// Returns the number of pulses since [`start`](Self::start).
    ///
    /// The timer is gated off just long enough to read a stable register
    /// value, then gated back on; pulses arriving in that window are lost.
    ///
    /// ## Race
    /// Overflow interrupts stay enabled across the read so no wrap is
    /// dropped. As a consequence, if the register wrapped right before the
    /// gate and its handler has not run yet when the wrap count is read, the
    /// result is one wrap (`2^BITS`) low. See
    /// [`count_compensated`](Self::count_compensated) for a variant that
    /// checks the pending flag.
    pub fn count(&mut self) -> u64 {
        self.timer.set_clock_source(ClockSource::Stopped);
        let raw = self.timer.read_count();
        self.timer.set_clock_source(ClockSource::External);

        let total = Self::combine(self.tracker.wraps(), raw);
        self.last_count = total;
        log::trace!("pulse count {} (raw {})", total, raw.widen());
        total
    }

    /// Like [`count`](Self::count), but compensates for one wrap whose
    /// interrupt has latched without being serviced yet.
    ///
    /// The wrap count is read before and after the gated register read; if
    /// the handler ran in between, the read is retried. When the pending flag
    /// is set the register already holds the post-wrap value, so one wrap is
    /// added. More than one unserviced wrap cannot be detected.
    pub fn count_compensated(&mut self) -> u64 {
        loop {
            let wraps_pre = self.tracker.wraps();

            self.timer.set_clock_source(ClockSource::Stopped);
            let raw = self.timer.read_count();
            let is_pending = self.timer.is_overflow_pending();
            self.timer.set_clock_source(ClockSource::External);

            let wraps_post = self.tracker.wraps();

            // Handler ran during the read; the flag and wraps may disagree
            if wraps_pre != wraps_post {
                continue;
            }

            let wraps = if is_pending {
                wraps_pre.wrapping_add(1)
            } else {
                wraps_pre
            };

            let total = Self::combine(wraps, raw);
            self.last_count = total;
            log::trace!(
                "pulse count {} (raw {}, pending {})",
                total,
                raw.widen(),
                is_pending
            );
            return total;
        }
    }

    /// Whether the observation window has elapsed since the last start.
    pub fn available(&self) -> bool {
        self.elapsed_ms() >= self.config.window_ms
    }

    /// Milliseconds since the last start, tolerating one clock wrap.
    pub fn elapsed_ms(&self) -> u32 {
        let now = self.clock.now_ms();
        if now >= self.start_ms {
            now - self.start_ms
        } else {
            // Clock wrapped: MAX + now - start, which cannot overflow here
            (u32::MAX - self.start_ms) + now
        }
    }

    /// Result of the most recent [`count`](Self::count).
    pub fn last_count(&self) -> u64 {
        self.last_count
    }

    /// Clock reading taken by the last [`start`](Self::start).
    pub fn start_ms(&self) -> u32 {
        self.start_ms
    }

    /// Register wraps recorded in the current session.
    pub fn wrap_count(&self) -> u32 {
        self.tracker.wraps()
    }

    pub fn config(&self) -> &CounterConfig<P> {
        &self.config
    }

    /// Releases the pin, timer and clock.
    pub fn release(self) -> (CounterConfig<P>, T, C) {
        (self.config, self.timer, self.clock)
    }

    #[inline(always)]
    fn combine(wraps: u32, raw: T::Count) -> u64 {
        let bits = <T::Count as CountRegister>::BITS;
        ((wraps as u64) << bits) + raw.widen()
    }
}
