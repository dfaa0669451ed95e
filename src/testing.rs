// SPDX-License-Identifier: Apache-2.0

//! Emulated pin, timer and clock for host tests.

use core::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::{Clock, ClockSource, CountRegister, CounterTimer, OverflowTracker, PulseInput};

pub trait MockRegister: CountRegister {
    const MAX: u32;
    fn from_u32(value: u32) -> Self;
    fn to_u32(self) -> u32;
}

macro_rules! impl_mock_register {
    ($t:ty) => {
        impl MockRegister for $t {
            const MAX: u32 = <$t>::MAX as u32;
            fn from_u32(value: u32) -> Self {
                value as $t
            }
            fn to_u32(self) -> u32 {
                self as u32
            }
        }
    };
}
impl_mock_register!(u8);
impl_mock_register!(u16);
impl_mock_register!(u32);

/// Registers of one timer unit, its input pin and a millisecond clock.
pub struct MockHardware<R> {
    pub tracker: OverflowTracker,
    pin_is_input: AtomicBool,
    now_ms: AtomicU32,
    raw: AtomicU32,
    running: AtomicBool,
    overflow_enabled: AtomicBool,
    pending: AtomicBool,         // emulated overflow flag
    defer_isr: AtomicBool,       // hold off the overflow handler
    read_hook: Mutex<Option<fn(&MockHardware<R>)>>, // runs inside read_count
    events: Mutex<Vec<&'static str>>,
    record_events: AtomicBool,
    _register: PhantomData<R>,
}

impl<R: MockRegister> MockHardware<R> {
    pub fn new() -> Self {
        MockHardware {
            tracker: OverflowTracker::new(),
            pin_is_input: AtomicBool::new(false),
            now_ms: AtomicU32::new(0),
            raw: AtomicU32::new(0),
            running: AtomicBool::new(false),
            overflow_enabled: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            defer_isr: AtomicBool::new(false),
            read_hook: Mutex::new(None),
            events: Mutex::new(Vec::new()),
            record_events: AtomicBool::new(true),
            _register: PhantomData,
        }
    }

    pub fn pin(&self) -> MockPin<'_, R> {
        MockPin(self)
    }

    pub fn timer(&self) -> MockTimer<'_, R> {
        MockTimer(self)
    }

    pub fn clock(&self) -> MockClock<'_, R> {
        MockClock(self)
    }

    /// Feed `n` edges into the pin. Dropped while the clock source is stopped.
    pub fn pulses(&self, n: u32) {
        for _ in 0..n {
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            let raw = self.raw.load(Ordering::SeqCst);
            if raw == R::MAX {
                self.raw.store(0, Ordering::SeqCst);
                self.pending.store(true, Ordering::SeqCst);
                if self.overflow_enabled.load(Ordering::SeqCst) && !self.is_isr_deferred() {
                    self.service_isr();
                }
            } else {
                self.raw.store(raw + 1, Ordering::SeqCst);
            }
        }
    }

    /// Run the overflow handler if the flag is latched.
    pub fn service_isr(&self) {
        if self.pending.swap(false, Ordering::SeqCst) {
            self.tracker.on_overflow();
        }
    }

    pub fn set_now(&self, now_ms: u32) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn set_raw(&self, raw: R) {
        self.raw.store(raw.to_u32(), Ordering::SeqCst);
    }

    pub fn raw(&self) -> u32 {
        self.raw.load(Ordering::SeqCst)
    }

    pub fn set_wraps(&self, wraps: u32) {
        self.tracker.set_wraps(wraps);
    }

    pub fn set_pending(&self, pending: bool) {
        self.pending.store(pending, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn set_defer_isr(&self, defer: bool) {
        self.defer_isr.store(defer, Ordering::SeqCst);
    }

    pub fn set_read_hook(&self, hook: Option<fn(&MockHardware<R>)>) {
        *self.read_hook.lock().unwrap() = hook;
    }

    pub fn set_record_events(&self, record: bool) {
        self.record_events.store(record, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn pin_input(&self) -> bool {
        self.pin_is_input.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn overflow_enabled(&self) -> bool {
        self.overflow_enabled.load(Ordering::SeqCst)
    }

    fn is_isr_deferred(&self) -> bool {
        self.defer_isr.load(Ordering::SeqCst)
    }

    fn record(&self, event: &'static str) {
        if self.record_events.load(Ordering::SeqCst) {
            self.events.lock().unwrap().push(event);
        }
    }
}

pub struct MockPin<'a, R>(&'a MockHardware<R>);

impl<R: MockRegister> PulseInput for MockPin<'_, R> {
    fn configure_input(&mut self) {
        self.0.pin_is_input.store(true, Ordering::SeqCst);
        self.0.record("pin input");
    }
}

pub struct MockClock<'a, R>(&'a MockHardware<R>);

impl<R: MockRegister> Clock for MockClock<'_, R> {
    fn now_ms(&self) -> u32 {
        self.0.now_ms.load(Ordering::SeqCst)
    }
}

pub struct MockTimer<'a, R>(&'a MockHardware<R>);

impl<R: MockRegister> CounterTimer for MockTimer<'_, R> {
    type Count = R;

    fn set_clock_source(&mut self, source: ClockSource) {
        let running = source == ClockSource::External;
        self.0.running.store(running, Ordering::SeqCst);
        self.0.record(if running {
            "clock external"
        } else {
            "clock stopped"
        });
    }

    fn reset_count(&mut self) {
        self.0.raw.store(0, Ordering::SeqCst);
        self.0.record("count reset");
    }

    fn read_count(&self) -> R {
        let hook = *self.0.read_hook.lock().unwrap();
        if let Some(hook) = hook {
            hook(self.0);
        }
        self.0.record("count read");
        R::from_u32(self.0.raw.load(Ordering::SeqCst))
    }

    fn enable_overflow_interrupt(&mut self) {
        self.0.overflow_enabled.store(true, Ordering::SeqCst);
        self.0.record("overflow enabled");
        // A latched flag fires as soon as the interrupt is unmasked
        if !self.0.is_isr_deferred() {
            self.0.service_isr();
        }
    }

    fn disable_overflow_interrupt(&mut self) {
        self.0.overflow_enabled.store(false, Ordering::SeqCst);
        self.0.record("overflow disabled");
    }

    fn clear_overflow_pending(&mut self) {
        self.0.pending.store(false, Ordering::SeqCst);
        self.0.record("pending cleared");
    }

    fn is_overflow_pending(&self) -> bool {
        self.0.pending.load(Ordering::SeqCst)
    }
}
