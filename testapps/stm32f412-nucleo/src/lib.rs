#![no_main]
#![no_std]

use panic_rtt_target as _;
pub use stm32f4xx_hal as hal;

use hal::pac;
use pulse_counter::{ClockSource, CounterTimer, PulseInput};

pub fn exit() -> ! {
    cortex_m_semihosting::debug::exit(cortex_m_semihosting::debug::EXIT_SUCCESS);
    #[allow(clippy::empty_loop)]
    loop {}
}

/// Hardfault handler.
///
/// Terminates the application and makes a semihosting-capable debug tool exit
/// with an error. This seems better than the default, which is to spin in a
/// loop.
#[cortex_m_rt::exception]
unsafe fn HardFault(_frame: &cortex_m_rt::ExceptionFrame) -> ! {
    cortex_m_semihosting::debug::exit(cortex_m_semihosting::debug::EXIT_FAILURE);
    #[allow(clippy::empty_loop)]
    loop {}
}

/// PD2 routed to TIM3_ETR (AF2).
pub struct Pd2Etr;

impl PulseInput for Pd2Etr {
    fn configure_input(&mut self) {
        // # Safety
        // Only pin 2 bits of GPIOD are touched, nothing else owns them
        unsafe {
            let rcc = &*pac::RCC::ptr();
            rcc.ahb1enr().modify(|_, w| w.gpioden().set_bit());

            let gpiod = &*pac::GPIOD::ptr();
            // MODER2 = alternate function
            gpiod
                .moder()
                .modify(|r, w| w.bits((r.bits() & !(0b11 << 4)) | (0b10 << 4)));
            // No pull, the tube front end drives the line
            gpiod.pupdr().modify(|r, w| w.bits(r.bits() & !(0b11 << 4)));
            // AFRL2 = AF2
            gpiod
                .afrl()
                .modify(|r, w| w.bits((r.bits() & !(0xF << 8)) | (2 << 8)));
        }
    }
}

/// TIM3 counting rising edges on its ETR input (external clock mode 2).
pub struct Tim3Counter {
    tim: pac::TIM3,
}

impl Tim3Counter {
    pub fn new(tim: pac::TIM3) -> Self {
        // # Safety
        // Enabling the TIM3 clock bit only
        unsafe {
            let rcc = &*pac::RCC::ptr();
            rcc.apb1enr().modify(|_, w| w.tim3en().set_bit());
        }
        // Full 16-bit range, update event only on overflow
        tim.arr().write(|w| unsafe { w.bits(0xFFFF) });
        tim.cr1().modify(|_, w| w.urs().set_bit());
        Tim3Counter { tim }
    }
}

impl CounterTimer for Tim3Counter {
    type Count = u16;

    fn set_clock_source(&mut self, source: ClockSource) {
        match source {
            ClockSource::Stopped => self.tim.cr1().modify(|_, w| w.cen().clear_bit()),
            ClockSource::External => {
                self.tim.smcr().modify(|_, w| w.ece().set_bit());
                self.tim.cr1().modify(|_, w| w.cen().set_bit());
            }
        }
    }

    fn reset_count(&mut self) {
        self.tim.cnt().write(|w| unsafe { w.bits(0) });
    }

    fn read_count(&self) -> u16 {
        self.tim.cnt().read().bits() as u16
    }

    fn enable_overflow_interrupt(&mut self) {
        self.tim.dier().modify(|_, w| w.uie().set_bit());
    }

    fn disable_overflow_interrupt(&mut self) {
        self.tim.dier().modify(|_, w| w.uie().clear_bit());
    }

    fn clear_overflow_pending(&mut self) {
        self.tim.sr().write(|w| w.uif().clear());
    }

    fn is_overflow_pending(&self) -> bool {
        self.tim.sr().read().uif().bit_is_set()
    }
}
