#![no_main]
#![no_std]

use stm32f412_nucleo as lib;

use cortex_m::peripheral::NVIC;
use hal::rcc::Config;
use lib::hal::{self, prelude::*};
use lib::{Pd2Etr, Tim3Counter};
use pulse_counter::{Counter, CounterConfig, OverflowTracker, SysTickMillis};
use rtt_target::{rprintln, rtt_init_log};

const CORE_FREQUENCY: u32 = 100_000_000;
const SHORT_RUN_WINDOWS: u32 = 3;

#[cfg(feature = "window-short")]
const WINDOW_MS: u32 = 10_000;
#[cfg(not(feature = "window-short"))]
const WINDOW_MS: u32 = 60_000;

// Millisecond clock and TIM3 wrap counter - accessible from ISRs and main code
static CLOCK: SysTickMillis = SysTickMillis::new(CORE_FREQUENCY);
static TRACKER: OverflowTracker = OverflowTracker::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().expect("Failed to take core peripherals");
    let dp = hal::pac::Peripherals::take().expect("Failed to take device peripherals");
    let _rcc = dp.RCC.freeze(Config::hse(8.MHz()).sysclk(100.MHz()));

    rtt_init_log!(
        log::LevelFilter::Debug,
        rtt_target::ChannelMode::NoBlockTrim,
        1024
    );

    rprintln!("Hello from STM32F412 Geiger counter !");
    report_configuration();

    CLOCK.start(&mut cp.SYST);
    rprintln!(
        "SysTick millisecond clock at {}MHz",
        CORE_FREQUENCY / 1_000_000
    );

    let mut counter = Counter::new(
        CounterConfig::new(Pd2Etr, WINDOW_MS),
        Tim3Counter::new(dp.TIM3),
        &CLOCK,
        &TRACKER,
    );

    unsafe {
        NVIC::unmask(hal::pac::Interrupt::TIM3);
    }

    counter.start();
    let mut windows = 0u32;

    loop {
        if counter.available() {
            let pulses = if cfg!(feature = "read-compensated") {
                counter.count_compensated()
            } else {
                counter.count()
            };
            windows += 1;
            rprintln!(
                "Window {}: {} pulses in {} ms ({} wraps)",
                windows,
                pulses,
                counter.elapsed_ms(),
                counter.wrap_count()
            );
            log::info!("{} pulses / {} ms", pulses, WINDOW_MS);

            if cfg!(feature = "duration-short") && windows >= SHORT_RUN_WINDOWS {
                break;
            }
            counter.start();
        }
        cortex_m::asm::wfi();
    }

    rprintln!("Completed {} windows", windows);
    stm32f412_nucleo::exit()
}

fn report_configuration() {
    rprintln!("Window: {} ms on PD2 (TIM3_ETR)", WINDOW_MS);
    if cfg!(feature = "isr-nested") {
        rprintln!("Overflow handler: on_overflow_nested");
    } else {
        rprintln!("Overflow handler: on_overflow");
    }
    if cfg!(feature = "read-compensated") {
        rprintln!("Read: count_compensated");
    } else {
        rprintln!("Read: count");
    }
}

// SysTick Interrupt Handler
#[cortex_m_rt::exception]
fn SysTick() {
    CLOCK.systick_handler();
}

// TIM3 Overflow Interrupt Handler
#[hal::interrupt]
fn TIM3() {
    // Clear the overflow interrupt flag
    unsafe {
        let tim3 = &*hal::pac::TIM3::ptr();
        if tim3.sr().read().uif().bit_is_set() {
            tim3.sr().write(|w| w.uif().clear());
        }
    }

    #[cfg(feature = "isr-nested")]
    TRACKER.on_overflow_nested();

    #[cfg(not(feature = "isr-nested"))]
    TRACKER.on_overflow();
}
