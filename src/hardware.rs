//! Hardware initialisation
//!
//! Clock tree and the TIM6 sampling time base.

use embassy_stm32::{pac, Config};

use g4_pid::config::timer;

use crate::state::SAMPLE_TIMER;

/// System clock after PLL setup
const SYSCLK_HZ: u32 = 170_000_000;

/// TIM6 counter clock after the prescaler
const TIM6_COUNTER_HZ: u32 = 1_000_000;

/// RCC clock configuration
///
/// HSI -> PLL (/4 x85 /2) = 170MHz, ADC12 clocked from SYSCLK
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::mux::{Adcsel, ClockMux};
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: None,
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R;

        let mut clock_mux = ClockMux::default();
        clock_mux.adc12sel = Adcsel::SYS;
        config.rcc.mux = clock_mux;
    }
    config
}

/// Start TIM6 as the sampling time base
///
/// Update interrupt at [`timer::TICK_HZ`]; every interrupt advances
/// [`SAMPLE_TIMER`] by one tick.
///
/// # Safety
/// Direct register access through the PAC. Must run once, after the clocks
/// are configured.
pub unsafe fn init_sample_timer() {
    let rcc = pac::RCC;
    let tim6 = pac::TIM6;

    rcc.apb1enr1().modify(|w| w.set_tim6en(true));

    tim6.cr1().modify(|w| w.set_cen(false));

    // 170MHz / 170 = 1MHz counter, / 100 = 10kHz update
    let psc = (SYSCLK_HZ / TIM6_COUNTER_HZ - 1) as u16;
    let arr = (TIM6_COUNTER_HZ / timer::TICK_HZ - 1) as u16;
    tim6.psc().write_value(psc);
    tim6.arr().write_value(pac::timer::regs::ArrCore(arr as u32));

    // Load the prescaler without taking an interrupt for it
    tim6.cr1()
        .modify(|w| w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY));
    tim6.egr().write(|w| w.set_ug(true));
    tim6.sr().modify(|w| w.set_uif(false));

    tim6.dier().modify(|w| w.set_uie(true));

    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM6_DAC);
        let mut cp = cortex_m::Peripherals::steal();
        cp.NVIC
            .set_priority(pac::Interrupt::TIM6_DAC, timer::IRQ_PRIORITY);
    }

    tim6.cr1().modify(|w| w.set_cen(true));

    info!(
        "TIM6 sampling time base started: {}Hz (PSC={}, ARR={})",
        timer::TICK_HZ,
        psc,
        arr
    );
}

/// TIM6 update interrupt handler
///
/// # Safety
/// Interrupt context only
#[inline(always)]
unsafe fn tim6_irq_handler() {
    let tim6 = pac::TIM6;
    if tim6.sr().read().uif() {
        tim6.sr().modify(|w| w.set_uif(false));
        SAMPLE_TIMER.tick();
    }
}

/// TIM6 interrupt vector (shared with the DAC underrun interrupt)
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM6_DAC() {
    tim6_irq_handler();
}
