#![no_std]
#![no_main]

mod fmt;
mod hardware;
mod io;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::adc::{Adc, AdcChannel, SampleTime};
use embassy_time::{Duration, Timer};

use g4_pid::config::timer;
use io::{AdcMeasurement, AtomicReference, LatchedActuator};
use tasks::{control_task, status_task};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let clocks = hardware::create_clock_config();
    let p = embassy_stm32::init(clocks);

    info!("g4-pid: fixed-point PID loop on STM32G431VB @ 170MHz");

    let config = state::CONTROLLER_CONFIG;
    if let Err(e) = config.validate() {
        warn!("Controller configuration is degenerate: {}", e);
    }
    info!(
        "Gains (x128): P={}, I={}, D={}",
        config.gains.p, config.gains.i, config.gains.d
    );
    info!(
        "Sampling every {} ticks ({} mHz)",
        config.sample_interval_ticks,
        config.sample_rate_millihertz(timer::TICK_HZ)
    );

    // Measurement on PC1 (ADC2_IN7)
    let mut adc2 = Adc::new(p.ADC2);
    adc2.set_sample_time(SampleTime::CYCLES640_5);
    let measurement = AdcMeasurement::new(adc2, p.PC1.degrade_adc());

    let reference = AtomicReference::new(&state::REFERENCE);
    let actuator = LatchedActuator::new(&state::ACTUATOR_OUTPUT);

    spawner
        .spawn(control_task(config, reference, measurement, actuator))
        .unwrap();
    spawner.spawn(status_task()).unwrap();

    // TIM6 starts raising the sampling condition once the control task exists
    unsafe {
        hardware::init_sample_timer();
    }

    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
