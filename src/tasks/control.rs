//! Control task
//!
//! Runs one PID step for every sample raised by TIM6. Between samples it
//! yields to the executor so the status task keeps running.

use embassy_futures::yield_now;

use g4_pid::{ControlLoop, ControllerConfig};

use crate::io::{AdcMeasurement, AtomicReference, LatchedActuator};
use crate::state::{LOOP_STATUS, SAMPLE_READY};

#[embassy_executor::task]
pub async fn control_task(
    config: ControllerConfig,
    reference: AtomicReference,
    measurement: AdcMeasurement,
    actuator: LatchedActuator,
) {
    info!("Control task started");

    let mut control = ControlLoop::new(
        &SAMPLE_READY,
        config.gains,
        reference,
        measurement,
        actuator,
    );

    control
        .run_async(yield_now, |sample, control| {
            // Skip the snapshot rather than stall the loop
            if let Ok(mut status) = LOOP_STATUS.try_lock() {
                status.samples = control.samples();
                status.setpoint = sample.setpoint;
                status.measurement = sample.measurement;
                status.output = sample.output;
                status.integral = control.controller().integral();
            }
        })
        .await
}
