//! Status task
//!
//! Logs the latest control step once per period.

use core::sync::atomic::Ordering;

use embassy_time::{Duration, Ticker};

use g4_pid::config::status::LOG_PERIOD_MS;

use crate::state::{ACTUATOR_OUTPUT, LOOP_STATUS};

#[embassy_executor::task]
pub async fn status_task() {
    info!("Status task started");

    let mut ticker = Ticker::every(Duration::from_millis(LOG_PERIOD_MS));
    let mut last_samples = 0u32;

    loop {
        ticker.next().await;

        let status = *LOOP_STATUS.lock().await;
        let rate = status.samples.wrapping_sub(last_samples);
        last_samples = status.samples;

        debug!(
            "[Control] sp: {}, pv: {}, out: {} (latched {}), I: {}, {} samples/period",
            status.setpoint,
            status.measurement,
            status.output,
            ACTUATOR_OUTPUT.load(Ordering::Relaxed),
            status.integral,
            rate
        );

        if rate == 0 {
            warn!("No control steps in the last period");
        }
    }
}
