//! Shared state
//!
//! Statics shared between the TIM6 interrupt and the tasks. The interrupt only
//! touches atomics; the status snapshot is behind a Mutex.

use core::sync::atomic::AtomicI16;

use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::mutex::Mutex;

use g4_pid::config::{ControllerConfig, DEFAULT_REFERENCE};
use g4_pid::{SamplingFlag, TimingSource};

/// Gains and sampling interval used by both TIM6 and the control task
pub const CONTROLLER_CONFIG: ControllerConfig = ControllerConfig::DEFAULT;

/// "Sample ready" condition (raised by TIM6, consumed by the control task)
pub static SAMPLE_READY: SamplingFlag = SamplingFlag::new();

/// Divides the TIM6 ticks down to the sampling rate
pub static SAMPLE_TIMER: TimingSource<'static> =
    TimingSource::new(&SAMPLE_READY, CONTROLLER_CONFIG.sample_interval_ticks);

/// Set-point read by the control task
pub static REFERENCE: AtomicI16 = AtomicI16::new(DEFAULT_REFERENCE);

/// Last controller output
pub static ACTUATOR_OUTPUT: AtomicI16 = AtomicI16::new(0);

/// Snapshot of the control loop for the status task
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopStatus {
    pub samples: u32,
    pub setpoint: i16,
    pub measurement: i16,
    pub output: i16,
    pub integral: i32,
}

impl LoopStatus {
    pub const fn new() -> Self {
        Self {
            samples: 0,
            setpoint: 0,
            measurement: 0,
            output: 0,
            integral: 0,
        }
    }
}

pub static LOOP_STATUS: Mutex<ThreadModeRawMutex, LoopStatus> = Mutex::new(LoopStatus::new());
