//! Fixed-point PID controller
//!
//! Discrete PID for a constant sampling interval using integer arithmetic only.
//! Gains are pre-scaled by [`SCALING_FACTOR`]; every intermediate result is kept
//! in a wider type or clamped before it can overflow, so the controller always
//! returns a bounded output instead of wrapping.

use crate::config::params::{MAX_INTEGRAL_MAGNITUDE, MAX_OUTPUT_MAGNITUDE, SCALING_FACTOR};

/// P, I and D gains, each pre-multiplied by [`SCALING_FACTOR`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gains {
    /// Proportional gain
    pub p: i16,
    /// Integral gain
    pub i: i16,
    /// Derivative gain
    pub d: i16,
}

impl Gains {
    /// A controller with these gains never actuates
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Gains that are already scaled
    pub const fn new(p: i16, i: i16, d: i16) -> Self {
        Self { p, i, d }
    }

    /// Gains given in thousandths (1000 == 1.0)
    ///
    /// The result is scaled by [`SCALING_FACTOR`], truncated toward zero and
    /// saturated to the `i16` range.
    pub const fn from_milli(p: i32, i: i32, d: i32) -> Self {
        Self {
            p: scale_milli(p),
            i: scale_milli(i),
            d: scale_milli(d),
        }
    }
}

const fn scale_milli(milli: i32) -> i16 {
    let scaled = milli as i64 * SCALING_FACTOR as i64 / 1000;
    if scaled > i16::MAX as i64 {
        i16::MAX
    } else if scaled < i16::MIN as i64 {
        i16::MIN
    } else {
        scaled as i16
    }
}

/// Largest error whose proportional term cannot overflow `MAX_OUTPUT_MAGNITUDE`
pub const fn error_limit(p_gain: i16) -> i16 {
    (MAX_OUTPUT_MAGNITUDE as i32 / (p_gain.unsigned_abs() as i32 + 1)) as i16
}

/// Largest accumulator whose integral term cannot overflow `MAX_INTEGRAL_MAGNITUDE`
pub const fn integral_limit(i_gain: i16) -> i32 {
    MAX_INTEGRAL_MAGNITUDE / (i_gain.unsigned_abs() as i32 + 1)
}

/// Per-term breakdown of one control step (all values before scaling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTerms {
    pub p: i32,
    pub i: i32,
    pub d: i64,
    /// Final saturated controller output
    pub output: i16,
}

/// State of one PID controller
///
/// **Note**
/// - Works with constant sampling interval only
/// - Derivative is taken on the measurement, not on the error
/// - Integral anti-windup freezes the accumulator itself at its bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    /// Running sum of errors (integral term before gain)
    integral_accumulator: i32,
    /// Measurement of the previous step
    last_measurement: i16,
    /// Scaled gains
    gains: Gains,
    /// Error magnitude above which the P term saturates
    max_error: i16,
    /// Accumulator bound
    max_integral_sum: i32,
}

impl ControllerState {
    /// Create a new controller
    ///
    /// # Arguments
    /// * `gains` - P, I and D gains pre-scaled by [`SCALING_FACTOR`]
    ///
    /// The overflow limits are derived once here. Very large gains yield a
    /// limit of 0, which permanently saturates the corresponding term;
    /// [`ControllerConfig::validate`](crate::config::ControllerConfig::validate)
    /// reports that case.
    pub fn new(gains: Gains) -> Self {
        let state = Self {
            integral_accumulator: 0,
            last_measurement: 0,
            gains,
            max_error: error_limit(gains.p),
            max_integral_sum: integral_limit(gains.i),
        };
        debug!(
            "PID init: Kp={}, Ki={}, Kd={}, max_error={}, max_integral_sum={}",
            gains.p,
            gains.i,
            gains.d,
            state.max_error,
            state.max_integral_sum
        );
        state
    }

    /// Run one control step
    ///
    /// # Arguments
    /// * `setpoint` - Desired value
    /// * `measurement` - Measured process value
    ///
    /// # Returns
    /// Controller output within `±MAX_OUTPUT_MAGNITUDE`
    #[inline]
    pub fn step(&mut self, setpoint: i16, measurement: i16) -> i16 {
        self.step_terms(setpoint, measurement).output
    }

    /// Run one control step and return the individual terms
    ///
    /// Same computation as [`step`](Self::step); the order of operations is
    /// fixed because it determines rounding.
    pub fn step_terms(&mut self, setpoint: i16, measurement: i16) -> StepTerms {
        let max_output = MAX_OUTPUT_MAGNITUDE as i32;
        let error = setpoint as i32 - measurement as i32;

        // P: clamp before multiplying so the product cannot overflow
        let max_error = self.max_error as i32;
        let p = if error > max_error {
            saturated(self.gains.p, max_output)
        } else if error < -max_error {
            saturated(self.gains.p, -max_output)
        } else {
            self.gains.p as i32 * error
        };

        // I: the accumulator stops at its bound (anti-windup)
        let candidate = self.integral_accumulator + error;
        let i = if candidate > self.max_integral_sum {
            self.integral_accumulator = self.max_integral_sum;
            saturated(self.gains.i, MAX_INTEGRAL_MAGNITUDE)
        } else if candidate < -self.max_integral_sum {
            self.integral_accumulator = -self.max_integral_sum;
            saturated(self.gains.i, -MAX_INTEGRAL_MAGNITUDE)
        } else {
            self.integral_accumulator = candidate;
            self.gains.i as i32 * self.integral_accumulator
        };

        // D: on measurement, so a set-point step causes no kick
        let d = self.gains.d as i64 * (self.last_measurement as i64 - measurement as i64);

        self.last_measurement = measurement;

        let raw = (p as i64 + i as i64 + d) / SCALING_FACTOR as i64;
        let output = raw.clamp(-(max_output as i64), max_output as i64) as i16;

        StepTerms { p, i, d, output }
    }

    /// Reset the integrator
    ///
    /// Only the accumulator is cleared; gains, limits and the derivative
    /// history are kept.
    pub fn reset_integrator(&mut self) {
        self.integral_accumulator = 0;
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Current integral accumulator
    pub fn integral(&self) -> i32 {
        self.integral_accumulator
    }

    pub fn last_measurement(&self) -> i16 {
        self.last_measurement
    }

    pub fn max_error(&self) -> i16 {
        self.max_error
    }

    pub fn max_integral_sum(&self) -> i32 {
        self.max_integral_sum
    }
}

/// Saturated term value, signed by the gain (a zero gain contributes nothing)
#[inline(always)]
fn saturated(gain: i16, bound: i32) -> i32 {
    match gain.signum() {
        1 => bound,
        -1 => -bound,
        _ => 0,
    }
}
