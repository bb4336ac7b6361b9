//! Configuration module
//!
//! Compile-time defaults live in [`params`]; [`ControllerConfig`] bundles the
//! values that shape the controller's behaviour and checks them for
//! combinations that would silently disable part of the control law.

pub mod params;

pub use params::*;

use crate::pid::{error_limit, integral_limit, Gains};

/// Configuration that makes the controller degenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sampling interval of 0 ticks
    ZeroSampleInterval,
    /// Non-zero P gain whose error limit is 0 (P term always saturated)
    DegenerateErrorLimit,
    /// Non-zero I gain whose accumulator limit is 0 (I term always saturated)
    DegenerateIntegralLimit,
}

/// Controller gains and sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Scaled PID gains
    pub gains: Gains,
    /// Timer ticks per control step
    pub sample_interval_ticks: u16,
}

impl ControllerConfig {
    /// Kp=1.0, Ki=0, Kd=0, 157 ticks per sample
    pub const DEFAULT: Self = Self {
        gains: Gains::from_milli(DEFAULT_KP_MILLI, DEFAULT_KI_MILLI, DEFAULT_KD_MILLI),
        sample_interval_ticks: DEFAULT_SAMPLE_INTERVAL_TICKS,
    };

    /// Check for configurations that disable part of the control law
    ///
    /// The controller itself accepts any configuration and saturates; this is
    /// for the application to reject or report such settings.
    ///
    /// # Returns
    /// * `Ok(())` - Usable configuration
    /// * `Err(ConfigError)` - First problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ticks == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.gains.p != 0 && error_limit(self.gains.p) == 0 {
            return Err(ConfigError::DegenerateErrorLimit);
        }
        if self.gains.i != 0 && integral_limit(self.gains.i) == 0 {
            return Err(ConfigError::DegenerateIntegralLimit);
        }
        Ok(())
    }

    /// Sampling rate in mHz for a timer running at `tick_hz`
    ///
    /// Saturates at `u32::MAX` (rates above ~4.29MHz).
    pub const fn sample_rate_millihertz(&self, tick_hz: u32) -> u32 {
        let interval = if self.sample_interval_ticks == 0 {
            1
        } else {
            self.sample_interval_ticks as u64
        };
        let rate = tick_hz as u64 * 1000 / interval;
        if rate > u32::MAX as u64 {
            u32::MAX
        } else {
            rate as u32
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
