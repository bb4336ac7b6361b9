//! Controller and sampling parameters (defaults)

/// Fixed-point scale applied to every gain (gain 1.0 == 128)
pub const SCALING_FACTOR: i32 = 128;

/// Largest magnitude of the controller output and of the proportional term
pub const MAX_OUTPUT_MAGNITUDE: i16 = i16::MAX;

/// Largest magnitude of the integral term before scaling
pub const MAX_INTEGRAL_MAGNITUDE: i32 = i32::MAX / 2;

/// Default gains in thousandths (1000 == 1.0)
pub const DEFAULT_KP_MILLI: i32 = 1000; // proportional
pub const DEFAULT_KI_MILLI: i32 = 0; // integral
pub const DEFAULT_KD_MILLI: i32 = 0; // derivative

/// Sampling interval in timer ticks (157 ticks @ 10kHz ≈ 63.7Hz)
pub const DEFAULT_SAMPLE_INTERVAL_TICKS: u16 = 157;

/// Reference value used until something else writes the set-point
pub const DEFAULT_REFERENCE: i16 = 8;

/// Sampling timer (TIM6 basic timer)
pub mod timer {
    /// Update interrupt rate [Hz]
    pub const TICK_HZ: u32 = 10_000;

    /// Interrupt priority (upper nibble on STM32G4)
    pub const IRQ_PRIORITY: u8 = 0x20;
}

/// Status reporting
pub mod status {
    /// Status log period [ms]
    pub const LOG_PERIOD_MS: u64 = 1_000;
}
