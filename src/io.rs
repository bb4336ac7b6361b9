//! Controller I/O bindings
//!
//! Set-point and actuator are plain atomics; the process value is read from
//! ADC2.

use core::sync::atomic::{AtomicI16, Ordering};

use embassy_stm32::adc::{Adc, AnyAdcChannel};
use embassy_stm32::peripherals;

use g4_pid::{ActuatorSink, MeasurementSource, ReferenceSource};

/// Set-point stored in an atomic
pub struct AtomicReference {
    value: &'static AtomicI16,
}

impl AtomicReference {
    pub fn new(value: &'static AtomicI16) -> Self {
        Self { value }
    }
}

impl ReferenceSource for AtomicReference {
    fn reference(&mut self) -> i16 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Process value from a blocking ADC2 conversion
pub struct AdcMeasurement {
    adc: Adc<'static, peripherals::ADC2>,
    pin: AnyAdcChannel<peripherals::ADC2>,
}

impl AdcMeasurement {
    pub fn new(adc: Adc<'static, peripherals::ADC2>, pin: AnyAdcChannel<peripherals::ADC2>) -> Self {
        Self { adc, pin }
    }
}

impl MeasurementSource for AdcMeasurement {
    fn measurement(&mut self) -> i16 {
        // 12-bit result, always fits
        let raw = self.adc.blocking_read(&mut self.pin);
        raw.min(i16::MAX as u16) as i16
    }
}

/// Controller output latched into an atomic
pub struct LatchedActuator {
    output: &'static AtomicI16,
}

impl LatchedActuator {
    pub fn new(output: &'static AtomicI16) -> Self {
        Self { output }
    }
}

impl ActuatorSink for LatchedActuator {
    fn set_output(&mut self, value: i16) {
        self.output.store(value, Ordering::Relaxed);
    }
}
