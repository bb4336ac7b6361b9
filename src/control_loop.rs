//! Sample dispatch loop
//!
//! Waits for the sampling condition, then reads the set-point and the process
//! value, runs one PID step and forwards the result to the actuator.

use core::future::Future;

use crate::pid::{ControllerState, Gains};
use crate::sampling::SamplingFlag;

/// Provides the set-point (reference value)
pub trait ReferenceSource {
    fn reference(&mut self) -> i16;
}

/// Provides the measured process value
pub trait MeasurementSource {
    fn measurement(&mut self) -> i16;
}

/// Receives the controller output
pub trait ActuatorSink {
    fn set_output(&mut self, value: i16);
}

impl<F: FnMut() -> i16> ReferenceSource for F {
    fn reference(&mut self) -> i16 {
        self()
    }
}

impl<F: FnMut() -> i16> MeasurementSource for F {
    fn measurement(&mut self) -> i16 {
        self()
    }
}

impl<F: FnMut(i16)> ActuatorSink for F {
    fn set_output(&mut self, value: i16) {
        self(value)
    }
}

/// Inputs and output of one completed control step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub setpoint: i16,
    pub measurement: i16,
    pub output: i16,
}

/// Control loop driven by a [`SamplingFlag`]
///
/// Owns the controller state; the timing source only ever touches the flag.
pub struct ControlLoop<'a, R, M, A> {
    flag: &'a SamplingFlag,
    controller: ControllerState,
    reference: R,
    measurement: M,
    actuator: A,
    samples: u32,
}

impl<'a, R, M, A> ControlLoop<'a, R, M, A>
where
    R: ReferenceSource,
    M: MeasurementSource,
    A: ActuatorSink,
{
    /// Create a control loop
    ///
    /// # Arguments
    /// * `flag` - Condition raised by the timing source
    /// * `gains` - Scaled PID gains
    /// * `reference` - Set-point provider
    /// * `measurement` - Process value provider
    /// * `actuator` - Output sink
    pub fn new(
        flag: &'a SamplingFlag,
        gains: Gains,
        reference: R,
        measurement: M,
        actuator: A,
    ) -> Self {
        Self {
            flag,
            controller: ControllerState::new(gains),
            reference,
            measurement,
            actuator,
            samples: 0,
        }
    }

    /// Run one control step if a sample is pending
    ///
    /// # Returns
    /// The completed sample, or `None` if the condition was not set (no
    /// provider is called in that case)
    pub fn poll(&mut self) -> Option<Sample> {
        let pending = self.flag.pending()?;

        let setpoint = self.reference.reference();
        let measurement = self.measurement.measurement();
        let output = self.controller.step(setpoint, measurement);
        self.actuator.set_output(output);

        self.flag.acknowledge(pending);
        self.samples = self.samples.wrapping_add(1);

        trace!(
            "sample {}: sp={}, pv={}, out={}",
            self.samples,
            setpoint,
            measurement,
            output
        );

        Some(Sample {
            setpoint,
            measurement,
            output,
        })
    }

    /// Poll forever, calling `idle` whenever no sample was pending
    pub fn run(&mut self, mut idle: impl FnMut()) -> ! {
        loop {
            if self.poll().is_none() {
                idle();
            }
        }
    }

    /// Poll forever on an async executor
    ///
    /// # Arguments
    /// * `idle` - Future awaited whenever no sample was pending (e.g. a yield)
    /// * `on_sample` - Called after every completed step with the sample and
    ///   the loop itself
    pub async fn run_async<F, Fut>(
        &mut self,
        mut idle: F,
        mut on_sample: impl FnMut(&Sample, &Self),
    ) -> !
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            match self.poll() {
                Some(sample) => on_sample(&sample, self),
                None => idle().await,
            }
        }
    }

    /// Clear the integrator (e.g. after a set-point discontinuity)
    pub fn reset_integrator(&mut self) {
        self.controller.reset_integrator();
    }

    pub fn controller(&self) -> &ControllerState {
        &self.controller
    }

    /// Number of completed control steps (wrapping)
    pub fn samples(&self) -> u32 {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::TimingSource;
    use core::cell::{Cell, RefCell};

    #[test]
    fn test_no_step_without_sample() {
        let flag = SamplingFlag::new();
        let calls = Cell::new(0u32);
        let mut control = ControlLoop::new(
            &flag,
            Gains::from_milli(1000, 0, 0),
            || {
                calls.set(calls.get() + 1);
                8
            },
            || 4,
            |_: i16| panic!("actuator called without a sample"),
        );

        assert_eq!(control.poll(), None);
        assert_eq!(calls.get(), 0);
        assert_eq!(control.samples(), 0);
    }

    #[test]
    fn test_step_forwards_output_and_clears_flag() {
        let flag = SamplingFlag::new();
        let output = Cell::new(None);
        let mut control = ControlLoop::new(
            &flag,
            Gains::from_milli(1000, 0, 0),
            || 8,
            || 4,
            |value: i16| output.set(Some(value)),
        );

        flag.raise();
        let sample = control.poll().unwrap();
        assert_eq!(
            sample,
            Sample {
                setpoint: 8,
                measurement: 4,
                output: 4
            }
        );
        assert_eq!(output.get(), Some(4));
        assert!(!flag.is_ready());
        assert_eq!(control.poll(), None);
        assert_eq!(control.samples(), 1);
    }

    #[test]
    fn test_call_order_within_step() {
        let flag = SamplingFlag::new();
        let log = RefCell::new([""; 3]);
        let n = Cell::new(0usize);
        let record = |name: &'static str| {
            log.borrow_mut()[n.get()] = name;
            n.set(n.get() + 1);
        };
        let mut control = ControlLoop::new(
            &flag,
            Gains::ZERO,
            || {
                record("reference");
                0
            },
            || {
                record("measurement");
                0
            },
            |_: i16| {
                assert!(flag.is_ready(), "flag cleared before output was written");
                record("actuator");
            },
        );

        flag.raise();
        control.poll();
        assert_eq!(*log.borrow(), ["reference", "measurement", "actuator"]);
    }

    #[test]
    fn test_one_step_per_ready_transition() {
        let flag = SamplingFlag::new();
        let timer = TimingSource::new(&flag, 5);
        let mut control = ControlLoop::new(&flag, Gains::ZERO, || 0, || 0, |_: i16| {});

        // Busy loop polling between every tick
        let mut steps = 0;
        for _ in 0..50 {
            timer.tick();
            for _ in 0..3 {
                if control.poll().is_some() {
                    steps += 1;
                }
            }
        }
        assert_eq!(steps, 10);
        assert_eq!(control.samples(), 10);
    }

    #[test]
    fn test_slow_loop_coalesces_ticks() {
        let flag = SamplingFlag::new();
        let timer = TimingSource::new(&flag, 5);
        let mut control = ControlLoop::new(&flag, Gains::ZERO, || 0, || 0, |_: i16| {});

        // Three intervals elapse before the loop gets to run
        for _ in 0..15 {
            timer.tick();
        }
        assert!(control.poll().is_some());
        assert!(control.poll().is_none());
        assert_eq!(control.samples(), 1);
    }

    #[test]
    fn test_tick_during_step_is_seen_next_poll() {
        let flag = SamplingFlag::new();
        let timer = TimingSource::new(&flag, 1);
        let mut control = ControlLoop::new(
            &flag,
            Gains::ZERO,
            || 0,
            || {
                // Timer interrupt preempts the step
                timer.tick();
                0
            },
            |_: i16| {},
        );

        timer.tick();
        assert!(control.poll().is_some());
        assert!(flag.is_ready());
        assert!(control.poll().is_some());
    }

    #[test]
    fn test_reset_integrator_through_loop() {
        let flag = SamplingFlag::new();
        let mut control =
            ControlLoop::new(&flag, Gains::from_milli(0, 500, 0), || 100, || 0, |_: i16| {});

        for _ in 0..3 {
            flag.raise();
            control.poll();
        }
        assert_eq!(control.controller().integral(), 300);
        control.reset_integrator();
        assert_eq!(control.controller().integral(), 0);
        assert_eq!(control.controller().last_measurement(), 0);
    }

    #[test]
    fn test_run_steps_once_per_raise() {
        let flag = SamplingFlag::new();
        let timer = TimingSource::new(&flag, 2);
        let outputs = Cell::new(0u32);
        let idles = Cell::new(0u32);
        let mut control = ControlLoop::new(
            &flag,
            Gains::from_milli(1000, 0, 0),
            || 8,
            || 4,
            |value: i16| {
                assert_eq!(value, 4);
                outputs.set(outputs.get() + 1);
            },
        );

        // The idle hook plays the timer and ends the loop after 21 idles
        let stopped = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            control.run(|| {
                idles.set(idles.get() + 1);
                if idles.get() == 21 {
                    panic!("stop");
                }
                timer.tick();
            })
        }));

        assert!(stopped.is_err());
        // 20 ticks at interval 2
        assert_eq!(outputs.get(), 10);
        assert_eq!(control.samples(), 10);
        assert!(!flag.is_ready());
    }

    #[test]
    fn test_run_async_reports_every_sample() {
        let flag = SamplingFlag::new();
        let timer = TimingSource::new(&flag, 2);
        let idles = Cell::new(0u32);
        let reported = RefCell::new(Vec::new());
        let mut control = ControlLoop::new(
            &flag,
            Gains::from_milli(0, 1000, 0),
            || 8,
            || 4,
            |_: i16| {},
        );

        let stopped = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            embassy_futures::block_on(control.run_async(
                || {
                    idles.set(idles.get() + 1);
                    if idles.get() == 7 {
                        panic!("stop");
                    }
                    timer.tick();
                    embassy_futures::yield_now()
                },
                |sample, running| {
                    reported.borrow_mut().push((
                        running.samples(),
                        sample.output,
                        running.controller().integral(),
                    ));
                },
            ))
        }));

        assert!(stopped.is_err());
        // 6 ticks at interval 2, integral grows by the error of 4 each step
        assert_eq!(*reported.borrow(), [(1, 4, 4), (2, 8, 8), (3, 12, 12)]);
    }

    struct Constant(i16);

    impl ReferenceSource for Constant {
        fn reference(&mut self) -> i16 {
            self.0
        }
    }

    struct Latch<'a>(&'a Cell<Option<i16>>);

    impl ActuatorSink for Latch<'_> {
        fn set_output(&mut self, value: i16) {
            self.0.set(Some(value));
        }
    }

    #[test]
    fn test_trait_implementors() {
        let flag = SamplingFlag::new();
        let latched = Cell::new(None);
        let mut control = ControlLoop::new(
            &flag,
            Gains::from_milli(2000, 0, 0),
            Constant(10),
            || 4,
            Latch(&latched),
        );
        flag.raise();
        control.poll();
        assert_eq!(latched.get(), Some(12));
    }
}
