//! # g4-pid
//!
//! Fixed-point discrete PID controller and its timer-driven sampling loop.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`pid`] | Integer PID control law with anti-windup and output saturation |
//! | [`sampling`] | Interrupt-to-main "sample ready" handshake and tick divider |
//! | [`control_loop`] | Dispatch loop: read inputs, step, write output |
//! | [`config`] | Scaling constants, default gains, configuration checks |
//!
//! The library has no hardware dependencies and is tested on the host; the
//! STM32G431 firmware (`src/main.rs`) is built with the `firmware` feature.

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod config;
pub mod control_loop;
pub mod pid;
pub mod sampling;

pub use config::{ConfigError, ControllerConfig};
pub use control_loop::{ActuatorSink, ControlLoop, MeasurementSource, ReferenceSource, Sample};
pub use pid::{ControllerState, Gains, StepTerms};
pub use sampling::{Pending, SamplingFlag, TimingSource};
