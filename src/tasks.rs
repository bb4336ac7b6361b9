//! Tasks

pub mod control;
pub mod status;

pub use control::control_task;
pub use status::status_task;
