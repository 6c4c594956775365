//! Application services (use cases).
//!
//! These services hold the monitoring logic and drive the session port.
//! None of them perform I/O directly.

pub mod burst;
pub mod connection;
pub mod detector;
pub mod diagnostic;
pub mod monitor;
pub mod stats;
