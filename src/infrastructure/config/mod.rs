//! Infrastructure configuration modules.

pub mod burst;
pub mod connection;
pub mod logging;
pub mod settings;
