//! Transport-agnostic domain types.

mod burst;
mod id;
mod resource;
mod stats;

pub use burst::{ActionOutcome, BurstRequest, BurstResult};
pub use id::GroupId;
pub use resource::{ResourceSnapshot, ResourceUpdate};
pub use stats::Stats;
