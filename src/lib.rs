//! Floodgate - watch a chat group and flood it the moment it opens.
//!
//! Monitors one group's "only admins can send" flag over a persistent
//! messaging session and, on every restricted-to-open transition, fires a
//! concurrent burst of identical messages into the group.
//!
//! # Architecture
//!
//! - [`domain`] - Transport-agnostic types: group ids, snapshots, bursts, stats
//! - [`port`] - Session and credential traits the application depends on
//! - [`application`] - Connection state machine, edge detector, burst engine,
//!   rolling statistics and the monitor loop that ties them together
//! - [`adapter`] - The WebSocket session bridge, file credential store and CLI
//! - [`infrastructure`] - Configuration and runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use floodgate::infrastructure::bootstrap;
//! use floodgate::infrastructure::config::settings::Config;
//!
//! # async fn run() -> floodgate::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//! let report = bootstrap::build_monitor(&config)
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//!     .into_result()?;
//! println!("{} bursts", report.stats.bursts_fired);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
