//! CKStats Pool Statistics Client
//!
//! An async polling client for the ckpool/ckstats statistics HTTP API.
//! It periodically fetches pool-wide and per-user statistics, merges them
//! into one immutable snapshot, and publishes a last-known-good view that
//! stays available through transient API failures.
//!
//! # Features
//!
//! - Scheduled, timeout-bounded polling of `/api/pool/current` and `/api/users`
//! - Partial-failure tolerance: pool stats are mandatory, user stats best-effort
//! - Last-known-good snapshot retained across failed refresh cycles
//! - One-time startup health probe before any polling starts
//! - Fixed metric descriptor registry for presentation layers
//! - Lock-free snapshot reads via copy-on-write publication
//! - Async/await based on Tokio
//!
//! # Example
//!
//! ```no_run
//! use ckstats_client::{registry, MetricValue, PoolCoordinator, PoolStatsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PoolStatsConfig {
//!         host: "pool.example.com".to_string(),
//!         port: 5000,
//!         ..Default::default()
//!     };
//!
//!     // Probes /api/health, runs the first refresh, starts the poll timer
//!     let coordinator = PoolCoordinator::start(config).await?;
//!
//!     if let Some(snapshot) = coordinator.snapshot() {
//!         for descriptor in registry::descriptors() {
//!             match descriptor.value(&snapshot) {
//!                 MetricValue::Unavailable => {}
//!                 value => println!("{}: {:?}", descriptor.label, value),
//!             }
//!         }
//!     }
//!
//!     coordinator.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod format;
pub mod registry;
pub mod snapshot;

// Re-export main types
pub use config::PoolStatsConfig;
pub use coordinator::{CoordinatorState, FailureRecord, HealthPhase, PoolCoordinator};
pub use error::{ErrorKind, PoolStatsError, Result};
pub use fetch::{StatsApi, StatsFetcher};
pub use format::{format_difficulty, format_hashrate, format_timestamp_ms};
pub use registry::{MetricDescriptor, MetricValue};
pub use snapshot::{PoolSnapshot, Snapshot, SnapshotBuilder, UserSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
