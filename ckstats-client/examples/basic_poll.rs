//! Basic polling example showing how to use the pool statistics client
//!
//! This example connects to a ckstats API, starts the coordinator, and
//! prints every registered metric from the current snapshot.

use ckstats_client::{
    format_hashrate, registry, HealthPhase, MetricValue, PoolCoordinator, PoolStatsConfig,
};
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("ckstats_client=debug")
        .init();

    info!("Starting ckstats polling example");

    // Point this at your pool's ckstats API
    let config = PoolStatsConfig {
        host: "localhost".to_string(),
        port: 5000,
        // Poll more aggressively than the 300s default for demo purposes
        poll_interval: Duration::from_secs(30),
        ..Default::default()
    };

    // Start the coordinator (probes /api/health, then begins polling)
    let coordinator = match PoolCoordinator::start(config).await {
        Ok(coordinator) => {
            info!("Connected to pool API");
            coordinator
        }
        Err(e) => {
            error!("Failed to start coordinator: {}", e);
            return Err(e.into());
        }
    };

    // Print the current snapshot every 30 seconds
    let mut ticker = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = coordinator.state();

                if state.phase == HealthPhase::Degraded {
                    if let Some(failure) = &state.last_failure {
                        error!("Pool API degraded since {}: {}", failure.occurred_at, failure.message);
                    }
                }

                let Some(snapshot) = &state.snapshot else {
                    info!("No snapshot yet");
                    continue;
                };

                info!("Pool hashrate (1h): {}", format_hashrate(snapshot.pool.hashrate_1h));

                for descriptor in registry::descriptors() {
                    match descriptor.value(snapshot) {
                        // User metrics are unavailable until the pool reports a user
                        MetricValue::Unavailable => {}
                        MetricValue::Unsigned(v) => info!("  {}: {}", descriptor.label, v),
                        MetricValue::Float(v) => info!("  {}: {}", descriptor.label, v),
                        MetricValue::Text(v) => info!("  {}: {}", descriptor.label, v),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down...");
    coordinator.stop().await;

    Ok(())
}

// Run with: cargo run --example basic_poll
// Point it at a running ckpool instance with the ckstats API enabled,
// e.g. http://localhost:5000/api/pool/current
