//! ttl_lru soak driver
//!
//! Hammers a shared cache from several tasks for a fixed time while an
//! owner-side timer sweeps expired entries, then reports statistics.

mod soak;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soak::{spawn_sweep_task, spawn_worker, SoakConfig};
use ttl_lru::Cache;

/// Main entry point for the soak run.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the shared cache with an eviction counter
/// 4. Start the sweep task and the workers
/// 5. Wait for the run length or SIGINT/SIGTERM
/// 6. Abort all tasks and report statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ttl_lru soak run");

    let config = SoakConfig::from_env().context("failed to load soak configuration")?;
    info!(
        "Configuration loaded: capacity={}, key_space={}, workers={}, entry_ttl={}ms, sweep_interval={}ms, run={}s",
        config.capacity,
        config.key_space,
        config.workers,
        config.entry_ttl_ms,
        config.sweep_interval_ms,
        config.run_secs
    );

    let evicted = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&evicted);
    let cache = Arc::new(
        Cache::<u64, String>::new(config.capacity).with_on_evicted(move |_key, _value| {
            counter.fetch_add(1, Ordering::Relaxed);
        }),
    );

    let mut handles = vec![spawn_sweep_task(
        Arc::clone(&cache),
        Duration::from_millis(config.sweep_interval_ms.max(1)),
    )];
    handles.extend((0..config.workers).map(|id| spawn_worker(id, Arc::clone(&cache), &config)));
    info!("Started {} workers and the sweep task", config.workers);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(config.run_secs)) => {
            info!("Run length reached, stopping");
        }
        _ = shutdown_signal() => {}
    }

    for handle in &handles {
        handle.abort();
    }
    warn!("Soak tasks aborted");

    let stats = cache.stats();
    let report = serde_json::to_string(&stats).context("failed to serialize cache statistics")?;
    info!(
        hit_rate = stats.hit_rate(),
        callbacks = evicted.load(Ordering::Relaxed),
        "Final statistics: {}",
        report
    );

    cache.clear();
    info!("Soak run complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
