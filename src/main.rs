use anyhow::Result;
use fleetwatch::config::{self, FleetConfig};
use fleetwatch::snapshot::{FileSnapshotSource, SnapshotSource};
use fleetwatch::{Dashboard, DashboardStatus, FeedChannel, FleetMetrics, FleetStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetwatch=info".into()),
        )
        .init();

    info!("Fleetwatch starting...");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FLEETWATCH_CONFIG").ok())
        .map(PathBuf::from);

    let config = match config_path {
        Some(path) => config::load_config(&path)?,
        None => {
            info!("No config file given, using defaults");
            FleetConfig::default()
        }
    }
    .with_env_overrides();

    let store = Arc::new(FleetStore::new());

    // Initial snapshot
    let source = config.snapshot.path.as_ref().map(FileSnapshotSource::new);
    match &source {
        Some(source) => {
            let vehicles = source.load()?;
            store.load_snapshot(vehicles);
        }
        None => warn!("No snapshot configured, fleet starts empty and updates will be discarded"),
    }

    if let (Some(source), Some(period)) = (source, config.snapshot.refresh_interval()) {
        tokio::spawn(run_snapshot_refresh(source, Arc::clone(&store), period));
    }

    // Live feed
    let dashboard = Dashboard::new(Arc::clone(&store));
    let status = dashboard.status();
    let (feed, feed_task) = FeedChannel::spawn(&config.feed, dashboard);
    feed.connect();

    if config.metrics.log_interval_seconds > 0 {
        tokio::spawn(run_metrics_logger(
            Arc::clone(&store),
            status,
            config.metrics.log_interval_seconds,
        ));
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    feed.shutdown();
    if let Err(e) = feed_task.await {
        error!(error = %e, "Feed channel task failed");
    }

    info!("Fleetwatch stopped");
    Ok(())
}

/// Periodically reload the full snapshot from its source
async fn run_snapshot_refresh(source: FileSnapshotSource, store: Arc<FleetStore>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // consume immediate first tick; initial load done above

    loop {
        ticker.tick().await;
        match source.load() {
            Ok(vehicles) => {
                store.load_snapshot(vehicles);
            }
            Err(e) => {
                warn!(path = %source.path().display(), error = %e, "Snapshot refresh failed, keeping current snapshot");
            }
        }
    }
}

/// Periodically log a fleet summary
async fn run_metrics_logger(store: Arc<FleetStore>, status: DashboardStatus, seconds: u64) {
    let mut ticker = interval(Duration::from_secs(seconds));

    // Skip missed ticks to prevent backlog under load
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let metrics = FleetMetrics::from_vehicles(&store.list());
        let feed = status.get_snapshot();
        info!(
            total = metrics.total,
            active = metrics.active,
            idle = metrics.idle,
            offline = metrics.offline,
            connected = feed.connected,
            updates_applied = feed.updates_applied,
            updates_discarded = feed.updates_discarded,
            "Fleet status"
        );
    }
}
