use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use matchday_engine::{LiveStore, RandomEventGenerator};
use matchday_server::config::Args;
use matchday_server::dashboard::{self, DashboardState, Metrics};
use matchday_server::event_bus::EventBus;
use matchday_server::notifier::AdminNotifier;
use matchday_server::persistence::{PersistenceGateway, SqliteGateway};
use matchday_server::simulation::{self, SimContext};
use matchday_server::{bootstrap, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let config = args.simulation_config()?;
    tracing::info!("Matchday simulator starting");
    tracing::debug!("Simulation settings: {:?}", config);

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(
        SqliteGateway::open(&args.db)
            .with_context(|| format!("opening database {}", args.db.display()))?,
    );
    tracing::info!("Using database {}", args.db.display());

    let generator = match config.seed {
        Some(seed) => RandomEventGenerator::seeded(seed),
        None => RandomEventGenerator::new(),
    };
    let store = Arc::new(LiveStore::new());
    let bus = Arc::new(EventBus::default());
    let alerts = Arc::new(AdminNotifier::new());
    let metrics = Arc::new(Metrics::new());

    let ctx = Arc::new(SimContext {
        config,
        store: Arc::clone(&store),
        gateway: Arc::clone(&gateway),
        generator: Arc::new(generator),
        broadcast: bus.clone(),
        notifier: alerts.clone(),
        metrics: Arc::clone(&metrics),
    });

    let seeded = bootstrap::ensure_fixture_pool(&ctx).await?;
    if seeded.teams > 0 || seeded.fixtures > 0 {
        tracing::info!(
            "First run: seeded {} teams and {} fixtures",
            seeded.teams,
            seeded.fixtures
        );
    }

    // Start live dashboard (non-blocking, runs on its own tasks).
    if !args.no_dashboard {
        let dash = Arc::new(DashboardState {
            metrics,
            store,
            gateway,
            bus,
            alerts,
        });
        let port = args.dashboard_port;
        tokio::spawn(async move {
            dashboard::server::start(dash, port).await;
        });
    }

    let (trigger, listener) = shutdown::channel();
    let tasks = simulation::start(ctx, listener);

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("Shutdown requested, stopping running fixtures");
    trigger.trigger();
    tasks.join().await;
    tracing::info!("Matchday simulator stopped");

    Ok(())
}
