use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketrush_core::{
    load_config_or_default, run_simulation, validate_config, Dispatcher, FanoutSink, MemorySink,
    OutcomeSink, TicketStore, TracingSink,
};
use ticketrush_server::api::create_router;
use ticketrush_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of outcomes kept in memory for the API
const OUTCOME_HISTORY: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TICKETRUSH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!("Total tickets: {}", config.pool.total_tickets);
    info!(
        "Processing delay: {}-{} ms",
        config.dispatcher.min_delay_ms, config.dispatcher.max_delay_ms
    );

    // Create ticket store
    let store = Arc::new(TicketStore::new(config.pool.total_tickets));
    info!("Ticket store initialized");

    // Outcomes go to the log and to a bounded in-memory history
    let outcomes = Arc::new(MemorySink::with_capacity(OUTCOME_HISTORY));
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(Arc::clone(&outcomes) as Arc<dyn OutcomeSink>);

    // Create and start the dispatcher
    let dispatcher = Arc::new(Dispatcher::new(
        config.dispatcher.clone(),
        Arc::clone(&store),
        Arc::new(sink),
    ));
    dispatcher
        .start()
        .await
        .context("Failed to start dispatcher")?;
    info!("Dispatcher started");

    // Start simulated buyers if enabled
    let simulation = if config.simulation.enabled {
        let dispatcher = Arc::clone(&dispatcher);
        let simulation_config = config.simulation.clone();
        Some(tokio::spawn(async move {
            let report = run_simulation(Arc::clone(&dispatcher), &simulation_config).await;
            info!(
                "Simulation submitted {} requests ({} refused)",
                report.accepted, report.refused
            );

            dispatcher.wait_idle().await;
            log_pool_summary(dispatcher.store());
        }))
    } else {
        info!("Simulation disabled in config");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&dispatcher),
        outcomes,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop simulated buyers that have not arrived yet
    if let Some(handle) = simulation {
        handle.abort();
    }

    // Drain every accepted request before exiting
    info!("Server shutting down, draining dispatcher...");
    dispatcher.shutdown().await;

    log_pool_summary(&store);

    Ok(())
}

fn log_pool_summary(store: &TicketStore) {
    let snapshot = store.snapshot();
    info!(
        "All ticket purchases processed: {} sold, {} available of {}",
        snapshot.purchased, snapshot.available, snapshot.total
    );
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
