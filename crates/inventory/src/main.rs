use anyhow::{Context, Result};
use axum::{Router, routing::get};
use inventory::{
    metrics::{health_check, metrics_handler},
    reconciler::ReservationReconciler,
    state::AppState,
};
use shared::{
    config::{Config, ConnectionManager},
    utils::{Telemetry, init_logger},
};
use sqlx::{Pool, Postgres};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tracing::{error, info, warn};

struct ServerHandles {
    reconciler_handle: tokio::task::JoinHandle<()>,
    metrics_handle: tokio::task::JoinHandle<()>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, state, reconciler, telemetry) =
        setup().await.context("Failed to setup application")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metric_port));
    let server_handles = ServerHandles {
        reconciler_handle: tokio::spawn(reconciler.start_with_shutdown(shutdown_rx.clone())),
        metrics_handle: run_metrics_server(state, metrics_addr, shutdown_rx),
    };

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Shutdown signal received (Ctrl+C)."),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }

    if shutdown_tx.send(true).is_err() {
        warn!("No running component received the shutdown signal");
    }

    shutdown(telemetry, server_handles).await;

    Ok(())
}

async fn setup() -> Result<(Config, Arc<AppState>, ReservationReconciler, Telemetry)> {
    dotenv::dotenv().ok();

    let is_dev = std::env::var("DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    let is_enable_file = std::env::var("ENABLE_FILE_LOG")
        .map(|v| v == "true")
        .unwrap_or(false);

    let config = Config::init().context("Failed to load configuration")?;

    let mut telemetry = Telemetry::new("inventory-service", config.otel_endpoint.clone());
    let logger_provider = telemetry
        .init_logger()
        .context("Failed to initialize OTLP logger")?;
    telemetry
        .init_meter()
        .context("Failed to initialize OTLP meter")?;
    telemetry
        .init_tracer()
        .context("Failed to initialize OTLP tracer")?;

    init_logger(logger_provider, "inventory-service", is_dev, is_enable_file);

    let db_pool =
        ConnectionManager::new_pool(&config.database_url, config.db_min_conn, config.db_max_conn)
            .await
            .context("Failed to initialize database pool")?;

    if config.run_migrations {
        run_migrations(&db_pool)
            .await
            .context("failed to migration database")?;
        info!("✅ Database migrations applied");
    }

    let (state, reconciler) = AppState::new(db_pool, &config)
        .await
        .context("Failed to create AppState")?;

    info!("✅ Application setup completed successfully.");
    Ok((config, Arc::new(state), reconciler, telemetry))
}

fn run_metrics_server(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            info!("🔧 Starting metrics server on {addr}");

            match start_metrics_server(state.clone(), addr, shutdown_rx.clone()).await {
                Ok(()) => {
                    info!("Metrics server stopped gracefully");
                    break;
                }
                Err(e) => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    error!("❌ Metrics server failed: {e}. Retrying in 3s...");
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                }
            }
        }
    })
}

async fn start_metrics_server(
    state: Arc<AppState>,
    addr: SocketAddr,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_check))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {addr}"))?;

    let shutdown_future = async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
        info!("Metrics server received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_future)
        .await
        .context("Metrics server failed to start or serve")
}

async fn shutdown(telemetry: Telemetry, server_handles: ServerHandles) {
    info!("🛑 Shutting down all components...");

    let shutdown_timeout = tokio::time::Duration::from_secs(30);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let (reconciler, metrics) = tokio::join!(
            server_handles.reconciler_handle,
            server_handles.metrics_handle
        );
        if let Err(e) = reconciler {
            error!("Reconciliation task panicked: {e}");
        }
        if let Err(e) = metrics {
            error!("Metrics server task panicked: {e}");
        }
    })
    .await;

    match shutdown_result {
        Ok(()) => info!("✅ All components shutdown gracefully"),
        Err(_) => {
            warn!("⚠️  Shutdown timeout reached, forcing exit");
        }
    }

    if let Err(e) = telemetry.shutdown().await {
        error!("Failed to shutdown telemetry: {e}");
    }

    info!("✅ Inventory Service shutdown complete.");
}

pub async fn run_migrations(pool: &Pool<Postgres>) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
