use hookrelay::application::context::AppContext;
use hookrelay::application::usecases::worker_loop::WorkerLoopUseCase;
use hookrelay::config;
use hookrelay::infrastructure::db::postgres::PostgresDatabase;
use hookrelay::infrastructure::db::repositories::Repositories;
use hookrelay::interface::http;
use hookrelay::interface::http::state::AppState;
use hookrelay::observability;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Step 1: Load configuration and install logging.
    let settings = config::load()?;
    observability::init_logging(
        &settings.observability.log_filter,
        settings.observability.json_logs,
    );

    // Step 2: Install the metrics recorder when enabled.
    let metrics = if settings.observability.enable_metrics {
        Some(observability::install_metrics()?)
    } else {
        None
    };

    // Step 3: Connect to the database and apply migrations.
    let db = Arc::new(
        PostgresDatabase::connect(&settings.db.url, settings.db.max_connections).await?,
    );
    db.migrate().await?;

    // Step 4: Assemble repositories and the shared application context.
    let repos = Repositories::postgres(db);
    let ctx = Arc::new(AppContext::from_settings(repos, &settings)?);

    // Step 5: Start the optional in-process poller.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller = if settings.worker.poll_interval_ms > 0 {
        let interval = Duration::from_millis(settings.worker.poll_interval_ms);
        tracing::info!(interval_ms = settings.worker.poll_interval_ms, "starting poller");
        Some(tokio::spawn(WorkerLoopUseCase::run(
            Arc::clone(&ctx),
            interval,
            shutdown_rx,
        )))
    } else {
        None
    };

    // Step 6: Build the HTTP app and serve until Ctrl-C.
    let state = AppState::new(ctx, settings.worker.shared_secret.as_str(), metrics);
    let app = http::app(state);
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    // Step 7: Stop the poller after the server drains.
    let _ = shutdown_tx.send(true);
    if let Some(poller) = poller {
        let _ = poller.await;
    }
    Ok(())
}
