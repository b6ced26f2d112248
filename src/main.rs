use checkpoint_tracker::{load_records, persist_records, router, AppState, Config};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let kv = load_records(&config.data_path).await.with_quota(config.storage_quota);
    let state = AppState::new(config.data_path.clone(), kv);
    {
        let mut store = state.lock().await;
        let subjects = store.list_subjects();
        info!(subjects = subjects.len(), "store ready");
        if let Err(err) = persist_records(&state.data_path, store.kv()).await {
            warn!("failed to write data file: {}", err.message);
        }
    }

    let addr = config.addr();
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
