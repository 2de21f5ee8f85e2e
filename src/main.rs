use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use warehouse_watch::feed::file::FileFeedSource;
use warehouse_watch::feed::refresh::spawn_refresh_thread;
use warehouse_watch::{api, config, state};

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        app = %config.app.name,
        config_path = config::DEFAULT_CONFIG_PATH,
        "warehouse-watch starting"
    );

    let state = Arc::new(RwLock::new(state::AppState::new(
        config.last_cleaned_days_ago(),
        config.schedule_cache_ttl(),
    )));

    // Periodic refresh thread (feed → snapshot)
    let stop_flag = Arc::new(AtomicBool::new(false));
    let refresh_handle = match config.feed_path() {
        Some(path) => {
            tracing::info!(
                path = %path.display(),
                interval_ms = config.refresh_interval().as_millis(),
                max_results = config.max_results(),
                "Starting feed refresh thread"
            );
            Some(spawn_refresh_thread(
                FileFeedSource::new(path),
                config.feed_mapping(),
                Arc::clone(&state),
                config.refresh_interval(),
                Arc::clone(&stop_flag),
            ))
        }
        None => {
            tracing::warn!("Refresh thread not started - no [feed].path configured");
            None
        }
    };

    let app = api::router(Arc::clone(&state));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    stop_flag.store(true, Ordering::Relaxed);
    if let Some(handle) = refresh_handle
        && handle.join().is_err()
    {
        tracing::error!("Feed refresh thread panicked");
    }

    Ok(())
}
