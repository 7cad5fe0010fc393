pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod scheduler;
pub mod sync;

use tokio::signal;

use api::AppState;
pub use config::Config;
use db::Store;
use scheduler::Scheduler;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = Config::load()?;
    config.apply_env_overrides();
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Mediarr v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let state = AppState {
        config: config.clone(),
        store,
    };

    let sched = Scheduler::new(state.clone(), config.scheduler.clone())
        .start()
        .await?;

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        let app = api::router(state);
        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web API running at http://0.0.0.0:{port}");
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    if let Some(mut sched) = sched {
        sched.shutdown().await.ok();
    }
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}
