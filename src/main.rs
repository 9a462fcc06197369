use mimalloc::MiMalloc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = roster_gate::Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        credential_backend = ?cfg.credential_backend,
        session_backend = ?cfg.session_backend,
        session_ttl_secs = ?cfg.session_ttl_secs,
        loglevel = %cfg.loglevel
    );

    let addr = cfg.listen_addr()?;
    let cleanup_every = Duration::from_secs(cfg.session_cleanup_secs.max(1));

    let state = roster_gate::app::build_state(cfg).await?;

    let cleanup = state.sessions.ttl().map(|_| {
        roster_gate::service::cleanup::spawn_cleanup_task(state.sessions.clone(), cleanup_every)
    });

    let app = roster_gate::gate_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cleanup {
        handle.abort();
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
