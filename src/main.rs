//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use nicu_scheduler::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // If configuration fails the application must not start
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let bootstrap_admin = config.bootstrap_admin.clone();

    let app_state = AppState::new(config).await?;

    if let Some((username, password)) = bootstrap_admin {
        let admin = app_state.auth_service.ensure_admin(&username, &password).await?;
        tracing::info!("✅ Bootstrap admin '{}' ready", admin.username);
    }

    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
