//! Runs the locations service. The bind address is read from `GEOREST_ADDR`.

use std::sync::Arc;

use georest_web::{build_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServiceConfig::from_env();
    let state = Arc::new(AppState::new(&config)?);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    log::info!("Serving locations on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
