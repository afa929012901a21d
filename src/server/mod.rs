//! HTTP server exposing the metrics endpoint.

pub mod handlers;
pub mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use prometheus::Registry;
use tracing::info;

/// Bind the listener and serve scrapes until the process is stopped.
pub async fn run(addr: SocketAddr, registry: Arc<Registry>) -> anyhow::Result<()> {
    let app = create_router(registry);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {addr}"))?;
    info!("serving metrics on http://{addr}/metrics");

    axum::serve(listener, app).await?;
    Ok(())
}
