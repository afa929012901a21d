use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use prometheus::Registry;
use tracing_subscriber::EnvFilter;

use systemd_exporter::cli::Cli;
use systemd_exporter::core::{ManagerClient, MetricCatalog, SystemdCollector};
use systemd_exporter::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let manager =
        ManagerClient::connect().context("failed to connect to the systemd manager")?;
    let catalog = MetricCatalog::new().context("failed to build the metric catalog")?;
    let collector = SystemdCollector::new(manager, catalog);

    let registry = Registry::new();
    registry
        .register(Box::new(collector))
        .context("failed to register the unit collector")?;

    server::run(cli.listen_address, Arc::new(registry)).await
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
