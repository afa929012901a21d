//! CLI argument parsing.

use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "systemd-exporter",
    about = "Prometheus exporter for systemd unit resource usage",
    version
)]
pub struct Cli {
    /// Address and port for the metrics HTTP endpoint.
    #[arg(long = "listen-address", default_value = "0.0.0.0:8080")]
    pub listen_address: SocketAddr,
}
