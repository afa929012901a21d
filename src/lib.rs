//! systemd-exporter - Prometheus exporter for systemd unit resource usage.
//!
//! Polls the systemd manager over the system bus on each scrape and exposes
//! per-unit resource-usage properties (CPU time, IP traffic, memory, task
//! count) as Prometheus metrics on an HTTP endpoint. Each scrape is a fresh
//! snapshot; nothing is cached between scrapes.

pub mod cli;
pub mod core;
pub mod server;
