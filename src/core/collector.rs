//! Collection engine
//!
//! Implements the prometheus describe/collect contract on top of the systemd
//! manager client: each scrape enumerates all units, queries the cataloged
//! properties for units of known types, and emits one labeled sample per
//! successfully resolved property.

use std::sync::Mutex;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tracing::{debug, error, warn};

use crate::core::catalog::MetricCatalog;
use crate::core::systemd::{ManagerError, PropertyValue, UnitManager};

/// Receiver for per-property query failures.
///
/// Injected into the collector so tests can capture failures instead of
/// scraping log output.
pub trait PropertyFailureSink: Send + Sync {
    fn property_query_failed(&self, unit: &str, property: &str, error: &ManagerError);
}

/// Default sink: one structured warning per failed property query.
pub struct LogFailureSink;

impl PropertyFailureSink for LogFailureSink {
    fn property_query_failed(&self, unit: &str, property: &str, error: &ManagerError) {
        warn!(unit, property, error = %error, "unit property query failed");
    }
}

/// Prometheus collector over the systemd manager.
///
/// Owns the bus client for its lifetime. Scrapes serialize on the client
/// mutex, so concurrent HTTP requests never interleave bus traffic.
pub struct SystemdCollector<M: UnitManager> {
    manager: Mutex<M>,
    catalog: MetricCatalog,
    failures: Box<dyn PropertyFailureSink>,
}

impl<M: UnitManager> SystemdCollector<M> {
    pub fn new(manager: M, catalog: MetricCatalog) -> Self {
        Self {
            manager: Mutex::new(manager),
            catalog,
            failures: Box::new(LogFailureSink),
        }
    }

    pub fn with_failure_sink(mut self, sink: Box<dyn PropertyFailureSink>) -> Self {
        self.failures = sink;
        self
    }
}

impl<M: UnitManager> Collector for SystemdCollector<M> {
    fn desc(&self) -> Vec<&Desc> {
        self.catalog.descs()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let manager = self
            .manager
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let units = match manager.list_units() {
            Ok(units) => units,
            Err(error) => {
                // Scrape-fatal: no partial unit list. The next scrape starts
                // over with a fresh enumeration.
                error!(error = %error, "unit enumeration failed, dropping this scrape");
                return Vec::new();
            }
        };
        debug!(units = units.len(), "collecting unit properties");

        self.catalog.reset();
        for unit in &units {
            let type_key = unit_type_key(&unit.name);
            let Some(metrics) = self.catalog.unit_metrics(&type_key) else {
                continue;
            };

            for (&property, metric) in metrics {
                match manager.get_typed_property(&unit.name, &type_key, property) {
                    // All bits set means the manager does not track this
                    // property for this unit.
                    Ok(PropertyValue::Uint64(u64::MAX)) => {}
                    Ok(PropertyValue::Uint64(value)) => metric.observe(&unit.name, value),
                    // A value type we do not export; nothing to report.
                    Ok(PropertyValue::Other) => {}
                    Err(error) => {
                        self.failures
                            .property_query_failed(&unit.name, property, &error)
                    }
                }
            }
        }

        self.catalog.collect()
    }
}

/// Catalog key for a unit: the extension after the last dot with its first
/// character uppercased, matching systemd's unit-type interface naming
/// ("nginx.service" -> "Service").
fn unit_type_key(unit_name: &str) -> String {
    let suffix = unit_name.rsplit('.').next().unwrap_or(unit_name);
    let mut chars = suffix.chars();
    match chars.next() {
        Some(first) => std::iter::once(first.to_ascii_uppercase())
            .chain(chars)
            .collect(),
        None => String::new(),
    }
}
