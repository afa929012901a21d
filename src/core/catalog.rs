//! Metric catalog
//!
//! Static mapping from unit type to the set of bus properties exported for
//! that type. Built once at startup and read-only afterwards; the collector
//! looks units up here to decide what to query.

use std::collections::HashMap;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, Opts};

const UNIT_LABEL: &str = "unit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Properties exported for units of type "Service".
///
/// Every property listed here is a genuine u64-typed property of the
/// org.freedesktop.systemd1.Service interface. Counters carry the `_total`
/// suffix, gauges do not.
const SERVICE_METRICS: &[(&str, &str, &str, MetricKind)] = &[
    (
        "CPUUsageNSec",
        "systemd_service_cpu_usage_nanoseconds_total",
        "Total CPU time consumed by the service, in nanoseconds.",
        MetricKind::Counter,
    ),
    (
        "IPIngressBytes",
        "systemd_service_ip_ingress_bytes_total",
        "Total ingress IP traffic of the service, in bytes.",
        MetricKind::Counter,
    ),
    (
        "IPIngressPackets",
        "systemd_service_ip_ingress_packets_total",
        "Total ingress IP packets of the service.",
        MetricKind::Counter,
    ),
    (
        "IPEgressBytes",
        "systemd_service_ip_egress_bytes_total",
        "Total egress IP traffic of the service, in bytes.",
        MetricKind::Counter,
    ),
    (
        "IPEgressPackets",
        "systemd_service_ip_egress_packets_total",
        "Total egress IP packets of the service.",
        MetricKind::Counter,
    ),
    (
        "MemoryCurrent",
        "systemd_service_memory_current_bytes",
        "Current memory usage of the service, in bytes.",
        MetricKind::Gauge,
    ),
    (
        "TasksCurrent",
        "systemd_service_tasks_current",
        "Current number of tasks in the service, user processes and kernel threads alike.",
        MetricKind::Gauge,
    ),
];

/// One exported metric family backing a (unit type, property) pair.
///
/// The family owns its descriptor, so Describe output is identical across
/// scrapes. Samples are labeled with the full unit name.
pub enum UnitMetric {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

impl UnitMetric {
    fn new(kind: MetricKind, name: &str, help: &str) -> prometheus::Result<Self> {
        let opts = Opts::new(name, help);
        Ok(match kind {
            MetricKind::Counter => Self::Counter(CounterVec::new(opts, &[UNIT_LABEL])?),
            MetricKind::Gauge => Self::Gauge(GaugeVec::new(opts, &[UNIT_LABEL])?),
        })
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
        }
    }

    /// Record one observation for the given unit.
    pub fn observe(&self, unit_name: &str, value: u64) {
        match self {
            Self::Counter(vec) => vec.with_label_values(&[unit_name]).inc_by(value as f64),
            Self::Gauge(vec) => vec.with_label_values(&[unit_name]).set(value as f64),
        }
    }

    fn desc(&self) -> Vec<&Desc> {
        match self {
            Self::Counter(vec) => vec.desc(),
            Self::Gauge(vec) => vec.desc(),
        }
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self {
            Self::Counter(vec) => vec.collect(),
            Self::Gauge(vec) => vec.collect(),
        }
    }

    fn reset(&self) {
        match self {
            Self::Counter(vec) => vec.reset(),
            Self::Gauge(vec) => vec.reset(),
        }
    }
}

/// Static nested table: unit type -> property name -> exported family.
pub struct MetricCatalog {
    by_type: HashMap<&'static str, HashMap<&'static str, UnitMetric>>,
}

impl MetricCatalog {
    /// Build the fixed catalog. Fails only if a baked-in name or help text is
    /// rejected by descriptor validation, which is a programming error.
    pub fn new() -> prometheus::Result<Self> {
        let mut service = HashMap::new();
        for &(property, name, help, kind) in SERVICE_METRICS {
            service.insert(property, UnitMetric::new(kind, name, help)?);
        }

        let mut by_type = HashMap::new();
        by_type.insert("Service", service);
        Ok(Self { by_type })
    }

    pub fn lookup(&self, unit_type: &str, property: &str) -> Option<&UnitMetric> {
        self.by_type.get(unit_type)?.get(property)
    }

    /// All properties tracked for a unit type, or None when the type is not
    /// in the catalog at all.
    pub fn unit_metrics(
        &self,
        unit_type: &str,
    ) -> Option<&HashMap<&'static str, UnitMetric>> {
        self.by_type.get(unit_type)
    }

    pub fn descs(&self) -> Vec<&Desc> {
        self.entries().flat_map(UnitMetric::desc).collect()
    }

    pub fn collect(&self) -> Vec<MetricFamily> {
        self.entries().flat_map(|metric| metric.collect()).collect()
    }

    /// Drop every sample recorded by the previous scrape.
    pub fn reset(&self) {
        for metric in self.entries() {
            metric.reset();
        }
    }

    fn entries(&self) -> impl Iterator<Item = &UnitMetric> {
        self.by_type.values().flat_map(HashMap::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_service_properties() {
        let catalog = MetricCatalog::new().unwrap();

        let cpu = catalog.lookup("Service", "CPUUsageNSec").unwrap();
        assert_eq!(cpu.kind(), MetricKind::Counter);

        let memory = catalog.lookup("Service", "MemoryCurrent").unwrap();
        assert_eq!(memory.kind(), MetricKind::Gauge);
    }

    #[test]
    fn lookup_misses_unknown_keys() {
        let catalog = MetricCatalog::new().unwrap();

        assert!(catalog.lookup("Mount", "CPUUsageNSec").is_none());
        assert!(catalog.lookup("Service", "NoSuchProperty").is_none());
        assert!(catalog.unit_metrics("Timer").is_none());
    }

    #[test]
    fn descriptor_set_is_stable_across_calls() {
        let catalog = MetricCatalog::new().unwrap();

        let names = |descs: Vec<&Desc>| {
            let mut names: Vec<String> =
                descs.into_iter().map(|d| d.fq_name.clone()).collect();
            names.sort();
            names
        };

        let first = names(catalog.descs());
        let second = names(catalog.descs());

        assert_eq!(first.len(), SERVICE_METRICS.len());
        assert_eq!(first, second);
        assert!(first.contains(&"systemd_service_ip_egress_packets_total".to_string()));
    }

    #[test]
    fn counters_carry_the_total_suffix() {
        for &(property, name, _, kind) in SERVICE_METRICS {
            match kind {
                MetricKind::Counter => {
                    assert!(name.ends_with("_total"), "{property} -> {name}")
                }
                MetricKind::Gauge => {
                    assert!(!name.ends_with("_total"), "{property} -> {name}")
                }
            }
        }
    }

    #[test]
    fn reset_clears_recorded_samples() {
        let catalog = MetricCatalog::new().unwrap();
        let tasks = catalog.lookup("Service", "TasksCurrent").unwrap();

        tasks.observe("nginx.service", 7);
        let recorded: usize = catalog.collect().iter().map(|mf| mf.get_metric().len()).sum();
        assert_eq!(recorded, 1);

        catalog.reset();
        let after_reset: usize = catalog.collect().iter().map(|mf| mf.get_metric().len()).sum();
        assert_eq!(after_reset, 0);
    }
}
