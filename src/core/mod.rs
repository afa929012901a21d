pub mod catalog;
pub mod collector;
pub mod systemd;

pub use catalog::{MetricCatalog, MetricKind};
pub use collector::{LogFailureSink, PropertyFailureSink, SystemdCollector};
pub use systemd::{ManagerClient, ManagerError, PropertyValue, UnitInfo, UnitManager};
