//! systemd manager D-Bus client
//!
//! Wraps a blocking session on the system bus and exposes the two queries the
//! collector needs: enumerate units and read a single typed unit property.

use thiserror::Error;
use zbus::blocking::Connection;
use zbus::blocking::fdo::PropertiesProxy as PropertiesProxyBlocking;
use zbus::names::InterfaceName;
use zbus::zvariant::OwnedObjectPath;

const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
const UNIT_PATH_PREFIX: &str = "/org/freedesktop/systemd1/unit/";

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("failed to connect to the system bus: {0}")]
    Connection(#[source] zbus::Error),

    #[error("failed to list units: {0}")]
    ListUnits(#[source] zbus::Error),

    #[error("failed to query {property} on {unit}: {source}")]
    Property {
        unit: String,
        property: String,
        #[source]
        source: zbus::Error,
    },
}

/// A unit known to the manager at enumeration time.
#[derive(Debug, Clone)]
pub struct UnitInfo {
    /// Full unit name including the type suffix, e.g. "nginx.service".
    pub name: String,
}

/// A unit property value as returned by the bus.
///
/// The collector only understands unsigned 64-bit quantities; everything else
/// is carried as `Other` so callers can treat it as "nothing to report"
/// without inspecting D-Bus signatures themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Uint64(u64),
    Other,
}

/// Query surface of the systemd manager consumed by the collector.
///
/// Kept as a trait so scrape logic can be exercised against a mock without a
/// running init system.
#[cfg_attr(test, mockall::automock)]
pub trait UnitManager: Send {
    fn list_units(&self) -> Result<Vec<UnitInfo>, ManagerError>;

    fn get_typed_property(
        &self,
        unit_name: &str,
        unit_type: &str,
        property: &str,
    ) -> Result<PropertyValue, ManagerError>;
}

/// Row layout of the manager's ListUnits reply (signature a(ssssssouso)).
type UnitListEntry = (
    String,          // unit name
    String,          // description
    String,          // load state
    String,          // active state
    String,          // sub state
    String,          // followed unit
    OwnedObjectPath, // unit object path
    u32,             // queued job id
    String,          // job type
    OwnedObjectPath, // job object path
);

#[zbus::proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1",
    gen_async = false
)]
pub trait SystemdManager {
    fn list_units(&self) -> zbus::Result<Vec<UnitListEntry>>;
}

/// Blocking client for the systemd manager on the system bus.
///
/// The connection is opened once and shared by every scrape; callers are
/// expected to serialize access (see the collector). Dropping the client
/// closes the connection.
pub struct ManagerClient {
    conn: Connection,
    manager: SystemdManagerProxy<'static>,
}

impl ManagerClient {
    /// Connect to the system bus. Fails fast when the bus or the systemd
    /// manager service is unreachable.
    pub fn connect() -> Result<Self, ManagerError> {
        let conn = Connection::system().map_err(ManagerError::Connection)?;
        let manager =
            SystemdManagerProxy::new(&conn).map_err(ManagerError::Connection)?;
        Ok(Self { conn, manager })
    }
}

impl UnitManager for ManagerClient {
    fn list_units(&self) -> Result<Vec<UnitInfo>, ManagerError> {
        let units = self.manager.list_units().map_err(ManagerError::ListUnits)?;
        Ok(units
            .into_iter()
            .map(|entry| UnitInfo { name: entry.0 })
            .collect())
    }

    fn get_typed_property(
        &self,
        unit_name: &str,
        unit_type: &str,
        property: &str,
    ) -> Result<PropertyValue, ManagerError> {
        let prop_err = |source: zbus::Error| ManagerError::Property {
            unit: unit_name.to_string(),
            property: property.to_string(),
            source,
        };

        let props = PropertiesProxyBlocking::builder(&self.conn)
            .destination(SYSTEMD_DESTINATION)
            .map_err(&prop_err)?
            .path(unit_object_path(unit_name))
            .map_err(&prop_err)?
            .build()
            .map_err(&prop_err)?;

        let interface =
            InterfaceName::try_from(format!("{SYSTEMD_DESTINATION}.{unit_type}"))
                .map_err(|e| prop_err(zbus::Error::from(e)))?;

        let value = props
            .get(interface, property)
            .map_err(|e| prop_err(zbus::Error::from(e)))?;

        Ok(match u64::try_from(value) {
            Ok(v) => PropertyValue::Uint64(v),
            Err(_) => PropertyValue::Other,
        })
    }
}

/// D-Bus object path of a unit, derived locally from its name.
///
/// systemd escapes every byte outside [A-Za-z0-9], and a leading digit, as
/// `_xx` lowercase hex; the empty name becomes a single underscore.
pub fn unit_object_path(unit_name: &str) -> String {
    format!("{}{}", UNIT_PATH_PREFIX, bus_path_escape(unit_name))
}

fn bus_path_escape(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }

    let mut escaped = String::with_capacity(name.len());
    for (i, byte) in name.bytes().enumerate() {
        let literal = byte.is_ascii_alphabetic() || (i > 0 && byte.is_ascii_digit());
        if literal {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("_{byte:02x}"));
        }
    }
    escaped
}
