//! Declarative configuration: the `Config` an external loader (YAML, env)
//! populates before handing it to the lifecycle orchestrator.
//!
//! Field names and defaults follow the schema an installation's config file
//! is validated against; unset fields fall back to [`Default`] impls here,
//! then [`Config::apply_env_overrides`] lets a handful of `XKNX_*`
//! environment variables win over both.

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::scanner::GatewayScanFilter;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

/// KNXnet/IP routing/discovery multicast group.
pub const DEFAULT_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 23, 12);
/// KNXnet/IP routing/discovery multicast port.
pub const DEFAULT_MULTICAST_PORT: u16 = 3671;
/// Default outbound telegram rate limit, in telegrams per second.
pub const DEFAULT_RATE_LIMIT: u32 = 20;
/// Default wait before a reconnect attempt.
pub const DEFAULT_AUTO_RECONNECT_WAIT: Duration = Duration::from_secs(3);

fn deserialize_from_str<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

fn deserialize_duration_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Ok(Duration::from_secs_f64(secs))
}

/// How a gateway is located and reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    /// Scan for a gateway and pick the best transport it advertises.
    Automatic,
    Tunneling,
    TunnelingTcp,
    TunnelingTcpSecure,
    Routing,
    RoutingSecure,
}

impl Default for ConnectionType {
    fn default() -> Self {
        Self::Automatic
    }
}

/// KNX IP Secure credentials, required by the `*_SECURE` connection types.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SecureConfig {
    pub backbone_key: Option<String>,
    pub latency_ms: Option<u32>,
    pub user_id: Option<u16>,
    pub device_authentication_password: Option<String>,
    pub user_password: Option<String>,
    pub knxkeys_file_path: Option<String>,
    pub knxkeys_password: Option<String>,
}

/// The `connection` section: how and where to reach a gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ConnectionConfig {
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub gateway_ip: Option<Ipv4Addr>,
    pub gateway_port: u16,
    pub local_ip: Option<Ipv4Addr>,
    pub local_port: u16,
    pub route_back: bool,
    pub multicast_group: Ipv4Addr,
    pub multicast_port: u16,
    pub auto_reconnect: bool,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub auto_reconnect_wait: Duration,
    pub threaded: bool,
    pub scan_filter: GatewayScanFilter,
    pub secure: Option<SecureConfig>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_type: ConnectionType::default(),
            gateway_ip: None,
            gateway_port: DEFAULT_MULTICAST_PORT,
            local_ip: None,
            local_port: 0,
            route_back: false,
            multicast_group: DEFAULT_MULTICAST_GROUP,
            multicast_port: DEFAULT_MULTICAST_PORT,
            auto_reconnect: true,
            auto_reconnect_wait: DEFAULT_AUTO_RECONNECT_WAIT,
            threaded: false,
            scan_filter: GatewayScanFilter::any(),
            secure: None,
        }
    }
}

/// The `general` section: this instance's own identity and bus manners.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct GeneralConfig {
    #[serde(deserialize_with = "deserialize_from_str")]
    pub own_address: IndividualAddress,
    pub rate_limit: u32,
    pub multicast_group: Ipv4Addr,
    pub multicast_port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            own_address: IndividualAddress::from(0u16),
            rate_limit: DEFAULT_RATE_LIMIT,
            multicast_group: DEFAULT_MULTICAST_GROUP,
            multicast_port: DEFAULT_MULTICAST_PORT,
        }
    }
}

/// The `groups` section: named device kinds, each a list of the group
/// addresses it exposes (e.g. `"living_room_light": ["1/0/1", "1/0/2"]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct GroupsConfig {
    #[serde(deserialize_with = "deserialize_group_map")]
    pub by_kind: HashMap<String, Vec<GroupAddress>>,
}

fn deserialize_group_map<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, Vec<GroupAddress>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = HashMap::<String, Vec<String>>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(kind, addrs)| {
            let addrs = addrs
                .iter()
                .map(|s| s.parse().map_err(serde::de::Error::custom))
                .collect::<std::result::Result<Vec<GroupAddress>, D::Error>>()?;
            Ok((kind, addrs))
        })
        .collect()
}

impl GroupsConfig {
    /// All group addresses registered under `kind`, or an empty slice if
    /// the kind is not present.
    pub fn kind(&self, kind: &str) -> &[GroupAddress] {
        self.by_kind.get(kind).map_or(&[], Vec::as_slice)
    }
}

/// Top-level configuration, as produced by a YAML loader (or assembled by
/// hand) and consumed by [`crate::orchestrator`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub general: GeneralConfig,
    pub groups: GroupsConfig,
}

impl Config {
    /// Parse a YAML document into a `Config`, falling back to defaults for
    /// any field it omits.
    ///
    /// # Errors
    ///
    /// Returns an error if `yaml` is not well-formed or a field fails to
    /// parse against its expected type.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|_| KnxError::invalid_config())
    }

    /// Apply `XKNX_*` environment variable overrides on top of whatever was
    /// loaded from a config file, letting the environment win.
    ///
    /// Recognised variables: `XKNX_GENERAL_OWN_ADDRESS`,
    /// `XKNX_GENERAL_RATE_LIMIT`, `XKNX_GENERAL_MULTICAST_GROUP`,
    /// `XKNX_GENERAL_MULTICAST_PORT`, `XKNX_CONNECTION_GATEWAY_IP`,
    /// `XKNX_CONNECTION_GATEWAY_PORT`, `XKNX_CONNECTION_LOCAL_IP`,
    /// `XKNX_CONNECTION_ROUTE_BACK`. Unset or unparsable variables are
    /// left alone rather than clearing the existing value.
    pub fn apply_env_overrides(&mut self) {
        if let Some(addr) = env_parsed::<IndividualAddress>("XKNX_GENERAL_OWN_ADDRESS") {
            self.general.own_address = addr;
        }
        if let Some(limit) = env_parsed::<u32>("XKNX_GENERAL_RATE_LIMIT") {
            self.general.rate_limit = limit;
        }
        if let Some(group) = env_parsed::<Ipv4Addr>("XKNX_GENERAL_MULTICAST_GROUP") {
            self.general.multicast_group = group;
        }
        if let Some(port) = env_parsed::<u16>("XKNX_GENERAL_MULTICAST_PORT") {
            self.general.multicast_port = port;
        }
        if let Some(ip) = env_parsed::<Ipv4Addr>("XKNX_CONNECTION_GATEWAY_IP") {
            self.connection.gateway_ip = Some(ip);
        }
        if let Some(port) = env_parsed::<u16>("XKNX_CONNECTION_GATEWAY_PORT") {
            self.connection.gateway_port = port;
        }
        if let Some(ip) = env_parsed::<Ipv4Addr>("XKNX_CONNECTION_LOCAL_IP") {
            self.connection.local_ip = Some(ip);
        }
        if let Some(route_back) = env_parsed::<bool>("XKNX_CONNECTION_ROUTE_BACK") {
            self.connection.route_back = route_back;
        }
    }

    /// Validate cross-field invariants a schema alone can't express:
    /// secure connection types require a `secure` section.
    ///
    /// # Errors
    ///
    /// Returns an error if `connection.type` demands secure credentials
    /// that `connection.secure` does not provide.
    pub fn validate(&self) -> Result<()> {
        let needs_secure = matches!(
            self.connection.connection_type,
            ConnectionType::TunnelingTcpSecure | ConnectionType::RoutingSecure
        );
        if needs_secure && self.connection.secure.is_none() {
            return Err(KnxError::missing_config_field());
        }
        Ok(())
    }
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_schema_validated_values() {
        let config = Config::default();
        assert_eq!(config.connection.connection_type, ConnectionType::Automatic);
        assert_eq!(config.connection.multicast_group, DEFAULT_MULTICAST_GROUP);
        assert!(config.connection.auto_reconnect);
        assert_eq!(config.general.rate_limit, DEFAULT_RATE_LIMIT);
    }

    #[test]
    fn parses_minimal_yaml_filling_in_defaults() {
        let yaml = "connection:\n  type: TUNNELING\n  gateway_ip: 192.168.1.10\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.connection.connection_type, ConnectionType::Tunneling);
        assert_eq!(config.connection.gateway_ip, Some(Ipv4Addr::new(192, 168, 1, 10)));
        assert_eq!(config.connection.gateway_port, DEFAULT_MULTICAST_PORT);
    }

    #[test]
    fn parses_group_addresses_and_general_own_address() {
        let yaml = "general:\n  own_address: \"1.1.1\"\ngroups:\n  living_room_light:\n    - \"1/0/1\"\n    - \"1/0/2\"\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.general.own_address, IndividualAddress::new(1, 1, 1).unwrap());
        assert_eq!(
            config.groups.kind("living_room_light"),
            &[GroupAddress::new(1, 0, 1).unwrap(), GroupAddress::new(1, 0, 2).unwrap()]
        );
        assert!(config.groups.kind("nonexistent").is_empty());
    }

    #[test]
    fn secure_connection_type_without_secure_section_fails_validation() {
        let mut config = Config::default();
        config.connection.connection_type = ConnectionType::RoutingSecure;
        assert!(config.validate().is_err());

        config.connection.secure = Some(SecureConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        // SAFETY (test-only): single-threaded test, restored immediately after.
        std::env::set_var("XKNX_GENERAL_RATE_LIMIT", "5");
        std::env::set_var("XKNX_CONNECTION_ROUTE_BACK", "true");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.general.rate_limit, 5);
        assert!(config.connection.route_back);

        std::env::remove_var("XKNX_GENERAL_RATE_LIMIT");
        std::env::remove_var("XKNX_CONNECTION_ROUTE_BACK");
    }
}
