//! KNXnet/IP gateway discovery.
//!
//! Sends both the legacy `SEARCH_REQUEST` and the core-v2
//! `SEARCH_REQUEST_EXTENDED` to the KNXnet/IP discovery multicast group and
//! collects `SearchResponse(Extended)` replies into [`GatewayDescriptor`]s,
//! deduplicated by control-endpoint `(ip, port)`.

use crate::addressing::IndividualAddress;
use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use crate::net::udp::UdpTransport;
use crate::protocol::constants::ServiceType;
use crate::protocol::dib::Dib;
use crate::protocol::frame::{Hpai, KnxnetIpFrame};
use crate::protocol::services::{SearchRequest, SearchRequestExtended, SearchResponse, SearchResponseExtended};
use crate::protocol::srp::Srp;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// KNXnet/IP discovery multicast group.
pub const DISCOVERY_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 23, 12);
/// KNXnet/IP discovery multicast port.
pub const DISCOVERY_PORT: u16 = 3671;

/// Service family ids carried in `SUPP_SVC_FAMILIES`/`SECURED_SERVICE_FAMILIES` DIBs.
mod family {
    pub const CORE: u8 = 0x02;
    pub const DEVICE_MANAGEMENT: u8 = 0x03;
    pub const TUNNELLING: u8 = 0x04;
    pub const ROUTING: u8 = 0x05;
}

/// `TUNNELLING` family version at which core-v2 (TCP-capable) tunnelling is advertised.
const TUNNELLING_TCP_VERSION: u8 = 2;

/// A discovered KNXnet/IP gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayDescriptor {
    pub name: String,
    pub ip: Ipv4Addr,
    pub port: u16,
    pub individual_address: IndividualAddress,
    pub local_ip: Ipv4Addr,
    pub local_interface: Option<Ipv4Addr>,
    pub supports_routing: bool,
    pub supports_tunnelling: bool,
    pub supports_tunnelling_tcp: bool,
    pub supports_secure: bool,
    pub core_version: u8,
    pub tunnelling_requires_secure: bool,
    pub routing_requires_secure: bool,
    pub tunnelling_slots: Vec<u8>,
}

impl GatewayDescriptor {
    fn from_dibs(
        control_endpoint: Hpai,
        dibs: &[Dib],
        is_extended: bool,
        local_ip: Ipv4Addr,
        local_interface: Option<Ipv4Addr>,
    ) -> Self {
        let mut name = String::new();
        let mut individual_address = IndividualAddress::from(0u16);
        let mut supports_routing = false;
        let mut supports_tunnelling = false;
        let mut supports_tunnelling_tcp = false;
        let mut tunnelling_requires_secure = false;
        let mut routing_requires_secure = false;
        let mut supports_secure = false;
        let mut tunnelling_slots = Vec::new();

        for dib in dibs {
            match dib {
                Dib::DeviceInfo(info) => {
                    name = info.friendly_name_str().to_string();
                    individual_address = IndividualAddress::from(info.individual_address);
                }
                Dib::SuppSvcFamilies(families) => {
                    for f in families {
                        match f.id {
                            family::TUNNELLING => {
                                supports_tunnelling = true;
                                if f.version >= TUNNELLING_TCP_VERSION {
                                    supports_tunnelling_tcp = true;
                                }
                            }
                            family::ROUTING => supports_routing = true,
                            family::CORE | family::DEVICE_MANAGEMENT => {}
                            _ => {}
                        }
                    }
                }
                Dib::SecuredServiceFamilies(families) => {
                    supports_secure = !families.is_empty();
                    for f in families {
                        match f.id {
                            family::TUNNELLING => tunnelling_requires_secure = true,
                            family::ROUTING => routing_requires_secure = true,
                            _ => {}
                        }
                    }
                }
                Dib::Other { dib_type: 0x07, data } => tunnelling_slots = data.clone(),
                Dib::Other { .. } => {}
            }
        }

        Self {
            name,
            ip: Ipv4Addr::from(control_endpoint.ip_address),
            port: control_endpoint.port,
            individual_address,
            local_ip,
            local_interface,
            supports_routing,
            supports_tunnelling,
            supports_tunnelling_tcp,
            supports_secure,
            core_version: u8::from(is_extended) + 1,
            tunnelling_requires_secure,
            routing_requires_secure,
            tunnelling_slots,
        }
    }
}

/// Filters applied to discovered gateways: OR across the enabled transport
/// methods, AND with a name substring match.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct GatewayScanFilter {
    pub name: Option<String>,
    pub tunnelling: bool,
    pub tunnelling_tcp: bool,
    pub routing: bool,
    pub secure_tunnelling: bool,
    pub secure_routing: bool,
}

impl GatewayScanFilter {
    /// No filtering: every discovered gateway matches.
    pub fn any() -> Self {
        Self::default()
    }

    fn any_method_enabled(&self) -> bool {
        self.tunnelling || self.tunnelling_tcp || self.routing || self.secure_tunnelling || self.secure_routing
    }

    /// Whether `gateway` satisfies this filter.
    pub fn matches(&self, gateway: &GatewayDescriptor) -> bool {
        let name_ok = match self.name.as_deref() {
            Some(n) => gateway.name.contains(n),
            None => true,
        };

        let method_ok = !self.any_method_enabled()
            || (self.tunnelling && gateway.supports_tunnelling)
            || (self.tunnelling_tcp && gateway.supports_tunnelling_tcp)
            || (self.routing && gateway.supports_routing)
            || (self.secure_tunnelling && gateway.supports_tunnelling && gateway.tunnelling_requires_secure)
            || (self.secure_routing && gateway.supports_routing && gateway.routing_requires_secure);

        name_ok && method_ok
    }
}

/// Scan options.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to keep listening for responses.
    pub timeout: Duration,
    /// Stop early once this many distinct gateways have answered.
    pub stop_on_found: Option<usize>,
    /// Bind the discovery socket to a specific local interface address
    /// instead of letting the OS route to its default interface.
    pub local_interface: Option<Ipv4Addr>,
    /// Post-hoc filter applied to the collected gateways.
    pub filter: GatewayScanFilter,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            stop_on_found: None,
            local_interface: None,
            filter: GatewayScanFilter::any(),
        }
    }
}

/// Send `SEARCH_REQUEST` and `SEARCH_REQUEST_EXTENDED` to the discovery
/// multicast group and collect matching gateways for `options.timeout` (or
/// until `options.stop_on_found` distinct gateways have answered).
///
/// # Errors
///
/// Returns an error if the discovery socket cannot be bound.
pub async fn scan(options: &ScanOptions) -> Result<Vec<GatewayDescriptor>> {
    let mut transport = UdpTransport::bind(0).await?;
    transport.set_broadcast(true)?;
    let local_addr = transport.local_addr()?;
    let local_ip = match local_addr {
        SocketAddr::V4(v4) => *v4.ip(),
        SocketAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    };

    let discovery_endpoint = Hpai::new(local_ip.octets(), local_addr.port());
    let target = SocketAddr::from((DISCOVERY_GROUP, DISCOVERY_PORT));

    let mut buf = [0u8; 64];
    let legacy = SearchRequest::new(discovery_endpoint);
    let len = legacy.build(&mut buf)?;
    transport.send_to(&buf[..len], target).await?;

    let mut ext_buf = [0u8; 96];
    let extended = SearchRequestExtended::new(discovery_endpoint, Vec::<Srp>::new());
    let len = extended.build(&mut ext_buf)?;
    transport.send_to(&ext_buf[..len], target).await?;

    debug!(%target, "sent gateway discovery requests");

    let mut found: HashMap<(Ipv4Addr, u16), (bool, GatewayDescriptor)> = HashMap::new();
    let deadline = Instant::now() + options.timeout;
    let mut rx_buf = [0u8; 512];

    while Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let recv = tokio::time::timeout(remaining, transport.recv_from(&mut rx_buf)).await;
        let Ok(Ok((n, _from))) = recv else {
            break;
        };

        let Ok(frame) = KnxnetIpFrame::parse(&rx_buf[..n]) else {
            continue;
        };

        let (control_endpoint, dibs, is_extended) = match frame.service_type() {
            ServiceType::SearchResponse => match SearchResponse::parse(frame.body()) {
                Ok(r) => (r.control_endpoint, r.dibs, false),
                Err(e) => {
                    warn!(error = %e, "malformed SearchResponse, skipping");
                    continue;
                }
            },
            ServiceType::SearchResponseExtended => match SearchResponseExtended::parse(frame.body()) {
                Ok(r) => (r.control_endpoint, r.dibs, true),
                Err(e) => {
                    warn!(error = %e, "malformed SearchResponseExtended, skipping");
                    continue;
                }
            },
            _ => continue,
        };

        let key = (Ipv4Addr::from(control_endpoint.ip_address), control_endpoint.port);
        let descriptor = GatewayDescriptor::from_dibs(control_endpoint, &dibs, is_extended, local_ip, options.local_interface);

        match found.get(&key) {
            Some((true, _)) if !is_extended => {
                trace!(?key, "keeping previously-seen extended response");
            }
            _ => {
                found.insert(key, (is_extended, descriptor));
            }
        }

        if let Some(stop_on_found) = options.stop_on_found {
            if found.len() >= stop_on_found {
                break;
            }
        }
    }

    transport.close();

    let gateways = found
        .into_values()
        .map(|(_, descriptor)| descriptor)
        .filter(|g| options.filter.matches(g))
        .collect();

    Ok(gateways)
}

/// Describe a single, already-known gateway directly (bypassing multicast
/// discovery), using `DESCRIPTION_REQUEST`/`DESCRIPTION_RESPONSE`.
///
/// # Errors
///
/// Returns an error if the gateway does not respond within `timeout`.
pub async fn describe(gateway: SocketAddr, timeout: Duration) -> Result<GatewayDescriptor> {
    use crate::protocol::services::{DescriptionRequest, DescriptionResponse};

    let mut transport = UdpTransport::bind(0).await?;
    let local_addr = transport.local_addr()?;
    let local_ip = match local_addr {
        SocketAddr::V4(v4) => *v4.ip(),
        SocketAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    };

    let request = DescriptionRequest::new(Hpai::new(local_ip.octets(), local_addr.port()));
    let mut buf = [0u8; 32];
    let len = request.build(&mut buf)?;
    transport.send_to(&buf[..len], gateway).await?;

    let mut rx_buf = [0u8; 512];
    let (n, _from) = tokio::time::timeout(timeout, transport.recv_from(&mut rx_buf))
        .await
        .map_err(|_| KnxError::connection_timeout())??;

    let frame = KnxnetIpFrame::parse(&rx_buf[..n])?;
    if frame.service_type() != ServiceType::DescriptionResponse {
        return Err(KnxError::invalid_frame());
    }
    let response = DescriptionResponse::parse(frame.body())?;

    let SocketAddr::V4(gateway_v4) = gateway else {
        return Err(KnxError::invalid_address());
    };
    let control_endpoint = Hpai::new(gateway_v4.ip().octets(), gateway_v4.port());

    Ok(GatewayDescriptor::from_dibs(control_endpoint, &response.dibs, true, local_ip, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::dib::{DeviceInfo, ServiceFamily};

    fn device_info(name: &str) -> DeviceInfo {
        let mut friendly_name = [0u8; 30];
        friendly_name[..name.len()].copy_from_slice(name.as_bytes());
        DeviceInfo {
            knx_medium: 0x10,
            device_status: 0,
            individual_address: 0x1101,
            project_install_id: 0,
            serial_number: [0; 6],
            multicast_address: DISCOVERY_GROUP.octets(),
            mac_address: [0; 6],
            friendly_name,
        }
    }

    #[test]
    fn descriptor_from_dibs_reports_core_v2_tcp_support() {
        let dibs = vec![
            Dib::DeviceInfo(device_info("Gira KNX/IP-Router")),
            Dib::SuppSvcFamilies(vec![
                ServiceFamily { id: family::TUNNELLING, version: 2 },
                ServiceFamily { id: family::ROUTING, version: 1 },
            ]),
        ];
        let endpoint = Hpai::new([192, 168, 1, 10], 3671);
        let descriptor = GatewayDescriptor::from_dibs(endpoint, &dibs, true, Ipv4Addr::new(192, 168, 1, 5), None);

        assert_eq!(descriptor.name, "Gira KNX/IP-Router");
        assert!(descriptor.supports_tunnelling);
        assert!(descriptor.supports_tunnelling_tcp);
        assert!(descriptor.supports_routing);
        assert!(!descriptor.supports_secure);
        assert_eq!(descriptor.core_version, 2);
    }

    #[test]
    fn descriptor_from_legacy_response_is_core_v1() {
        let dibs = vec![
            Dib::DeviceInfo(device_info("Legacy Gateway")),
            Dib::SuppSvcFamilies(vec![ServiceFamily { id: family::TUNNELLING, version: 1 }]),
        ];
        let endpoint = Hpai::new([10, 0, 0, 1], 3671);
        let descriptor = GatewayDescriptor::from_dibs(endpoint, &dibs, false, Ipv4Addr::new(10, 0, 0, 5), None);

        assert_eq!(descriptor.core_version, 1);
        assert!(!descriptor.supports_tunnelling_tcp);
        assert!(!descriptor.supports_secure);
    }

    #[test]
    fn descriptor_flags_secure_tunnelling() {
        let dibs = vec![
            Dib::DeviceInfo(device_info("Secure Gateway")),
            Dib::SuppSvcFamilies(vec![ServiceFamily { id: family::TUNNELLING, version: 2 }]),
            Dib::SecuredServiceFamilies(vec![ServiceFamily { id: family::TUNNELLING, version: 2 }]),
        ];
        let endpoint = Hpai::new([10, 0, 0, 1], 3671);
        let descriptor = GatewayDescriptor::from_dibs(endpoint, &dibs, true, Ipv4Addr::new(10, 0, 0, 5), None);

        assert!(descriptor.supports_secure);
        assert!(descriptor.tunnelling_requires_secure);
        assert!(!descriptor.routing_requires_secure);
    }

    #[test]
    fn filter_ors_across_methods_and_ands_with_name() {
        let dibs = vec![
            Dib::DeviceInfo(device_info("Gira KNX/IP-Router")),
            Dib::SuppSvcFamilies(vec![ServiceFamily { id: family::ROUTING, version: 1 }]),
        ];
        let endpoint = Hpai::new([192, 168, 1, 10], 3671);
        let descriptor = GatewayDescriptor::from_dibs(endpoint, &dibs, false, Ipv4Addr::new(192, 168, 1, 5), None);

        let routing_filter = GatewayScanFilter { routing: true, ..GatewayScanFilter::any() };
        assert!(routing_filter.matches(&descriptor));

        let tunnelling_filter = GatewayScanFilter { tunnelling: true, ..GatewayScanFilter::any() };
        assert!(!tunnelling_filter.matches(&descriptor));

        let name_filter = GatewayScanFilter { name: Some("Gira".to_string()), ..GatewayScanFilter::any() };
        assert!(name_filter.matches(&descriptor));

        let wrong_name_filter = GatewayScanFilter { name: Some("Hager".to_string()), ..GatewayScanFilter::any() };
        assert!(!wrong_name_filter.matches(&descriptor));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let dibs = vec![Dib::DeviceInfo(device_info("Anything"))];
        let endpoint = Hpai::new([192, 168, 1, 10], 3671);
        let descriptor = GatewayDescriptor::from_dibs(endpoint, &dibs, false, Ipv4Addr::new(192, 168, 1, 5), None);
        assert!(GatewayScanFilter::any().matches(&descriptor));
    }
}
