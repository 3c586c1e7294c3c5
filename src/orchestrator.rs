//! Lifecycle orchestrator: turns a [`Config`] into a running, self-healing
//! KNX link.
//!
//! `start()` picks a transport (scanning when `connection.type` is
//! [`ConnectionType::Automatic`], preferring a TCP tunnel, then a UDP
//! tunnel, then routing), brings it to an active connection, and starts
//! the telegram queue's outbound/inbound pumps, the caller's dispatcher and
//! state updater, and a heartbeat task registered with the connection
//! manager so it is cancelled and respawned across a reconnect. `stop()`
//! unwinds all of that in reverse and releases the underlying socket.

use crate::addressing::IndividualAddress;
use crate::config::{Config, ConnectionConfig, ConnectionType};
use crate::connection_manager::{ConnectionManager, ConnectionState};
use crate::error::{KnxError, Result};
use crate::net::tcp::TCPTransport;
use crate::net::udp::UdpTransport;
use crate::protocol::async_tunnel::{AsyncTunnelClient, HEARTBEAT_INTERVAL};
use crate::protocol::constants::CEMIMessageCode;
use crate::queue::{self, Dispatcher, TelegramQueue};
use crate::router::MulticastRouter;
use crate::scanner::{scan, ScanOptions};
use crate::state_updater::StateUpdater;
use crate::telegram::{Direction, Telegram};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const MAX_CEMI_SIZE: usize = 64;

/// The concrete, connected transport behind a running orchestrator.
enum Link {
    TunnelUdp(AsyncTunnelClient<UdpTransport>),
    TunnelTcp(AsyncTunnelClient<TCPTransport>),
    Routing(MulticastRouter<UdpTransport>),
}

impl Link {
    async fn send(&mut self, telegram: &Telegram) -> Result<()> {
        match self {
            Self::TunnelUdp(client) => {
                let mut buf = [0u8; MAX_CEMI_SIZE];
                let n = telegram.to_cemi(CEMIMessageCode::LDataReq, &mut buf)?;
                client.send_cemi(&buf[..n]).await
            }
            Self::TunnelTcp(client) => {
                let mut buf = [0u8; MAX_CEMI_SIZE];
                let n = telegram.to_cemi(CEMIMessageCode::LDataReq, &mut buf)?;
                client.send_cemi(&buf[..n]).await
            }
            Self::Routing(router) => router.send(telegram).await,
        }
    }

    /// Poll once for an inbound telegram. `Ok(None)` means nothing arrived
    /// (a poll timeout for tunnels, or an internally-handled datagram for
    /// routing) and the caller should simply poll again.
    async fn recv(&mut self) -> Result<Option<Telegram>> {
        match self {
            Self::TunnelUdp(client) => match client.receive().await? {
                Some(cemi) => Ok(Some(Telegram::from_cemi(&cemi, Direction::Incoming)?)),
                None => Ok(None),
            },
            Self::TunnelTcp(client) => match client.receive().await? {
                Some(cemi) => Ok(Some(Telegram::from_cemi(&cemi, Direction::Incoming)?)),
                None => Ok(None),
            },
            Self::Routing(router) => router.recv().await,
        }
    }

    async fn heartbeat(&mut self) -> Result<()> {
        match self {
            Self::TunnelUdp(client) => client.heartbeat().await,
            Self::TunnelTcp(client) => client.heartbeat().await,
            Self::Routing(_) => Ok(()),
        }
    }

    async fn disconnect(&mut self) {
        match self {
            Self::TunnelUdp(client) => {
                let _ = client.disconnect().await;
            }
            Self::TunnelTcp(client) => {
                let _ = client.disconnect().await;
            }
            Self::Routing(_) => {}
        }
    }
}

async fn connect_tunnel_udp(ip: std::net::Ipv4Addr, port: u16, local_port: u16) -> Result<Link> {
    let transport = UdpTransport::bind(local_port).await?;
    let mut client = AsyncTunnelClient::new(transport, ip.octets(), port);
    client.connect().await?;
    Ok(Link::TunnelUdp(client))
}

async fn connect_tunnel_tcp(ip: std::net::Ipv4Addr, port: u16) -> Result<Link> {
    let transport = TCPTransport::connect(SocketAddr::from((ip, port))).await?;
    let mut client = AsyncTunnelClient::new(transport, ip.octets(), port);
    client.connect().await?;
    Ok(Link::TunnelTcp(client))
}

async fn connect_routing(own_address: IndividualAddress, group: std::net::Ipv4Addr, port: u16) -> Result<Link> {
    Ok(Link::Routing(MulticastRouter::bind(own_address, group, port).await?))
}

async fn establish_link(config: &ConnectionConfig, own_address: IndividualAddress) -> Result<Link> {
    match config.connection_type {
        ConnectionType::Routing | ConnectionType::RoutingSecure => {
            connect_routing(own_address, config.multicast_group, config.multicast_port).await
        }
        ConnectionType::Tunneling => {
            let ip = config.gateway_ip.ok_or_else(KnxError::missing_config_field)?;
            connect_tunnel_udp(ip, config.gateway_port, config.local_port).await
        }
        ConnectionType::TunnelingTcp | ConnectionType::TunnelingTcpSecure => {
            let ip = config.gateway_ip.ok_or_else(KnxError::missing_config_field)?;
            connect_tunnel_tcp(ip, config.gateway_port).await
        }
        ConnectionType::Automatic => {
            let options = ScanOptions {
                timeout: Duration::from_secs(3),
                stop_on_found: Some(1),
                local_interface: config.local_ip,
                filter: config.scan_filter.clone(),
            };
            let gateway = scan(&options)
                .await?
                .into_iter()
                .next()
                .ok_or_else(KnxError::no_interface)?;

            info!(gateway = %gateway.name, ip = %gateway.ip, "discovered gateway for automatic connection");

            if gateway.supports_tunnelling_tcp {
                connect_tunnel_tcp(gateway.ip, gateway.port).await
            } else if gateway.supports_tunnelling {
                connect_tunnel_udp(gateway.ip, gateway.port, config.local_port).await
            } else if gateway.supports_routing {
                connect_routing(own_address, config.multicast_group, config.multicast_port).await
            } else {
                Err(KnxError::no_interface())
            }
        }
    }
}

/// A running KNX link: telegram queue pumps, the caller's dispatcher and
/// state updater, and a self-restarting heartbeat, all wired to one
/// connected transport.
pub struct KnxOrchestrator {
    connection_manager: ConnectionManager,
    queue: TelegramQueue,
    outbound_handle: JoinHandle<()>,
    inbound_handle: JoinHandle<()>,
    dispatcher_handle: JoinHandle<()>,
    state_updater_handles: Vec<JoinHandle<()>>,
    link: Arc<AsyncMutex<Link>>,
}

impl KnxOrchestrator {
    /// Establish a link per `config`, then start the telegram queue's
    /// outbound/inbound pumps, `dispatcher`, `state_updater`, and a
    /// reconnect-aware heartbeat.
    ///
    /// `dispatcher` and `state_updater` should already have their devices,
    /// callbacks, and tracked values registered; the orchestrator only
    /// drives them.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid, no gateway responds to
    /// discovery (`AUTOMATIC`), or the initial connect/bind fails.
    pub async fn start(mut config: Config, dispatcher: Dispatcher, state_updater: StateUpdater) -> Result<Self> {
        config.apply_env_overrides();
        config.validate()?;

        let own_address = config.general.own_address;
        let connection_manager = ConnectionManager::new();
        connection_manager.set_state(ConnectionState::Connecting);

        let link = establish_link(&config.connection, own_address).await?;
        connection_manager.set_state(ConnectionState::Connected);
        let link = Arc::new(AsyncMutex::new(link));

        let (telegram_queue, outbound_rx, inbound_rx) = TelegramQueue::new(queue::DEFAULT_CAPACITY);

        let outbound_handle = {
            let link = Arc::clone(&link);
            let rate_limit = config.general.rate_limit.max(1);
            tokio::spawn(queue::run_outbound_limiter(outbound_rx, rate_limit, move |telegram| {
                let link = Arc::clone(&link);
                async move { link.lock().await.send(&telegram).await }
            }))
        };

        let inbound_handle = {
            let link = Arc::clone(&link);
            let queue = telegram_queue.clone();
            let connection_manager = connection_manager.clone();
            tokio::spawn(async move {
                loop {
                    let outcome = link.lock().await.recv().await;
                    match outcome {
                        Ok(Some(telegram)) => {
                            if queue.deliver_inbound(telegram).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(%err, "inbound receive failed, marking connection disconnected");
                            connection_manager.set_state(ConnectionState::Disconnected);
                        }
                    }
                }
            })
        };

        let dispatcher_handle = tokio::spawn(dispatcher.run(inbound_rx));
        let state_updater_handles = state_updater.spawn_all(telegram_queue.clone(), own_address);

        {
            let link = Arc::clone(&link);
            connection_manager.register_task("heartbeat", true, move || {
                let link = Arc::clone(&link);
                async move {
                    loop {
                        tokio::time::sleep(HEARTBEAT_INTERVAL).await;
                        if link.lock().await.heartbeat().await.is_err() {
                            break;
                        }
                    }
                }
            });
        }

        Ok(Self {
            connection_manager,
            queue: telegram_queue,
            outbound_handle,
            inbound_handle,
            dispatcher_handle,
            state_updater_handles,
            link,
        })
    }

    /// The telegram queue handle, for enqueuing outbound telegrams or
    /// handing to additional producers (e.g. a device API built on top).
    pub fn queue(&self) -> &TelegramQueue {
        &self.queue
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_manager.state()
    }

    /// Stop everything this orchestrator started, in reverse order, and
    /// disconnect the underlying transport so its socket/USB handle is
    /// released.
    pub async fn stop(self) {
        self.outbound_handle.abort();
        self.inbound_handle.abort();
        self.dispatcher_handle.abort();
        for handle in self.state_updater_handles {
            handle.abort();
        }
        self.connection_manager.stop().await;
        self.link.lock().await.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tunneling_without_gateway_ip_is_a_config_error() {
        let mut config = ConnectionConfig::default();
        config.connection_type = ConnectionType::Tunneling;
        config.gateway_ip = None;

        let result = establish_link(&config, IndividualAddress::new(1, 1, 1).unwrap()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn tunneling_tcp_without_gateway_ip_is_a_config_error() {
        let mut config = ConnectionConfig::default();
        config.connection_type = ConnectionType::TunnelingTcp;
        config.gateway_ip = None;

        let result = establish_link(&config, IndividualAddress::new(1, 1, 1).unwrap()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn routing_connects_without_a_gateway_address() {
        let mut config = ConnectionConfig::default();
        config.connection_type = ConnectionType::Routing;
        config.multicast_port = 0; // ephemeral, avoid clashing with a real router on the test host

        let link = establish_link(&config, IndividualAddress::new(1, 1, 1).unwrap()).await;
        assert!(link.is_ok());
    }
}
