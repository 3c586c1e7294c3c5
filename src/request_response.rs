//! Generic request/response runner for short control exchanges (Connect,
//! ConnectionState, Disconnect, Tunnelling ack): a single retrying,
//! timeout-bounded send/await-reply primitive parameterized over the
//! expected response service type and a correlation predicate, rather than
//! a family of duplicated per-service runners.

use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use crate::protocol::constants::ServiceType;
use crate::protocol::frame::KnxnetIpFrame;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::warn;

/// Default retry budget for heartbeat-class exchanges (`ConnectionState`).
pub const DEFAULT_HEARTBEAT_RETRIES: u32 = 3;
/// Default retry budget for connect-class exchanges.
pub const DEFAULT_CONNECT_RETRIES: u32 = 1;

/// Told when an exchange gives up after exhausting its retry budget, so a
/// connection manager can react (typically by triggering a reconnect).
pub trait FailureSink {
    fn report_persistent_failure(&mut self, service: ServiceType);
}

/// A `FailureSink` that discards reports; useful for one-off exchanges
/// (e.g. discovery) with no connection state to update.
impl FailureSink for () {
    fn report_persistent_failure(&mut self, _service: ServiceType) {}
}

/// Run one control exchange: send `request` to `gateway`, wait up to
/// `response_timeout` for a reply of `expected_service` satisfying
/// `correlates`, retrying the send up to `max_retries` additional times on
/// timeout. Packets from a different sender, of the wrong service type, or
/// failing `correlates` are ignored rather than treated as the answer.
///
/// Returns the accepted response body. On persistent failure (every attempt
/// timed out), reports to `failure_sink` and returns `Err(KnxError::Timeout)`
/// by way of [`crate::error::KnxError::connection_timeout`].
///
/// # Errors
///
/// Returns an error if the transport fails to send, or if no matching
/// response arrives within the full retry budget.
pub async fn request_response(
    transport: &mut impl AsyncTransport,
    gateway: SocketAddr,
    request: &[u8],
    expected_service: ServiceType,
    response_timeout: Duration,
    max_retries: u32,
    mut correlates: impl FnMut(&[u8]) -> bool,
    failure_sink: &mut impl FailureSink,
) -> Result<Vec<u8>> {
    let mut buf = [0u8; 512];

    for attempt in 0..=max_retries {
        transport.send_to(request, gateway).await?;
        let deadline = Instant::now() + response_timeout;

        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok(Ok((n, from))) = timeout(remaining, transport.recv_from(&mut buf)).await else {
                break;
            };

            if from != gateway {
                continue;
            }
            let Ok(frame) = KnxnetIpFrame::parse(&buf[..n]) else {
                continue;
            };
            if frame.service_type() == expected_service && correlates(frame.body()) {
                return Ok(frame.body().to_vec());
            }
        }

        if attempt < max_retries {
            warn!(?expected_service, attempt, "request/response timed out, retrying");
        }
    }

    failure_sink.report_persistent_failure(expected_service);
    Err(KnxError::connection_timeout())
}
