//! Telegram queue: bounded inbound/outbound channels bridging devices and
//! transports (tunnel/router), with outbound rate limiting and inbound
//! address-filtered dispatch.

use crate::addressing::{AddressFilter, GroupAddress};
use crate::error::{KnxError, Result};
use crate::telegram::{Destination, Telegram};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Default outbound rate limit, in telegrams per second.
pub const DEFAULT_RATE_LIMIT: u32 = 20;

/// Default channel capacity for both halves of the queue.
pub const DEFAULT_CAPACITY: usize = 256;

/// The producer/consumer halves of a telegram queue, handed to the tunnel
/// or router on one side and devices/subscribers on the other.
///
/// Cheaply cloneable: every clone shares the same underlying channels.
#[derive(Clone)]
pub struct TelegramQueue {
    outbound_tx: mpsc::Sender<Telegram>,
    inbound_tx: mpsc::Sender<Telegram>,
}

impl TelegramQueue {
    /// Create a new queue pair with `capacity`-deep bounded channels,
    /// returning the shared handle plus the two receiver ends: `outbound_rx`
    /// (consumed by the tunnel/router) and `inbound_rx` (consumed by a
    /// [`Dispatcher`]).
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Telegram>, mpsc::Receiver<Telegram>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        (Self { outbound_tx, inbound_tx }, outbound_rx, inbound_rx)
    }

    /// Enqueue a telegram for sending. Blocks (cooperatively yields) if the
    /// outbound queue is full, applying backpressure to the producer.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue has been shut down (receiver dropped).
    pub async fn send_outbound(&self, telegram: Telegram) -> Result<()> {
        self.outbound_tx.send(telegram).await.map_err(|_| KnxError::cancelled())
    }

    /// Deliver a telegram received off the bus for dispatch. Never drops:
    /// if the inbound queue is full, this awaits until space frees up.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue has been shut down (receiver dropped).
    pub async fn deliver_inbound(&self, telegram: Telegram) -> Result<()> {
        self.inbound_tx.send(telegram).await.map_err(|_| KnxError::cancelled())
    }
}

/// Drains `outbound_rx` at no more than `rate_per_second` telegrams per
/// second, handing each one to `send`. Runs until the channel closes.
pub async fn run_outbound_limiter<F, Fut>(
    mut outbound_rx: mpsc::Receiver<Telegram>,
    rate_per_second: u32,
    mut send: F,
) where
    F: FnMut(Telegram) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let interval = Duration::from_secs_f64(1.0 / f64::from(rate_per_second.max(1)));
    let mut next_emission = Instant::now();

    while let Some(telegram) = outbound_rx.recv().await {
        let now = Instant::now();
        if next_emission > now {
            tokio::time::sleep(next_emission - now).await;
        }
        next_emission = Instant::now() + interval;

        if let Err(err) = send(telegram).await {
            trace!(%err, "outbound telegram send failed");
        }
    }
}

type Callback = Box<dyn FnMut(&Telegram) + Send>;

/// Inbound dispatch: a group-address-keyed "device" registry plus an
/// address-filtered callback registry, both invoked in registration order
/// for every telegram whose destination matches.
#[derive(Default)]
pub struct Dispatcher {
    devices: Vec<(HashSet<GroupAddress>, Callback)>,
    subscriptions: Vec<(AddressFilter, Callback)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device-like subscriber interested in `group_addresses`
    /// (its full group-address set, used for state update and actions).
    pub fn register_device(
        &mut self,
        group_addresses: impl IntoIterator<Item = GroupAddress>,
        callback: impl FnMut(&Telegram) + Send + 'static,
    ) {
        self.devices.push((group_addresses.into_iter().collect(), Box::new(callback)));
    }

    /// Register a telegram callback gated by an address filter.
    pub fn register_callback(&mut self, filter: AddressFilter, callback: impl FnMut(&Telegram) + Send + 'static) {
        self.subscriptions.push((filter, Box::new(callback)));
    }

    /// Dispatch one inbound telegram: first to matching devices, then to
    /// matching filtered callbacks, both in registration order. Non-group
    /// destinations reach no subscriber (point-to-point services are
    /// outside this queue's scope).
    pub fn dispatch(&mut self, telegram: &Telegram) {
        let Destination::Group(destination) = telegram.destination else {
            return;
        };

        for (addresses, callback) in &mut self.devices {
            if addresses.contains(&destination) {
                callback(telegram);
            }
        }

        for (filter, callback) in &mut self.subscriptions {
            if filter.matches(destination) {
                callback(telegram);
            }
        }
    }

    /// Drain `inbound_rx`, dispatching every telegram serially, until the
    /// channel closes. A single slow callback delays later telegrams but
    /// never drops them — callers wanting backpressure on the sender should
    /// apply their own drop policy inside the callback.
    pub async fn run(mut self, mut inbound_rx: mpsc::Receiver<Telegram>) {
        while let Some(telegram) = inbound_rx.recv().await {
            self.dispatch(&telegram);
        }
        debug!("telegram dispatcher stopped: inbound channel closed");
    }
}
