//! State updater: per-tracked-value read strategies, funnelled through the
//! outbound telegram queue so reads respect its rate limit.

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::queue::TelegramQueue;
use crate::telegram::Telegram;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Upper bound of the pseudo-random startup jitter applied to each tracked
/// value, so a large installation doesn't stampede the bus with reads the
/// instant a tunnel connects.
const STARTUP_JITTER_MAX_MS: u64 = 2000;

/// How a tracked remote value is kept fresh.
#[derive(Debug, Clone, Copy)]
pub enum UpdateStrategy {
    /// Read if no inbound update has been seen for `Duration`.
    Expire(Duration),
    /// Read unconditionally every `Duration`, regardless of inbound traffic.
    Every(Duration),
    /// Never read.
    Off,
    /// Read exactly once, right after connecting.
    Init,
}

/// A handle a dispatcher can use to tell the updater that a fresh inbound
/// value arrived for this tracked value, resetting its expiry clock.
#[derive(Clone)]
pub struct ValueHandle {
    group_address: GroupAddress,
    last_update: Arc<Mutex<Option<Instant>>>,
}

impl ValueHandle {
    /// The group address this handle tracks.
    pub fn group_address(&self) -> GroupAddress {
        self.group_address
    }

    /// Record that an inbound update was just observed.
    pub fn notify_update(&self) {
        *self.last_update.lock().unwrap() = Some(Instant::now());
    }
}

struct TrackedValue {
    group_address: GroupAddress,
    strategy: UpdateStrategy,
    last_update: Arc<Mutex<Option<Instant>>>,
}

/// Owns the set of tracked values and spawns one task per value that isn't
/// `Off`, each issuing `GroupValueRead`s through the outbound queue on its
/// own schedule.
#[derive(Default)]
pub struct StateUpdater {
    values: Vec<TrackedValue>,
}

impl StateUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `group_address` under `strategy`, returning a handle
    /// to notify of inbound updates.
    pub fn track(&mut self, group_address: GroupAddress, strategy: UpdateStrategy) -> ValueHandle {
        let last_update = Arc::new(Mutex::new(None));
        self.values.push(TrackedValue { group_address, strategy, last_update: Arc::clone(&last_update) });
        ValueHandle { group_address, last_update }
    }

    /// Spawn one task per tracked (non-`Off`) value, each reading through
    /// `queue` as `own_address`. Returns the spawned tasks' handles so a
    /// caller can register them with a [`crate::connection_manager::ConnectionManager`].
    pub fn spawn_all(self, queue: TelegramQueue, own_address: IndividualAddress) -> Vec<JoinHandle<()>> {
        self.values
            .into_iter()
            .filter(|value| !matches!(value.strategy, UpdateStrategy::Off))
            .map(|value| {
                let queue = queue.clone();
                tokio::spawn(run_value(value, queue, own_address))
            })
            .collect()
    }
}

async fn startup_jitter() {
    let jitter_ms = rand::thread_rng().gen_range(0..=STARTUP_JITTER_MAX_MS);
    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
}

async fn send_read(queue: &TelegramQueue, own_address: IndividualAddress, group_address: GroupAddress) {
    if let Err(err) = queue.send_outbound(Telegram::group_read(own_address, group_address)).await {
        trace!(%group_address, %err, "state updater read could not be enqueued");
    }
}

async fn run_value(value: TrackedValue, queue: TelegramQueue, own_address: IndividualAddress) {
    startup_jitter().await;

    match value.strategy {
        UpdateStrategy::Off => {}
        UpdateStrategy::Init => {
            send_read(&queue, own_address, value.group_address).await;
        }
        UpdateStrategy::Every(interval) => loop {
            send_read(&queue, own_address, value.group_address).await;
            tokio::time::sleep(interval).await;
        },
        UpdateStrategy::Expire(expiry) => loop {
            let wait = match *value.last_update.lock().unwrap() {
                Some(last) => expiry.saturating_sub(last.elapsed()),
                None => Duration::ZERO,
            };
            tokio::time::sleep(wait).await;

            let stale = match *value.last_update.lock().unwrap() {
                Some(last) => last.elapsed() >= expiry,
                None => true,
            };
            if stale {
                send_read(&queue, own_address, value.group_address).await;
            }
        },
    }
}
