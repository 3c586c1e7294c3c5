//! Connection-state observable plus the task registry that tracks it.
//!
//! The connection manager is the single source of truth for whether a
//! tunnel/router is usable. Other long-running responsibilities (heartbeat,
//! state updater, telegram dispatch) register themselves as named tasks;
//! the registry cancels and restarts the ones that declare
//! `restart_after_reconnect` as the connection drops and comes back.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

type StateCallback = Box<dyn FnMut(ConnectionState) + Send>;
type TaskFactory = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

struct TaskEntry {
    factory: TaskFactory,
    handle: Option<JoinHandle<()>>,
    restart_after_reconnect: bool,
}

struct Inner {
    state: ConnectionState,
    callbacks: Vec<StateCallback>,
    tasks: HashMap<String, TaskEntry>,
}

/// Connection-state observable and named-task supervisor.
///
/// Cheaply cloneable: clones share the same underlying state, so a tunnel
/// can hold one clone while the orchestrator holds another.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                callbacks: Vec::new(),
                tasks: HashMap::new(),
            })),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().unwrap().state
    }

    /// Register a callback invoked on every state transition. Re-asserting
    /// the current state is a no-op and does not invoke callbacks.
    pub fn on_state_change(&self, callback: impl FnMut(ConnectionState) + Send + 'static) {
        self.inner.lock().unwrap().callbacks.push(Box::new(callback));
    }

    /// Transition to `new_state`. A transition to `Disconnected` cancels
    /// every task with `restart_after_reconnect = true`; a transition to
    /// `Connected` respawns them.
    pub fn set_state(&self, new_state: ConnectionState) {
        let restart_names = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == new_state {
                return;
            }
            inner.state = new_state;
            for callback in &mut inner.callbacks {
                callback(new_state);
            }

            match new_state {
                ConnectionState::Disconnected => {
                    for entry in inner.tasks.values_mut() {
                        if entry.restart_after_reconnect {
                            if let Some(handle) = entry.handle.take() {
                                handle.abort();
                            }
                        }
                    }
                    Vec::new()
                }
                ConnectionState::Connected => inner
                    .tasks
                    .iter()
                    .filter(|(_, entry)| entry.restart_after_reconnect && entry.handle.is_none())
                    .map(|(name, _)| name.clone())
                    .collect(),
                ConnectionState::Connecting => Vec::new(),
            }
        };

        for name in restart_names {
            self.spawn_task(&name);
        }

        info!(?new_state, "connection state changed");
    }

    /// Register a named task and start it immediately. `restart_after_reconnect`
    /// tasks are cancelled on disconnect and respawned on reconnect;
    /// others run unaffected by connection-state transitions (e.g. the
    /// telegram dispatcher, which must keep draining across a reconnect).
    pub fn register_task<F, Fut>(&self, name: impl Into<String>, restart_after_reconnect: bool, factory: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let factory: TaskFactory = Arc::new(move || Box::pin(factory()));
        {
            let mut inner = self.inner.lock().unwrap();
            inner.tasks.insert(name.clone(), TaskEntry { factory, handle: None, restart_after_reconnect });
        }
        self.spawn_task(&name);
    }

    fn spawn_task(&self, name: &str) {
        let factory = {
            let inner = self.inner.lock().unwrap();
            inner.tasks.get(name).map(|entry| Arc::clone(&entry.factory))
        };
        let Some(factory) = factory else { return };

        let registry = Arc::clone(&self.inner);
        let task_name = name.to_string();
        let span = info_span!("knx_task", name = %task_name);
        let handle = tokio::spawn(
            async move {
                factory().await;
                let mut inner = registry.lock().unwrap();
                if let Some(entry) = inner.tasks.get(&task_name) {
                    if !entry.restart_after_reconnect {
                        inner.tasks.remove(&task_name);
                    }
                }
            }
            .instrument(span),
        );

        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.tasks.get_mut(name) {
            entry.handle = Some(handle);
        }
    }

    /// Cancel and unregister a single named task, awaiting its termination.
    pub async fn unregister_task(&self, name: &str) {
        let handle = {
            let mut inner = self.inner.lock().unwrap();
            inner.tasks.remove(name).and_then(|entry| entry.handle)
        };
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Stop every registered task, awaiting each one's cancellation, and
    /// transition to `Disconnected`.
    pub async fn stop(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.tasks.drain().filter_map(|(_, entry)| entry.handle).collect()
        };
        for handle in handles {
            handle.abort();
            let _ = handle.await;
        }
        self.set_state(ConnectionState::Disconnected);
        debug!("connection manager stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn identical_state_reassertion_is_suppressed() {
        let manager = ConnectionManager::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        manager.on_state_change(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        manager.set_state(ConnectionState::Disconnected); // already disconnected: no-op
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        manager.set_state(ConnectionState::Connecting);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        manager.set_state(ConnectionState::Connecting); // re-assert: suppressed
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn restart_after_reconnect_task_is_cancelled_and_respawned() {
        let manager = ConnectionManager::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = Arc::clone(&runs);

        manager.register_task("heartbeat", true, move || {
            let runs = Arc::clone(&runs_clone);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        manager.set_state(ConnectionState::Disconnected);
        manager.set_state(ConnectionState::Connected);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        manager.stop().await;
    }

    #[tokio::test]
    async fn non_restarting_task_survives_disconnect() {
        let manager = ConnectionManager::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = Arc::clone(&runs);

        manager.register_task("dispatcher", false, move || {
            let runs = Arc::clone(&runs_clone);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.set_state(ConnectionState::Disconnected);
        manager.set_state(ConnectionState::Connected);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        manager.stop().await;
    }

    #[tokio::test]
    async fn background_task_self_deregisters_on_completion() {
        let manager = ConnectionManager::new();
        manager.register_task("one-shot", false, || async {});

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.inner.lock().unwrap().tasks.len(), 0);
    }
}
