//! Stream Connection Manager
//!
//! Registry of named, cancellable streaming connections. At most one live
//! connection exists per name; registering a name again cancels its predecessor.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::stream::{Connection, ConnectionState};

// == Registry ==
#[derive(Debug)]
struct Slot {
    id: u64,
    token: CancellationToken,
    state: ConnectionState,
    opened_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Registry {
    slots: HashMap<String, Slot>,
    next_id: u64,
}

impl Registry {
    /// Drops slots whose token has fired since the last access.
    fn reap(&mut self) {
        self.slots.retain(|name, slot| {
            let live = !slot.token.is_cancelled();
            if !live {
                debug!(connection = %name, "Stream connection disconnected");
            }
            live
        });
    }
}

/// Snapshot of one registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub name: String,
    pub state: ConnectionState,
    pub opened_at: DateTime<Utc>,
}

// == Connection Handle ==
/// The caller's side of a registered connection.
///
/// Wraps the cancellation token the stream reader must poll. Cancelling the
/// token (from here, from the manager, or by a replacement) moves the
/// connection to `Disconnected` and removes it from the registry.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    name: String,
    id: u64,
    token: CancellationToken,
    registry: Weak<Mutex<Registry>>,
}

impl ConnectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once the connection has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Records that the stream is established and delivering data.
    pub fn mark_connected(&self) {
        self.set_state(ConnectionState::Connected);
    }

    /// Records that the stream failed.
    ///
    /// The state lasts until the handle is cancelled.
    pub fn mark_error(&self) {
        self.set_state(ConnectionState::Error);
    }

    // A superseded or cancelled handle must not overwrite its successor's state.
    fn set_state(&self, state: ConnectionState) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        if let Some(slot) = registry.slots.get_mut(&self.name) {
            if slot.id == self.id && !slot.token.is_cancelled() {
                debug!(connection = %self.name, %state, "Stream connection state changed");
                slot.state = state;
            }
        }
    }
}

// == Stream Connection Manager ==
/// Registry of named streaming connections.
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct StreamConnectionManager {
    registry: Arc<Mutex<Registry>>,
}

impl StreamConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    // == Create Connection ==
    /// Registers a new connection under `name` in the `Connecting` state.
    ///
    /// Any connection already registered under `name` is cancelled and replaced.
    /// The returned connection bundles the cancellation handle with the caller's
    /// callbacks; driving the actual stream is up to the caller.
    pub fn create_connection<C>(&self, name: impl Into<String>, callbacks: C) -> Connection<C> {
        let name = name.into();
        let mut registry = self.registry.lock();
        registry.reap();

        if let Some(previous) = registry.slots.remove(&name) {
            previous.token.cancel();
            info!(connection = %name, "Superseded existing stream connection");
        }

        registry.next_id += 1;
        let id = registry.next_id;
        let token = CancellationToken::new();
        registry.slots.insert(
            name.clone(),
            Slot {
                id,
                token: token.clone(),
                state: ConnectionState::Connecting,
                opened_at: Utc::now(),
            },
        );
        info!(connection = %name, "Stream connection created");

        let handle = ConnectionHandle {
            name,
            id,
            token,
            registry: Arc::downgrade(&self.registry),
        };
        Connection::new(handle, callbacks)
    }

    // == Close Connection ==
    /// Cancels and removes the connection registered under `name`.
    ///
    /// Closing an unknown name is a no-op. Returns whether a live connection was closed.
    pub fn close_connection(&self, name: &str) -> bool {
        let mut registry = self.registry.lock();
        registry.reap();

        match registry.slots.remove(name) {
            Some(slot) => {
                slot.token.cancel();
                info!(connection = %name, "Stream connection closed");
                true
            }
            None => false,
        }
    }

    // == Close All Connections ==
    /// Cancels and removes every registered connection.
    ///
    /// Returns the number of live connections that were closed.
    pub fn close_all_connections(&self) -> usize {
        let mut registry = self.registry.lock();
        registry.reap();

        let closed = registry.slots.len();
        for (_, slot) in registry.slots.drain() {
            slot.token.cancel();
        }
        info!("Closed all stream connections ({} closed)", closed);
        closed
    }

    // == Inspection ==
    /// True only while the connection under `name` is in the `Connected` state.
    pub fn is_connected(&self, name: &str) -> bool {
        self.connection_state(name) == ConnectionState::Connected
    }

    /// Current state of `name`; `Disconnected` if nothing is registered.
    pub fn connection_state(&self, name: &str) -> ConnectionState {
        let mut registry = self.registry.lock();
        registry.reap();
        registry
            .slots
            .get(name)
            .map(|slot| slot.state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Names of all registered connections, sorted.
    pub fn active_connections(&self) -> Vec<String> {
        let mut registry = self.registry.lock();
        registry.reap();
        let mut names: Vec<String> = registry.slots.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_active_connections(&self) -> bool {
        let mut registry = self.registry.lock();
        registry.reap();
        !registry.slots.is_empty()
    }

    /// Details of all registered connections, sorted by name.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut registry = self.registry.lock();
        registry.reap();
        let mut infos: Vec<ConnectionInfo> = registry
            .slots
            .iter()
            .map(|(name, slot)| ConnectionInfo {
                name: name.clone(),
                state: slot.state,
                opened_at: slot.opened_at,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}
