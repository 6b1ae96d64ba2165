//! Per-session lock state.
//!
//! A session starts when a view is attached and ends when it is dropped.
//! The vault cache is reloaded at bootstrap; the unlocked set and restore
//! queue start empty and are never written anywhere.

use tracing::debug;

use crate::error::Result;
use crate::restore_queue::RestoreQueue;
use crate::route::Route;
use crate::storage::KeyValueStore;
use crate::vault::LockVault;

pub struct SessionContext<S: KeyValueStore> {
    vault: LockVault<S>,
    restore_queue: RestoreQueue,
    route_token: Option<String>,
    last_lock_key: Option<String>,
}

impl<S: KeyValueStore> SessionContext<S> {
    /// Load the vault and start tracking `route`.
    ///
    /// `route` is `None` when the view's location cannot be parsed.
    pub fn bootstrap(store: S, route: Option<&Route>) -> Result<Self> {
        let mut vault = LockVault::open(store)?;
        vault.clear_unlocked();
        Ok(Self {
            vault,
            restore_queue: RestoreQueue::new(),
            route_token: route.map(Route::route_token),
            last_lock_key: route.and_then(Route::lock_key),
        })
    }

    pub fn vault(&self) -> &LockVault<S> {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut LockVault<S> {
        &mut self.vault
    }

    pub fn restore_queue(&self) -> &RestoreQueue {
        &self.restore_queue
    }

    pub fn restore_queue_mut(&mut self) -> &mut RestoreQueue {
        &mut self.restore_queue
    }

    pub fn route_token(&self) -> Option<&str> {
        self.route_token.as_deref()
    }

    pub fn last_lock_key(&self) -> Option<&str> {
        self.last_lock_key.as_deref()
    }

    /// Record the route now in view.
    ///
    /// When the route token moved, the previously viewed key is re-armed if
    /// it differs from the current one, and the current key is re-armed as
    /// well. Returns true when the token moved.
    pub fn observe_route(&mut self, route: Option<&Route>) -> bool {
        let token = route.map(Route::route_token);
        if token == self.route_token {
            return false;
        }

        let previous_key = self.last_lock_key.take();
        let current_key = route.and_then(Route::lock_key);
        debug!(
            from = previous_key.as_deref().unwrap_or("-"),
            to = current_key.as_deref().unwrap_or("-"),
            "route changed"
        );

        if let Some(previous) = previous_key.as_deref() {
            if current_key.as_deref() != Some(previous) {
                self.vault.evict(previous);
            }
        }
        if let Some(current) = current_key.as_deref() {
            self.vault.evict(current);
        }

        self.route_token = token;
        self.last_lock_key = current_key;
        true
    }

    /// End the session, discarding session-only state.
    pub fn end(mut self) -> S {
        self.restore_queue.clear();
        self.vault.into_store()
    }
}
