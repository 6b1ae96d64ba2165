//! The harness that keeps the gate in step with the view.
//!
//! Nothing tells us when the route changes, so a `RouteChangeSource` emits
//! periodic ticks. Each tick pulls view changes, notices outside writes to
//! the store and runs the route check. Handlers run to completion before the
//! next signal is taken; there is no parallelism inside the loop.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::gate::{GateStateMachine, OverlayFrame, OverlayHost, UnlockOutcome};
use crate::storage::KeyValueStore;
use crate::types::{EntryKind, LockedEntry};
use crate::view::ViewProvider;

/// Default route polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(750);

/// "Something may have changed."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Periodic route poll
    Tick,
    /// The view's content changed
    ViewChanged,
    /// Another writer changed the persisted vault
    StorageChanged,
    /// Stop the loop
    Shutdown,
}

/// Producer of signals for the sync loop.
pub trait RouteChangeSource {
    /// Block until the next signal is due.
    fn next_signal(&mut self) -> Signal;
}

/// Emits `Tick` on a fixed period.
#[derive(Debug, Clone)]
pub struct IntervalSource {
    interval: Duration,
    remaining: Option<u64>,
}

impl IntervalSource {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            remaining: None,
        }
    }

    /// Stop after `ticks` ticks by emitting `Shutdown`.
    pub fn with_limit(mut self, ticks: u64) -> Self {
        self.remaining = Some(ticks);
        self
    }
}

impl Default for IntervalSource {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl RouteChangeSource for IntervalSource {
    fn next_signal(&mut self) -> Signal {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Signal::Shutdown;
            }
            *remaining -= 1;
        }
        thread::sleep(self.interval);
        Signal::Tick
    }
}

/// Relays signals sent from elsewhere, ticking while the channel is quiet.
///
/// A disconnected channel reads as `Shutdown`.
pub struct ChannelSource {
    receiver: Receiver<Signal>,
    idle_tick: Option<Duration>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn channel() -> (Sender<Signal>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver,
                idle_tick: None,
            },
        )
    }

    /// Emit `Tick` whenever nothing arrives within `interval`.
    pub fn with_idle_tick(mut self, interval: Duration) -> Self {
        self.idle_tick = Some(interval);
        self
    }
}

impl RouteChangeSource for ChannelSource {
    fn next_signal(&mut self) -> Signal {
        match self.idle_tick {
            Some(interval) => match self.receiver.recv_timeout(interval) {
                Ok(signal) => signal,
                Err(RecvTimeoutError::Timeout) => Signal::Tick,
                Err(RecvTimeoutError::Disconnected) => Signal::Shutdown,
            },
            None => self.receiver.recv().unwrap_or(Signal::Shutdown),
        }
    }
}

/// Drives a gate against one view and one overlay host.
pub struct SyncLoop<S: KeyValueStore, V: ViewProvider, H: OverlayHost> {
    gate: GateStateMachine<S>,
    view: V,
    host: H,
    last_frame: Option<OverlayFrame>,
}

impl<S: KeyValueStore, V: ViewProvider, H: OverlayHost> SyncLoop<S, V, H> {
    /// Bootstrap a session over `store` for `view`.
    pub fn bootstrap(store: S, view: V, host: H) -> Result<Self> {
        let gate = GateStateMachine::bootstrap(store, &view)?;
        let mut sync = Self {
            gate,
            view,
            host,
            last_frame: None,
        };
        sync.gate.on_view_changed(&mut sync.view);
        sync.finish()?;
        Ok(sync)
    }

    pub fn gate(&self) -> &GateStateMachine<S> {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut GateStateMachine<S> {
        &mut self.gate
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// The view, for hosts that mutate it before signalling.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// End the session, returning the store, view and host.
    pub fn into_parts(self) -> (S, V, H) {
        (self.gate.into_store(), self.view, self.host)
    }

    /// React to one signal. Returns false on `Shutdown`.
    pub fn handle(&mut self, signal: Signal) -> Result<bool> {
        match signal {
            Signal::Tick => {
                let view_changed = self.view.refresh()?;
                let storage_changed = self.gate.session_mut().vault_mut().reload_if_changed()?;
                let route_changed = self.gate.on_route_tick(&mut self.view);
                if view_changed || route_changed || storage_changed {
                    self.gate.on_view_changed(&mut self.view);
                }
            }
            Signal::ViewChanged => {
                self.view.refresh()?;
                self.gate.on_view_changed(&mut self.view);
            }
            Signal::StorageChanged => {
                self.gate.on_storage_changed(&mut self.view)?;
            }
            Signal::Shutdown => {
                debug!("sync loop shutting down");
                return Ok(false);
            }
        }
        self.finish()?;
        Ok(true)
    }

    /// Take signals from `source` until `Shutdown`.
    ///
    /// A failing handler is logged and the loop carries on; only a failure
    /// to write the view ends it.
    pub fn run(&mut self, source: &mut dyn RouteChangeSource) -> Result<()> {
        info!("sync loop started");
        loop {
            let signal = source.next_signal();
            match self.handle(signal) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!(error = %e, ?signal, "signal handler failed");
                    self.view.flush()?;
                }
            }
        }
        info!("sync loop stopped");
        Ok(())
    }

    /// The lock button.
    pub fn lock_current(&mut self) -> Result<LockedEntry> {
        let entry = self.gate.lock_current(&mut self.view)?;
        self.finish()?;
        self.host.notify(match entry.kind {
            EntryKind::Chat => "Chat locked.",
            EntryKind::Project => "Project locked.",
        });
        Ok(entry)
    }

    /// The gate's PIN prompt.
    pub fn submit_pin(&mut self, pin: &str) -> Result<UnlockOutcome> {
        let outcome = self.gate.submit_pin(&mut self.view, pin)?;
        self.finish()?;
        self.host.notify(match outcome.kind {
            EntryKind::Chat => "Chat decrypted.",
            EntryKind::Project => "Project unlocked.",
        });
        Ok(outcome)
    }

    /// Unlock a chat from the open folder and follow it.
    pub fn open_from_folder(&mut self, lock_key: &str) -> Result<String> {
        let target = self.gate.unlock_from_folder(lock_key)?;
        self.view.navigate(&target)?;
        self.gate.on_route_tick(&mut self.view);
        self.gate.on_view_changed(&mut self.view);
        self.finish()?;
        self.host.notify("Chat decrypted.");
        Ok(target)
    }

    fn finish(&mut self) -> Result<()> {
        self.view.flush()?;
        let frame = self.gate.frame();
        if self.last_frame.as_ref() != Some(&frame) {
            self.host.render(&frame);
            self.last_frame = Some(frame);
        }
        Ok(())
    }
}
