//! # Chatlock Core
//!
//! PIN-gated locking for chat conversations and projects.
//!
//! Locking captures a conversation's messages, encrypts them under a key
//! derived from the user's PIN and masks the view. Unlocking with the PIN
//! decrypts the payload, removes it from the vault and restores the view.
//!
//! ## Architecture
//!
//! - **crypto**: PIN fingerprinting and AES-GCM sealing
//! - **route**: Route identity and vault lookup by route
//! - **capture**: Reading, restoring and masking message units
//! - **vault**: The persisted map of locked entries
//! - **restore_queue**: Payloads waiting for their conversation to load
//! - **gate**: The overlay state machine
//! - **sync**: The signal loop that keeps the gate in step with the view
//! - **storage**: Key-value stores (in-memory and SQLite)
//! - **view**: The view abstraction and a JSON document view

pub mod capture;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod gate;
pub mod restore_queue;
pub mod route;
pub mod session;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod types;
pub mod vault;
pub mod view;

pub use error::{LockError, Result};
pub use gate::{FolderItem, GateState, GateStateMachine, OverlayFrame, OverlayHost, UnlockOutcome};
pub use restore_queue::RestoreQueue;
pub use route::Route;
pub use session::SessionContext;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use sync::{ChannelSource, IntervalSource, RouteChangeSource, Signal, SyncLoop};
pub use types::{EntryKind, LockedEntry, Payload, VaultMap};
pub use vault::LockVault;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
