//! The gate: decides what overlay the view shows and drives unlocking.
//!
//! ```text
//! Hidden ──evaluate──▶ Gated ──submit_pin──▶ Hidden
//!   │
//!   └─open_folder─▶ FolderPin ──submit_folder_pin──▶ FolderList
//!                                                       │
//!                      Hidden ◀──unlock_from_folder─────┘
//! ```
//!
//! Any state returns to `Hidden` on `close`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capture;
use crate::crypto::Fingerprint;
use crate::error::{LockError, Result};
use crate::route::Route;
use crate::session::SessionContext;
use crate::settings::verify_pin;
use crate::storage::KeyValueStore;
use crate::types::{
    ConversationPayload, EntryKind, LockedEntry, MessageRecord, Payload, ProjectPayload,
};
use crate::view::ViewProvider;

/// What the overlay shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// Nothing to gate
    Hidden,
    /// The current route is locked; content is masked behind a PIN prompt
    Gated {
        lock_key: String,
        kind: EntryKind,
        title: String,
    },
    /// The private folder is open and waiting for its PIN
    FolderPin,
    /// The private folder is open and listing locked chats
    FolderList,
}

impl GateState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, GateState::Hidden)
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, GateState::FolderPin | GateState::FolderList)
    }
}

/// One row of the folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderItem {
    pub lock_key: String,
    pub title: String,
    pub locked_at: Option<DateTime<Utc>>,
}

impl From<&LockedEntry> for FolderItem {
    fn from(entry: &LockedEntry) -> Self {
        Self {
            lock_key: entry.lock_key.clone(),
            title: entry.display_title().to_string(),
            locked_at: entry.locked_at(),
        }
    }
}

/// Everything an overlay host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayFrame {
    pub state: GateState,
    /// Folder rows; only filled in `FolderList`
    pub folder: Vec<FolderItem>,
    pub revision: u64,
}

/// Surface that draws the gate and folder overlays.
pub trait OverlayHost {
    /// Draw `frame`. A `Hidden` frame means draw nothing.
    fn render(&mut self, frame: &OverlayFrame);

    /// Show a short, non-blocking message.
    fn notify(&mut self, _message: &str) {}
}

/// Result of a successful in-place unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockOutcome {
    pub lock_key: String,
    pub kind: EntryKind,
    /// Number of message units put back into the view
    pub restored: usize,
}

/// The gate state machine and the session it owns.
pub struct GateStateMachine<S: KeyValueStore> {
    session: SessionContext<S>,
    state: GateState,
    folder_key: Option<Fingerprint>,
}

impl<S: KeyValueStore> GateStateMachine<S> {
    /// Start a session against `store` for the view's current route.
    pub fn bootstrap(store: S, view: &dyn ViewProvider) -> Result<Self> {
        let route = current_route(view);
        let session = SessionContext::bootstrap(store, route.as_ref())?;
        Ok(Self::with_session(session))
    }

    pub fn with_session(session: SessionContext<S>) -> Self {
        Self {
            session,
            state: GateState::Hidden,
            folder_key: None,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn session(&self) -> &SessionContext<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext<S> {
        &mut self.session
    }

    /// End the session and hand back the store.
    pub fn into_store(self) -> S {
        self.session.end()
    }

    /// Bumped on every vault or unlocked-set change.
    pub fn revision(&self) -> u64 {
        self.session.vault().revision()
    }

    /// Recompute whether the current route must be gated.
    ///
    /// Folder states are left alone; they only close explicitly or on
    /// navigation.
    pub fn evaluate(&mut self, view: &dyn ViewProvider) -> &GateState {
        if self.state.is_folder() {
            return &self.state;
        }

        let route = current_route(view);
        let gate = route
            .as_ref()
            .and_then(|route| self.session.vault().active_match(route))
            .map(|found| GateState::Gated {
                lock_key: found.lock_key.clone(),
                kind: found.entry.kind,
                title: found.entry.display_title().to_string(),
            });

        match gate {
            Some(gated) => {
                if gated != self.state {
                    debug!(?gated, "gating route");
                }
                self.state = gated;
            }
            None => {
                if matches!(self.state, GateState::Gated { .. }) {
                    debug!("route no longer gated");
                }
                self.state = GateState::Hidden;
            }
        }
        &self.state
    }

    /// Mask the view if the current route is gated by a chat entry.
    ///
    /// Returns the number of units newly masked.
    pub fn mask_if_gated(&self, view: &mut dyn ViewProvider) -> usize {
        let Some(route) = current_route(view) else {
            return 0;
        };
        let gated_chat = self
            .session
            .vault()
            .active_match(&route)
            .is_some_and(|found| found.entry.kind != EntryKind::Project);
        if gated_chat {
            capture::mask(view)
        } else {
            0
        }
    }

    /// Lock what the view currently shows.
    ///
    /// A route addressing a project but no conversation locks the project.
    /// Otherwise the conversation is captured, sealed and masked, and the
    /// composer is cleared.
    ///
    /// # Errors
    ///
    /// - `PinNotSet` if no PIN is stored
    /// - `NoActiveTarget` if the route names no conversation or project
    /// - `EmptyCapture` if there are no messages to capture
    /// - `InvalidInput` if the route is already gated
    pub fn lock_current(&mut self, view: &mut dyn ViewProvider) -> Result<LockedEntry> {
        let key = self
            .session
            .vault()
            .fingerprint()?
            .ok_or(LockError::PinNotSet)?;
        let route = view.route()?;

        if self.session.vault().active_match(&route).is_some() {
            return Err(LockError::InvalidInput(
                "This item is already locked.".to_string(),
            ));
        }

        let entry = match (&route.conversation_id, &route.project_id) {
            (None, Some(project_id)) => {
                let payload = Payload::Project(ProjectPayload {
                    locked_at: Utc::now(),
                    location: route.href.clone(),
                    project_id: project_id.clone(),
                });
                self.session.vault_mut().lock(&route, &key, &payload, None)?
            }
            (None, None) => return Err(LockError::NoActiveTarget),
            (Some(conversation_id), _) => {
                let messages: Vec<MessageRecord> = capture::capture(view)?;
                let payload = Payload::Conversation(ConversationPayload {
                    locked_at: Utc::now(),
                    location: route.href.clone(),
                    conversation_id: conversation_id.clone(),
                    messages,
                });
                let title = view.active_title();
                let entry =
                    self.session
                        .vault_mut()
                        .lock(&route, &key, &payload, title.as_deref())?;
                capture::mask(view);
                view.clear_composer();
                entry
            }
        };

        self.evaluate(view);
        Ok(entry)
    }

    /// Unlock the gated route with `pin`.
    ///
    /// The PIN is checked against the stored fingerprint before the vault is
    /// touched. Chats have their messages restored into the view.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing gates the current route
    /// - `InvalidInput`, `PinNotSet` or `WrongPin` from PIN verification
    /// - `Crypto` if the entry does not decrypt under the stored fingerprint
    pub fn submit_pin(&mut self, view: &mut dyn ViewProvider, pin: &str) -> Result<UnlockOutcome> {
        let route = view.route()?;
        let lock_key = self
            .session
            .vault()
            .lookup(&route)
            .map(|found| found.lock_key)
            .ok_or_else(|| LockError::NotFound("This item is not locked.".to_string()))?;

        let key = verify_pin(self.session.vault().store(), pin)?;
        let payload = self.session.vault_mut().unlock(&lock_key, &key)?;

        self.state = GateState::Hidden;
        self.folder_key = None;

        let kind = payload.kind();
        let restored = match payload.as_conversation() {
            Some(conversation) => capture::restore(view, conversation),
            None => 0,
        };
        self.evaluate(view);

        Ok(UnlockOutcome {
            lock_key,
            kind,
            restored,
        })
    }

    /// Open the private folder, which asks for the PIN first.
    ///
    /// # Errors
    ///
    /// Returns `PinNotSet` without changing state if no PIN is stored.
    pub fn open_folder(&mut self) -> Result<()> {
        if self.session.vault().fingerprint()?.is_none() {
            return Err(LockError::PinNotSet);
        }
        self.folder_key = None;
        self.state = GateState::FolderPin;
        Ok(())
    }

    /// Verify the folder PIN and show the listing.
    ///
    /// The verified key is kept only while the folder stays open.
    pub fn submit_folder_pin(&mut self, pin: &str) -> Result<()> {
        if !self.state.is_folder() {
            return Err(LockError::InvalidInput(
                "The private folder is not open.".to_string(),
            ));
        }
        let key = verify_pin(self.session.vault().store(), pin)?;
        self.folder_key = Some(key);
        self.state = GateState::FolderList;
        info!("private folder opened");
        Ok(())
    }

    /// Locked chats, as listed in the folder.
    pub fn folder_items(&self) -> Vec<FolderItem> {
        self.session
            .vault()
            .snapshot_kind(EntryKind::Chat)
            .values()
            .map(FolderItem::from)
            .collect()
    }

    /// Unlock a chat from the folder listing.
    ///
    /// The decrypted conversation is queued for restore and the entry's
    /// location is returned; the caller navigates the view there, and the
    /// restore applies once that conversation is in view.
    ///
    /// # Errors
    ///
    /// - `FolderLocked` if the folder PIN has not been verified
    /// - `NotFound` if the chat is no longer locked
    /// - `NotAChat` if the key names a project
    pub fn unlock_from_folder(&mut self, lock_key: &str) -> Result<String> {
        let verified = match (&self.state, &self.folder_key) {
            (GateState::FolderList, Some(key)) => Some(key.clone()),
            _ => None,
        };
        let Some(key) = verified else {
            if self.state.is_folder() {
                self.state = GateState::FolderPin;
            }
            return Err(LockError::FolderLocked);
        };

        let entry = self
            .session
            .vault()
            .get(lock_key)
            .cloned()
            .ok_or_else(|| LockError::NotFound(lock_key.to_string()))?;
        if entry.kind != EntryKind::Chat {
            return Err(LockError::NotAChat);
        }

        let payload = self.session.vault_mut().unlock(lock_key, &key)?;
        let conversation_id = entry
            .conversation_id
            .clone()
            .unwrap_or_else(|| lock_key.to_string());
        match payload.into_conversation() {
            Some(conversation) => self
                .session
                .restore_queue_mut()
                .enqueue(&conversation_id, conversation),
            None => warn!(lock_key, "chat entry held no conversation"),
        }

        self.close();
        Ok(entry.navigation_target())
    }

    /// Close whatever overlay is open and forget the folder key.
    pub fn close(&mut self) {
        self.state = GateState::Hidden;
        self.folder_key = None;
    }

    /// Route tick: re-arm keys when the route moved, then re-check.
    ///
    /// Returns true when the route changed.
    pub fn on_route_tick(&mut self, view: &mut dyn ViewProvider) -> bool {
        let route = current_route(view);
        if !self.session.observe_route(route.as_ref()) {
            return false;
        }
        if self.state.is_folder() {
            self.close();
        }
        self.mask_if_gated(view);
        self.evaluate(view);
        true
    }

    /// View mutation: apply a pending restore, mask, re-check.
    pub fn on_view_changed(&mut self, view: &mut dyn ViewProvider) {
        let conversation_id = current_route(view).and_then(|route| route.conversation_id);
        if let Some(payload) = self
            .session
            .restore_queue_mut()
            .drain_if_current(conversation_id.as_deref())
        {
            let restored = capture::restore(view, &payload);
            info!(restored, "applied pending restore");
        }
        self.mask_if_gated(view);
        self.evaluate(view);
    }

    /// The store changed outside this session: reload and re-check.
    pub fn on_storage_changed(&mut self, view: &mut dyn ViewProvider) -> Result<()> {
        self.session.vault_mut().reload()?;
        self.mask_if_gated(view);
        self.evaluate(view);
        Ok(())
    }

    /// The frame an overlay host should draw now.
    pub fn frame(&self) -> OverlayFrame {
        let folder = if matches!(self.state, GateState::FolderList) {
            self.folder_items()
        } else {
            Vec::new()
        };
        OverlayFrame {
            state: self.state.clone(),
            folder,
            revision: self.revision(),
        }
    }
}

fn current_route(view: &dyn ViewProvider) -> Option<Route> {
    match view.route() {
        Ok(route) => Some(route),
        Err(e) => {
            debug!(error = %e, "view has no usable route");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ASSISTANT_PLACEHOLDER, USER_PLACEHOLDER};
    use crate::crypto::PinPolicy;
    use crate::settings::set_pin;
    use crate::storage::MemoryStore;
    use crate::view::{DocumentMessage, ViewDocument};

    fn chat_view(id: &str) -> ViewDocument {
        let mut doc = ViewDocument::new(format!("https://chatgpt.com/c/{}", id)).with_messages(vec![
            DocumentMessage::new("user", Some("m1"), "hi"),
            DocumentMessage::new("assistant", Some("m2"), "hello"),
        ]);
        doc.composer = "draft".to_string();
        doc
    }

    fn store_with_pin() -> MemoryStore {
        let mut store = MemoryStore::new();
        set_pin(&mut store, "4242", "4242", &PinPolicy::default()).unwrap();
        store
    }

    fn machine(view: &ViewDocument) -> GateStateMachine<MemoryStore> {
        GateStateMachine::bootstrap(store_with_pin(), view).unwrap()
    }

    #[test]
    fn test_lock_masks_and_gates() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);

        let entry = gate.lock_current(&mut view).unwrap();
        assert_eq!(entry.lock_key, "abc123");
        assert_eq!(view.messages[0].text, USER_PLACEHOLDER);
        assert_eq!(view.messages[1].text, ASSISTANT_PLACEHOLDER);
        assert!(view.composer.is_empty());
        assert!(matches!(gate.state(), GateState::Gated { lock_key, .. } if lock_key == "abc123"));
    }

    #[test]
    fn test_lock_requires_pin() {
        let mut view = chat_view("abc123");
        let mut gate = GateStateMachine::bootstrap(MemoryStore::new(), &view).unwrap();
        assert!(matches!(
            gate.lock_current(&mut view),
            Err(LockError::PinNotSet)
        ));
    }

    #[test]
    fn test_lock_without_target() {
        let mut view = ViewDocument::new("https://chatgpt.com/");
        let mut gate = machine(&view);
        assert!(matches!(
            gate.lock_current(&mut view),
            Err(LockError::NoActiveTarget)
        ));
    }

    #[test]
    fn test_lock_empty_conversation() {
        let mut view = ViewDocument::new("https://chatgpt.com/c/new");
        let mut gate = machine(&view);
        assert!(matches!(
            gate.lock_current(&mut view),
            Err(LockError::EmptyCapture)
        ));
        assert!(gate.session().vault().is_empty());
    }

    #[test]
    fn test_lock_twice_is_rejected_while_gated() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);
        gate.lock_current(&mut view).unwrap();
        assert!(matches!(
            gate.lock_current(&mut view),
            Err(LockError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_pin_then_right_pin() {
        let mut view = chat_view("abc123");
        let original = view.clone();
        let mut gate = machine(&view);
        gate.lock_current(&mut view).unwrap();

        assert!(matches!(
            gate.submit_pin(&mut view, "0000"),
            Err(LockError::WrongPin)
        ));
        assert_eq!(gate.session().vault().len(), 1);

        let outcome = gate.submit_pin(&mut view, "4242").unwrap();
        assert_eq!(outcome.restored, 2);
        assert!(gate.state().is_hidden());
        assert!(gate.session().vault().is_empty());
        assert_eq!(view.messages[0].text, original.messages[0].text);
        assert_eq!(view.messages[1].html, original.messages[1].html);
    }

    #[test]
    fn test_submit_pin_when_not_locked() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);
        assert!(matches!(
            gate.submit_pin(&mut view, "4242"),
            Err(LockError::NotFound(_))
        ));
    }

    #[test]
    fn test_project_lock_reveals_without_restore() {
        let mut view = ViewDocument::new("https://chatgpt.com/g/proj9/project");
        let mut gate = machine(&view);
        let entry = gate.lock_current(&mut view).unwrap();
        assert_eq!(entry.lock_key, "project:proj9");
        assert_eq!(entry.kind, EntryKind::Project);

        let outcome = gate.submit_pin(&mut view, "4242").unwrap();
        assert_eq!(outcome.kind, EntryKind::Project);
        assert_eq!(outcome.restored, 0);
    }

    #[test]
    fn test_open_folder_without_pin() {
        let view = chat_view("abc123");
        let mut gate = GateStateMachine::bootstrap(MemoryStore::new(), &view).unwrap();
        assert!(matches!(gate.open_folder(), Err(LockError::PinNotSet)));
        assert!(gate.state().is_hidden());
    }

    #[test]
    fn test_folder_unlock_requires_verified_pin() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);
        gate.lock_current(&mut view).unwrap();

        gate.open_folder().unwrap();
        assert_eq!(gate.state(), &GateState::FolderPin);
        assert!(matches!(
            gate.unlock_from_folder("abc123"),
            Err(LockError::FolderLocked)
        ));

        assert!(matches!(
            gate.submit_folder_pin("1111"),
            Err(LockError::WrongPin)
        ));
        gate.submit_folder_pin("4242").unwrap();
        assert_eq!(gate.state(), &GateState::FolderList);
        assert_eq!(gate.frame().folder.len(), 1);
    }

    #[test]
    fn test_folder_unlock_queues_restore_until_navigated() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);
        gate.lock_current(&mut view).unwrap();

        // Browse elsewhere before opening the folder.
        view.navigate("/").unwrap();
        gate.on_route_tick(&mut view);

        gate.open_folder().unwrap();
        gate.submit_folder_pin("4242").unwrap();
        let target = gate.unlock_from_folder("abc123").unwrap();
        assert_eq!(target, "https://chatgpt.com/c/abc123");
        assert!(gate.state().is_hidden());
        assert!(gate.session().restore_queue().contains("abc123"));

        // Nothing applies until the conversation is in view.
        gate.on_view_changed(&mut view);
        assert!(gate.session().restore_queue().contains("abc123"));

        view.navigate(&target).unwrap();
        gate.on_route_tick(&mut view);
        gate.on_view_changed(&mut view);
        assert!(!gate.session().restore_queue().contains("abc123"));
        assert_eq!(view.messages[0].text, "hi");
        assert!(gate.state().is_hidden());
    }

    #[test]
    fn test_folder_rejects_projects() {
        let mut view = ViewDocument::new("https://chatgpt.com/g/p1/project");
        let mut gate = machine(&view);
        gate.lock_current(&mut view).unwrap();
        gate.open_folder().unwrap();
        gate.submit_folder_pin("4242").unwrap();
        assert!(matches!(
            gate.unlock_from_folder("project:p1"),
            Err(LockError::NotAChat)
        ));
        assert!(gate.folder_items().is_empty());
    }

    #[test]
    fn test_navigation_closes_folder() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);
        gate.open_folder().unwrap();
        view.navigate("/c/other").unwrap();
        assert!(gate.on_route_tick(&mut view));
        assert!(gate.state().is_hidden());
    }

    #[test]
    fn test_storage_change_re_gates_unlocked_keys() {
        let mut view = chat_view("abc123");
        let mut gate = machine(&view);
        gate.lock_current(&mut view).unwrap();
        gate.session_mut().vault_mut().mark_unlocked("abc123");
        gate.evaluate(&view);
        assert!(gate.state().is_hidden());

        gate.on_storage_changed(&mut view).unwrap();
        assert!(matches!(gate.state(), GateState::Gated { .. }));
    }

    #[test]
    fn test_entry_sealed_under_old_pin_stays_locked() {
        let mut view = chat_view("abc123");
        let mut store = MemoryStore::new();
        set_pin(&mut store, "1111", "1111", &PinPolicy::default()).unwrap();
        let mut gate = GateStateMachine::bootstrap(store, &view).unwrap();
        gate.lock_current(&mut view).unwrap();

        set_pin(
            gate.session_mut().vault_mut().store_mut(),
            "2222",
            "2222",
            &PinPolicy::default(),
        )
        .unwrap();

        let err = gate.submit_pin(&mut view, "2222").unwrap_err();
        assert!(matches!(err, LockError::Crypto(_)));
        assert!(err.is_auth_failure());
        assert_eq!(gate.session().vault().len(), 1);
        assert!(matches!(gate.state(), GateState::Gated { lock_key, .. } if lock_key == "abc123"));
        assert_eq!(view.messages[0].text, USER_PLACEHOLDER);
    }
}
