//! The vault: persisted lock key to encrypted entry map.
//!
//! `LockVault` keeps an in-memory copy of `lockedChats` alongside the
//! session's unlocked set. Every mutation rewrites the whole map. A failed
//! write is logged and the cache is kept; the next mutation writes the full
//! map again, which reconciles the store.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::crypto::{decrypt, encrypt, Fingerprint};
use crate::error::{LockError, Result};
use crate::route::{lookup_entry_for_route, project_lock_key, Route, RouteMatch};
use crate::storage::{self, KeyValueStore};
use crate::types::{
    EntryKind, LockedEntry, Payload, VaultMap, DEFAULT_CHAT_TITLE, DEFAULT_PROJECT_TITLE,
};

/// Lock keys unlocked during this session.
///
/// Keys in the set are not gated even though their entry may still exist.
/// Never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnlockedSet {
    keys: HashSet<String>,
}

impl UnlockedSet {
    pub fn insert(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.keys.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Encrypted vault bound to a persistence provider.
pub struct LockVault<S: KeyValueStore> {
    store: S,
    entries: VaultMap,
    unlocked: UnlockedSet,
    revision: u64,
    synced: bool,
    data_version: Option<i64>,
}

impl<S: KeyValueStore> LockVault<S> {
    /// Load the vault from `store`, migrating a legacy entry if present.
    pub fn open(mut store: S) -> Result<Self> {
        let entries = storage::load_vault(&mut store)?;
        let data_version = store.data_version()?;
        debug!(entries = entries.len(), "vault loaded");
        Ok(Self {
            store,
            entries,
            unlocked: UnlockedSet::default(),
            revision: 0,
            synced: true,
            data_version,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give back the store, dropping the cache and unlocked set.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn entries(&self) -> &VaultMap {
        &self.entries
    }

    pub fn get(&self, lock_key: &str) -> Option<&LockedEntry> {
        self.entries.get(lock_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counter bumped on every change to the entries or the unlocked set.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// False while the last write to the store has not succeeded.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn unlocked(&self) -> &UnlockedSet {
        &self.unlocked
    }

    /// Stored PIN fingerprint, if any.
    pub fn fingerprint(&self) -> Result<Option<Fingerprint>> {
        storage::load_fingerprint(&self.store)
    }

    /// Seal `payload` and store it under the lock key it names.
    ///
    /// `route` supplies the navigation coordinates recorded on the entry and
    /// `title` the display title for chats. An existing entry under the same
    /// key is replaced. The key is removed from the unlocked set.
    ///
    /// # Errors
    ///
    /// - `NoActiveTarget` if the payload names no conversation or project
    /// - `Crypto` if sealing fails
    pub fn lock(
        &mut self,
        route: &Route,
        key: &Fingerprint,
        payload: &Payload,
        title: Option<&str>,
    ) -> Result<LockedEntry> {
        let plaintext = payload.to_json()?;

        let mut entry = match payload {
            Payload::Conversation(conversation) => {
                if conversation.conversation_id.is_empty() {
                    return Err(LockError::NoActiveTarget);
                }
                let title = title
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_CHAT_TITLE)
                    .to_string();
                let mut entry = blank_entry(EntryKind::Chat, &conversation.conversation_id);
                entry.title = Some(title.clone());
                entry.original_title = Some(title);
                entry.conversation_id = Some(conversation.conversation_id.clone());
                entry
            }
            Payload::Project(project) => {
                if project.project_id.is_empty() {
                    return Err(LockError::NoActiveTarget);
                }
                let mut entry = blank_entry(EntryKind::Project, &project_lock_key(&project.project_id));
                entry.project_title = Some(DEFAULT_PROJECT_TITLE.to_string());
                entry.project_id = Some(project.project_id.clone());
                entry
            }
        };

        entry.sealed = encrypt(key, &plaintext)?;
        entry.target_path = Some(route.path.clone());
        entry.target_search = Some(route.search.clone());
        entry.location = Some(route.href.clone());

        let lock_key = entry.lock_key.clone();
        let replaced = self.entries.insert(lock_key.clone(), entry.clone()).is_some();
        self.unlocked.remove(&lock_key);
        self.revision += 1;
        self.persist();

        info!(lock_key = %lock_key, kind = %entry.kind, replaced, "locked");
        Ok(entry)
    }

    /// Open the entry under `lock_key` and remove it from the vault.
    ///
    /// The entry is removed only after decryption succeeds. On success the
    /// key joins the unlocked set.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no entry exists for `lock_key`
    /// - `Crypto` if the tag does not verify under `key`
    pub fn unlock(&mut self, lock_key: &str, key: &Fingerprint) -> Result<Payload> {
        let entry = self
            .entries
            .get(lock_key)
            .ok_or_else(|| LockError::NotFound(lock_key.to_string()))?;

        let plaintext = decrypt(key, &entry.sealed.ciphertext, &entry.sealed.iv).map_err(|e| {
            error!(lock_key, error = %e, "vault entry failed to decrypt");
            e
        })?;
        let payload = Payload::from_json(entry.kind, &plaintext)?;

        self.entries.shift_remove(lock_key);
        self.unlocked.insert(lock_key);
        self.revision += 1;
        self.persist();

        info!(lock_key, kind = %payload.kind(), "unlocked");
        Ok(payload)
    }

    /// Entries accepted by `predicate`, in vault order. Read only.
    pub fn snapshot<F>(&self, predicate: F) -> VaultMap
    where
        F: Fn(&LockedEntry) -> bool,
    {
        self.entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Entries of one kind, in vault order.
    pub fn snapshot_kind(&self, kind: EntryKind) -> VaultMap {
        self.snapshot(|entry| entry.kind == kind)
    }

    /// The entry matching `route`, unlocked or not.
    pub fn lookup(&self, route: &Route) -> Option<RouteMatch<'_>> {
        lookup_entry_for_route(&self.entries, route)
    }

    /// The entry that should gate `route` right now.
    ///
    /// Like `lookup`, but keys in the unlocked set do not gate.
    pub fn active_match(&self, route: &Route) -> Option<RouteMatch<'_>> {
        self.lookup(route)
            .filter(|found| !self.unlocked.contains(&found.lock_key))
    }

    pub fn mark_unlocked(&mut self, lock_key: &str) {
        self.unlocked.insert(lock_key);
        self.revision += 1;
    }

    /// Drop `lock_key` from the unlocked set so it gates again.
    pub fn evict(&mut self, lock_key: &str) -> bool {
        let evicted = self.unlocked.remove(lock_key);
        if evicted {
            debug!(lock_key, "re-armed");
            self.revision += 1;
        }
        evicted
    }

    pub fn clear_unlocked(&mut self) {
        self.unlocked.clear();
        self.revision += 1;
    }

    /// Replace the cache with what the store holds now and forget every
    /// session unlock.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = storage::load_vault(&mut self.store)?;
        self.data_version = self.store.data_version()?;
        self.unlocked.clear();
        self.synced = true;
        self.revision += 1;
        debug!(entries = self.entries.len(), "vault reloaded");
        Ok(())
    }

    /// Reload if another writer changed the store since the last look.
    ///
    /// Returns true when a reload happened.
    pub fn reload_if_changed(&mut self) -> Result<bool> {
        let current = self.store.data_version()?;
        if current.is_none() || current == self.data_version {
            return Ok(false);
        }
        info!("vault changed outside this session, reloading");
        self.reload()?;
        Ok(true)
    }

    fn persist(&mut self) {
        match storage::save_vault(&mut self.store, &self.entries) {
            Ok(()) => {
                self.synced = true;
                if let Ok(version) = self.store.data_version() {
                    self.data_version = version;
                }
            }
            Err(e) => {
                self.synced = false;
                warn!(error = %e, "vault write failed, keeping in-memory state");
            }
        }
    }
}

fn blank_entry(kind: EntryKind, lock_key: &str) -> LockedEntry {
    LockedEntry {
        kind,
        lock_key: lock_key.to_string(),
        sealed: Default::default(),
        locked_at: Utc::now().timestamp_millis(),
        title: None,
        original_title: None,
        project_title: None,
        conversation_id: None,
        project_id: None,
        target_path: None,
        target_search: None,
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash_pin;
    use crate::storage::MemoryStore;
    use crate::types::{ConversationPayload, MessageRecord, ProjectPayload, Role};

    fn route(href: &str) -> Route {
        Route::parse(href).unwrap()
    }

    fn chat_payload(id: &str) -> Payload {
        Payload::Conversation(ConversationPayload {
            locked_at: Utc::now(),
            location: format!("https://chatgpt.com/c/{}", id),
            conversation_id: id.to_string(),
            messages: vec![MessageRecord {
                message_id: "m1".to_string(),
                role: Role::User,
                content: "hi".to_string(),
                html: "<p>hi</p>".to_string(),
            }],
        })
    }

    fn vault() -> LockVault<MemoryStore> {
        LockVault::open(MemoryStore::new()).unwrap()
    }

    #[test]
    fn test_lock_then_unlock() {
        let mut vault = vault();
        let key = hash_pin("4242");
        let here = route("https://chatgpt.com/c/abc123");

        let entry = vault
            .lock(&here, &key, &chat_payload("abc123"), Some("Plans"))
            .unwrap();
        assert_eq!(entry.lock_key, "abc123");
        assert_eq!(entry.kind, EntryKind::Chat);
        assert_eq!(entry.title.as_deref(), Some("Plans"));
        assert_eq!(entry.target_path.as_deref(), Some("/c/abc123"));
        assert!(vault.active_match(&here).is_some());

        let payload = vault.unlock("abc123", &key).unwrap();
        let conversation = payload.as_conversation().unwrap();
        assert_eq!(conversation.conversation_id, "abc123");
        assert_eq!(conversation.messages[0].content, "hi");
        assert!(vault.is_empty());
        assert!(vault.unlocked().contains("abc123"));
    }

    #[test]
    fn test_lock_same_key_overwrites() {
        let mut vault = vault();
        let key = hash_pin("4242");
        let here = route("https://chatgpt.com/c/abc123");
        vault.lock(&here, &key, &chat_payload("abc123"), None).unwrap();
        vault.lock(&here, &key, &chat_payload("abc123"), Some("Again")).unwrap();
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.get("abc123").unwrap().title.as_deref(), Some("Again"));
    }

    #[test]
    fn test_default_titles() {
        let mut vault = vault();
        let key = hash_pin("4242");
        let entry = vault
            .lock(&route("https://chatgpt.com/c/x"), &key, &chat_payload("x"), Some("  "))
            .unwrap();
        assert_eq!(entry.title.as_deref(), Some(DEFAULT_CHAT_TITLE));

        let project = Payload::Project(ProjectPayload {
            locked_at: Utc::now(),
            location: "https://chatgpt.com/g/proj9/project".to_string(),
            project_id: "proj9".to_string(),
        });
        let entry = vault
            .lock(&route("https://chatgpt.com/g/proj9/project"), &key, &project, None)
            .unwrap();
        assert_eq!(entry.lock_key, "project:proj9");
        assert_eq!(entry.project_title.as_deref(), Some(DEFAULT_PROJECT_TITLE));
    }

    #[test]
    fn test_unlock_missing_is_not_found() {
        let mut vault = vault();
        let result = vault.unlock("nope", &hash_pin("4242"));
        assert!(matches!(result, Err(LockError::NotFound(_))));
    }

    #[test]
    fn test_unlock_wrong_key_keeps_entry() {
        let mut vault = vault();
        let here = route("https://chatgpt.com/c/abc123");
        vault
            .lock(&here, &hash_pin("4242"), &chat_payload("abc123"), None)
            .unwrap();
        let result = vault.unlock("abc123", &hash_pin("0000"));
        assert!(matches!(result, Err(LockError::Crypto(_))));
        assert_eq!(vault.len(), 1);
        assert!(!vault.unlocked().contains("abc123"));
    }

    #[test]
    fn test_unlocked_keys_do_not_gate() {
        let mut vault = vault();
        let here = route("https://chatgpt.com/c/abc123");
        vault
            .lock(&here, &hash_pin("4242"), &chat_payload("abc123"), None)
            .unwrap();
        vault.mark_unlocked("abc123");
        assert!(vault.active_match(&here).is_none());
        assert!(vault.lookup(&here).is_some());
        assert!(vault.evict("abc123"));
        assert!(vault.active_match(&here).is_some());
    }

    #[test]
    fn test_failed_write_keeps_cache_and_reconciles() {
        let mut vault = vault();
        vault.store_mut().set_fail_writes(true);
        let here = route("https://chatgpt.com/c/abc123");
        vault
            .lock(&here, &hash_pin("4242"), &chat_payload("abc123"), None)
            .unwrap();
        assert!(!vault.is_synced());
        assert_eq!(vault.len(), 1);

        vault.store_mut().set_fail_writes(false);
        vault
            .lock(&route("https://chatgpt.com/c/b"), &hash_pin("4242"), &chat_payload("b"), None)
            .unwrap();
        assert!(vault.is_synced());

        let reopened = LockVault::open(vault.store().clone()).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_snapshot_filters_by_kind() {
        let mut vault = vault();
        let key = hash_pin("4242");
        vault
            .lock(&route("https://chatgpt.com/c/a"), &key, &chat_payload("a"), None)
            .unwrap();
        let project = Payload::Project(ProjectPayload {
            locked_at: Utc::now(),
            location: String::new(),
            project_id: "p".to_string(),
        });
        vault
            .lock(&route("https://chatgpt.com/g/p/project"), &key, &project, None)
            .unwrap();

        let chats = vault.snapshot_kind(EntryKind::Chat);
        assert_eq!(chats.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(vault.len(), 2);
    }

    #[test]
    fn test_external_change_reloads_and_clears_unlocked() {
        let mut vault = vault();
        vault.mark_unlocked("abc123");
        assert!(!vault.reload_if_changed().unwrap());

        vault
            .store_mut()
            .write_external(storage::LOCKED_CHATS_KEY, serde_json::json!({}));
        assert!(vault.reload_if_changed().unwrap());
        assert!(vault.unlocked().is_empty());
    }

    #[test]
    fn test_revision_moves_on_mutation() {
        let mut vault = vault();
        let start = vault.revision();
        vault
            .lock(&route("https://chatgpt.com/c/a"), &hash_pin("4242"), &chat_payload("a"), None)
            .unwrap();
        assert!(vault.revision() > start);
    }
}
