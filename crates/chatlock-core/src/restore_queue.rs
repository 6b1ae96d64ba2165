//! Deferred delivery of decrypted conversations.
//!
//! Unlocking from the folder navigates the view, and the target conversation
//! only appears some time later. The payload waits here until then. The
//! queue lives for the session only and is never persisted.

use std::collections::HashMap;

use tracing::debug;

use crate::types::ConversationPayload;

#[derive(Debug, Default)]
pub struct RestoreQueue {
    pending: HashMap<String, ConversationPayload>,
}

impl RestoreQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `payload` for `conversation_id`, replacing anything already
    /// waiting for it.
    pub fn enqueue(&mut self, conversation_id: &str, payload: ConversationPayload) {
        if conversation_id.is_empty() {
            return;
        }
        if self
            .pending
            .insert(conversation_id.to_string(), payload)
            .is_some()
        {
            debug!(conversation_id, "replaced pending restore");
        }
    }

    /// Take the payload waiting for the conversation now in view, if any.
    ///
    /// The payload is removed, so each one is handed out at most once.
    pub fn drain_if_current(
        &mut self,
        current_conversation_id: Option<&str>,
    ) -> Option<ConversationPayload> {
        let id = current_conversation_id.filter(|id| !id.is_empty())?;
        self.pending.remove(id)
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.pending.contains_key(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything; called when the session ends.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn payload(id: &str, marker: &str) -> ConversationPayload {
        ConversationPayload {
            locked_at: Utc::now(),
            location: marker.to_string(),
            conversation_id: id.to_string(),
            messages: Vec::new(),
        }
    }

    #[test]
    fn test_drain_exactly_once() {
        let mut queue = RestoreQueue::new();
        queue.enqueue("abc", payload("abc", "one"));

        assert!(queue.drain_if_current(Some("other")).is_none());
        assert!(queue.drain_if_current(None).is_none());
        assert!(queue.drain_if_current(Some("abc")).is_some());
        assert!(queue.drain_if_current(Some("abc")).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enqueue_overwrites() {
        let mut queue = RestoreQueue::new();
        queue.enqueue("abc", payload("abc", "old"));
        queue.enqueue("abc", payload("abc", "new"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_if_current(Some("abc")).unwrap().location, "new");
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let mut queue = RestoreQueue::new();
        queue.enqueue("", payload("", "x"));
        assert!(queue.is_empty());
    }
}
