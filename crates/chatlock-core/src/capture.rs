//! Capture, restore and masking of message units.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{LockError, Result};
use crate::types::{ConversationPayload, MessageRecord, Role};
use crate::view::{MessageUnit, UnitContent, ViewProvider};

/// Placeholder shown in place of a locked user message.
pub const USER_PLACEHOLDER: &str = "Prompt locked. Enter your PIN later to restore.";

/// Placeholder shown in place of a locked assistant message.
pub const ASSISTANT_PLACEHOLDER: &str = "Assistant message locked.";

/// Prefix of ids given to units the view left unnamed.
pub const FALLBACK_ID_PREFIX: &str = "chatlock-";

pub fn placeholder_for(role: Role) -> &'static str {
    match role {
        Role::User => USER_PLACEHOLDER,
        Role::Assistant => ASSISTANT_PLACEHOLDER,
    }
}

fn qualifying(units: Vec<MessageUnit>) -> impl Iterator<Item = (Role, MessageUnit)> {
    units
        .into_iter()
        .filter_map(|unit| Role::parse(&unit.role).map(|role| (role, unit)))
}

/// Read every user and assistant message from the view, in order.
///
/// Units without any id get `chatlock-<n>`, numbered per call. The resolved
/// id is written back to each unit.
///
/// # Errors
///
/// Returns `LockError::EmptyCapture` when the view holds no qualifying unit.
pub fn capture(view: &mut dyn ViewProvider) -> Result<Vec<MessageRecord>> {
    let mut fallback_index = 0usize;
    let mut records = Vec::new();

    for (role, unit) in qualifying(view.message_units()) {
        let message_id = match unit.known_id() {
            Some(id) => id.to_string(),
            None => {
                fallback_index += 1;
                format!("{}{}", FALLBACK_ID_PREFIX, fallback_index)
            }
        };
        view.assign_id(unit.handle, &message_id);
        records.push(MessageRecord {
            message_id,
            role,
            content: unit.text.trim().to_string(),
            html: unit.html,
        });
    }

    if records.is_empty() {
        return Err(LockError::EmptyCapture);
    }
    debug!(count = records.len(), "captured messages");
    Ok(records)
}

/// Put saved messages back into the live units.
///
/// A unit is matched to its saved message by id first. Failing that, saved
/// messages are consumed in order until one with the unit's role turns up.
/// Units left without a counterpart are not touched.
///
/// Returns the number of units restored.
pub fn restore(view: &mut dyn ViewProvider, payload: &ConversationPayload) -> usize {
    let by_id: HashMap<&str, &MessageRecord> = payload
        .messages
        .iter()
        .filter(|m| !m.message_id.is_empty())
        .map(|m| (m.message_id.as_str(), m))
        .collect();

    let mut sequential = 0usize;
    let mut restored = 0usize;

    for (role, unit) in qualifying(view.message_units()) {
        let live_id = unit.known_id().map(str::to_string);
        if let Some(id) = &live_id {
            view.assign_id(unit.handle, id);
        }

        let mut saved = live_id.as_deref().and_then(|id| by_id.get(id).copied());
        if saved.is_none() {
            while sequential < payload.messages.len() {
                let candidate = &payload.messages[sequential];
                sequential += 1;
                if candidate.role == role {
                    saved = Some(candidate);
                    break;
                }
            }
        }

        match saved {
            Some(record) if record.role == role => {
                view.set_content(unit.handle, render(record));
                restored += 1;
            }
            _ => {}
        }
    }

    debug!(restored, saved = payload.messages.len(), "restored messages");
    restored
}

/// Replace every qualifying unit with its lock placeholder.
///
/// Units already showing a placeholder are left alone. Returns the number of
/// units newly masked.
pub fn mask(view: &mut dyn ViewProvider) -> usize {
    let mut masked = 0usize;
    for (role, unit) in qualifying(view.message_units()) {
        if unit.locked {
            continue;
        }
        view.set_content(
            unit.handle,
            UnitContent::Placeholder(placeholder_for(role).to_string()),
        );
        masked += 1;
    }
    masked
}

fn render(record: &MessageRecord) -> UnitContent {
    let markup = record.html.trim();
    if !markup.is_empty() {
        return UnitContent::Html {
            markup: markup.to_string(),
            text: record.content.clone(),
        };
    }
    UnitContent::Paragraphs(split_paragraphs(record.content.trim()))
}

/// Split text into blocks separated by two or more newlines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut newlines = 0usize;

    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            continue;
        }
        if newlines >= 2 {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else if newlines == 1 {
            current.push('\n');
        }
        newlines = 0;
        current.push(c);
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{DocumentMessage, ViewDocument};
    use chrono::Utc;

    fn doc(messages: Vec<DocumentMessage>) -> ViewDocument {
        ViewDocument::new("https://chatgpt.com/c/abc123").with_messages(messages)
    }

    fn payload(messages: Vec<MessageRecord>) -> ConversationPayload {
        ConversationPayload {
            locked_at: Utc::now(),
            location: "https://chatgpt.com/c/abc123".to_string(),
            conversation_id: "abc123".to_string(),
            messages,
        }
    }

    fn record(id: &str, role: Role, content: &str) -> MessageRecord {
        MessageRecord {
            message_id: id.to_string(),
            role,
            content: content.to_string(),
            html: String::new(),
        }
    }

    #[test]
    fn test_capture_skips_other_roles_and_assigns_fallback_ids() {
        let mut view = doc(vec![
            DocumentMessage::new("user", None, "  hi  "),
            DocumentMessage::new("system", None, "ignored"),
            DocumentMessage::new("assistant", Some("native"), "hello"),
            DocumentMessage::new("assistant", None, "more"),
        ]);

        let records = capture(&mut view).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.message_id.as_str()).collect();
        assert_eq!(ids, vec!["chatlock-1", "native", "chatlock-2"]);
        assert_eq!(records[0].content, "hi");
        assert_eq!(view.messages[0].capture_id.as_deref(), Some("chatlock-1"));
        assert_eq!(view.messages[1].capture_id, None);
    }

    #[test]
    fn test_capture_prefers_native_then_capture_then_element_id() {
        let mut first = DocumentMessage::new("user", None, "a");
        first.capture_id = Some("cap".to_string());
        first.element_id = Some("el".to_string());
        let mut second = DocumentMessage::new("user", None, "b");
        second.element_id = Some("el2".to_string());

        let mut view = doc(vec![first, second]);
        let records = capture(&mut view).unwrap();
        assert_eq!(records[0].message_id, "cap");
        assert_eq!(records[1].message_id, "el2");
    }

    #[test]
    fn test_capture_empty_view() {
        let mut view = doc(vec![DocumentMessage::new("tool", None, "x")]);
        assert!(matches!(capture(&mut view), Err(LockError::EmptyCapture)));
    }

    #[test]
    fn test_mask_is_idempotent() {
        let mut view = doc(vec![
            DocumentMessage::new("user", Some("m1"), "hi"),
            DocumentMessage::new("assistant", Some("m2"), "hello"),
        ]);
        assert_eq!(mask(&mut view), 2);
        assert_eq!(view.messages[0].text, USER_PLACEHOLDER);
        assert_eq!(view.messages[1].text, ASSISTANT_PLACEHOLDER);
        let snapshot = view.clone();
        assert_eq!(mask(&mut view), 0);
        assert_eq!(view, snapshot);
    }

    #[test]
    fn test_restore_by_id() {
        let mut view = doc(vec![
            DocumentMessage::new("assistant", Some("m2"), "x"),
            DocumentMessage::new("user", Some("m1"), "y"),
        ]);
        let restored = restore(
            &mut view,
            &payload(vec![
                record("m1", Role::User, "hi"),
                record("m2", Role::Assistant, "hello"),
            ]),
        );
        assert_eq!(restored, 2);
        assert_eq!(view.messages[0].text, "hello");
        assert_eq!(view.messages[1].text, "hi");
    }

    #[test]
    fn test_restore_positional_by_role_after_id_churn() {
        let mut view = doc(vec![
            DocumentMessage::new("user", Some("new-1"), "x"),
            DocumentMessage::new("assistant", Some("new-2"), "x"),
            DocumentMessage::new("user", Some("new-3"), "x"),
        ]);
        let restored = restore(
            &mut view,
            &payload(vec![
                record("old-1", Role::User, "first"),
                record("old-2", Role::Assistant, "reply"),
                record("old-3", Role::User, "second"),
            ]),
        );
        assert_eq!(restored, 3);
        assert_eq!(view.messages[0].text, "first");
        assert_eq!(view.messages[1].text, "reply");
        assert_eq!(view.messages[2].text, "second");
    }

    #[test]
    fn test_restore_positional_skips_consumed_roles() {
        // The assistant unit consumes past the first user record, so the
        // trailing user unit only finds the second one.
        let mut view = doc(vec![
            DocumentMessage::new("assistant", None, "x"),
            DocumentMessage::new("user", None, "x"),
        ]);
        restore(
            &mut view,
            &payload(vec![
                record("a", Role::User, "lost"),
                record("b", Role::Assistant, "reply"),
                record("c", Role::User, "kept"),
            ]),
        );
        assert_eq!(view.messages[0].text, "reply");
        assert_eq!(view.messages[1].text, "kept");
    }

    #[test]
    fn test_restore_leaves_unmatched_untouched() {
        let mut view = doc(vec![
            DocumentMessage::new("user", None, "x"),
            DocumentMessage::new("user", None, "untouched"),
        ]);
        let restored = restore(&mut view, &payload(vec![record("a", Role::User, "only")]));
        assert_eq!(restored, 1);
        assert_eq!(view.messages[1].text, "untouched");
    }

    #[test]
    fn test_restore_id_match_with_wrong_role_is_skipped() {
        let mut view = doc(vec![DocumentMessage::new("user", Some("m1"), "orig")]);
        let restored = restore(
            &mut view,
            &payload(vec![record("m1", Role::Assistant, "swapped")]),
        );
        assert_eq!(restored, 0);
        assert_eq!(view.messages[0].text, "orig");
    }

    #[test]
    fn test_restore_prefers_saved_markup() {
        let mut view = doc(vec![DocumentMessage::new("user", Some("m1"), "x")]);
        let mut saved = record("m1", Role::User, "hi");
        saved.html = "  <p><b>hi</b></p> ".to_string();
        restore(&mut view, &payload(vec![saved]));
        assert_eq!(view.messages[0].html, "<p><b>hi</b></p>");
        assert!(!view.messages[0].locked);
    }

    #[test]
    fn test_split_paragraphs() {
        assert_eq!(
            split_paragraphs("one\ntwo\n\n\nthree"),
            vec!["one\ntwo".to_string(), "three".to_string()]
        );
        assert!(split_paragraphs("").is_empty());
    }
}
