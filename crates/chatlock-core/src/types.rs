//! Core data types for the vault and its payloads.
//!
//! Field names serialize in camelCase so the persisted `lockedChats` map
//! stays readable by earlier installs.

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::crypto::Sealed;

/// Title given to chat entries when the view exposes none.
pub const DEFAULT_CHAT_TITLE: &str = "Private chat";

/// Title given to project entries.
pub const DEFAULT_PROJECT_TITLE: &str = "Private project";

/// Persisted `lockedChats` map. Iteration follows insertion order, which the
/// fallback route matcher depends on.
pub type VaultMap = IndexMap<String, LockedEntry>;

/// What a vault entry guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A single conversation, transcript captured and encrypted
    #[default]
    Chat,
    /// A project workspace, navigation gated only
    Project,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Chat => write!(f, "chat"),
            EntryKind::Project => write!(f, "project"),
        }
    }
}

/// Author role of a message unit. Other roles in the view are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a raw role attribute, returning `None` for roles we never capture.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One encrypted unit in the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedEntry {
    /// Entry kind; absent on legacy entries, which were always chats
    #[serde(rename = "type", default)]
    pub kind: EntryKind,

    /// Vault key this entry is stored under
    #[serde(default)]
    pub lock_key: String,

    /// Ciphertext and nonce, always set together
    #[serde(flatten)]
    pub sealed: Sealed,

    /// Milliseconds since the Unix epoch
    pub locked_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Route path at lock time, used by the fallback matcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,

    /// Route query (including `?`) at lock time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_search: Option<String>,

    /// Full location to navigate back to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LockedEntry {
    /// Lock time as a UTC timestamp.
    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.locked_at).single()
    }

    /// Title for listings, never derived from secret content.
    pub fn display_title(&self) -> &str {
        self.original_title
            .as_deref()
            .or(self.title.as_deref())
            .or(self.project_title.as_deref())
            .unwrap_or(match self.kind {
                EntryKind::Chat => DEFAULT_CHAT_TITLE,
                EntryKind::Project => DEFAULT_PROJECT_TITLE,
            })
    }

    /// Where to send the view to reopen this entry.
    pub fn navigation_target(&self) -> String {
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            return location.to_string();
        }
        match (&self.conversation_id, &self.project_id) {
            (Some(id), _) => format!("/c/{}", id),
            (None, Some(id)) => format!("/g/{}/project", id),
            (None, None) => format!("/c/{}", self.lock_key),
        }
    }
}

/// A captured message, as stored inside a chat payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub message_id: String,
    pub role: Role,
    pub content: String,
    pub html: String,
}

/// Plaintext sealed inside a chat entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPayload {
    pub locked_at: DateTime<Utc>,
    pub location: String,
    pub conversation_id: String,
    pub messages: Vec<MessageRecord>,
}

/// Plaintext sealed inside a project entry. No transcript is captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub locked_at: DateTime<Utc>,
    pub location: String,
    pub project_id: String,
}

/// Decrypted contents of a vault entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Conversation(ConversationPayload),
    Project(ProjectPayload),
}

impl Payload {
    pub fn kind(&self) -> EntryKind {
        match self {
            Payload::Conversation(_) => EntryKind::Chat,
            Payload::Project(_) => EntryKind::Project,
        }
    }

    /// Serialize to the JSON string that gets encrypted.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Payload::Conversation(payload) => serde_json::to_string(payload),
            Payload::Project(payload) => serde_json::to_string(payload),
        }
    }

    /// Parse decrypted plaintext according to the entry kind it came from.
    pub fn from_json(kind: EntryKind, plaintext: &str) -> serde_json::Result<Self> {
        match kind {
            EntryKind::Chat => serde_json::from_str(plaintext).map(Payload::Conversation),
            EntryKind::Project => serde_json::from_str(plaintext).map(Payload::Project),
        }
    }

    pub fn as_conversation(&self) -> Option<&ConversationPayload> {
        match self {
            Payload::Conversation(payload) => Some(payload),
            Payload::Project(_) => None,
        }
    }

    pub fn into_conversation(self) -> Option<ConversationPayload> {
        match self {
            Payload::Conversation(payload) => Some(payload),
            Payload::Project(_) => None,
        }
    }
}
