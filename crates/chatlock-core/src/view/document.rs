//! A view held as a plain JSON document.
//!
//! ```json
//! {
//!   "location": "https://chatgpt.com/c/abc123",
//!   "title": "Weekend plans",
//!   "composer": "",
//!   "messages": [
//!     { "role": "user", "id": "m1", "text": "hi", "html": "<p>hi</p>" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{MessageUnit, UnitContent, UnitHandle, ViewProvider};
use crate::error::{LockError, Result};

/// CSS class wrapped around lock placeholders.
pub const PLACEHOLDER_CLASS: &str = "chatlock-locked-message";

fn is_false(value: &bool) -> bool {
    !*value
}

/// One message as stored in the document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

impl DocumentMessage {
    pub fn new(role: &str, id: Option<&str>, text: &str) -> Self {
        Self {
            role: role.to_string(),
            id: id.map(str::to_string),
            text: text.to_string(),
            html: format!("<p>{}</p>", escape_html(text)),
            ..Self::default()
        }
    }
}

/// In-memory view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDocument {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub composer: String,
    #[serde(default)]
    pub messages: Vec<DocumentMessage>,
}

impl ViewDocument {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            title: None,
            composer: String::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<DocumentMessage>) -> Self {
        self.messages = messages;
        self
    }
}

impl ViewProvider for ViewDocument {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn message_units(&self) -> Vec<MessageUnit> {
        self.messages
            .iter()
            .enumerate()
            .map(|(handle, message)| MessageUnit {
                handle,
                role: message.role.clone(),
                native_id: message.id.clone(),
                capture_id: message.capture_id.clone(),
                element_id: message.element_id.clone(),
                text: message.text.clone(),
                html: message.html.clone(),
                locked: message.locked,
            })
            .collect()
    }

    fn assign_id(&mut self, handle: UnitHandle, id: &str) {
        if let Some(message) = self.messages.get_mut(handle) {
            message.capture_id = Some(id.to_string());
        }
    }

    fn set_content(&mut self, handle: UnitHandle, content: UnitContent) {
        let Some(message) = self.messages.get_mut(handle) else {
            return;
        };
        match content {
            UnitContent::Placeholder(text) => {
                message.html = format!(
                    "<div class=\"{}\">{}</div>",
                    PLACEHOLDER_CLASS,
                    escape_html(&text)
                );
                message.text = text;
                message.locked = true;
            }
            UnitContent::Html { markup, text } => {
                message.html = markup;
                message.text = text;
                message.locked = false;
            }
            UnitContent::Paragraphs(blocks) => {
                message.html = blocks
                    .iter()
                    .map(|block| format!("<p>{}</p>", escape_html(block)))
                    .collect();
                message.text = blocks.join("\n\n");
                message.locked = false;
            }
        }
    }

    fn clear_composer(&mut self) {
        self.composer.clear();
    }

    fn active_title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    fn navigate(&mut self, target: &str) -> Result<()> {
        let base = Url::parse(&self.location).map_err(|e| {
            LockError::InvalidInput(format!("Invalid location {}: {}", self.location, e))
        })?;
        let next = base
            .join(target)
            .map_err(|e| LockError::InvalidInput(format!("Invalid target {}: {}", target, e)))?;
        debug!(target = %next, "navigating view");
        self.location = next.to_string();
        Ok(())
    }
}

/// A `ViewDocument` backed by a JSON file.
///
/// Mutations stay in memory until `save` writes them back atomically.
#[derive(Debug)]
pub struct DocumentView {
    path: PathBuf,
    document: ViewDocument,
    dirty: bool,
}

impl DocumentView {
    /// Load the document at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let document = read_document(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ViewDocument {
        &self.document
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-read the file, returning true if its contents differ from memory.
    ///
    /// Unsaved changes are discarded.
    pub fn reload(&mut self) -> Result<bool> {
        let fresh = read_document(&self.path)?;
        let changed = fresh != self.document;
        self.document = fresh;
        self.dirty = false;
        Ok(changed)
    }

    /// Write pending changes back to the file.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.document)?;
        crate::fs::write_atomic(&self.path, json.as_bytes())?;
        self.dirty = false;
        Ok(())
    }
}

impl ViewProvider for DocumentView {
    fn location(&self) -> String {
        self.document.location()
    }

    fn message_units(&self) -> Vec<MessageUnit> {
        self.document.message_units()
    }

    fn assign_id(&mut self, handle: UnitHandle, id: &str) {
        let before = self.document.messages.get(handle).and_then(|m| m.capture_id.clone());
        self.document.assign_id(handle, id);
        if before.as_deref() != Some(id) {
            self.dirty = true;
        }
    }

    fn set_content(&mut self, handle: UnitHandle, content: UnitContent) {
        self.document.set_content(handle, content);
        self.dirty = true;
    }

    fn clear_composer(&mut self) {
        if !self.document.composer.is_empty() {
            self.document.clear_composer();
            self.dirty = true;
        }
    }

    fn active_title(&self) -> Option<String> {
        self.document.active_title()
    }

    fn navigate(&mut self, target: &str) -> Result<()> {
        self.document.navigate(target)?;
        self.dirty = true;
        Ok(())
    }

    fn refresh(&mut self) -> Result<bool> {
        self.save()?;
        self.reload()
    }

    fn flush(&mut self) -> Result<()> {
        self.save()
    }
}

fn read_document(path: &Path) -> Result<ViewDocument> {
    let raw = fs::read_to_string(path).map_err(|e| {
        LockError::InvalidInput(format!("Cannot read view {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        LockError::InvalidInput(format!("View {} is not valid: {}", path.display(), e))
    })
}

/// Escape text for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
