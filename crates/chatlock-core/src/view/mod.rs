//! The view the lock flow reads from and writes to.
//!
//! A view exposes the current location, an ordered list of message units
//! and a way to replace what a unit displays. The core never assumes how
//! the view is rendered; `ViewDocument` is a plain data implementation and
//! `DocumentView` keeps one in a JSON file.

pub mod document;

pub use document::{DocumentMessage, DocumentView, ViewDocument};

use crate::error::Result;
use crate::route::Route;

/// Position of a unit within the view, stable for one enumeration.
pub type UnitHandle = usize;

/// A message unit as the view currently shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUnit {
    pub handle: UnitHandle,
    /// Raw author role; only `user` and `assistant` are ever captured
    pub role: String,
    /// Id the page itself assigns to the message
    pub native_id: Option<String>,
    /// Id written back by an earlier capture or restore
    pub capture_id: Option<String>,
    /// Id of the element hosting the message
    pub element_id: Option<String>,
    pub text: String,
    pub html: String,
    /// Whether the unit currently shows a lock placeholder
    pub locked: bool,
}

impl MessageUnit {
    /// The best id the view knows for this unit, if any.
    pub fn known_id(&self) -> Option<&str> {
        [&self.native_id, &self.capture_id, &self.element_id]
            .into_iter()
            .find_map(|id| id.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Replacement content for a message unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitContent {
    /// Lock placeholder text; marks the unit locked
    Placeholder(String),
    /// Saved rich markup and the text it displays
    Html { markup: String, text: String },
    /// Plain text blocks, one paragraph each
    Paragraphs(Vec<String>),
}

/// Source of the current route and message units.
pub trait ViewProvider {
    /// The absolute location currently shown.
    fn location(&self) -> String;

    /// The current route, parsed from `location`.
    fn route(&self) -> Result<Route> {
        Route::parse(&self.location())
    }

    /// Every message unit in document order, of any role.
    fn message_units(&self) -> Vec<MessageUnit>;

    /// Record a capture id on a unit so later restores can match it.
    fn assign_id(&mut self, handle: UnitHandle, id: &str);

    /// Replace what a unit displays.
    fn set_content(&mut self, handle: UnitHandle, content: UnitContent);

    /// Empty the message composer.
    fn clear_composer(&mut self);

    /// Title of the active conversation as the view labels it.
    fn active_title(&self) -> Option<String>;

    /// Move the view to `target`, absolute or relative to the current location.
    fn navigate(&mut self, target: &str) -> Result<()>;

    /// Pull in changes made to the view from outside.
    ///
    /// Returns true when something changed. Views that are always current
    /// return false.
    fn refresh(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Push pending changes out to wherever the view is displayed.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
