//! Route identity: lock keys and change tokens derived from the location.
//!
//! A conversation lives at `/c/<id>` (or carries `conversation_id` in the
//! query); a project lives at `/<...>/<id>/project` (or carries
//! `project_id`). Everything else has no lock key.

use url::Url;

use crate::error::{LockError, Result};
use crate::types::{LockedEntry, VaultMap};

/// Prefix for project lock keys.
pub const PROJECT_KEY_PREFIX: &str = "project:";

const CONVERSATION_QUERY_KEYS: [&str; 3] = ["conversation_id", "conversationId", "conversation"];
const PROJECT_QUERY_KEYS: [&str; 2] = ["project_id", "projectId"];

/// The navigation context of the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Full location as reported by the view
    pub href: String,
    /// URL path, e.g. `/c/abc123`
    pub path: String,
    /// Query string including the leading `?`, or empty
    pub search: String,
    pub conversation_id: Option<String>,
    pub project_id: Option<String>,
}

impl Route {
    /// Parse an absolute location into a route.
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href)
            .map_err(|e| LockError::InvalidInput(format!("Invalid location {}: {}", href, e)))?;
        Ok(Self::from_url(&url))
    }

    /// Build a route from an already parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let search = match url.query() {
            Some(query) if !query.is_empty() => format!("?{}", query),
            _ => String::new(),
        };
        Self {
            href: url.to_string(),
            path: url.path().to_string(),
            search,
            conversation_id: conversation_id_from(url),
            project_id: project_id_from(url),
        }
    }

    /// Stable vault identity for this route, if it has one.
    ///
    /// A conversation id wins over a project id.
    pub fn lock_key(&self) -> Option<String> {
        if let Some(id) = &self.conversation_id {
            return Some(id.clone());
        }
        self.project_id.as_deref().map(project_lock_key)
    }

    /// Fine-grained token used only to notice that the view changed.
    pub fn route_token(&self) -> String {
        format!(
            "{}{}::{}",
            self.path,
            self.search,
            self.conversation_id.as_deref().unwrap_or("root")
        )
    }
}

/// Lock key for a project id.
pub fn project_lock_key(project_id: &str) -> String {
    format!("{}{}", PROJECT_KEY_PREFIX, project_id)
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn first_query_value(url: &Url, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        url.query_pairs()
            .find(|(name, value)| name == key && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

fn conversation_id_from(url: &Url) -> Option<String> {
    let parts = path_segments(url);
    if let Some(idx) = parts.iter().position(|part| *part == "c") {
        if let Some(id) = parts.get(idx + 1) {
            return Some((*id).to_string());
        }
    }
    first_query_value(url, &CONVERSATION_QUERY_KEYS)
}

fn project_id_from(url: &Url) -> Option<String> {
    let parts = path_segments(url);
    if parts.len() >= 2 && parts[parts.len() - 1] == "project" {
        return Some(parts[parts.len() - 2].to_string());
    }
    first_query_value(url, &PROJECT_QUERY_KEYS)
}

/// Which vault entry applies to a route, and through which key.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    pub lock_key: String,
    pub entry: &'a LockedEntry,
    pub conversation_id: Option<String>,
    pub project_id: Option<String>,
}

/// Find the vault entry guarding `route`.
///
/// Priority: exact conversation id, then exact project key, then the first
/// entry (in insertion order) whose recorded path and query agree with the
/// route. An empty recorded coordinate matches anything; an entry recording
/// neither coordinate is never matched this way.
pub fn lookup_entry_for_route<'a>(vault: &'a VaultMap, route: &Route) -> Option<RouteMatch<'a>> {
    if let Some(conversation_id) = &route.conversation_id {
        if let Some(entry) = vault.get(conversation_id) {
            return Some(RouteMatch {
                lock_key: conversation_id.clone(),
                entry,
                conversation_id: Some(conversation_id.clone()),
                project_id: None,
            });
        }
    }

    if let Some(project_id) = &route.project_id {
        let key = project_lock_key(project_id);
        if let Some(entry) = vault.get(&key) {
            return Some(RouteMatch {
                lock_key: key,
                entry,
                conversation_id: None,
                project_id: Some(project_id.clone()),
            });
        }
    }

    vault
        .iter()
        .find(|(_, entry)| fallback_matches(entry, route))
        .map(|(key, entry)| RouteMatch {
            lock_key: key.clone(),
            entry,
            conversation_id: entry.conversation_id.clone(),
            project_id: entry.project_id.clone(),
        })
}

/// An empty coordinate is a wildcard, but an entry recording neither
/// coordinate never matches, so an id-less entry cannot gate every route.
fn fallback_matches(entry: &LockedEntry, route: &Route) -> bool {
    let path = entry.target_path.as_deref().filter(|p| !p.is_empty());
    let search = entry.target_search.as_deref().filter(|s| !s.is_empty());
    if path.is_none() && search.is_none() {
        return false;
    }
    path.map_or(true, |p| p == route.path) && search.map_or(true, |s| s == route.search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Sealed;
    use crate::types::EntryKind;

    fn entry(key: &str, kind: EntryKind, path: Option<&str>, search: Option<&str>) -> LockedEntry {
        LockedEntry {
            kind,
            lock_key: key.to_string(),
            sealed: Sealed {
                ciphertext: "c".to_string(),
                iv: "i".to_string(),
            },
            locked_at: 0,
            title: None,
            original_title: None,
            project_title: None,
            conversation_id: None,
            project_id: None,
            target_path: path.map(str::to_string),
            target_search: search.map(str::to_string),
            location: None,
        }
    }

    #[test]
    fn test_conversation_from_path() {
        let route = Route::parse("https://chat.openai.com/c/abc123").unwrap();
        assert_eq!(route.conversation_id.as_deref(), Some("abc123"));
        assert_eq!(route.lock_key().as_deref(), Some("abc123"));
        assert_eq!(route.search, "");
    }

    #[test]
    fn test_conversation_inside_project_path() {
        let route = Route::parse("https://chatgpt.com/g/g-p-xyz/c/abc123").unwrap();
        assert_eq!(route.conversation_id.as_deref(), Some("abc123"));
        assert_eq!(route.lock_key().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_conversation_from_query() {
        let route = Route::parse("https://chat.openai.com/?conversationId=q1").unwrap();
        assert_eq!(route.conversation_id.as_deref(), Some("q1"));
        assert_eq!(route.search, "?conversationId=q1");
    }

    #[test]
    fn test_query_key_priority() {
        let route =
            Route::parse("https://chat.openai.com/?conversation=late&conversation_id=early")
                .unwrap();
        assert_eq!(route.conversation_id.as_deref(), Some("early"));
    }

    #[test]
    fn test_project_lock_key() {
        let route = Route::parse("https://chatgpt.com/g/proj9/project").unwrap();
        assert_eq!(route.conversation_id, None);
        assert_eq!(route.project_id.as_deref(), Some("proj9"));
        assert_eq!(route.lock_key().as_deref(), Some("project:proj9"));
    }

    #[test]
    fn test_project_from_query() {
        let route = Route::parse("https://chatgpt.com/projects?project_id=p2").unwrap();
        assert_eq!(route.lock_key().as_deref(), Some("project:p2"));
    }

    #[test]
    fn test_home_has_no_lock_key() {
        let route = Route::parse("https://chat.openai.com/").unwrap();
        assert_eq!(route.lock_key(), None);
        assert_eq!(route.route_token(), "/::root");
    }

    #[test]
    fn test_route_token_includes_query_and_id() {
        let route = Route::parse("https://chat.openai.com/c/abc?model=x").unwrap();
        assert_eq!(route.route_token(), "/c/abc?model=x::abc");
    }

    #[test]
    fn test_invalid_location_rejected() {
        assert!(matches!(
            Route::parse("not a url"),
            Err(LockError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_lookup_prefers_conversation_id() {
        let mut vault = VaultMap::new();
        vault.insert(
            "other".to_string(),
            entry("other", EntryKind::Chat, Some("/c/abc"), None),
        );
        vault.insert("abc".to_string(), entry("abc", EntryKind::Chat, None, None));

        let route = Route::parse("https://chat.openai.com/c/abc").unwrap();
        let found = lookup_entry_for_route(&vault, &route).unwrap();
        assert_eq!(found.lock_key, "abc");
        assert_eq!(found.conversation_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_lookup_project_key() {
        let mut vault = VaultMap::new();
        vault.insert(
            "project:proj9".to_string(),
            entry("project:proj9", EntryKind::Project, None, None),
        );
        let route = Route::parse("https://chatgpt.com/g/proj9/project").unwrap();
        let found = lookup_entry_for_route(&vault, &route).unwrap();
        assert_eq!(found.lock_key, "project:proj9");
        assert_eq!(found.project_id.as_deref(), Some("proj9"));
    }

    #[test]
    fn test_lookup_fallback_first_match_in_insertion_order() {
        let mut vault = VaultMap::new();
        vault.insert(
            "first".to_string(),
            entry("first", EntryKind::Chat, Some("/share/x"), None),
        );
        vault.insert(
            "second".to_string(),
            entry("second", EntryKind::Chat, Some("/share/x"), Some("?a=1")),
        );
        let route = Route::parse("https://chat.openai.com/share/x?a=1").unwrap();
        let found = lookup_entry_for_route(&vault, &route).unwrap();
        assert_eq!(found.lock_key, "first");
    }

    #[test]
    fn test_lookup_fallback_requires_search_when_recorded() {
        let mut vault = VaultMap::new();
        vault.insert(
            "k".to_string(),
            entry("k", EntryKind::Chat, Some("/share/x"), Some("?a=1")),
        );
        let route = Route::parse("https://chat.openai.com/share/x?a=2").unwrap();
        assert!(lookup_entry_for_route(&vault, &route).is_none());
    }

    #[test]
    fn test_entry_without_coordinates_never_matches() {
        let mut vault = VaultMap::new();
        vault.insert("k".to_string(), entry("k", EntryKind::Chat, None, Some("")));
        for href in [
            "https://chat.openai.com/",
            "https://chat.openai.com/share/x?a=1",
            "https://chat.openai.com/c/other",
        ] {
            let route = Route::parse(href).unwrap();
            assert!(lookup_entry_for_route(&vault, &route).is_none(), "{}", href);
        }
    }
}
