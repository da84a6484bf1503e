//! Search result rows and quick-reference terms.

use serde::{Deserialize, Serialize};

use super::{Backlog, Story, Task, User};

/// The entity a search result points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchTarget {
    Backlog(Backlog),
    Story(Story),
    Task(Task),
    User(User),
}

impl SearchTarget {
    pub fn name(&self) -> &str {
        match self {
            SearchTarget::Backlog(b) => &b.name,
            SearchTarget::Story(s) => &s.name,
            SearchTarget::Task(t) => &t.name,
            SearchTarget::User(u) => &u.full_name,
        }
    }
}

/// One labelled search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultRow {
    pub label: String,
    pub original: SearchTarget,
}

impl SearchResultRow {
    pub fn new(label: impl Into<String>, original: SearchTarget) -> Self {
        Self {
            label: label.into(),
            original,
        }
    }
}

/// Entity kinds that can be addressed with a `kind:id` quick reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Story,
    Backlog,
}

impl ReferenceKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "story" => Some(ReferenceKind::Story),
            "backlog" => Some(ReferenceKind::Backlog),
            _ => None,
        }
    }
}

/// A parsed quick reference such as `story:42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub id: i32,
}

impl Reference {
    /// Parse `kind:id`. Anything else (no colon, several colons, an
    /// unknown kind, a non-integer id) is not a reference.
    pub fn parse(term: &str) -> Option<Self> {
        let (kind, id) = term.split_once(':')?;
        if id.contains(':') {
            return None;
        }
        Some(Self {
            kind: ReferenceKind::parse(kind)?,
            id: parse_id(id)?,
        })
    }
}

/// Parse a search term as an entity id.
pub fn parse_id(term: &str) -> Option<i32> {
    term.parse().ok()
}
