//! Core data model.
//!
//! Backlogs form a shallow tree (product > project > iteration). Stories live
//! in a backlog and optionally an iteration; tasks live in a story and/or
//! directly in an iteration. Relations are materialized by value when an
//! entity is loaded, so a `Task` carries its story and that story's
//! containers.

pub mod queue;
pub mod search;

pub use queue::*;
pub use search::*;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Backlog (product, project or iteration) identifier.
    BacklogId
);
id_type!(StoryId);
id_type!(TaskId);
id_type!(UserId);

// ---------------------------------------------------------------------------
// Backlog
// ---------------------------------------------------------------------------

/// What kind of container a backlog is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklogKind {
    Product,
    Project,
    Iteration,
}

impl std::fmt::Display for BacklogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BacklogKind::Product => "product",
            BacklogKind::Project => "project",
            BacklogKind::Iteration => "iteration",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for BacklogKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(BacklogKind::Product),
            "project" => Ok(BacklogKind::Project),
            "iteration" => Ok(BacklogKind::Iteration),
            other => Err(crate::error::Error::Other(format!(
                "unknown backlog kind: {other}"
            ))),
        }
    }
}

/// A container of stories and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlog {
    pub id: BacklogId,
    pub name: String,
    pub kind: BacklogKind,
    /// Enclosing backlog. None for products and standalone iterations.
    pub parent: Option<BacklogRef>,
}

/// Shallow reference to a backlog, used for parent links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogRef {
    pub id: BacklogId,
    pub name: String,
    pub kind: BacklogKind,
}

impl Backlog {
    pub fn to_ref(&self) -> BacklogRef {
        BacklogRef {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Story / Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub name: String,
    pub backlog: Option<Backlog>,
    pub iteration: Option<Backlog>,
}

impl Story {
    /// The backlog a story is shown under: its iteration if it has one,
    /// otherwise its backlog.
    pub fn container(&self) -> Option<&Backlog> {
        self.iteration.as_ref().or(self.backlog.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub story: Option<Story>,
    /// Iteration the task is assigned to directly, bypassing any story.
    pub iteration: Option<Backlog>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login_name: String,
    pub full_name: String,
    pub initials: String,
    pub enabled: bool,
    pub admin: bool,
}
