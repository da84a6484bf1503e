//! Storage-facing traits consumed by the search service and the daily work
//! action.
//!
//! [`crate::db::Db`] implements all of them against Postgres. Tests plug in
//! in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::*;

#[async_trait]
pub trait BacklogRepository: Send + Sync {
    /// Backlogs whose name contains `term`, optionally restricted to one kind.
    async fn search_by_name(&self, term: &str, kind: Option<BacklogKind>) -> Result<Vec<Backlog>>;

    /// Backlogs with the given id (zero or one).
    async fn search_by_id(&self, id: i32) -> Result<Vec<Backlog>>;

    async fn get(&self, id: BacklogId) -> Result<Option<Backlog>>;
}

#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Story>>;

    async fn search_by_id(&self, id: i32) -> Result<Vec<Story>>;

    async fn get(&self, id: StoryId) -> Result<Option<Story>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Task>>;

    async fn search_by_id(&self, id: i32) -> Result<Vec<Task>>;

    async fn get(&self, id: TaskId) -> Result<Option<Task>>;

    /// Like [`get`](Self::get), but a missing task is an error.
    async fn retrieve(&self, id: TaskId) -> Result<Task> {
        self.get(id)
            .await?
            .ok_or_else(|| crate::error::Error::NotFound(format!("task {id}")))
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Users whose full name or login name contains `term`.
    async fn search_by_name(&self, term: &str) -> Result<Vec<User>>;

    async fn get(&self, id: UserId) -> Result<Option<User>>;

    async fn enabled_users(&self) -> Result<Vec<User>>;

    /// Like [`get`](Self::get), but a missing user is an error.
    async fn retrieve(&self, id: UserId) -> Result<User> {
        self.get(id)
            .await?
            .ok_or_else(|| crate::error::Error::NotFound(format!("user {id}")))
    }
}

/// Decides whether a user may see the contents of a backlog.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn is_backlog_accessible(&self, backlog: BacklogId, user: &User) -> Result<bool>;
}

/// Per-user ordered work queue.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Queued tasks in rank order, followed by assigned but unqueued tasks.
    async fn current_tasks(&self, user: &User) -> Result<Vec<DailyWorkTask>>;

    /// Append `task` to the end of the user's queue. Already queued tasks
    /// keep their entry.
    async fn add(&self, user: &User, task: &Task) -> Result<QueueEntry>;

    /// Drop `task` from the user's queue. Not queued is a no-op.
    async fn remove(&self, user: &User, task: &Task) -> Result<()>;

    /// Move `task` directly below `target`, or to the top when there is no
    /// target.
    async fn rank_under(
        &self,
        user: &User,
        task: &Task,
        target: Option<&Task>,
    ) -> Result<DailyWorkTask>;
}
