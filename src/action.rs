//! Daily work action: resolves user and task ids, then hands off to the
//! work queue.
//!
//! Every operation takes an optional user id. `None` means the logged-in
//! user. A user or task id that doesn't resolve aborts the operation with
//! [`Error::NotFound`](crate::error::Error::NotFound) before the queue is
//! touched.

use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, info};

use crate::error::Result;
use crate::model::*;
use crate::repository::{TaskRepository, UserRepository, WorkQueue};
use crate::telemetry::queue::{record_rank, start_queue_span};

/// What `retrieve` exposes: the user's daily work plus everyone the UI can
/// switch to.
#[derive(Debug, Clone, Serialize)]
pub struct DailyWorkView {
    pub user: User,
    pub assigned_tasks: Vec<DailyWorkTask>,
    pub enabled_users: Vec<User>,
}

pub struct DailyWorkAction {
    users: Arc<dyn UserRepository>,
    tasks: Arc<dyn TaskRepository>,
    queue: Arc<dyn WorkQueue>,
    logged_in_user: UserId,
}

impl DailyWorkAction {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tasks: Arc<dyn TaskRepository>,
        queue: Arc<dyn WorkQueue>,
        logged_in_user: UserId,
    ) -> Self {
        Self {
            users,
            tasks,
            queue,
            logged_in_user,
        }
    }

    /// Build an action whose collaborators all go to `store`.
    pub fn from_store<S>(store: Arc<S>, logged_in_user: UserId) -> Self
    where
        S: UserRepository + TaskRepository + WorkQueue + 'static,
    {
        Self {
            users: store.clone(),
            tasks: store.clone(),
            queue: store,
            logged_in_user,
        }
    }

    pub async fn retrieve(&self, user_id: Option<UserId>) -> Result<DailyWorkView> {
        let user = self.resolve_user(user_id).await?;
        let enabled_users = self.users.enabled_users().await?;
        let assigned_tasks = self.queue.current_tasks(&user).await?;
        Ok(DailyWorkView {
            user,
            assigned_tasks,
            enabled_users,
        })
    }

    /// Queue a task for a user. Returns the task for display.
    pub async fn add_to_work_queue(&self, user_id: Option<UserId>, task_id: TaskId) -> Result<Task> {
        let user = self.resolve_user(user_id).await?;
        let task = self.tasks.retrieve(task_id).await?;

        let span = start_queue_span("add", user.id, task.id);
        let entry = self.queue.add(&user, &task).instrument(span.clone()).await?;
        record_rank(&span, entry.rank);
        info!(user = %user.id, task = %task.id, rank = entry.rank, "task queued");
        Ok(task)
    }

    /// Take a task off a user's queue. Returns the task for display.
    pub async fn delete_from_work_queue(
        &self,
        user_id: Option<UserId>,
        task_id: TaskId,
    ) -> Result<Task> {
        let user = self.resolve_user(user_id).await?;
        let task = self.tasks.retrieve(task_id).await?;

        let span = start_queue_span("remove", user.id, task.id);
        self.queue.remove(&user, &task).instrument(span).await?;
        info!(user = %user.id, task = %task.id, "task dequeued");
        Ok(task)
    }

    /// Move a queued task directly below another one. A missing or unknown
    /// `rank_under` moves it to the top.
    pub async fn rank_queue_task_and_move_under(
        &self,
        user_id: Option<UserId>,
        task_id: TaskId,
        rank_under: Option<TaskId>,
    ) -> Result<DailyWorkTask> {
        let user = self.resolve_user(user_id).await?;
        let task = self.tasks.retrieve(task_id).await?;
        let target = match rank_under {
            Some(id) => self.tasks.get(id).await?,
            None => None,
        };

        let span = start_queue_span("rank", user.id, task.id);
        let ranked = self
            .queue
            .rank_under(&user, &task, target.as_ref())
            .instrument(span.clone())
            .await?;
        record_rank(&span, ranked.work_queue_rank);
        Ok(ranked)
    }

    async fn resolve_user(&self, user_id: Option<UserId>) -> Result<User> {
        self.users
            .retrieve(user_id.unwrap_or(self.logged_in_user))
            .await
    }
}
