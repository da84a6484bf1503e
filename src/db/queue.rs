//! Work queue persistence.
//!
//! Every mutation runs in one transaction and leaves the user's ranks
//! dense (0..n).

use async_trait::async_trait;
use opentelemetry::KeyValue;

use crate::error::{Error, Result};
use crate::model::*;
use crate::repository::WorkQueue;
use crate::telemetry::metrics;

impl super::Db {
    /// A user's queue entries in rank order.
    pub async fn queue_entries(&self, user: UserId) -> Result<Vec<QueueEntry>> {
        let rows: Vec<QueueEntryRow> = sqlx::query_as(
            "SELECT user_id, task_id, rank, created_at FROM work_queue_entries
             WHERE user_id = $1 ORDER BY rank, task_id",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(QueueEntry::from).collect())
    }

    /// Like [`Db::get_tasks`](super::Db::get_tasks), but every id must resolve.
    async fn load_tasks(&self, ids: Vec<TaskId>) -> Result<Vec<Task>> {
        let tasks = self.get_tasks(&ids).await?;
        if let Some(missing) = ids.iter().find(|id| !tasks.iter().any(|t| t.id == **id)) {
            return Err(Error::NotFound(format!("task {missing}")));
        }
        Ok(tasks)
    }
}

#[async_trait]
impl WorkQueue for super::Db {
    async fn current_tasks(&self, user: &User) -> Result<Vec<DailyWorkTask>> {
        let entries = self.queue_entries(user.id).await?;
        let queued = self.load_tasks(entries.iter().map(|e| e.task_id).collect()).await?;

        let assigned_ids: Vec<(i32,)> = sqlx::query_as(
            "SELECT r.task_id FROM task_responsibles r
             WHERE r.user_id = $1
             AND NOT EXISTS (
                 SELECT 1 FROM work_queue_entries q
                 WHERE q.user_id = r.user_id AND q.task_id = r.task_id
             )
             ORDER BY r.task_id",
        )
        .bind(user.id.0)
        .fetch_all(&self.pool)
        .await?;
        let assigned = self
            .load_tasks(assigned_ids.into_iter().map(|r| TaskId(r.0)).collect())
            .await?;

        Ok(queued
            .into_iter()
            .zip(entries.iter())
            .map(|(task, entry)| DailyWorkTask::next(task, entry.rank))
            .chain(assigned.into_iter().map(DailyWorkTask::assigned))
            .collect())
    }

    async fn add(&self, user: &User, task: &Task) -> Result<QueueEntry> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<QueueEntryRow> = sqlx::query_as(
            "SELECT user_id, task_id, rank, created_at FROM work_queue_entries
             WHERE user_id = $1 AND task_id = $2",
        )
        .bind(user.id.0)
        .bind(task.id.0)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(row) = existing {
            tx.commit().await?;
            return Ok(row.into());
        }

        let row: QueueEntryRow = sqlx::query_as(
            "INSERT INTO work_queue_entries (user_id, task_id, rank)
             VALUES ($1, $2, (SELECT COUNT(*)::int FROM work_queue_entries WHERE user_id = $1))
             RETURNING user_id, task_id, rank, created_at",
        )
        .bind(user.id.0)
        .bind(task.id.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        metrics::queue_operations().add(1, &[KeyValue::new("operation", "add")]);
        Ok(row.into())
    }

    async fn remove(&self, user: &User, task: &Task) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<(i32,)> = sqlx::query_as(
            "DELETE FROM work_queue_entries WHERE user_id = $1 AND task_id = $2 RETURNING rank",
        )
        .bind(user.id.0)
        .bind(task.id.0)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((rank,)) = removed {
            sqlx::query(
                "UPDATE work_queue_entries SET rank = rank - 1 WHERE user_id = $1 AND rank > $2",
            )
            .bind(user.id.0)
            .bind(rank)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        metrics::queue_operations().add(1, &[KeyValue::new("operation", "remove")]);
        Ok(())
    }

    async fn rank_under(
        &self,
        user: &User,
        task: &Task,
        target: Option<&Task>,
    ) -> Result<DailyWorkTask> {
        let mut tx = self.pool.begin().await?;

        let current: Vec<(i32,)> = sqlx::query_as(
            "SELECT task_id FROM work_queue_entries WHERE user_id = $1 ORDER BY rank, task_id FOR UPDATE",
        )
        .bind(user.id.0)
        .fetch_all(&mut *tx)
        .await?;
        let mut order: Vec<TaskId> = current.into_iter().map(|r| TaskId(r.0)).collect();

        let rank = crate::model::rank_under(&mut order, task.id, target.map(|t| t.id));

        for (position, id) in order.iter().enumerate() {
            sqlx::query(
                "INSERT INTO work_queue_entries (user_id, task_id, rank) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, task_id) DO UPDATE SET rank = EXCLUDED.rank",
            )
            .bind(user.id.0)
            .bind(id.0)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        metrics::queue_operations().add(1, &[KeyValue::new("operation", "rank")]);
        Ok(DailyWorkTask::next(task.clone(), rank as i32))
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct QueueEntryRow {
    user_id: i32,
    task_id: i32,
    rank: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<QueueEntryRow> for QueueEntry {
    fn from(row: QueueEntryRow) -> Self {
        QueueEntry {
            user_id: UserId(row.user_id),
            task_id: TaskId(row.task_id),
            rank: row.rank,
            created_at: row.created_at,
        }
    }
}
