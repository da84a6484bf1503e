//! Task queries.

use std::collections::HashMap;

use async_trait::async_trait;

use super::contains_pattern;
use crate::error::{Error, Result};
use crate::model::*;
use crate::repository::TaskRepository;

impl super::Db {
    pub async fn create_task(
        &self,
        name: &str,
        story: Option<StoryId>,
        iteration: Option<BacklogId>,
    ) -> Result<Task> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO tasks (name, story_id, iteration_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(story.map(|s| s.0))
        .bind(iteration.map(|i| i.0))
        .fetch_one(&self.pool)
        .await?;

        self.get_task(TaskId(row.0))
            .await?
            .ok_or_else(|| Error::NotFound(format!("task {}", row.0)))
    }

    /// Make `user` one of the people responsible for `task`.
    pub async fn assign_task(&self, task: TaskId, user: UserId) -> Result<()> {
        sqlx::query(
            "INSERT INTO task_responsibles (task_id, user_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(task.0)
        .bind(user.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT id, name, story_id, iteration_id FROM tasks WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_task(row).await?)),
            None => Ok(None),
        }
    }

    /// Load several tasks in one query, returned in the order of `ids`.
    /// Ids with no row are left out.
    pub async fn get_tasks(&self, ids: &[TaskId]) -> Result<Vec<Task>> {
        let raw: Vec<i32> = ids.iter().map(|id| id.0).collect();
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, name, story_id, iteration_id FROM tasks WHERE id = ANY($1)",
        )
        .bind(raw.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<i32, TaskRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let mut tasks = Vec::with_capacity(by_id.len());
        for id in raw {
            if let Some(row) = by_id.remove(&id) {
                tasks.push(self.hydrate_task(row).await?);
            }
        }
        Ok(tasks)
    }

    pub async fn search_tasks_by_name(&self, term: &str) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, name, story_id, iteration_id FROM tasks
             WHERE name ILIKE $1
             ORDER BY name, id",
        )
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(self.hydrate_task(row).await?);
        }
        Ok(tasks)
    }

    async fn hydrate_task(&self, row: TaskRow) -> Result<Task> {
        let story = match row.story_id {
            Some(id) => self.get_story(StoryId(id)).await?,
            None => None,
        };
        Ok(Task {
            id: TaskId(row.id),
            name: row.name,
            story,
            iteration: self.load_backlog(row.iteration_id).await?,
        })
    }
}

#[async_trait]
impl TaskRepository for super::Db {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Task>> {
        self.search_tasks_by_name(term).await
    }

    async fn search_by_id(&self, id: i32) -> Result<Vec<Task>> {
        Ok(self.get_task(TaskId(id)).await?.into_iter().collect())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        self.get_task(id).await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    name: String,
    story_id: Option<i32>,
    iteration_id: Option<i32>,
}
