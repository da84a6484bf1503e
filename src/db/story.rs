//! Story queries.

use async_trait::async_trait;

use super::contains_pattern;
use crate::error::{Error, Result};
use crate::model::*;
use crate::repository::StoryRepository;

impl super::Db {
    pub async fn create_story(
        &self,
        name: &str,
        backlog: Option<BacklogId>,
        iteration: Option<BacklogId>,
    ) -> Result<Story> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO stories (name, backlog_id, iteration_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(backlog.map(|b| b.0))
        .bind(iteration.map(|i| i.0))
        .fetch_one(&self.pool)
        .await?;

        self.get_story(StoryId(row.0))
            .await?
            .ok_or_else(|| Error::NotFound(format!("story {}", row.0)))
    }

    pub async fn get_story(&self, id: StoryId) -> Result<Option<Story>> {
        let row: Option<StoryRow> =
            sqlx::query_as("SELECT id, name, backlog_id, iteration_id FROM stories WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_story(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn search_stories_by_name(&self, term: &str) -> Result<Vec<Story>> {
        let rows: Vec<StoryRow> = sqlx::query_as(
            "SELECT id, name, backlog_id, iteration_id FROM stories
             WHERE name ILIKE $1
             ORDER BY name, id",
        )
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        let mut stories = Vec::with_capacity(rows.len());
        for row in rows {
            stories.push(self.hydrate_story(row).await?);
        }
        Ok(stories)
    }

    async fn hydrate_story(&self, row: StoryRow) -> Result<Story> {
        Ok(Story {
            id: StoryId(row.id),
            name: row.name,
            backlog: self.load_backlog(row.backlog_id).await?,
            iteration: self.load_backlog(row.iteration_id).await?,
        })
    }
}

#[async_trait]
impl StoryRepository for super::Db {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Story>> {
        self.search_stories_by_name(term).await
    }

    async fn search_by_id(&self, id: i32) -> Result<Vec<Story>> {
        Ok(self.get_story(StoryId(id)).await?.into_iter().collect())
    }

    async fn get(&self, id: StoryId) -> Result<Option<Story>> {
        self.get_story(id).await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct StoryRow {
    id: i32,
    name: String,
    backlog_id: Option<i32>,
    iteration_id: Option<i32>,
}
