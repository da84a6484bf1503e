//! Backlog queries.

use async_trait::async_trait;

use super::contains_pattern;
use crate::error::Result;
use crate::model::*;
use crate::repository::BacklogRepository;

const SELECT_BACKLOG: &str = "SELECT b.id, b.name, b.kind, p.id AS parent_id, p.name AS parent_name, p.kind AS parent_kind
     FROM backlogs b LEFT JOIN backlogs p ON p.id = b.parent_id";

impl super::Db {
    /// Create a backlog under `parent` (None for products and standalone
    /// iterations).
    pub async fn create_backlog(
        &self,
        name: &str,
        kind: BacklogKind,
        parent: Option<BacklogId>,
    ) -> Result<Backlog> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO backlogs (name, kind, parent_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(kind.to_string())
        .bind(parent.map(|p| p.0))
        .fetch_one(&self.pool)
        .await?;

        self.get_backlog(BacklogId(row.0))
            .await?
            .ok_or_else(|| crate::error::Error::NotFound(format!("backlog {}", row.0)))
    }

    pub async fn get_backlog(&self, id: BacklogId) -> Result<Option<Backlog>> {
        let row: Option<BacklogRow> = sqlx::query_as(&format!("{SELECT_BACKLOG} WHERE b.id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BacklogRow::try_into_backlog).transpose()
    }

    /// Load an optional foreign key as a backlog. A dangling id loads as None.
    pub(crate) async fn load_backlog(&self, id: Option<i32>) -> Result<Option<Backlog>> {
        match id {
            Some(id) => self.get_backlog(BacklogId(id)).await,
            None => Ok(None),
        }
    }

    pub async fn search_backlogs_by_name(
        &self,
        term: &str,
        kind: Option<BacklogKind>,
    ) -> Result<Vec<Backlog>> {
        let rows: Vec<BacklogRow> = sqlx::query_as(&format!(
            "{SELECT_BACKLOG}
             WHERE b.name ILIKE $1 AND ($2::text IS NULL OR b.kind = $2)
             ORDER BY b.name, b.id"
        ))
        .bind(contains_pattern(term))
        .bind(kind.map(|k| k.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BacklogRow::try_into_backlog).collect()
    }
}

#[async_trait]
impl BacklogRepository for super::Db {
    async fn search_by_name(&self, term: &str, kind: Option<BacklogKind>) -> Result<Vec<Backlog>> {
        self.search_backlogs_by_name(term, kind).await
    }

    async fn search_by_id(&self, id: i32) -> Result<Vec<Backlog>> {
        Ok(self.get_backlog(BacklogId(id)).await?.into_iter().collect())
    }

    async fn get(&self, id: BacklogId) -> Result<Option<Backlog>> {
        self.get_backlog(id).await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct BacklogRow {
    id: i32,
    name: String,
    kind: String,
    parent_id: Option<i32>,
    parent_name: Option<String>,
    parent_kind: Option<String>,
}

impl BacklogRow {
    fn try_into_backlog(self) -> Result<Backlog> {
        let parent = match (self.parent_id, self.parent_name, self.parent_kind) {
            (Some(id), Some(name), Some(kind)) => Some(BacklogRef {
                id: BacklogId(id),
                name,
                kind: kind.parse()?,
            }),
            _ => None,
        };

        Ok(Backlog {
            id: BacklogId(self.id),
            name: self.name,
            kind: self.kind.parse()?,
            parent,
        })
    }
}
