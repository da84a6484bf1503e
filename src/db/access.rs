//! Backlog access checks.
//!
//! Admins see everything. Everyone else sees a backlog when its root
//! (the product it belongs to, or the backlog itself if it has no parent)
//! has been granted to one of their teams.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{BacklogId, User};
use crate::repository::AccessControl;

impl super::Db {
    /// Grant a team access to a root backlog and everything under it.
    pub async fn grant_team_access(&self, team: i32, backlog: BacklogId) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_backlog_access (team_id, backlog_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(team)
        .bind(backlog.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_backlog_accessible_to(&self, backlog: BacklogId, user: &User) -> Result<bool> {
        if user.admin {
            return Ok(true);
        }

        let row: (bool,) = sqlx::query_as(
            "WITH RECURSIVE chain AS (
                 SELECT id, parent_id FROM backlogs WHERE id = $1
                 UNION ALL
                 SELECT b.id, b.parent_id FROM backlogs b JOIN chain c ON b.id = c.parent_id
             )
             SELECT EXISTS (
                 SELECT 1 FROM chain c
                 JOIN team_backlog_access a ON a.backlog_id = c.id
                 JOIN team_members m ON m.team_id = a.team_id
                 WHERE c.parent_id IS NULL AND m.user_id = $2
             )",
        )
        .bind(backlog.0)
        .bind(user.id.0)
        .fetch_one(&self.pool)
        .await?;

        if !row.0 {
            tracing::debug!(backlog = %backlog, user = %user.id, "backlog not accessible");
        }
        Ok(row.0)
    }
}

#[async_trait]
impl AccessControl for super::Db {
    async fn is_backlog_accessible(&self, backlog: BacklogId, user: &User) -> Result<bool> {
        self.is_backlog_accessible_to(backlog, user).await
    }
}
