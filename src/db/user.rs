//! User and team queries.

use async_trait::async_trait;

use super::contains_pattern;
use crate::error::{Error, Result};
use crate::model::*;
use crate::repository::UserRepository;

const SELECT_USER: &str = "SELECT id, login_name, full_name, initials, enabled, admin FROM users";

impl super::Db {
    pub async fn create_user(&self, login_name: &str, full_name: &str, admin: bool) -> Result<User> {
        let initials: String = full_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect();

        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (login_name, full_name, initials, admin) VALUES ($1, $2, $3, $4)
             RETURNING id, login_name, full_name, initials, enabled, admin",
        )
        .bind(login_name)
        .bind(full_name)
        .bind(initials)
        .bind(admin)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn set_user_enabled(&self, id: UserId, enabled: bool) -> Result<()> {
        let rows = sqlx::query("UPDATE users SET enabled = $1 WHERE id = $2")
            .bind(enabled)
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(Error::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    pub async fn search_users_by_name(&self, term: &str) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "{SELECT_USER} WHERE full_name ILIKE $1 OR login_name ILIKE $1 ORDER BY full_name, id"
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn list_enabled_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE enabled ORDER BY full_name, id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Create a team. Returns its id.
    pub async fn create_team(&self, name: &str) -> Result<i32> {
        let row: (i32,) = sqlx::query_as("INSERT INTO teams (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn add_team_member(&self, team: i32, user: UserId) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team)
        .bind(user.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for super::Db {
    async fn search_by_name(&self, term: &str) -> Result<Vec<User>> {
        self.search_users_by_name(term).await
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        self.get_user(id).await
    }

    async fn enabled_users(&self) -> Result<Vec<User>> {
        self.list_enabled_users().await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    login_name: String,
    full_name: String,
    initials: String,
    enabled: bool,
    admin: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            login_name: row.login_name,
            full_name: row.full_name,
            initials: row.initials,
            enabled: row.enabled,
            admin: row.admin,
        }
    }
}
