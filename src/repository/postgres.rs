//! PostgreSQL user store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::UserStore;
use crate::error::{Error, Result};
use crate::models::{NewUser, User};

/// Database row representation of a user.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    age: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id.to_string(),
            name: row.name,
            age: row.age,
        }
    }
}

/// User store backed by a `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool, checks connectivity and applies the embedded migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");

        Ok(Self::new(pool))
    }
}

/// Ids that are not UUIDs cannot exist in the table.
fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::NotFound(id.to_string()))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<String> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO users (id, name, age) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&user.name)
            .bind(user.age)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to insert user");
                Error::from(e)
            })?;

        info!(user_id = %id, "user created");
        Ok(id.to_string())
    }

    async fn get(&self, id: &str) -> Result<User> {
        let uuid = parse_id(id)?;

        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, age FROM users WHERE id = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = %id, error = %e, "failed to query user");
                Error::from(e)
            })?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                debug!(user_id = %id, "user not found");
                Err(Error::NotFound(id.to_string()))
            }
        }
    }

    async fn update(&self, user: &User) -> Result<()> {
        let uuid = parse_id(&user.id)?;

        let result = sqlx::query("UPDATE users SET name = $1, age = $2 WHERE id = $3")
            .bind(&user.name)
            .bind(user.age)
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "update query failed");
                Error::from(e)
            })?;

        if result.rows_affected() == 0 {
            warn!(user_id = %user.id, "update of unknown user");
            return Err(Error::NotFound(user.id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let uuid = parse_id(id)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = %id, error = %e, "delete query failed");
                Error::from(e)
            })?;

        if result.rows_affected() == 0 {
            warn!(user_id = %id, "delete of unknown user");
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, age FROM users ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(limit, offset, error = %e, "failed to list users");
            Error::from(e)
        })?;

        debug!(count = rows.len(), "users listed");
        Ok(rows.into_iter().map(User::from).collect())
    }
}
