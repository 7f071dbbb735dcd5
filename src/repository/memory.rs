//! In-process user store used when no database is configured, and by tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::UserStore;
use crate::error::{Error, Result};
use crate::models::{NewUser, User};

/// `BTreeMap` keeps ids sorted so pagination matches `ORDER BY id`.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user with a caller-chosen id, replacing any existing one.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.users
            .write()
            .await
            .insert(id.clone(), user.with_id(id.clone()));
        debug!(user_id = %id, "user created");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn update(&self, user: &User) -> Result<()> {
        match self.users.write().await.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => {
                warn!(user_id = %user.id, "update of unknown user");
                Err(Error::NotFound(user.id.clone()))
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.users.write().await.remove(id) {
            Some(_) => Ok(()),
            None => {
                warn!(user_id = %id, "delete of unknown user");
                Err(Error::NotFound(id.to_string()))
            }
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let limit = usize::try_from(limit)
            .map_err(|_| Error::InvalidRequest(format!("invalid limit {}", limit)))?;
        let offset = usize::try_from(offset)
            .map_err(|_| Error::InvalidRequest(format!("invalid offset {}", offset)))?;

        let users = self.users.read().await;
        Ok(users.values().skip(offset).take(limit).cloned().collect())
    }
}
