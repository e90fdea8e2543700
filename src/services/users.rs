//! User accounts.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::guard::{BoundedCount, Role, ValidContent};
use crate::services::credentials::PasswordHash;
use crate::services::StoreError;

#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: PasswordHash,
    pub role: Role,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Client-facing view of a user. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

/// Input for [`UserRepository::put`]. Both fields already passed the content guard.
#[derive(Debug)]
pub struct NewUser {
    pub username: ValidContent,
    pub password_hash: PasswordHash,
    pub role: Role,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user; fails with `Conflict` if the username is taken.
    async fn put(&self, user: NewUser) -> Result<User, StoreError>;

    /// Remove a user. Returns false if the id was unknown.
    async fn delete(&self, id: BoundedCount) -> Result<bool, StoreError>;

    async fn count_by_role(&self, role: Role) -> Result<usize, StoreError>;
}

/// In-memory repository. Usernames are unique, case-sensitive.
#[derive(Debug)]
pub struct InMemoryUserStore {
    users: DashMap<u64, User>,
    by_name: DashMap<String, u64>,
    next_id: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            by_name: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn get(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.by_name.get(username).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.get(id).await
    }

    async fn put(&self, user: NewUser) -> Result<User, StoreError> {
        let username = user.username.into_string();
        match self.by_name.entry(username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("username")),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let stored = User {
                    id,
                    username,
                    password_hash: user.password_hash,
                    role: user.role,
                };
                self.users.insert(id, stored.clone());
                slot.insert(id);
                Ok(stored)
            }
        }
    }

    async fn delete(&self, id: BoundedCount) -> Result<bool, StoreError> {
        match self.users.remove(&id.get()) {
            Some((_, user)) => {
                self.by_name.remove(&user.username);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_by_role(&self, role: Role) -> Result<usize, StoreError> {
        Ok(self.users.iter().filter(|u| u.role == role).count())
    }
}
