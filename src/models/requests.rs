//! Request DTOs for the user API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use uuid::Uuid;

use super::user::{NewUser, User, MAX_AGE, MIN_AGE};

/// Maximum accepted user name length in bytes
pub const MAX_NAME_LENGTH: usize = 255;

/// Default and maximum page size for `GET /users`
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 1000;

/// Request body for POST /user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub age: i32,
}

impl CreateUserRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name).or_else(|| validate_age(self.age))
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser::new(self.name.trim(), self.age)
    }
}

/// Request body for PUT /user
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub id: String,
    pub name: String,
    pub age: i32,
}

impl UpdateUserRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_id(&self.id)
            .or_else(|| validate_name(&self.name))
            .or_else(|| validate_age(self.age))
    }

    pub fn into_user(self) -> User {
        User::new(self.id, self.name.trim(), self.age)
    }
}

/// Pagination query for GET /users
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListQuery {
    /// Returns `(limit, offset)` with defaults applied, or an error message.
    pub fn resolve(&self) -> Result<(i64, i64), String> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        let offset = self.offset.unwrap_or(0);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        if offset < 0 {
            return Err("offset must not be negative".to_string());
        }
        Ok((limit, offset))
    }
}

/// Returns an error message unless `id` is a well-formed UUID.
pub fn validate_id(id: &str) -> Option<String> {
    match Uuid::parse_str(id) {
        Ok(_) => None,
        Err(_) => Some(format!("'{}' is not a valid UUID", id)),
    }
}

fn validate_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return Some("Name cannot be empty".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Some(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        ));
    }
    None
}

fn validate_age(age: i32) -> Option<String> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Some(format!("Age must be between {} and {}", MIN_AGE, MAX_AGE));
    }
    None
}
