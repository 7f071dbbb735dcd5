//! Domain entity and request/response models
//!
//! `User` is the cached entity; the request and response types are the DTOs
//! (Data Transfer Objects) used for serializing/deserializing HTTP bodies.

pub mod requests;
pub mod responses;
pub mod user;

// Re-export commonly used types
pub use requests::{CreateUserRequest, ListQuery, UpdateUserRequest};
pub use responses::{DeleteResponse, HealthResponse, IdResponse, StatsResponse};
pub use user::{NewUser, User};
