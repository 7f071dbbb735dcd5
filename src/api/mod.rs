//! API Module
//!
//! HTTP handlers and routing for the user service REST API.
//!
//! # Endpoints
//! - `POST /user`, `PUT /user` - Create or update a user
//! - `GET /user/:id`, `DELETE /user/:id` - Fetch or delete a user
//! - `GET /users` - Page through users
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
