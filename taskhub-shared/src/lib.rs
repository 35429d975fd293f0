//! # TaskHub Shared Library
//!
//! Domain types, storage ports and business flows used by the TaskHub API
//! server and the notification worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL
//! - `store`: Storage ports and the cache-aside user store
//! - `auth`: Passwords, sessions, authorization, verification and invitations
//! - `services`: User, project and task operations plus wiring
//! - `events`: Outbound notifications and their wire format
//! - `db`: PostgreSQL pool, migrations and the durable store
//! - `redis`: Redis client, user cache and notification stream
//! - `memory`: In-memory adapters for every port
//! - `error`: Common error types

pub mod auth;
pub mod db;
pub mod error;
pub mod events;
pub mod memory;
pub mod models;
pub mod redis;
pub mod services;
pub mod store;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
