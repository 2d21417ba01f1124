//! Database module for PostgreSQL connectivity
//!
//! Provides connection pool management, schema bootstrap, video/result
//! persistence, and the database-backed quota store.

pub mod models;
pub mod pool;
pub mod quota;
pub mod videos;

pub use pool::{DbError, DbPool};
pub use quota::PgQuotaStore;
pub use videos::VideoRepository;
