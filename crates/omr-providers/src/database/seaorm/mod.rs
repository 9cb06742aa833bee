//! SeaORM-backed repositories over SQLite/Postgres.
//!
//! Entities mirror the record tables; repositories implement the domain
//! ports with eager aggregate fetches and transactional, idempotent result
//! application.

pub mod conversions;
pub mod entities;
pub mod repos;
pub mod schema;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use omr_domain::error::{Error, Result};

/// Open a database connection. Accepts any SeaORM-supported URL
/// (`sqlite://...`, `postgres://...`).
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(10)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options)
        .await
        .map_err(|e| Error::database_with_source("could not connect to database", e))
}
