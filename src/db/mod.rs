//! Analytics-store access: connection setup, record types, and the two
//! collaborator contracts the ranking pipeline talks to.

pub mod data_service;
pub mod models;
pub mod repository;

use crate::config::DatabaseConfig;
use crate::errors::AppError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

/// Open a connection pool against the analytics store.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(cfg!(debug_assertions));

    let db = Database::connect(options).await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool initialized"
    );

    Ok(db)
}
