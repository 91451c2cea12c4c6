//! Database layer for playtube-rs.
//!
//! Owns the SeaORM connection pool, the entity and repository modules,
//! and the schema migrations.

pub mod entities;
pub mod migrations;
pub mod repositories;

use std::time::Duration;

use playtube_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::log::LevelFilter;

/// Connect to the database with bounded pool options.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let db = &config.database;

    let mut opt = ConnectOptions::new(&db.url);
    opt.max_connections(db.max_connections)
        .min_connections(db.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    let conn = Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::debug!(
        max_connections = db.max_connections,
        min_connections = db.min_connections,
        "Database pool ready"
    );
    Ok(conn)
}

/// Apply pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
