//! Database layer for StackIt.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use stackit_common::{AppError, Config};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize the process-wide connection pool.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Begin a transaction on the pool.
///
/// Dropping the returned transaction without committing rolls it back.
pub async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction, AppError> {
    db.begin().await.map_err(txn_err)
}

/// Commit a transaction.
pub async fn commit(txn: DatabaseTransaction) -> Result<(), AppError> {
    txn.commit().await.map_err(txn_err)
}

/// Map a store error raised while a transaction is open.
#[must_use]
pub fn txn_err(e: DbErr) -> AppError {
    AppError::TransactionFailure(e.to_string())
}
