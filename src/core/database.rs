use crate::core::config::DatabaseConfig;
use crate::core::error::AppError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Map a failed write to an `AppError`.
///
/// Unique violations become `Conflict` with the given message, foreign key
/// violations become `BadRequest`. Everything else is logged and returned as
/// a database error.
pub fn map_write_error(e: sqlx::Error, context: &str, conflict_message: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                tracing::debug!("{}: unique violation: {}", context, db_err.message());
                return AppError::Conflict(conflict_message.to_string());
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                tracing::debug!("{}: foreign key violation: {}", context, db_err.message());
                return AppError::BadRequest("Referenced record does not exist".to_string());
            }
            _ => {}
        }
    }

    tracing::error!("{}: {:?}", context, e);
    AppError::Database(e)
}
