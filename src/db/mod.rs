use std::future::Future;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::Config;
use crate::error::{AppError, AppResult};

const RETRY_ATTEMPTS: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 50;

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(&config.database_url);
    options
        .max_connections(20)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

/// Retry an idempotent query through transient connectivity failures with
/// bounded backoff. Anything still failing afterwards maps to `Unavailable`
/// via the `DbErr` conversion; domain errors pass through untouched.
pub async fn with_backoff<T, F, Fut>(mut op: F) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    for attempt in 0..RETRY_ATTEMPTS {
        match op().await {
            Err(err) if is_transient(&err) => {
                tracing::warn!(error = %err, attempt = attempt + 1, "transient database error, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            other => return other,
        }
    }
    op().await
}
