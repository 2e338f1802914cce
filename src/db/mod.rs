pub mod schema;
pub mod store;

#[cfg(test)]
pub mod memory;

use crate::config::Config;
use derive_more::Display;
use sqlx::mysql::MySqlPoolOptions;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use store::MySqlStore;
use tracing::{info, warn};

/// Bounded retry budget for the startup connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&Config> for RetryPolicy {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.db_connect_retries,
            delay: config.db_connect_retry_delay,
        }
    }
}

#[derive(Debug, Display)]
pub enum BootstrapError {
    #[display(fmt = "gave up after {} attempt(s): {}", attempts, last_error)]
    Exhausted { attempts: u32, last_error: String },
}

impl std::error::Error for BootstrapError {}

/// Runs `attempt` until it succeeds or the policy is spent, sleeping
/// `policy.delay` between failures. Every failure is logged.
pub async fn connect_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T, BootstrapError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for n in 1..=max_attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt = n, max_attempts, error = %e, "DB connect attempt {n}/{max_attempts} failed: {e}");
                last_error = e.to_string();
                if n < max_attempts {
                    actix_web::rt::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(BootstrapError::Exhausted {
        attempts: max_attempts,
        last_error,
    })
}

/// Connects to MySQL and ensures the schema, retrying per the configured policy.
pub async fn init_db(config: &Config) -> Result<MySqlStore, BootstrapError> {
    let policy = RetryPolicy::from(config);
    info!(
        max_attempts = policy.max_attempts,
        delay_ms = policy.delay.as_millis() as u64,
        "Connecting to MySQL"
    );
    connect_with_retry(&policy, || open_store(config)).await
}

async fn open_store(config: &Config) -> Result<MySqlStore, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    schema::ensure_schema(&pool).await?;

    Ok(MySqlStore::new(pool))
}
