use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{Level, info, warn};

/// Where and how verbosely to log. Read before tracing is installed.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub log_dir: String,
    pub log_level: Level,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: lookup("LOG_LEVEL")
                .and_then(|v| Level::from_str(v.trim()).ok())
                .unwrap_or(Level::INFO),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,

    // Startup connection retry
    pub db_connect_retries: u32,
    pub db_connect_retry_delay: Duration,

    // Pool
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,

    /// Join `users`/`events` for display names when listing.
    pub enrichment: bool,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got '{raw}'"))?,
            None => 4000,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: database_url(&lookup),
            db_connect_retries: positive_or_default(&lookup, "DB_CONNECT_RETRIES", 10),
            db_connect_retry_delay: Duration::from_millis(positive_or_default(
                &lookup,
                "DB_CONNECT_RETRY_DELAY_MS",
                2000,
            )),
            db_max_connections: positive_or_default(&lookup, "DB_MAX_CONNECTIONS", 10),
            db_acquire_timeout: Duration::from_secs(positive_or_default(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                5,
            )),
            enrichment: flag(&lookup, "ATTENDANCE_ENRICHMENT"),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
        })
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the `DB_*` parts.
fn database_url(lookup: &impl Fn(&str) -> Option<String>) -> String {
    if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
        return url;
    }

    let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string());
    let port = lookup("DB_PORT").unwrap_or_else(|| "3306".to_string());
    let user = lookup("DB_USER").unwrap_or_else(|| "root".to_string());
    let name = lookup("DB_NAME").unwrap_or_else(|| "attendance".to_string());

    match lookup("DB_PASSWORD").filter(|p| !p.is_empty()) {
        Some(password) => format!("mysql://{user}:{password}@{host}:{port}/{name}"),
        None => format!("mysql://{user}@{host}:{port}/{name}"),
    }
}

/// Missing, unparsable or zero values fall back to `default`.
fn positive_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            warn!("Invalid {key} value '{raw}', using default: {default}");
            default
        }
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "0" | "false" | "no" | "off") => false,
        Some("1" | "true" | "yes" | "on") => true,
        Some(other) => {
            warn!("Invalid {key} value '{other}', treating as false");
            false
        }
    }
}
