use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LISTING_URL: &str =
    "https://weworkremotely.com/categories/remote-full-stack-programming-jobs";
pub const DEFAULT_DESCRIPTION_SELECTOR: &str = "div.lis-container__job__content__description";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DB_PASSWORD not found; add it to the environment or a .env file")]
    MissingPassword,

    #[error("{key} must be a valid number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Connection settings for the job database.
///
/// Everything but the password has a default; the password is checked before
/// anything touches the network.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let password = lookup("DB_PASSWORD").ok_or(ConfigError::MissingPassword)?;

        let host = non_blank(lookup("DB_HOST")).unwrap_or_else(|| "localhost".to_string());
        let port = parse_or("DB_PORT", non_blank(lookup("DB_PORT")), 5432)?;
        let database = non_blank(lookup("DB_NAME")).unwrap_or_else(|| "remote_jobs".to_string());
        let user = non_blank(lookup("DB_USER")).unwrap_or_else(|| "postgres".to_string());

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
        })
    }
}

/// Phase 1 settings.
#[derive(Clone, Debug)]
pub struct HarvestConfig {
    pub listing_url: String,
    pub http_timeout: Duration,
}

impl HarvestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listing_url =
            non_blank(lookup("LISTING_URL")).unwrap_or_else(|| DEFAULT_LISTING_URL.to_string());
        let http_timeout_secs =
            positive_or("HTTP_TIMEOUT_SECS", non_blank(lookup("HTTP_TIMEOUT_SECS")), 15)?;

        Ok(Self {
            listing_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// Phase 2 settings.
#[derive(Clone, Debug)]
pub struct BackfillConfig {
    pub description_selector: String,
    pub limit: Option<i64>,
    pub render_timeout: Duration,
    pub pace: Duration,
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            description_selector: DEFAULT_DESCRIPTION_SELECTOR.to_string(),
            limit: None,
            render_timeout: Duration::from_secs(15),
            pace: Duration::from_secs(2),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
        }
    }
}

impl BackfillConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let description_selector =
            non_blank(lookup("DESCRIPTION_SELECTOR")).unwrap_or(defaults.description_selector);

        // "0", "none" and "off" all mean "process everything"
        let limit = match non_blank(lookup("BACKFILL_LIMIT")) {
            None => None,
            Some(v) if matches!(v.to_lowercase().as_str(), "0" | "none" | "off") => None,
            Some(v) => Some(v.parse::<i64>().map_err(|_| ConfigError::InvalidNumber {
                key: "BACKFILL_LIMIT",
                value: v.clone(),
            })?)
            .filter(|n| *n > 0),
        };

        let render_timeout_secs =
            positive_or("RENDER_TIMEOUT_SECS", non_blank(lookup("RENDER_TIMEOUT_SECS")), 15)?;
        let pace_secs = parse_or("PACE_SECS", non_blank(lookup("PACE_SECS")), 2)?;

        let webdriver_url =
            non_blank(lookup("WEBDRIVER_URL")).unwrap_or(defaults.webdriver_url);
        let headless = env_bool(lookup("BROWSER_HEADLESS")).unwrap_or(defaults.headless);

        Ok(Self {
            description_selector,
            limit,
            render_timeout: Duration::from_secs(render_timeout_secs),
            pace: Duration::from_secs(pace_secs),
            webdriver_url,
            headless,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value: v }),
    }
}

/// Like `parse_or`, but zero is rejected.
fn positive_or(key: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match parse_or(key, value, default)? {
        0 => Err(ConfigError::InvalidNumber {
            key,
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}

fn env_bool(value: Option<String>) -> Option<bool> {
    value.map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
