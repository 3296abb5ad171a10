use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::settings::{MissingIdPolicy, DEFAULT_LISTING_BASE_URL};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("APPSYNC_ENV", "development"))?;
    let log_level = or_default("APPSYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("APPSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("APPSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("APPSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let listing_base_url = or_default("APPSYNC_LISTING_BASE_URL", DEFAULT_LISTING_BASE_URL);
    if !(listing_base_url.starts_with("http://") || listing_base_url.starts_with("https://")) {
        return Err(invalid(
            "APPSYNC_LISTING_BASE_URL",
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    let category = or_default("APPSYNC_CATEGORY", "small_appliance");
    if category.trim().is_empty() {
        return Err(invalid("APPSYNC_CATEGORY", "must not be empty".to_string()));
    }

    let currency = parse_currency(&or_default("APPSYNC_CURRENCY", "EUR"))?;
    let image_dir = PathBuf::from(or_default(
        "APPSYNC_IMAGE_DIR",
        "./storage/public/appliances",
    ));

    let max_pages = parse_u32("APPSYNC_MAX_PAGES", "500")?;
    if max_pages == 0 {
        return Err(invalid("APPSYNC_MAX_PAGES", "must be at least 1".to_string()));
    }

    let missing_id_policy = or_default("APPSYNC_MISSING_ID_POLICY", "skip")
        .parse::<MissingIdPolicy>()
        .map_err(|reason| invalid("APPSYNC_MISSING_ID_POLICY", reason))?;
    let skip_malformed = parse_bool("APPSYNC_SKIP_MALFORMED", "false")?;

    let scraper_request_timeout_secs = parse_u64("APPSYNC_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("APPSYNC_SCRAPER_USER_AGENT", "appsync/0.1 (catalog-sync)");
    let scraper_max_retries = parse_u32("APPSYNC_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("APPSYNC_SCRAPER_RETRY_BACKOFF_BASE_SECS", "2")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        listing_base_url,
        category,
        currency,
        image_dir,
        max_pages,
        missing_id_policy,
        skip_malformed,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "APPSYNC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Currency codes are three ASCII letters; lowercase input is upper-cased.
fn parse_currency(s: &str) -> Result<String, ConfigError> {
    let code = s.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "APPSYNC_CURRENCY".to_string(),
            reason: format!("\"{s}\" is not a three-letter ISO 4217 code"),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
