use std::path::PathBuf;

use thiserror::Error;

use crate::app_config::{AppConfig, ProxyCredentials};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

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

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let preview_only = is_truthy(&or_default("PREVIEW_ONLY", ""));

    // Postgres credentials arrive as discrete PG* variables and are
    // assembled into a URL here. All of them are required unless the run
    // is preview-only.
    let database_url = match build_database_url(&lookup) {
        Ok(url) => Some(url),
        Err(_) if preview_only => None,
        Err(e) => return Err(e),
    };

    let proxy = build_proxy(&lookup)?;
    let extra_proxies = parse_extra_proxies(&or_default("AISLE_EXTRA_PROXIES", ""))?;

    let render_api_key = lookup("RENDER_API_KEY").ok().filter(|s| !s.is_empty());
    let render_daily_quota = parse_u32("AISLE_RENDER_DAILY_QUOTA", "950")?;

    let ocado_headful = is_truthy(&or_default("AISLE_OCADO_HEADFUL", ""));
    let log_level = or_default("AISLE_LOG_LEVEL", "info");
    let preview_path = PathBuf::from(or_default("AISLE_PREVIEW_PATH", "./aisle_preview.csv"));

    let max_concurrent_rows = parse_usize("AISLE_MAX_CONCURRENT_ROWS", "1")?;
    let request_timeout_secs = parse_u64("AISLE_REQUEST_TIMEOUT_SECS", "15")?;
    let min_body_bytes = parse_usize("AISLE_MIN_BODY_BYTES", "500")?;

    Ok(AppConfig {
        database_url,
        preview_only,
        preview_path,
        log_level,
        proxy,
        extra_proxies,
        render_api_key,
        render_daily_quota,
        ocado_headful,
        max_concurrent_rows,
        request_timeout_secs,
        min_body_bytes,
    })
}

fn build_database_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let host = require("PGHOST")?;
    let port = lookup("PGPORT").unwrap_or_else(|_| "5432".to_string());
    port.parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "PGPORT".to_string(),
            reason: e.to_string(),
        })?;
    let database = require("PGDATABASE")?;
    let user = require("PGUSER")?;
    let password = require("PGPASSWORD")?;

    Ok(format!(
        "postgres://{user}:{password}@{host}:{port}/{database}"
    ))
}

fn build_proxy<F>(lookup: &F) -> Result<Option<ProxyCredentials>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let host = match lookup("BRIGHT_DATA_HOST") {
        Ok(h) if !h.is_empty() => h,
        _ => return Ok(None),
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let port_raw = require("BRIGHT_DATA_PORT")?;
    let port = port_raw
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "BRIGHT_DATA_PORT".to_string(),
            reason: e.to_string(),
        })?;
    let username = require("BRIGHT_DATA_USER")?;
    let password = require("BRIGHT_DATA_PASS")?;

    Ok(Some(ProxyCredentials {
        host,
        port,
        username,
        password,
    }))
}

/// Parse `AISLE_EXTRA_PROXIES`: comma-separated `host:port:user:pass`
/// entries. Empty input yields an empty list.
fn parse_extra_proxies(raw: &str) -> Result<Vec<ProxyCredentials>, ConfigError> {
    let mut proxies = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parts: Vec<&str> = entry.splitn(4, ':').collect();
        if parts.len() != 4 {
            return Err(ConfigError::InvalidEnvVar {
                var: "AISLE_EXTRA_PROXIES".to_string(),
                reason: format!("expected host:port:user:pass, got \"{entry}\""),
            });
        }
        let port = parts[1]
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "AISLE_EXTRA_PROXIES".to_string(),
                reason: format!("bad port in \"{entry}\": {e}"),
            })?;
        proxies.push(ProxyCredentials {
            host: parts[0].to_string(),
            port,
            username: parts[2].to_string(),
            password: parts[3].to_string(),
        });
    }
    Ok(proxies)
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
