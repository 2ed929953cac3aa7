use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
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
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected true/false, got '{raw}'"),
        })
    };

    let log_level = or_default("GRIDHARVEST_LOG_LEVEL", "info");
    let stores_path = PathBuf::from(or_default(
        "GRIDHARVEST_STORES_PATH",
        "./config/stores.yaml",
    ));
    let output_dir = PathBuf::from(or_default("GRIDHARVEST_OUTPUT_DIR", "./output"));
    let webdriver_url = or_default("GRIDHARVEST_WEBDRIVER_URL", "http://localhost:9515");
    let headless = parse_flag("GRIDHARVEST_HEADLESS", "true")?;
    let user_agent = or_default("GRIDHARVEST_USER_AGENT", DEFAULT_USER_AGENT);
    let run_timeout_secs = parse_u64("GRIDHARVEST_RUN_TIMEOUT_SECS", "0")?;
    let ready_timeout_secs = parse_u64("GRIDHARVEST_READY_TIMEOUT_SECS", "20")?;

    if url::Url::parse(&webdriver_url).is_err() {
        return Err(ConfigError::InvalidEnvVar {
            var: "GRIDHARVEST_WEBDRIVER_URL".to_string(),
            reason: format!("'{webdriver_url}' is not an absolute URL"),
        });
    }

    Ok(AppConfig {
        log_level,
        stores_path,
        output_dir,
        webdriver_url,
        headless,
        user_agent,
        run_timeout_secs,
        ready_timeout_secs,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
