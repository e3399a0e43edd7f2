//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RevstatsConfig;
use super::secret::secret_string;
use crate::domain::errors::RevstatsError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`RevstatsConfig`]
/// 4. Applies environment variable overrides (`REVSTATS_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`RevstatsError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use revstats::config::loader::load_config;
///
/// let config = load_config("revstats.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RevstatsConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RevstatsError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RevstatsError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;

    tracing::debug!(
        path = %path.display(),
        gateway_target = ?config.gateway_target,
        batch_size = config.extract.batch_size,
        "Configuration loaded"
    );

    Ok(config)
}

/// Parses and validates configuration from TOML text
///
/// Same pipeline as [`load_config`] without the file access.
pub fn parse_config(contents: &str) -> Result<RevstatsConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: RevstatsConfig = toml::from_str(&contents)
        .map_err(|e| RevstatsError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        RevstatsError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RevstatsError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RevstatsError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `REVSTATS_` prefix
///
/// Variables follow the pattern `REVSTATS_<SECTION>_<KEY>`, for example
/// `REVSTATS_EXTRACT_BATCH_SIZE`. Unparsable numeric values are ignored.
fn apply_env_overrides(config: &mut RevstatsConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("REVSTATS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("REVSTATS_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Gateway overrides (only for sections present in the file)
    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("REVSTATS_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("REVSTATS_POSTGRESQL_STATEMENT_TIMEOUT_SECONDS") {
            if let Ok(secs) = val.parse() {
                pg.statement_timeout_seconds = secs;
            }
        }
    }
    if let Some(ref mut http) = config.http {
        if let Ok(val) = std::env::var("REVSTATS_HTTP_BASE_URL") {
            http.base_url = val;
        }
        if let Ok(val) = std::env::var("REVSTATS_HTTP_TOKEN") {
            http.token = Some(secret_string(val));
        }
    }

    // Extract overrides
    if let Ok(val) = std::env::var("REVSTATS_EXTRACT_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.extract.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("REVSTATS_EXTRACT_DEFAULT_LANG") {
        config.extract.default_lang = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("REVSTATS_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("REVSTATS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
