//! Configuration loader
//!
//! ## Loading Strategy
//! 1. A `.env` file in the working directory is applied to the process
//!    environment when present
//! 2. If any `ORDERBRIDGE_*` variable is set, configuration comes from the
//!    environment (unset variables keep their defaults)
//! 3. Otherwise the first config file found by [`probe_config_paths`] is
//!    parsed (JSON or TOML, detected by extension)
//! 4. With neither, the built-in defaults are used
//!
//! ## Environment Variables
//! - `ORDERBRIDGE_QUEUE_CANONICAL_ORDERS`: canonical order queue name
//! - `ORDERBRIDGE_QUEUE_INVOICE_REQUESTS`: invoice request queue name
//! - `ORDERBRIDGE_QUEUE_INVOICE_RESPONSES`: invoice response queue name
//! - `ORDERBRIDGE_QUEUE_DURABLE`: declare queues durable (true/false)
//! - `ORDERBRIDGE_SYNC_PAGE_SIZE`: default sync page size
//! - `ORDERBRIDGE_SYNC_INTER_PAGE_DELAY_MS`: delay between sync pages
//! - `ORDERBRIDGE_INVOICING_CONSISTENCY_DELAY_MS`: wait before document lookup
//! - `ORDERBRIDGE_INVOICING_LOOKUP_AFTER_CREATE`: enable document lookup
//! - `ORDERBRIDGE_TOKEN_REFRESH_MARGIN_SECS`: proactive token refresh margin
//! - `ORDERBRIDGE_LOG_LEVEL`: `EnvFilter` directive
//! - `ORDERBRIDGE_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! `orderbridge.{toml,json}` then `config.{toml,json}`, looked up in the
//! working directory, its parent and the executable's directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use orderbridge_domain::{Config, OrderBridgeError, Result};

const ENV_PREFIX: &str = "ORDERBRIDGE_";

/// Resolve the process configuration: environment first, then a config
/// file, then defaults.
///
/// # Errors
/// Returns `OrderBridgeError::Config` if an environment variable or the
/// probed config file holds an invalid value.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "applied .env file");
    }

    if has_prefixed_vars(std::env::vars().map(|(key, _)| key)) {
        let config = load_from_env()?;
        tracing::info!("configuration loaded from ORDERBRIDGE_* variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("no configuration source found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Configuration from `ORDERBRIDGE_*` variables; unset ones keep their
/// defaults.
///
/// # Errors
/// Returns `OrderBridgeError::Config` when a variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from an arbitrary key lookup, starting from the
/// defaults.
fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        lookup(&format!("{ENV_PREFIX}{suffix}")).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    let mut config = Config::default();

    if let Some(name) = var("QUEUE_CANONICAL_ORDERS") {
        config.queues.canonical_orders = name;
    }
    if let Some(name) = var("QUEUE_INVOICE_REQUESTS") {
        config.queues.invoice_requests = name;
    }
    if let Some(name) = var("QUEUE_INVOICE_RESPONSES") {
        config.queues.invoice_responses = name;
    }
    if let Some(raw) = var("QUEUE_DURABLE") {
        config.queues.durable = parse_bool("QUEUE_DURABLE", &raw)?;
    }
    if let Some(raw) = var("SYNC_PAGE_SIZE") {
        config.sync.default_page_size = parse_number("SYNC_PAGE_SIZE", &raw)?;
    }
    if let Some(raw) = var("SYNC_INTER_PAGE_DELAY_MS") {
        config.sync.inter_page_delay_ms = parse_number("SYNC_INTER_PAGE_DELAY_MS", &raw)?;
    }
    if let Some(raw) = var("INVOICING_CONSISTENCY_DELAY_MS") {
        config.invoicing.consistency_delay_ms =
            parse_number("INVOICING_CONSISTENCY_DELAY_MS", &raw)?;
    }
    if let Some(raw) = var("INVOICING_LOOKUP_AFTER_CREATE") {
        config.invoicing.lookup_after_create = parse_bool("INVOICING_LOOKUP_AFTER_CREATE", &raw)?;
    }
    if let Some(raw) = var("TOKEN_REFRESH_MARGIN_SECS") {
        config.tokens.refresh_margin_secs = parse_number("TOKEN_REFRESH_MARGIN_SECS", &raw)?;
    }
    if let Some(level) = var("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(raw) = var("LOG_JSON") {
        config.logging.json = parse_bool("LOG_JSON", &raw)?;
    }

    Ok(config)
}

/// Read one config file. With `path` set to `None` the first file found by
/// [`probe_config_paths`] is used.
///
/// # Errors
/// `OrderBridgeError::Config` when the file is missing or unreadable, has an
/// unknown extension, or does not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) if path.is_file() => path,
        Some(path) => {
            return Err(OrderBridgeError::Config(format!(
                "config file {} does not exist",
                path.display()
            )))
        }
        None => probe_config_paths().ok_or_else(|| {
            OrderBridgeError::Config("no config.* or orderbridge.* file to load".into())
        })?,
    };

    let format = ConfigFormat::from_path(&path)?;
    tracing::info!(path = %path.display(), ?format, "loading configuration file");
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        OrderBridgeError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    format.parse(&contents)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            other => Err(OrderBridgeError::Config(format!(
                "unsupported config extension {:?} (expected .toml or .json)",
                other.unwrap_or_default()
            ))),
        }
    }

    fn parse(self, contents: &str) -> Result<Config> {
        match self {
            Self::Toml => toml::from_str(contents)
                .map_err(|e| OrderBridgeError::Config(format!("invalid TOML config: {e}"))),
            Self::Json => serde_json::from_str(contents)
                .map_err(|e| OrderBridgeError::Config(format!("invalid JSON config: {e}"))),
        }
    }
}

/// First existing config file: the working directory, then its parent, then
/// the directory holding the executable.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok();
    let parent = cwd.as_deref().and_then(Path::parent).map(Path::to_path_buf);
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    [cwd, parent, exe_dir]
        .into_iter()
        .flatten()
        .flat_map(|dir| candidate_files(&dir))
        .find(|path| path.is_file())
}

fn candidate_files(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("orderbridge.toml"),
        dir.join("orderbridge.json"),
        dir.join("config.toml"),
        dir.join("config.json"),
    ]
}

fn has_prefixed_vars(mut keys: impl Iterator<Item = String>) -> bool {
    keys.any(|key| key.starts_with(ENV_PREFIX))
}

/// `1`/`true`/`yes`/`on` or `0`/`false`/`no`/`off`, any case.
fn parse_bool(suffix: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(OrderBridgeError::Config(format!(
            "Invalid boolean for {ENV_PREFIX}{suffix}: {other}"
        ))),
    }
}

fn parse_number<T>(suffix: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        OrderBridgeError::Config(format!("Invalid value for {ENV_PREFIX}{suffix}: {e}"))
    })
}
