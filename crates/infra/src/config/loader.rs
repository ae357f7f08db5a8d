//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when `GRAPHKIT_CLIENT_ID` is set (parse errors are returned)
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//!
//! ## Environment Variables
//! - `GRAPHKIT_CLIENT_ID` (required): Azure AD application id
//! - `GRAPHKIT_CLIENT_SECRET`: application secret
//! - `GRAPHKIT_REDIRECT_URI`: OAuth redirect URI
//! - `GRAPHKIT_TENANT`: tenant segment of the authority (`common`)
//! - `GRAPHKIT_AUTHORITY_HOST`: identity platform host override
//! - `GRAPHKIT_GRAPH_BASE_URL`: Graph REST root
//! - `GRAPHKIT_TOKEN_DIR`: directory of the token file
//! - `GRAPHKIT_VAULT_BACKEND`: store tokens in the keychain (true/false)
//! - `GRAPHKIT_VAULT_SECRET`: keychain entry name
//! - `GRAPHKIT_HTTP_TIMEOUT_SECS`: per-request timeout
//!
//! ## File Locations
//! `graphkit.toml`, `graphkit.json`, `config.toml` and `config.json` in the
//! working directory, its two parents, then the executable's directory.

use std::path::{Path, PathBuf};

use graphkit_domain::{Config, GraphError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["graphkit.toml", "graphkit.json", "config.toml", "config.json"];

/// Load configuration, preferring the environment over files.
///
/// The environment is used whenever `GRAPHKIT_CLIENT_ID` is set; an invalid
/// value in it is an error rather than a reason to fall back to files.
///
/// # Errors
/// Returns `GraphError::Config` when an environment value does not parse, or
/// when no environment configuration and no config file are found.
pub fn load() -> Result<Config> {
    match load_env_if_present()? {
        Some(config) => Ok(config),
        None => load_from_file(None),
    }
}

/// Like [`load`], but falls back to [`Config::default`] when neither source
/// exists. Errors in a source that does exist are still returned.
///
/// # Errors
/// Returns `GraphError::Config` when the environment or the probed file is
/// invalid.
pub fn load_or_default() -> Result<Config> {
    if let Some(config) = load_env_if_present()? {
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("no configuration found, using defaults");
            Ok(Config::default())
        }
    }
}

fn load_env_if_present() -> Result<Option<Config>> {
    if env_opt("GRAPHKIT_CLIENT_ID").is_none() {
        tracing::debug!("GRAPHKIT_CLIENT_ID not set, trying config file");
        return Ok(None);
    }

    let config = load_from_env()?;
    tracing::info!("configuration loaded from environment variables");
    Ok(Some(config))
}

/// Load configuration from `GRAPHKIT_*` variables. Unset optional
/// variables keep their defaults.
///
/// # Errors
/// Returns `GraphError::Config` if `GRAPHKIT_CLIENT_ID` is missing or a
/// value cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.auth.client_id = Some(env_var("GRAPHKIT_CLIENT_ID")?);
    config.auth.client_secret = env_opt("GRAPHKIT_CLIENT_SECRET");
    if let Some(uri) = env_opt("GRAPHKIT_REDIRECT_URI") {
        config.auth.redirect_uri = uri;
    }
    if let Some(tenant) = env_opt("GRAPHKIT_TENANT") {
        config.auth.tenant = tenant;
    }
    config.auth.authority_host = env_opt("GRAPHKIT_AUTHORITY_HOST");

    if let Some(base_url) = env_opt("GRAPHKIT_GRAPH_BASE_URL") {
        config.graph.base_url = base_url;
    }
    if let Some(timeout) = env_opt("GRAPHKIT_HTTP_TIMEOUT_SECS") {
        config.graph.timeout_secs = timeout
            .parse()
            .map_err(|e| GraphError::Config(format!("Invalid HTTP timeout '{timeout}': {e}")))?;
    }

    if let Some(dir) = env_opt("GRAPHKIT_TOKEN_DIR") {
        config.storage.file_backend_path = PathBuf::from(dir);
    }
    config.storage.vault_backend = env_bool("GRAPHKIT_VAULT_BACKEND", false);
    config.storage.vault_secret = env_opt("GRAPHKIT_VAULT_SECRET");

    Ok(config)
}

/// Load configuration from `path`, or from the first probed location when
/// `path` is `None`. Format follows the file extension.
///
/// # Errors
/// Returns `GraphError::Config` if no file is found, it cannot be read, or
/// it does not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) if p.exists() => p,
        Some(p) => {
            return Err(GraphError::Config(format!("Config file not found: {}", p.display())))
        }
        None => probe_config_paths().ok_or_else(|| {
            GraphError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GraphError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GraphError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GraphError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GraphError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    probe_in(&dirs)
}

fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key)
        .ok_or_else(|| GraphError::Config(format!("Missing required environment variable: {key}")))
}

/// Non-empty value of `key`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
