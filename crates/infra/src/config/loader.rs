//! Configuration loader
//!
//! Loads client configuration from a file and environment variables.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment when one exists
//! 2. Reads the first config file found by [`probe_config_paths`], or starts
//!    from defaults when there is none
//! 3. Applies environment variable overrides on top
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SITEGPT_API_BASE_URL`: Base URL request paths are appended to
//! - `SITEGPT_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `SITEGPT_API_MAX_ATTEMPTS`: Transport attempts per request
//! - `SITEGPT_REFRESH_PATH`: Refresh endpoint path
//! - `SITEGPT_REFRESH_TIMEOUT_SECS`: Upper bound on one refresh call
//! - `SITEGPT_LOGIN_ROUTE`: Route the navigator is sent to on logout
//! - `SITEGPT_CREDENTIAL_BACKEND`: `memory` or `keychain`
//! - `SITEGPT_KEYCHAIN_SERVICE`: Keychain service name
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./sitegpt.toml`, `./sitegpt.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sitegpt_domain::{Config, CredentialBackend, Result, SiteGptError};

const CONFIG_FILE_NAMES: [&str; 4] = ["sitegpt.toml", "sitegpt.json", "config.toml", "config.json"];

/// Load configuration with file fallback and environment overrides
///
/// # Errors
/// Returns `SiteGptError::Config` if:
/// - A probed config file cannot be read or parsed
/// - An environment override has an invalid value
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }

    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    tracing::info!(base_url = %config.api.base_url, "Configuration loaded");
    Ok(config)
}

/// Load configuration from defaults and environment variables only
///
/// # Errors
/// Returns `SiteGptError::Config` if a variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Overwrite fields of `config` with any `SITEGPT_*` variables that are set
///
/// # Errors
/// Returns `SiteGptError::Config` if a variable has an invalid value.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(base_url) = env_opt("SITEGPT_API_BASE_URL") {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = env_parse::<u64>("SITEGPT_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse::<usize>("SITEGPT_API_MAX_ATTEMPTS")? {
        config.api.max_attempts = attempts.max(1);
    }
    if let Some(path) = env_opt("SITEGPT_REFRESH_PATH") {
        config.session.refresh_path = path;
    }
    if let Some(timeout) = env_parse::<u64>("SITEGPT_REFRESH_TIMEOUT_SECS")? {
        config.session.refresh_timeout_secs = timeout;
    }
    if let Some(route) = env_opt("SITEGPT_LOGIN_ROUTE") {
        config.session.login_route = route;
    }
    if let Some(backend) = env_opt("SITEGPT_CREDENTIAL_BACKEND") {
        config.session.credential_backend =
            CredentialBackend::from_str(&backend).map_err(SiteGptError::Config)?;
    }
    if let Some(service) = env_opt("SITEGPT_KEYCHAIN_SERVICE") {
        config.session.keychain_service = service;
    }
    Ok(())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SiteGptError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SiteGptError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SiteGptError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SiteGptError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SiteGptError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SiteGptError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SiteGptError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an environment variable if it is set
///
/// # Errors
/// Returns `SiteGptError::Config` if the value does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| SiteGptError::Config(format!("Invalid value for {key} ({raw}): {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 8] = [
        "SITEGPT_API_BASE_URL",
        "SITEGPT_API_TIMEOUT_SECS",
        "SITEGPT_API_MAX_ATTEMPTS",
        "SITEGPT_REFRESH_PATH",
        "SITEGPT_REFRESH_TIMEOUT_SECS",
        "SITEGPT_LOGIN_ROUTE",
        "SITEGPT_CREDENTIAL_BACKEND",
        "SITEGPT_KEYCHAIN_SERVICE",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_temp(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_load_from_env_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let config = load_from_env().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SITEGPT_API_BASE_URL", "https://api.example.com/v1");
        std::env::set_var("SITEGPT_API_TIMEOUT_SECS", "15");
        std::env::set_var("SITEGPT_API_MAX_ATTEMPTS", "3");
        std::env::set_var("SITEGPT_REFRESH_PATH", "/session/refresh");
        std::env::set_var("SITEGPT_REFRESH_TIMEOUT_SECS", "4");
        std::env::set_var("SITEGPT_LOGIN_ROUTE", "/signin");
        std::env::set_var("SITEGPT_CREDENTIAL_BACKEND", "Keychain");
        std::env::set_var("SITEGPT_KEYCHAIN_SERVICE", "SiteGPT-Test");

        let result = load_from_env();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/v1");
        assert_eq!(config.api.timeout(), Duration::from_secs(15));
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.session.refresh_path, "/session/refresh");
        assert_eq!(config.session.refresh_timeout(), Duration::from_secs(4));
        assert_eq!(config.session.login_route, "/signin");
        assert_eq!(config.session.credential_backend, CredentialBackend::Keychain);
        assert_eq!(config.session.keychain_service, "SiteGPT-Test");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SITEGPT_REFRESH_TIMEOUT_SECS", "soon");
        let result = load_from_env();
        clear_env();

        match result {
            Err(SiteGptError::Config(msg)) => assert!(msg.contains("SITEGPT_REFRESH_TIMEOUT_SECS")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_env_unknown_backend() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SITEGPT_CREDENTIAL_BACKEND", "cookie-jar");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(SiteGptError::Config(_))));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let path = write_temp(
            r#"
[api]
base_url = "https://from-file.example.com"
timeout_secs = 12
"#,
            "toml",
        );
        let mut config = load_from_file(Some(path.clone())).unwrap();

        std::env::set_var("SITEGPT_API_BASE_URL", "https://from-env.example.com");
        let result = apply_env_overrides(&mut config);
        clear_env();
        result.unwrap();

        assert_eq!(config.api.base_url, "https://from-env.example.com");
        assert_eq!(config.api.timeout_secs, 12);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = write_temp(
            r#"{
                "api": { "base_url": "https://json.example.com/api/v1", "max_attempts": 2 },
                "session": { "refresh_timeout_secs": 3 }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.api.base_url, "https://json.example.com/api/v1");
        assert_eq!(config.api.max_attempts, 2);
        assert_eq!(config.session.refresh_timeout_secs, 3);
        assert_eq!(config.session.refresh_path, "/auth/refresh");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/sitegpt.toml")));
        assert!(matches!(result, Err(SiteGptError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = write_temp(r#"{ "this is": "not valid json" "#, "json");

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_extension() {
        let result = parse_config("base_url: x", Path::new("config.yaml"));
        assert!(matches!(result, Err(SiteGptError::Config(msg)) if msg.contains("yaml")));
    }
}
