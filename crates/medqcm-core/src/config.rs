//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/medqcm/config.toml)
//! 3. Environment variables
//!
//! Environment variables take precedence over config file values. The API
//! credential resolves from `MEDQCM_API_KEY`, then `GEMINI_API_KEY`, then
//! the config file; its absence is a valid state (generation disabled),
//! never a startup error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "MEDQCM";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credential for the generation service (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Generation model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// How many questions one generation request asks for
    #[serde(default = "default_generate_count")]
    pub generate_count: usize,

    /// Log file for TUI mode (optional)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            generate_count: default_generate_count(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // MEDQCM_API_KEY wins over GEMINI_API_KEY; empty values are ignored
        if let Some(key) = non_empty_env(&format!("{}_API_KEY", ENV_PREFIX))
            .or_else(|| non_empty_env("GEMINI_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(model) = non_empty_env(&format!("{}_MODEL", ENV_PREFIX)) {
            self.model = model;
        }
    }

    /// Whether a generation credential is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Get the config file path
    ///
    /// Can be overridden with the MEDQCM_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medqcm")
            .join("config.toml")
    }

    /// Log file path for TUI mode
    pub fn log_file_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("medqcm-debug.log"))
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_generate_count() -> usize {
    3
}

/// Read an environment variable, treating empty values as unset
fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &["MEDQCM_API_KEY", "GEMINI_API_KEY", "MEDQCM_MODEL"];

    #[test]
    fn test_default_config() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(!config.has_api_key());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.generate_count, 3);
    }

    #[test]
    fn test_env_api_key_precedence() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("GEMINI_API_KEY", "gemini-key");
        config.apply_env_overrides();
        assert_eq!(config.api_key.as_deref(), Some("gemini-key"));

        // MEDQCM_API_KEY wins over GEMINI_API_KEY
        env::set_var("MEDQCM_API_KEY", "medqcm-key");
        config.apply_env_overrides();
        assert_eq!(config.api_key.as_deref(), Some("medqcm-key"));
    }

    #[test]
    fn test_empty_env_key_is_ignored() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::default()
        };

        env::set_var("MEDQCM_API_KEY", "");
        config.apply_env_overrides();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_env_model_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("MEDQCM_MODEL", "gemini-2.5-pro");
        config.apply_env_overrides();
        assert_eq!(config.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            api_key = "file-key"
            model = "gemini-2.0-flash"
            generate_count = 5
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.generate_count, 5);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(config.api_key.is_none());
        assert_eq!(config.generate_count, 3);
    }

    #[test]
    fn test_load_from_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = \"abc\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert!(config.has_api_key());
    }

    #[test]
    fn test_serialization_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            api_key: Some("k".to_string()),
            model: "gemini-2.5-flash".to_string(),
            generate_count: 4,
            log_file: Some(PathBuf::from("/tmp/medqcm.log")),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.api_key, config.api_key);
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.generate_count, config.generate_count);
        assert_eq!(parsed.log_file, config.log_file);
    }
}
