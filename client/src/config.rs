//! Layered configuration for the submission client.
//!
//! Three layers with precedence: built-in defaults, then `config.toml` in
//! the survey home directory, then `SURVEY_*` environment variables. A
//! missing config file is not an error, and an unset or placeholder endpoint
//! is the recognized "remote submission disabled" state rather than a
//! failure.

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for ${var}: '{value}' (expected {expected})")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: &'static str,
    },

    #[error("cannot determine home directory")]
    NoHomeDir,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory holding the local buffer, the config file, and exports.
    pub survey_home: PathBuf,
    /// Raw endpoint setting; see [`ClientConfig::endpoint`].
    pub endpoint: Option<String>,
    pub debounce_ms: u64,
    pub heartbeat_secs: u64,
}

impl ClientConfig {
    /// The collection endpoint, if remote submission is enabled. An unset,
    /// empty, or placeholder value (one containing `YOUR_`) disables it.
    pub fn endpoint(&self) -> Option<&str> {
        match &self.endpoint {
            Some(url) if !url.trim().is_empty() && !url.contains("YOUR_") => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

/// On-disk shape of `config.toml`. Unknown keys are tolerated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    endpoint: Option<String>,
    debounce_ms: Option<u64>,
    heartbeat_secs: Option<u64>,
}

/// Builder for layered configuration loading.
pub struct ConfigLoader {
    survey_home: Option<PathBuf>,
    env_prefix: String,
    skip_file: bool,
    skip_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            survey_home: None,
            env_prefix: "SURVEY".to_string(),
            skip_file: false,
            skip_env: false,
        }
    }

    /// Set the survey home directory explicitly. If not set, `$SURVEY_HOME`
    /// is consulted, then `~/.survey`.
    pub fn with_survey_home(mut self, path: PathBuf) -> Self {
        self.survey_home = Some(path);
        self
    }

    /// Override the environment variable prefix. Tests use a unique prefix
    /// so parallel processes cannot observe each other's overrides.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip the config file layer (defaults + env only).
    pub fn skip_file_layer(mut self) -> Self {
        self.skip_file = true;
        self
    }

    /// Skip the environment layer (defaults + file only).
    pub fn skip_env_layer(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load configuration with all enabled layers, default < file < env.
    pub fn load(self) -> Result<ClientConfig, ConfigError> {
        let survey_home = self.resolve_survey_home()?;
        let mut config = ClientConfig {
            survey_home,
            endpoint: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        };

        if !self.skip_file {
            let file = Self::load_from_file(&config.survey_home)?;
            if file.endpoint.is_some() {
                config.endpoint = file.endpoint;
            }
            if let Some(debounce_ms) = file.debounce_ms {
                config.debounce_ms = debounce_ms;
            }
            if let Some(heartbeat_secs) = file.heartbeat_secs {
                config.heartbeat_secs = heartbeat_secs;
            }
        }

        if !self.skip_env {
            Self::apply_env_overrides(&mut config, &self.env_prefix)?;
        }

        Ok(config)
    }

    fn resolve_survey_home(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.survey_home {
            return Ok(path.clone());
        }
        if let Ok(path) = env::var("SURVEY_HOME")
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .map(|home| home.join(".survey"))
            .ok_or(ConfigError::NoHomeDir)
    }

    /// Read `config.toml` from the survey home. A missing file yields the
    /// empty layer, not an error.
    fn load_from_file(survey_home: &Path) -> Result<ConfigFile, ConfigError> {
        let path = survey_home.join("config.toml");
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    fn apply_env_overrides(config: &mut ClientConfig, prefix: &str) -> Result<(), ConfigError> {
        if let Ok(value) = env::var(format!("{prefix}_ENDPOINT")) {
            config.endpoint = Some(value);
        }
        if let Some(value) = read_env_u64(&format!("{prefix}_DEBOUNCE_MS"))? {
            config.debounce_ms = value;
        }
        if let Some(value) = read_env_u64(&format!("{prefix}_HEARTBEAT_SECS"))? {
            config.heartbeat_secs = value;
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env_u64(var: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue {
                var: var.to_string(),
                value,
                expected: "a non-negative integer",
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_apply_without_file_or_env() {
        let dir = tempfile::TempDir::new().unwrap();

        let config = ConfigLoader::new()
            .with_survey_home(dir.path().to_path_buf())
            .skip_env_layer()
            .load()
            .unwrap();

        assert_eq!(None, config.endpoint());
        assert_eq!(DEFAULT_DEBOUNCE_MS, config.debounce_ms);
        assert_eq!(DEFAULT_HEARTBEAT_SECS, config.heartbeat_secs);
    }

    #[test]
    fn file_layer_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "endpoint = \"https://collector.example/submit\"\ndebounce_ms = 500\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_survey_home(dir.path().to_path_buf())
            .skip_env_layer()
            .load()
            .unwrap();

        assert_eq!(Some("https://collector.example/submit"), config.endpoint());
        assert_eq!(500, config.debounce_ms);
        assert_eq!(DEFAULT_HEARTBEAT_SECS, config.heartbeat_secs);
    }

    #[test]
    fn env_layer_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "endpoint = \"https://from-file.example\"\n",
        )
        .unwrap();
        unsafe {
            std::env::set_var("SVTEST_A_ENDPOINT", "https://from-env.example");
            std::env::set_var("SVTEST_A_HEARTBEAT_SECS", "45");
        }

        let config = ConfigLoader::new()
            .with_survey_home(dir.path().to_path_buf())
            .with_env_prefix("SVTEST_A")
            .load()
            .unwrap();

        unsafe {
            std::env::remove_var("SVTEST_A_ENDPOINT");
            std::env::remove_var("SVTEST_A_HEARTBEAT_SECS");
        }

        assert_eq!(Some("https://from-env.example"), config.endpoint());
        assert_eq!(45, config.heartbeat_secs);
    }

    #[test]
    fn placeholder_and_empty_endpoints_are_disabled() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = ConfigLoader::new()
            .with_survey_home(dir.path().to_path_buf())
            .skip_env_layer()
            .load()
            .unwrap();

        config.endpoint = Some("YOUR_COLLECTION_ENDPOINT".to_string());
        assert_eq!(None, config.endpoint());

        config.endpoint = Some("  ".to_string());
        assert_eq!(None, config.endpoint());
    }

    #[test]
    fn invalid_numeric_env_value_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        unsafe {
            std::env::set_var("SVTEST_B_DEBOUNCE_MS", "soon");
        }

        let result = ConfigLoader::new()
            .with_survey_home(dir.path().to_path_buf())
            .with_env_prefix("SVTEST_B")
            .load();

        unsafe {
            std::env::remove_var("SVTEST_B_DEBOUNCE_MS");
        }

        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvValue { .. })
        ));
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "endpoint = [not toml").unwrap();

        let result = ConfigLoader::new()
            .with_survey_home(dir.path().to_path_buf())
            .skip_env_layer()
            .load();

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
