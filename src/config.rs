//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/natstat/natstat.toml`
//! 3. Local config: `<dir>/.natstat.toml` (normally the working directory)
//! 4. Environment variables: `NATSTAT_*` prefix
//!
//! Command-line flags are applied on top by the CLI.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

pub const DEFAULT_BASE_URL: &str = "https://api3.natst.at";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Output formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Field delimiter for tabular output
    pub delimiter: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub delimiter: Option<char>,
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub output: RawOutputConfig,
}

/// Unified configuration for natstat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// API key sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Root URL of the statistics API
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub output: OutputConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output: OutputConfig::default(),
        }
    }
}

/// Get the XDG config directory for natstat.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "natstat").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("natstat.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".natstat.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `local_dir` is searched for `.natstat.toml`; pass `None` to skip the
    /// local layer.
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Load from one explicit file on top of defaults, without env overrides.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            api_key: overlay.api_key.clone().or_else(|| self.api_key.clone()),
            base_url: overlay
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            timeout_secs: overlay.timeout_secs.unwrap_or(self.timeout_secs),
            output: OutputConfig {
                delimiter: overlay.output.delimiter.unwrap_or(self.output.delimiter),
            },
        }
    }

    /// Apply NATSTAT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("NATSTAT").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("api_key") {
            settings.api_key = Some(val);
        }
        if let Ok(val) = config.get_string("base_url") {
            settings.base_url = val;
        }
        if let Ok(val) = config.get_string("timeout_secs") {
            settings.timeout_secs = val.parse().map_err(|_| ApplicationError::Config {
                message: format!("NATSTAT_TIMEOUT_SECS: '{val}' is not a number of seconds"),
            })?;
        }
        if let Ok(val) = config.get_string("output.delimiter") {
            settings.output.delimiter = parse_delimiter(&val)?;
        }

        Ok(settings)
    }

    /// Reject settings no request could be made with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.base_url.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "base_url must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ApplicationError::Config {
                message: "timeout_secs must be at least 1".to_string(),
            });
        }
        self.delimiter_byte().map(|_| ())
    }

    /// The delimiter as the single byte the CSV writer expects.
    pub fn delimiter_byte(&self) -> Result<u8, ApplicationError> {
        let c = self.output.delimiter;
        if c.is_ascii() && c != '\n' && c != '\r' && c != '"' {
            Ok(c as u8)
        } else {
            Err(ApplicationError::Config {
                message: format!("delimiter {c:?} must be a single ASCII character"),
            })
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Effective configuration for display, with the API key masked.
    pub fn to_display_toml(&self) -> Result<String, ApplicationError> {
        Settings {
            api_key: self.api_key.as_deref().map(mask_secret),
            ..self.clone()
        }
        .to_toml()
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# natstat configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/natstat/natstat.toml
#   Local:  ./.natstat.toml
#   Env:    NATSTAT_* environment variables (NATSTAT_OUTPUT__DELIMITER for nested keys)
#   Flags:  --api-key, --base-url, --delimiter

# API key sent as the `key` query parameter
# api_key = "..."

# Root URL of the statistics API
# base_url = "https://api3.natst.at"

# Per-request timeout in seconds
# timeout_secs = 30

[output]
# Field delimiter for tabular output
# delimiter = ","
"#
        .to_string()
    }
}

/// Parse a delimiter given as text; exactly one character.
pub fn parse_delimiter(raw: &str) -> Result<char, ApplicationError> {
    let unescaped = if raw == "\\t" { "\t" } else { raw };
    let mut chars = unescaped.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ApplicationError::Config {
            message: format!("delimiter '{raw}' must be exactly one character"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// All but the last four characters starred; short secrets are starred entirely.
fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "*".repeat(count.max(4));
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}
