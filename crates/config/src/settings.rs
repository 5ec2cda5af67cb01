// Application settings
// Loaded from ~/.config/griya/settings.toml

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use griya_core::FormProfile;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    /// File exists but could not be read or written.
    Io { path: PathBuf, message: String },
    /// TOML syntax or type error.
    Parse { path: PathBuf, message: String },
    /// Parsed, but a value is out of bounds.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot access {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "cannot parse {}: {message}", path.display()),
            Self::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Prediction server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address (localhost by default)
    pub bind: String,

    /// Connections beyond this are refused
    pub max_connections: usize,

    /// Longest accepted request line, in bytes
    pub max_message_bytes: usize,
}

/// Request lines are buffered whole, so keep them well below memory limits.
pub const MAX_MESSAGE_BYTES_CEILING: usize = 16 * 1024 * 1024;

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7878".to_string(),
            max_connections: 32,
            max_message_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Trained model artifact, read once at startup
    pub model_path: PathBuf,

    /// Which fields the form collects
    pub profile: FormProfile,

    /// Require encoded columns to equal the model schema exactly
    pub strict_schema: bool,

    /// Reject submissions whose building size exceeds the land size
    pub validate_sizes: bool,

    /// Prefix for displayed prices
    pub currency_prefix: String,

    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("full_model.json"),
            profile: FormProfile::Adaptive,
            strict_schema: false,
            validate_sizes: false,
            currency_prefix: "Rp".to_string(),
            server: ServerSettings::default(),
        }
    }
}

const DEFAULT_FILE: &str = r#"# Griya settings

# Trained model artifact (JSON), read once at startup.
# Overridden by --model or GRIYA_MODEL.
model_path = "full_model.json"

# Form profile: "adaptive" (7 fields) or "full" (adds carports, building age, garages)
profile = "adaptive"

# Require the encoded input to carry exactly the model's columns
strict_schema = false

# Reject submissions where building size exceeds land size
validate_sizes = false

currency_prefix = "Rp"

[server]
bind = "127.0.0.1:7878"
max_connections = 32
max_message_bytes = 65536
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("griya")
            .join("settings.toml")
    }

    /// Load from the default location. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse { path: path.to_path_buf(), message },
            other => other,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("model_path is empty".into()));
        }
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.bind \"{}\" is not a socket address",
                self.server.bind
            )));
        }
        if self.server.max_connections == 0 {
            return Err(ConfigError::Invalid("server.max_connections must be at least 1".into()));
        }
        if self.server.max_message_bytes < 256 {
            return Err(ConfigError::Invalid("server.max_message_bytes must be at least 256".into()));
        }
        if self.server.max_message_bytes > MAX_MESSAGE_BYTES_CEILING {
            return Err(ConfigError::Invalid(format!(
                "server.max_message_bytes must be at most {MAX_MESSAGE_BYTES_CEILING}"
            )));
        }
        Ok(())
    }

    /// Serialize the effective settings as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Write the commented default file. Refuses to overwrite.
    pub fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io { path: path.to_path_buf(), message: e.to_string() };
        if path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                message: "file already exists".into(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, DEFAULT_FILE).map_err(io_err)
    }
}
