//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `QROSTER_ROOT_FOLDER` environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is never fatal: the service logs a warning and starts
//! with compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application directory name used under the OS config/data directories
pub const APP_DIR_NAME: &str = "qroster";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "QROSTER_ROOT_FOLDER";

/// Database filename inside the root folder
pub const DATABASE_FILE_NAME: &str = "qroster.db";

/// QR image directory name inside the root folder (also the URL prefix)
pub const QR_CODES_DIR_NAME: &str = "qr_codes";

/// Contents of `config.toml`
///
/// Every field is optional; absent values fall back to CLI/env/defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Base of the public detail-page URL encoded into every QR code
    pub public_base_url: Option<String>,
    /// Optional directory of prebuilt dashboard assets served as fallback
    pub static_assets: Option<PathBuf>,
    pub qr: QrConfig,
    pub logging: LoggingConfig,
}

/// QR rendering settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QrConfig {
    /// Output image width and height in pixels
    pub size: u32,
    /// Quiet zone around the code, in modules
    pub margin: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self { size: 256, margin: 2 }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the explicitly requested config file, or the per-user default one
    ///
    /// An explicit path that does not exist is an error. A missing default
    /// file yields `TomlConfig::default()`.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                debug!("Loading config file {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "No config file at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Per-user config file location (`<config_dir>/qroster/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Values compiled into the binary, used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind: String,
    pub port: u16,
    pub public_base_url: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./qroster_data"));

        Self {
            root_folder,
            bind: "127.0.0.1".to_string(),
            port: 5000,
            public_base_url: "http://localhost:5000/details".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder from the loaded TOML config
    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout on first run
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder and the QR image directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.qr_codes_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn qr_codes_path(&self) -> PathBuf {
        self.root_folder.join(QR_CODES_DIR_NAME)
    }
}
