//! Server configuration
//!
//! Merges command-line/environment values over the TOML config, falling back
//! to compiled defaults.

use std::path::PathBuf;

use qroster_common::config::{CompiledDefaults, QrConfig, RootFolderResolver, TomlConfig};

/// Values given on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub public_base_url: Option<String>,
    pub static_assets: Option<PathBuf>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub bind: String,
    pub port: u16,
    pub public_base_url: String,
    pub static_assets: Option<PathBuf>,
    pub qr: QrConfig,
}

impl ServerConfig {
    pub fn resolve(cli: CliOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = RootFolderResolver::new()
            .with_cli_arg(cli.root_folder)
            .with_toml(toml)
            .resolve();

        Self {
            root_folder,
            bind: cli.bind.or_else(|| toml.bind.clone()).unwrap_or(defaults.bind),
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            public_base_url: cli
                .public_base_url
                .or_else(|| toml.public_base_url.clone())
                .unwrap_or(defaults.public_base_url),
            static_assets: cli.static_assets.or_else(|| toml.static_assets.clone()),
            qr: toml.qr.clone(),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_toml() {
        let toml = TomlConfig {
            bind: Some("0.0.0.0".into()),
            port: Some(8080),
            public_base_url: Some("https://toml.example/d".into()),
            ..Default::default()
        };
        let cli = CliOverrides {
            root_folder: Some(PathBuf::from("/tmp/qroster-cli")),
            port: Some(9090),
            ..Default::default()
        };

        let config = ServerConfig::resolve(cli, &toml);

        assert_eq!(config.root_folder, PathBuf::from("/tmp/qroster-cli"));
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.public_base_url, "https://toml.example/d");
        assert_eq!(config.listen_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_defaults_when_unconfigured() {
        let config = ServerConfig::resolve(
            CliOverrides {
                root_folder: Some(PathBuf::from("/tmp/qroster-default")),
                ..Default::default()
            },
            &TomlConfig::default(),
        );

        assert_eq!(config.port, 5000);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.qr, QrConfig::default());
        assert!(config.static_assets.is_none());
    }
}
