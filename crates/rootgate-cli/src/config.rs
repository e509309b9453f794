//! Configuration file management for rootgate.
//!
//! Provides a TOML-based config file at `~/.config/rootgate/config.toml`
//! holding the account owner and the registry whitelist. The file is found
//! through the chain: `--config` flag > `ROOTGATE_CONFIG` env var > default
//! path. `ROOTGATE_OWNER` overrides the owner from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use rootgate_core::collaborators::RegistryConfig;
use rootgate_store::Address;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub account: AccountSection,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSection {
    /// Controlling identity of the account.
    pub owner: Address,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the rootgate config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/rootgate` or
/// `~/.config/rootgate`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("rootgate");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("rootgate")
}

/// Return the config file path: `cli_path` > `ROOTGATE_CONFIG` > default.
pub fn config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("ROOTGATE_CONFIG") {
        return PathBuf::from(path);
    }
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone, PartialEq)]
pub struct RootgateConfig {
    pub owner: Address,
    pub registry: RegistryConfig,
}

impl RootgateConfig {
    /// Resolve configuration.
    ///
    /// - Owner: `ROOTGATE_OWNER` env > `account.owner` in the file > error
    /// - Registry: the file's `[registry]` section, or an empty whitelist
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        let path = config_path(cli_path);
        let file_config = if path.exists() {
            Some(load_config(&path)?)
        } else {
            tracing::debug!(path = %path.display(), "no config file");
            None
        };

        let owner = if let Ok(owner) = std::env::var("ROOTGATE_OWNER") {
            owner
                .parse()
                .with_context(|| format!("ROOTGATE_OWNER is not a valid address: {owner:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.account.owner
        } else {
            bail!(
                "account owner not found; set ROOTGATE_OWNER or run `rootgate init` to create a config file"
            );
        };

        Ok(Self {
            owner,
            registry: file_config.map(|cfg| cfg.registry).unwrap_or_default(),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
