//! Server configuration: TOML file + CLI overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use wsbridge_core::{BridgeError, BridgeResult};

/// Top-level config file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default = "default_reply_path_prefix")]
    pub reply_path_prefix: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            ws_path: default_ws_path(),
            backend_url: None,
            reply_path_prefix: default_reply_path_prefix(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_ws_path() -> String {
    "/ws".to_string()
}
fn default_reply_path_prefix() -> String {
    "/reply".to_string()
}

/// Resolved server configuration (CLI overrides applied, paths normalized).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub ws_path: String,
    pub backend_url: String,
    pub reply_path_prefix: String,
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    ///
    /// `backend_url` has no sensible default and must come from either
    /// source.
    pub fn load(
        config_path: Option<&Path>,
        cli_listen_addr: Option<String>,
        cli_ws_path: Option<String>,
        cli_backend_url: Option<String>,
        cli_reply_path_prefix: Option<String>,
    ) -> BridgeResult<Self> {
        // Load base config from file
        let file_config = if let Some(path) = config_path {
            let expanded = expand_tilde(path);
            if expanded.exists() {
                info!(path = %expanded.display(), "loading config file");
                let content = std::fs::read_to_string(&expanded)?;
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|e| BridgeError::Other(format!("config parse error: {e}")))?
            } else {
                info!(path = %expanded.display(), "config file not found, using defaults");
                ConfigFile {
                    server: ServerSection::default(),
                }
            }
        } else {
            ConfigFile {
                server: ServerSection::default(),
            }
        };

        // Merge CLI overrides
        let listen_addr = cli_listen_addr.unwrap_or(file_config.server.listen_addr);
        let ws_path = cli_ws_path.unwrap_or(file_config.server.ws_path);
        let backend_url = cli_backend_url
            .or(file_config.server.backend_url)
            .ok_or_else(|| {
                BridgeError::Other(
                    "backend URL not set (use --backend-url or the config file)".to_string(),
                )
            })?;
        let reply_path_prefix =
            cli_reply_path_prefix.unwrap_or(file_config.server.reply_path_prefix);

        Ok(Self {
            listen_addr,
            ws_path: normalize_path(&ws_path),
            backend_url,
            reply_path_prefix: normalize_path(&reply_path_prefix),
        })
    }
}

/// Ensure a route path has a leading slash and no trailing slash.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(s.as_ref())
}
