// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use crate::oauth::ProviderConfig;

/// Configuration for the roomq server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "roomq", version, about = "Shared music queue rooms backed by one owner's account")]
pub struct RoomqConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "ROOMQ_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8090, env = "ROOMQ_PORT")]
    pub port: u16,

    /// OAuth client id registered with the provider.
    #[arg(long, env = "CLIENT_ID", default_value = "")]
    pub client_id: String,

    /// OAuth client secret registered with the provider.
    #[arg(long, env = "CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub client_secret: String,

    /// Provider token endpoint.
    #[arg(long, default_value = "https://accounts.spotify.com/api/token", env = "ROOMQ_TOKEN_URL")]
    pub token_url: String,

    /// Provider REST API base URL (no trailing slash).
    #[arg(long, default_value = "https://api.spotify.com/v1", env = "ROOMQ_API_BASE")]
    pub api_base: String,

    /// Timeout for each outbound provider or token call, in milliseconds.
    #[arg(long, default_value_t = 10000, env = "ROOMQ_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Directory holding `records.json`.
    #[arg(long, env = "ROOMQ_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Keep principals and rooms in memory only.
    #[arg(long, env = "ROOMQ_EPHEMERAL")]
    pub ephemeral: bool,

    /// Log format (json or text).
    #[arg(long, env = "ROOMQ_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "ROOMQ_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl RoomqConfig {
    /// Reject configurations that cannot serve a single login.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.client_id.is_empty() {
            anyhow::bail!("--client-id (or CLIENT_ID) is required");
        }
        if self.client_secret.is_empty() {
            anyhow::bail!("--client-secret (or CLIENT_SECRET) is required");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        if self.request_timeout_ms == 0 {
            anyhow::bail!("--request-timeout-ms must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Provider endpoints and client credentials for the token client and executor.
    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_url: self.token_url.clone(),
            api_base: self.api_base.trim_end_matches('/').to_owned(),
            timeout: self.request_timeout(),
        }
    }

    /// Path of the persisted record file, or `None` when running ephemeral.
    pub fn records_path(&self) -> Option<PathBuf> {
        if self.ephemeral {
            return None;
        }
        let dir = self.state_dir.clone().unwrap_or_else(state_dir);
        Some(dir.join("records.json"))
    }
}

/// Resolve the default state directory.
///
/// Checks `ROOMQ_STATE_DIR`, then `$XDG_STATE_HOME/roomq`,
/// then `$HOME/.local/state/roomq`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ROOMQ_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("roomq");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/roomq");
    }
    PathBuf::from(".roomq")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
