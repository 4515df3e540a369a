//! Server configuration loaded from environment variables.

use std::net::SocketAddr;

use anyhow::{bail, Context, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_INTERACTIONS_PATH: &str = "/interactions";
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Path served by the liveness endpoint; not available for interactions.
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone, Debug)]
pub struct Config {
    /// Address to bind the HTTP server.
    pub bind_addr: SocketAddr,
    /// Route that receives interaction webhooks.
    pub interactions_path: String,
    /// Application Ed25519 public key, hex-encoded. Checked per request, not here.
    pub public_key: Option<String>,
    /// Bot token (enables command registration).
    pub bot_token: Option<String>,
    /// Application id (enables command registration).
    pub application_id: Option<String>,
    /// Base URL of the platform REST API.
    pub api_base: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("PARLEY_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("PARLEY_BIND_ADDR must be a socket address such as 0.0.0.0:8080")?;

        let interactions_path =
            get("PARLEY_INTERACTIONS_PATH").unwrap_or_else(|| DEFAULT_INTERACTIONS_PATH.to_string());
        if !interactions_path.starts_with('/') {
            bail!("PARLEY_INTERACTIONS_PATH must start with '/', got {interactions_path:?}");
        }
        if interactions_path == HEALTH_PATH {
            bail!("PARLEY_INTERACTIONS_PATH cannot be {HEALTH_PATH}");
        }

        let api_base = get("DISCORD_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            bind_addr,
            interactions_path,
            public_key: get("DISCORD_PUBLIC_KEY"),
            bot_token: get("DISCORD_BOT_TOKEN"),
            application_id: get("DISCORD_APPLICATION_ID"),
            api_base,
        })
    }

    /// Both credentials needed to push command definitions are present.
    pub fn can_register(&self) -> bool {
        self.bot_token.is_some() && self.application_id.is_some()
    }
}
