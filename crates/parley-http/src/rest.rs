//! Outbound command registration.
//!
//! Pushes the registry's command definitions to the platform REST API using
//! bulk overwrite: one `PUT` for global commands and one per guild. Whatever
//! was registered remotely before is replaced. No retries.

use std::collections::BTreeMap;

use reqwest::header::AUTHORIZATION;
use thiserror::Error;
use tracing::{info, warn};

use parley_core::types::CommandDefinition;
use parley_core::{GuildId, Registry};

use crate::config::Config;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("missing {0}, cannot register commands")]
    MissingCredentials(&'static str),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Api { url: String, status: u16, body: String },
}

impl RegistrationError {
    /// The host is misconfigured rather than the remote side failing.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, Self::MissingCredentials(_))
    }
}

/// Counts of what a [`CommandRegistrar::register`] call pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub global_commands: usize,
    pub guilds: usize,
    pub guild_commands: usize,
}

/// Client for the platform's application-command endpoints.
#[derive(Clone)]
pub struct CommandRegistrar {
    client: reqwest::Client,
    api_base: String,
    application_id: String,
    token: String,
}

impl std::fmt::Debug for CommandRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistrar")
            .field("api_base", &self.api_base)
            .field("application_id", &self.application_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl CommandRegistrar {
    pub fn new(
        api_base: impl Into<String>,
        application_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            application_id: application_id.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, RegistrationError> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or(RegistrationError::MissingCredentials("DISCORD_BOT_TOKEN"))?;
        let application_id = config
            .application_id
            .as_deref()
            .ok_or(RegistrationError::MissingCredentials("DISCORD_APPLICATION_ID"))?;
        Ok(Self::new(config.api_base.as_str(), application_id, token))
    }

    /// Replace all global commands.
    pub async fn overwrite_global(&self, commands: &[CommandDefinition]) -> Result<(), RegistrationError> {
        let url = format!("{}/applications/{}/commands", self.api_base, self.application_id);
        self.put(url, commands).await
    }

    /// Replace all commands scoped to `guild_id`.
    pub async fn overwrite_guild(
        &self,
        guild_id: &GuildId,
        commands: &[CommandDefinition],
    ) -> Result<(), RegistrationError> {
        let url = format!(
            "{}/applications/{}/guilds/{}/commands",
            self.api_base, self.application_id, guild_id
        );
        self.put(url, commands).await
    }

    /// Push every definition in `registry`, global set first.
    ///
    /// The global set is always sent, even when empty, so commands removed
    /// from the registry disappear remotely.
    pub async fn register(&self, registry: &Registry) -> Result<RegistrationSummary, RegistrationError> {
        let global = registry.global_definitions();
        self.overwrite_global(&global).await?;

        let guilds: BTreeMap<GuildId, Vec<CommandDefinition>> = registry.guild_definitions();
        let mut summary = RegistrationSummary {
            global_commands: global.len(),
            ..Default::default()
        };
        for (guild_id, commands) in &guilds {
            self.overwrite_guild(guild_id, commands).await?;
            summary.guilds += 1;
            summary.guild_commands += commands.len();
        }

        info!(
            global = summary.global_commands,
            guilds = summary.guilds,
            guild_commands = summary.guild_commands,
            "commands registered"
        );
        Ok(summary)
    }

    async fn put(&self, url: String, commands: &[CommandDefinition]) -> Result<(), RegistrationError> {
        let response = match self
            .client
            .put(&url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .json(commands)
            .send()
            .await
        {
            Ok(response) => response,
            Err(source) => return Err(RegistrationError::Http { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "command registration rejected");
            return Err(RegistrationError::Api {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
