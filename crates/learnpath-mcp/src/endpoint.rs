// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Configuration errors caught before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a YouTube endpoint URL is required")]
    MissingPrimaryUrl,
    #[error("the {kind} integration was selected but no URL was provided")]
    MissingSecondaryUrl { kind: &'static str },
    #[error("invalid {name} endpoint URL: {message}")]
    InvalidEndpointUrl { name: &'static str, message: String },
}

/// Wire transport used to reach an MCP server.
///
/// Only the streamable HTTP transport is supported; the tag exists so the
/// endpoint descriptor names its protocol explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    StreamableHttp,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::StreamableHttp => write!(f, "streamable_http"),
        }
    }
}

/// The secondary tool integration for one invocation.
///
/// Exactly one of Drive or Notion may be configured – the enum makes the
/// both-at-once state unrepresentable.
#[derive(Debug, Clone)]
pub enum Integration {
    Drive(String),
    Notion(String),
}

impl Integration {
    /// Endpoint key, used as the server name.
    pub fn key(&self) -> &'static str {
        match self {
            Integration::Drive(_) => "drive",
            Integration::Notion(_) => "notion",
        }
    }

    /// Human-readable name used in progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Integration::Drive(_) => "Google Drive",
            Integration::Notion(_) => "Notion",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Integration::Drive(url) | Integration::Notion(url) => url,
        }
    }
}

/// One configured MCP endpoint.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub url: String,
    pub transport: Transport,
}

/// The ordered set of MCP servers for one invocation: the mandatory YouTube
/// source first, then the optional secondary integration.
#[derive(Debug, Clone)]
pub struct ServerSet {
    servers: Vec<ServerConfig>,
}

impl ServerSet {
    /// Build the server set from caller input.  Fails before any network
    /// call when the primary URL is absent, or when the selected secondary
    /// integration carries an empty URL.
    pub fn build(
        youtube_url: &str,
        secondary: Option<&Integration>,
    ) -> Result<Self, ConfigError> {
        let youtube_url = youtube_url.trim();
        if youtube_url.is_empty() {
            return Err(ConfigError::MissingPrimaryUrl);
        }
        check_url("YouTube", youtube_url)?;

        let mut servers = vec![ServerConfig {
            name: "youtube".to_string(),
            url: youtube_url.to_string(),
            transport: Transport::StreamableHttp,
        }];

        if let Some(integration) = secondary {
            let url = integration.url().trim();
            if url.is_empty() {
                return Err(ConfigError::MissingSecondaryUrl { kind: integration.label() });
            }
            check_url(integration.label(), url)?;
            servers.push(ServerConfig {
                name: integration.key().to_string(),
                url: url.to_string(),
                transport: Transport::StreamableHttp,
            });
        }

        Ok(Self { servers })
    }

    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }
}

fn check_url(name: &'static str, raw: &str) -> Result<(), ConfigError> {
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEndpointUrl { name, message: e.to_string() })
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
