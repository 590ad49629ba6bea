//! Process configuration loaded via OrthoConfig, plus the assembled
//! [`ServerConfig`] handed to [`super::create_server`].

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use storefront::domain::DEFAULT_VERIFY_TIMEOUT;
use storefront::inbound::http::auth_config::AuthSettings;
use storefront::outbound::notify::DEFAULT_BOT_API_BASE_URL;
use storefront::outbound::payment::DEFAULT_GATEWAY_BASE_URL;
use storefront::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Non-secret runtime settings. Secrets come from [`AuthSettings`].
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct AppSettings {
    /// Listener address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server keeps state in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Payment gateway API root.
    pub gateway_base_url: Option<String>,
    /// Bot API root.
    pub bot_api_base_url: Option<String>,
    /// Mini app link used in purchase notifications. Notifications are
    /// disabled when unset.
    pub mini_app_url: Option<String>,
    /// Deadline for one outbound HTTP call, in seconds.
    pub outbound_timeout_secs: Option<u64>,
}

/// Errors turning [`AppSettings`] into typed values.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid URL for {name} ({value}): {source}")]
    Url {
        name: &'static str,
        value: String,
        source: url::ParseError,
    },
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|source| SettingsError::Url {
        name,
        value: value.to_owned(),
        source,
    })
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn gateway_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "gateway_base_url",
            self.gateway_base_url
                .as_deref()
                .unwrap_or(DEFAULT_GATEWAY_BASE_URL),
        )
    }

    pub fn bot_api_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "bot_api_base_url",
            self.bot_api_base_url
                .as_deref()
                .unwrap_or(DEFAULT_BOT_API_BASE_URL),
        )
    }

    pub fn mini_app_url(&self) -> Result<Option<Url>, SettingsError> {
        self.mini_app_url
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_url("mini_app_url", raw))
            .transpose()
    }

    pub fn outbound_timeout(&self) -> Duration {
        self.outbound_timeout_secs
            .map_or(DEFAULT_VERIFY_TIMEOUT, Duration::from_secs)
    }
}

/// Outbound endpoints resolved from [`AppSettings`].
#[derive(Debug, Clone)]
pub struct OutboundConfig {
    pub gateway_base_url: Url,
    pub bot_api_base_url: Url,
    pub mini_app_url: Option<Url>,
    pub timeout: Duration,
}

impl OutboundConfig {
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            gateway_base_url: settings.gateway_base_url()?,
            bot_api_base_url: settings.bot_api_base_url()?,
            mini_app_url: settings.mini_app_url()?,
            timeout: settings.outbound_timeout(),
        })
    }
}

/// Everything the server needs at construction time.
pub struct ServerConfig {
    pub(crate) auth: AuthSettings,
    pub(crate) outbound: OutboundConfig,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(auth: AuthSettings, outbound: OutboundConfig, bind_addr: SocketAddr) -> Self {
        Self {
            auth,
            outbound,
            bind_addr,
            db_pool: None,
        }
    }

    /// Attach a database pool; without one the server uses in-memory
    /// repositories.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
