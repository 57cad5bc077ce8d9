//! Service settings loaded via OrthoConfig, and the resolved server
//! configuration built from them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::outbound::ai::ChatClientConfig;
use crate::outbound::persistence::{DEFAULT_MAX_CONNECTIONS, DbPool};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Settings read from CLI arguments, `SKILLFLASH_*` variables, and config
/// files.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SKILLFLASH")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server runs on in-process fixtures.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    /// Root of an OpenAI-compatible API.
    pub ai_base_url: Option<String>,
    /// Provider key. Module generation and grading are disabled without it.
    pub ai_api_key: Option<String>,
    pub ai_model: Option<String>,
    pub ai_timeout_secs: Option<u64>,
    pub session_key_file: Option<PathBuf>,
    /// Accept a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    #[ortho_config(default = true)]
    pub session_cookie_secure: bool,
    /// `Strict`, `Lax`, or `None`.
    pub session_same_site: Option<String>,
    /// Origin used to build certificate verification links.
    pub public_base_url: Option<String>,
}

impl std::fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("db_max_connections", &self.db_max_connections)
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("ai_model", &self.ai_model)
            .field("ai_timeout_secs", &self.ai_timeout_secs)
            .field("session_key_file", &self.session_key_file)
            .field("session_allow_ephemeral", &self.session_allow_ephemeral)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("session_same_site", &self.session_same_site)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

/// Invalid values in [`AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid {name} '{value}': {source}")]
    Url {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid session same-site policy '{value}'; expected {SAMESITE_EXPECTED}")]
    SameSite { value: String },
    #[error("SameSite=None requires secure session cookies")]
    InsecureSameSiteNone,
}

impl AppSettings {
    /// Socket address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Cookie `SameSite` policy. Defaults to `Lax`.
    ///
    /// # Errors
    ///
    /// Rejects unknown policies and `None` on insecure cookies.
    pub fn same_site(&self) -> Result<SameSite, SettingsError> {
        let Some(value) = self.session_same_site.as_deref() else {
            return Ok(SameSite::Lax);
        };
        match value.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if self.session_cookie_secure => Ok(SameSite::None),
            "none" => Err(SettingsError::InsecureSameSiteNone),
            _ => Err(SettingsError::SameSite {
                value: value.to_owned(),
            }),
        }
    }

    /// Public origin without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Url`] when the value is not an absolute URL.
    pub fn public_base_url(&self) -> Result<String, SettingsError> {
        let value = self
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL);
        let url = parse_url("public_base_url", value)?;
        Ok(url.as_str().trim_end_matches('/').to_owned())
    }

    /// Chat client settings, or `None` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Url`] when the base URL is malformed.
    pub fn ai_client_config(&self) -> Result<Option<ChatClientConfig>, SettingsError> {
        let Some(api_key) = self
            .ai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        else {
            return Ok(None);
        };
        let base_url = parse_url(
            "ai_base_url",
            self.ai_base_url.as_deref().unwrap_or(DEFAULT_AI_BASE_URL),
        )?;
        Ok(Some(ChatClientConfig {
            base_url,
            api_key: Zeroizing::new(api_key.to_owned()),
            model: self
                .ai_model
                .clone()
                .unwrap_or_else(|| DEFAULT_AI_MODEL.to_owned()),
            timeout: Duration::from_secs(self.ai_timeout_secs.unwrap_or(DEFAULT_AI_TIMEOUT_SECS)),
        }))
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|source| SettingsError::Url {
        name,
        value: value.to_owned(),
        source,
    })
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) public_base_url: String,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) ai: Option<ChatClientConfig>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
            db_pool: None,
            ai: None,
        }
    }

    /// Attach a database pool; repositories switch from fixtures to Diesel.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach chat client settings; generation and grading go live.
    #[must_use]
    pub fn with_ai(mut self, ai: Option<ChatClientConfig>) -> Self {
        self.ai = ai;
        self
    }

    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
