//! dsched.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Port the ds-server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 50000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_ALGORITHM: &str = "cf";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server: Option<ServerConfig>,
    pub client: Option<ClientSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout: Option<String>,
    /// `"0"` disables the read timeout.
    pub read_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSection {
    pub user: Option<String>,
    pub algorithm: Option<String>,
}

/// Fully resolved settings, every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Option<Duration>,
    pub user: String,
    pub algorithm: String,
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply defaults and parse duration strings.
    pub fn resolve(&self) -> anyhow::Result<Settings> {
        let server = self.server.clone().unwrap_or_default();
        let client = self.client.clone().unwrap_or_default();

        let connect_timeout = match server.connect_timeout.as_deref() {
            Some(s) => parse_duration(s)
                .ok_or_else(|| anyhow::anyhow!("invalid server.connect_timeout: {s:?}"))?,
            None => Duration::from_secs(5),
        };
        let read_timeout = match server.read_timeout.as_deref() {
            Some(s) => read_timeout_from(s)?,
            None => Some(Duration::from_secs(30)),
        };

        Ok(Settings {
            host: server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: server.port.unwrap_or(DEFAULT_PORT),
            connect_timeout,
            read_timeout,
            user: client.user.unwrap_or_else(default_user),
            algorithm: client
                .algorithm
                .unwrap_or_else(|| DEFAULT_ALGORITHM.to_string()),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Some(Duration::from_secs(30)),
            user: default_user(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
        }
    }
}

/// Parse a read timeout where a zero duration means "block forever".
pub fn read_timeout_from(s: &str) -> anyhow::Result<Option<Duration>> {
    let d = parse_duration(s).ok_or_else(|| anyhow::anyhow!("invalid read timeout: {s:?}"))?;
    Ok((!d.is_zero()).then_some(d))
}

/// Parse `"500ms"`, `"5s"`, `"2m"` or a bare number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Local principal name sent with `AUTH`.
pub fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "dsched".to_string())
}
