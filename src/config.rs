// config.rs
use crate::auth::token::{hash_token, hashes_equal};
use crate::domain::category::{Category, CategoryTable};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000));
pub const DEFAULT_DATABASE_PATH: &str = "property_board.sqlite3";
pub const DEFAULT_LOCAL_API: &str = "http://localhost:5001";
pub const DEFAULT_REMOTE_API: &str = "https://api.property-board.example";
pub const DEFAULT_SYNC_SECS: u64 = 30;
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24;
pub const DEFAULT_MAX_WORKERS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("OPERATOR_USERNAME and OPERATOR_PASSWORD_SHA256 must be set together")]
    IncompleteOperator,
    #[error("PUBLISH_USERNAME and PUBLISH_PASSWORD must be set together")]
    IncompletePublisher,
}

/// Operator allowed to sign in to the dashboard. Only a SHA-256 of the
/// password is ever held.
#[derive(Clone, PartialEq)]
pub struct OperatorCredentials {
    pub username: String,
    pub password_sha256: [u8; 32],
}

impl std::fmt::Debug for OperatorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl OperatorCredentials {
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let name_ok = hashes_equal(username.trim().as_bytes(), self.username.as_bytes());
        let pass_ok = hashes_equal(&hash_token(password), &self.password_sha256);
        name_ok && pass_ok
    }
}

/// Account on the listings API that operator changes are mirrored to.
#[derive(Clone, PartialEq)]
pub struct PublishCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PublishCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub local_api_base_url: String,
    pub remote_api_base_url: String,
    pub default_category: Category,
    /// False when DEFAULT_CATEGORY was not set and the fallback was assumed.
    pub default_category_confirmed: bool,
    pub sync_interval: Duration,
    pub session_ttl_secs: i64,
    pub max_workers: usize,
    pub operator: Option<OperatorCredentials>,
    /// Unset means operator changes stay local.
    pub publish: Option<PublishCredentials>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            local_api_base_url: DEFAULT_LOCAL_API.to_string(),
            remote_api_base_url: DEFAULT_REMOTE_API.to_string(),
            default_category: Category::Launch,
            default_category_confirmed: false,
            sync_interval: Duration::from_secs(DEFAULT_SYNC_SECS),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            max_workers: DEFAULT_MAX_WORKERS,
            operator: None,
            publish: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let (default_category, default_category_confirmed) = match var("DEFAULT_CATEGORY") {
            Some(raw) => {
                let category = Category::from_slug(&raw).ok_or_else(|| ConfigError::Invalid {
                    var: "DEFAULT_CATEGORY",
                    reason: format!("unknown category {raw:?}"),
                })?;
                (category, true)
            }
            None => (defaults.default_category, false),
        };

        let sync_interval = var("SYNC_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.sync_interval);

        let session_ttl_secs = var("SESSION_TTL_SECS")
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.session_ttl_secs);

        let max_workers = var("MAX_WORKERS")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_workers);

        let operator = match (var("OPERATOR_USERNAME"), var("OPERATOR_PASSWORD_SHA256")) {
            (Some(username), Some(hex)) => Some(OperatorCredentials {
                username,
                password_sha256: decode_sha256_hex(&hex).map_err(|reason| ConfigError::Invalid {
                    var: "OPERATOR_PASSWORD_SHA256",
                    reason,
                })?,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteOperator),
        };

        let publish = match (var("PUBLISH_USERNAME"), var("PUBLISH_PASSWORD")) {
            (Some(username), Some(password)) => Some(PublishCredentials { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompletePublisher),
        };

        let config = Self {
            bind_addr,
            database_path: var("DATABASE_PATH").unwrap_or(defaults.database_path),
            local_api_base_url: var("LOCAL_API_BASE_URL").unwrap_or(defaults.local_api_base_url),
            remote_api_base_url: var("REMOTE_API_BASE_URL").unwrap_or(defaults.remote_api_base_url),
            default_category,
            default_category_confirmed,
            sync_interval,
            session_ttl_secs,
            max_workers,
            operator,
            publish,
        };

        // Mirroring into ourselves would re-enter the same handler forever.
        if config.publish.is_some() && config.api_points_at_self() {
            return Err(ConfigError::Invalid {
                var: "PUBLISH_USERNAME",
                reason: format!("listings API {} is this server", config.api_base_url()),
            });
        }
        Ok(config)
    }

    pub fn is_loopback(&self) -> bool {
        self.bind_addr.ip().is_loopback()
    }

    /// Local API while serving on loopback, the remote one otherwise.
    pub fn api_base_url(&self) -> &str {
        if self.is_loopback() {
            &self.local_api_base_url
        } else {
            &self.remote_api_base_url
        }
    }

    fn api_points_at_self(&self) -> bool {
        let Ok(url) = url::Url::parse(self.api_base_url()) else {
            return false;
        };
        if url.port_or_known_default() != Some(self.bind_addr.port()) {
            return false;
        }

        let ours = self.bind_addr.ip();
        match url.host() {
            Some(url::Host::Domain(name)) => name == "localhost" && (ours.is_loopback() || ours.is_unspecified()),
            Some(url::Host::Ipv4(ip)) => {
                IpAddr::V4(ip) == ours || (ip.is_loopback() && (ours.is_loopback() || ours.is_unspecified()))
            }
            Some(url::Host::Ipv6(ip)) => {
                IpAddr::V6(ip) == ours || (ip.is_loopback() && (ours.is_loopback() || ours.is_unspecified()))
            }
            None => false,
        }
    }

    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(self.default_category)
    }
}

fn decode_sha256_hex(text: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(text.trim()).map_err(|e| e.to_string())?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected a 32-byte digest, got {} bytes", bytes.len()))
}
