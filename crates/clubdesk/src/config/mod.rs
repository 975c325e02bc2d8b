use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Selects which record store and mailing list an operation targets.
///
/// The target is an explicit value threaded through every store access and
/// external call; nothing reads it from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTarget {
    Test,
    Production,
}

impl StoreTarget {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            _ => Self::Test,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StoreTarget::Test => "test",
            StoreTarget::Production => "production",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target: StoreTarget,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub mailbox: MailboxConfig,
    pub ecomail: EcomailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let target =
            StoreTarget::from_str(&env::var("CLUBDESK_ENV").unwrap_or_else(|_| "test".to_string()));

        let host = env::var("CLUBDESK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("CLUBDESK_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("CLUBDESK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            target,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            mailbox: MailboxConfig::from_env()?,
            ecomail: EcomailConfig::from_env(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// IMAP mailbox the application inbox lives on.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Subject fragment identifying application messages.
    pub subject_marker: String,
    pub timeout: Duration,
}

impl MailboxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("MAILBOX_PORT")
            .unwrap_or_else(|_| "993".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        Ok(Self {
            server: env::var("MAILBOX_SERVER").unwrap_or_else(|_| "imap.gmail.com".to_string()),
            port,
            username: env::var("MAILBOX_USER").unwrap_or_default(),
            password: env::var("MAILBOX_PASS").unwrap_or_default(),
            subject_marker: env::var("MAILBOX_SUBJECT_MARKER")
                .unwrap_or_else(|_| "Nová Přihláška".to_string()),
            timeout: Duration::from_secs(30),
        })
    }
}

/// External mailing-list API settings.
#[derive(Debug, Clone)]
pub struct EcomailConfig {
    pub api_key: String,
    pub base_url: String,
    pub production_list_id: String,
    pub test_list_id: String,
    pub timeout: Duration,
}

impl EcomailConfig {
    fn from_env() -> Self {
        Self {
            api_key: env::var("ECOMAIL_API_KEY").unwrap_or_default(),
            base_url: env::var("ECOMAIL_BASE_URL")
                .unwrap_or_else(|_| "https://api2.ecomailapp.cz".to_string()),
            production_list_id: env::var("ECOMAIL_LIST_PRODUCTION")
                .unwrap_or_else(|_| "16".to_string()),
            test_list_id: env::var("ECOMAIL_LIST_TEST").unwrap_or_else(|_| "17".to_string()),
            timeout: Duration::from_secs(15),
        }
    }

    /// The mirrored list for the given target store.
    pub fn list_id(&self, target: StoreTarget) -> &str {
        match target {
            StoreTarget::Production => &self.production_list_id,
            StoreTarget::Test => &self.test_list_id,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "port values must be valid u16 numbers"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "CLUBDESK_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
