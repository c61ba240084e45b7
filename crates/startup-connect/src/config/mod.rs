use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::applicants::intake::{
    IntakePolicy, DEFAULT_MAX_RESUME_BYTES, DEFAULT_RESUME_TYPES,
};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub intake: IntakeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json_logs = match env::var("APP_LOG_FORMAT") {
            Ok(format) => format.trim().eq_ignore_ascii_case("json"),
            Err(_) => environment == AppEnvironment::Production,
        };

        let max_resume_bytes = match env::var("APP_MAX_RESUME_BYTES") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::InvalidResumeLimit { value: raw }),
            },
            Err(_) => DEFAULT_MAX_RESUME_BYTES,
        };

        let allowed_resume_types = match env::var("APP_RESUME_TYPES") {
            Ok(raw) => parse_mime_list(&raw)?,
            Err(_) => DEFAULT_RESUME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                json_logs,
            },
            intake: IntakeConfig {
                max_resume_bytes,
                allowed_resume_types,
            },
        })
    }
}

fn parse_mime_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let types: Vec<String> = raw
        .split(',')
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .collect();

    if types.is_empty() || types.iter().any(|value| !value.contains('/')) {
        return Err(ConfigError::InvalidResumeTypes {
            value: raw.to_string(),
        });
    }

    Ok(types)
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
    /// Emit one JSON object per event instead of compact text.
    pub json_logs: bool,
}

/// Limits applied to resume attachments at submission time.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub max_resume_bytes: usize,
    pub allowed_resume_types: Vec<String>,
}

impl IntakeConfig {
    pub fn policy(&self) -> IntakePolicy {
        IntakePolicy::new(self.max_resume_bytes, self.allowed_resume_types.clone())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidResumeLimit { value: String },
    InvalidResumeTypes { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidResumeLimit { value } => write!(
                f,
                "APP_MAX_RESUME_BYTES must be a positive byte count (found '{}')",
                value
            ),
            ConfigError::InvalidResumeTypes { value } => write!(
                f,
                "APP_RESUME_TYPES must be a comma-separated list of mime types (found '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidResumeLimit { .. }
            | ConfigError::InvalidResumeTypes { .. } => None,
        }
    }
}
