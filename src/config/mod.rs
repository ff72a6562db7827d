use serde::{Deserialize, Serialize};
use std::env;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Configuration faults. These abort startup; the service never accepts
/// traffic with an invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Upper bound for token lifetime: one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Reverse proxies whose `X-Forwarded-For` is believed when keying rate
    /// limits. Requests from any other peer are keyed by the peer address.
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub login_rate_limit_requests: u32,
    pub login_rate_limit_window_secs: u64,
    pub enable_request_logging: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub store_timeout_ms: u64,
    pub enable_cors: bool,
    pub bootstrap_admin_email: Option<String>,
    #[serde(skip_serializing)]
    pub bootstrap_admin_password: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("enable_cors", &self.enable_cors)
            .field("bootstrap_admin_email", &self.bootstrap_admin_email)
            .finish()
    }
}

impl SecurityConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt_expiry_hours as i64)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl ApiConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn login_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.login_rate_limit_window_secs)
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// `APP_ENV` selects the preset, individual variables override it, and
    /// `JWT_SECRET` is mandatory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    /// Preset for a given environment with an explicit secret, used by tests
    /// and embedders that do not read the environment.
    pub fn with_secret(environment: Environment, secret: impl Into<String>) -> Self {
        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };
        config.security.jwt_secret = secret.into();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                name: "SECURITY_BCRYPT_COST",
                value: self.security.bcrypt_cost.to_string(),
            });
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::InvalidValue {
                name: "SECURITY_JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if self.security.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "SECURITY_STORE_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("TODO_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("SERVER_TRUSTED_PROXIES") {
            self.server.trusted_proxies = parse_list("SERVER_TRUSTED_PROXIES", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = parse_var("API_ENABLE_RATE_LIMITING", &v)?;
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = parse_var("API_RATE_LIMIT_REQUESTS", &v)?;
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = parse_var("API_RATE_LIMIT_WINDOW_SECS", &v)?;
        }
        if let Ok(v) = env::var("API_LOGIN_RATE_LIMIT_REQUESTS") {
            self.api.login_rate_limit_requests = parse_var("API_LOGIN_RATE_LIMIT_REQUESTS", &v)?;
        }
        if let Ok(v) = env::var("API_LOGIN_RATE_LIMIT_WINDOW_SECS") {
            self.api.login_rate_limit_window_secs =
                parse_var("API_LOGIN_RATE_LIMIT_WINDOW_SECS", &v)?;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse_var("API_ENABLE_REQUEST_LOGGING", &v)?;
        }

        // Security overrides
        self.security.jwt_secret = env::var("JWT_SECRET").unwrap_or_default();
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = parse_var("SECURITY_JWT_EXPIRY_HOURS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = parse_var("SECURITY_BCRYPT_COST", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_STORE_TIMEOUT_MS") {
            self.security.store_timeout_ms = parse_var("SECURITY_STORE_TIMEOUT_MS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse_var("SECURITY_ENABLE_CORS", &v)?;
        }
        self.security.bootstrap_admin_email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok();
        self.security.bootstrap_admin_password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok();

        Ok(self)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                trusted_proxies: Vec::new(),
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                login_rate_limit_requests: 20,
                login_rate_limit_window_secs: 60,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 72,
                bcrypt_cost: 4,
                store_timeout_ms: 5_000,
                enable_cors: true,
                bootstrap_admin_email: None,
                bootstrap_admin_password: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                trusted_proxies: Vec::new(),
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 60,
                login_rate_limit_requests: 10,
                login_rate_limit_window_secs: 60,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 72,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                store_timeout_ms: 3_000,
                enable_cors: true,
                bootstrap_admin_email: None,
                bootstrap_admin_password: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                trusted_proxies: Vec::new(),
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
                login_rate_limit_requests: 5,
                login_rate_limit_window_secs: 60,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 72,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                store_timeout_ms: 2_000,
                enable_cors: false,
                bootstrap_admin_email: None,
                bootstrap_admin_password: None,
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Comma-separated list; empty entries are skipped.
fn parse_list<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<Vec<T>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_var(name, item))
        .collect()
}
