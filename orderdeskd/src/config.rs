//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use orderdesk_engine::FeeSchedule;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Trading session configuration
    pub session: SessionConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Trading session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Funds available for orders (rupees)
    pub account_balance: Decimal,
    /// Brokerage, GST and STT rates
    pub fees: FeeSchedule,
    /// Seed for the analysis generator; entropy when `None`
    pub analysis_seed: Option<u64>,
    /// Simulated gateway processing delay
    pub submit_delay: Duration,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Opening balance of a new session
    pub const DEFAULT_ACCOUNT_BALANCE: Decimal = Decimal::from_parts(150_000, 0, 0, false, 0);

    /// Default gateway delay in milliseconds
    pub const DEFAULT_SUBMIT_DELAY_MS: u64 = 2000;

    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> DaemonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::load_environment(&lookup)?;
        let api = Self::load_api_config(&lookup)?;
        let session = Self::load_session_config(&lookup)?;

        Ok(Self {
            api,
            session,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            session: SessionConfig {
                account_balance: Self::DEFAULT_ACCOUNT_BALANCE,
                fees: FeeSchedule::default(),
                analysis_seed: Some(42),
                submit_delay: Duration::ZERO,
            },
            environment: Environment::Test,
        }
    }

    fn load_environment(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<Environment> {
        let env_str = lookup("ORDERDESK_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid ORDERDESK_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<ApiConfig> {
        let host = lookup("ORDERDESK_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port_str = lookup("ORDERDESK_API_PORT").unwrap_or_else(|| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid ORDERDESK_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_session_config(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<SessionConfig> {
        let account_balance =
            Self::load_decimal(lookup, "ORDERDESK_ACCOUNT_BALANCE", Self::DEFAULT_ACCOUNT_BALANCE)?;
        if account_balance < Decimal::ZERO {
            return Err(DaemonError::Config(format!(
                "ORDERDESK_ACCOUNT_BALANCE cannot be negative: {}",
                account_balance
            )));
        }

        let fees = FeeSchedule::new(
            Self::load_decimal(lookup, "ORDERDESK_BROKERAGE_RATE", FeeSchedule::DEFAULT_BROKERAGE_RATE)?,
            Self::load_decimal(lookup, "ORDERDESK_GST_RATE", FeeSchedule::DEFAULT_GST_RATE)?,
            Self::load_decimal(lookup, "ORDERDESK_STT_RATE", FeeSchedule::DEFAULT_STT_RATE)?,
        )
        .map_err(|e| DaemonError::Config(e.to_string()))?;

        let analysis_seed = match lookup("ORDERDESK_ANALYSIS_SEED") {
            Some(val) => Some(
                val.parse::<u64>()
                    .map_err(|_| DaemonError::Config(format!("Invalid ORDERDESK_ANALYSIS_SEED: {}", val)))?,
            ),
            None => None,
        };

        let delay_ms = match lookup("ORDERDESK_SUBMIT_DELAY_MS") {
            Some(val) => val
                .parse::<u64>()
                .map_err(|_| DaemonError::Config(format!("Invalid ORDERDESK_SUBMIT_DELAY_MS: {}", val)))?,
            None => Self::DEFAULT_SUBMIT_DELAY_MS,
        };

        Ok(SessionConfig {
            account_balance,
            fees,
            analysis_seed,
            submit_delay: Duration::from_millis(delay_ms),
        })
    }

    fn load_decimal(
        lookup: &impl Fn(&str) -> Option<String>,
        key: &str,
        default: Decimal,
    ) -> DaemonResult<Decimal> {
        match lookup(key) {
            Some(val) => Decimal::from_str(val.trim())
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            None => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            session: SessionConfig {
                account_balance: Self::DEFAULT_ACCOUNT_BALANCE,
                fees: FeeSchedule::default(),
                analysis_seed: None,
                submit_delay: Duration::from_millis(Self::DEFAULT_SUBMIT_DELAY_MS),
            },
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
