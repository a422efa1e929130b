//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `SCHOOLLIB_*` environment variables, an optional
//! configuration file and command-line flags, in the usual OrthoConfig
//! precedence order. Unset values fall back to the defaults below.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::LoanPeriod;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not a socket address.
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    /// The loan period is zero days.
    #[error("loan period must be at least one day")]
    LoanPeriod,
}

/// Runtime settings for the library service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCHOOLLIB")]
pub struct AppSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Days a loan runs before it falls due.
    pub loan_period_days: Option<u16>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

impl AppSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size, defaulting to ten connections.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Lending period for new loans.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::LoanPeriod`] for a zero-day period.
    pub fn loan_period(&self) -> Result<LoanPeriod, SettingsError> {
        match self.loan_period_days {
            None => Ok(LoanPeriod::default()),
            Some(days) => LoanPeriod::from_days(days).ok_or(SettingsError::LoanPeriod),
        }
    }
}
