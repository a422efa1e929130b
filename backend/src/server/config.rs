//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use schoollib::domain::LoanPeriod;
use schoollib::inbound::http::health::StorageBackend;
use schoollib::inbound::http::session_config::SessionSettings;
use schoollib::outbound::memory::{InMemoryLibrary, InMemoryUsers};
use schoollib::outbound::persistence::DbPool;

/// Where circulation, catalogue and account data live.
#[derive(Clone)]
pub enum Storage {
    /// PostgreSQL through the Diesel adapters.
    Postgres(DbPool),
    /// Process-local library and accounts; contents vanish on restart.
    Memory(InMemoryLibrary, InMemoryUsers),
}

impl Storage {
    /// Empty process-local storage.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(InMemoryLibrary::new(), InMemoryUsers::new())
    }

    /// Backend reported by the health probes.
    #[must_use]
    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Postgres(_) => StorageBackend::Postgres,
            Self::Memory(..) => StorageBackend::Memory,
        }
    }
}

/// Everything `create_server` needs to assemble the application.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl_hours: u16,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) storage: Storage,
    pub(crate) loan_period: LoanPeriod,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Combine session settings with the listener address and storage.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, storage: Storage) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
            ttl_hours,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            session_ttl_hours: ttl_hours,
            bind_addr,
            storage,
            loan_period: LoanPeriod::default(),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Override the lending period applied to new loans.
    #[must_use]
    pub fn with_loan_period(mut self, loan_period: LoanPeriod) -> Self {
        self.loan_period = loan_period;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
