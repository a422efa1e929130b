//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CatalogueCommand, CatalogueQuery, CirculationCommand, CirculationQuery, LoginService,
    RegistrationCommand,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationCommand>,
    pub circulation: Arc<dyn CirculationCommand>,
    pub circulation_query: Arc<dyn CirculationQuery>,
    pub catalogue: Arc<dyn CatalogueCommand>,
    pub catalogue_query: Arc<dyn CatalogueQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationCommand>,
    pub circulation: Arc<dyn CirculationCommand>,
    pub circulation_query: Arc<dyn CirculationQuery>,
    pub catalogue: Arc<dyn CatalogueCommand>,
    pub catalogue_query: Arc<dyn CatalogueQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use schoollib::domain::{AccountService, CatalogueService, CirculationService, LoanPeriod};
    /// use schoollib::inbound::http::state::{HttpState, HttpStatePorts};
    /// use schoollib::outbound::memory::{InMemoryLibrary, InMemoryUsers};
    ///
    /// let accounts = Arc::new(AccountService::new(
    ///     Arc::new(InMemoryUsers::new()),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let library = Arc::new(InMemoryLibrary::new());
    /// let circulation = Arc::new(CirculationService::new(
    ///     library.clone(),
    ///     Arc::new(DefaultClock),
    ///     LoanPeriod::default(),
    /// ));
    /// let catalogue = Arc::new(CatalogueService::new(library));
    /// let state = HttpState::new(HttpStatePorts {
    ///     login: accounts.clone(),
    ///     registration: accounts,
    ///     circulation: circulation.clone(),
    ///     circulation_query: circulation,
    ///     catalogue: catalogue.clone(),
    ///     catalogue_query: catalogue,
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            registration,
            circulation,
            circulation_query,
            catalogue,
            catalogue_query,
        } = ports;
        Self {
            login,
            registration,
            circulation,
            circulation_query,
            catalogue,
            catalogue_query,
        }
    }
}
