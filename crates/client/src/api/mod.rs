//! Typed bindings for the dashboard's endpoints.
//!
//! Each service is a thin, cloneable wrapper around a [`Gateway`]. They add
//! URL shapes and types; auth, failure notifications and 401 handling all
//! happen in the gateway.

pub mod auth;
pub mod billing;
pub mod members;
pub mod projects;
pub mod resources;
pub mod tenants;

use std::sync::Arc;

use thiserror::Error;

use ecowiser_auth::{AuthzError, Capability, authorize};
use ecowiser_core::CoreError;

use crate::bootstrap::{self, Bootstrap};
use crate::config::ClientConfig;
use crate::effects::{Navigator, Notifier};
use crate::gateway::{Gateway, GatewayError};
use crate::session::{SessionError, SessionStore};
use crate::types::CsvTableError;

pub use auth::{AuthService, LoginOutcome};
pub use billing::BillingService;
pub use members::MemberService;
pub use projects::ProjectService;
pub use resources::ResourceService;
pub use tenants::TenantService;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The cached profile does not allow the action; nothing was sent.
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Csv(#[from] CsvTableError),
}

impl ApiError {
    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Gateway(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Gateway(err) if err.is_unauthorized())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Entry point bundling the gateway and every endpoint service.
#[derive(Debug, Clone)]
pub struct EcowiserClient {
    gateway: Gateway,
}

impl EcowiserClient {
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, GatewayError> {
        Ok(Self::from_gateway(Gateway::new(
            config, session, notifier, navigator,
        )?))
    }

    pub fn from_gateway(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.gateway.clone())
    }

    pub fn tenants(&self) -> TenantService {
        TenantService::new(self.gateway.clone())
    }

    pub fn members(&self) -> MemberService {
        MemberService::new(self.gateway.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.gateway.clone())
    }

    pub fn resources(&self) -> ResourceService {
        ResourceService::new(self.gateway.clone())
    }

    pub fn billing(&self) -> BillingService {
        BillingService::new(self.gateway.clone())
    }

    /// Run the dashboard's mount-time session guard.
    pub async fn bootstrap(&self) -> Bootstrap {
        bootstrap::bootstrap(&self.gateway).await
    }
}

/// Check the cached profile before an Admin/Owner-only call.
pub(crate) fn require(gateway: &Gateway, capability: Capability) -> ApiResult<()> {
    authorize(gateway.session().user().as_ref(), capability)?;
    Ok(())
}

/// `?page=` value; the API numbers pages from 1.
pub(crate) fn page_param(page: u32) -> u32 {
    page.max(1)
}
