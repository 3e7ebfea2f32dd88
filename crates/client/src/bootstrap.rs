//! Mount-time session guard for authenticated views.

use ecowiser_auth::UserProfile;

use crate::api::{AuthService, TenantService};
use crate::gateway::Gateway;
use crate::types::Tenant;

#[derive(Debug, Clone, PartialEq)]
pub enum Bootstrap {
    /// No usable session. Navigation to the login route has been requested.
    RedirectToLogin,
    Ready {
        user: UserProfile,
        /// `None` when the user has no tenant or it could not be loaded.
        tenant: Option<Tenant>,
    },
}

impl Bootstrap {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Bootstrap::Ready { user, .. } => Some(user),
            Bootstrap::RedirectToLogin => None,
        }
    }
}

/// Decide whether an authenticated view may render.
///
/// - no token: redirect;
/// - cached profile: use it without a round trip;
/// - otherwise fetch `/users/self/` and redirect if that fails;
/// - a tenant is loaded when the profile names one; failing to load it is
///   not fatal unless the failure was a 401.
pub async fn bootstrap(gateway: &Gateway) -> Bootstrap {
    if !gateway.session().is_authenticated() {
        tracing::debug!("no session; redirecting to login");
        gateway.redirect_to_login();
        return Bootstrap::RedirectToLogin;
    }

    let user = match gateway.session().user() {
        Some(user) => user,
        None => match AuthService::new(gateway.clone()).current_user().await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!("could not load the signed-in user: {err}");
                // A 401 has already navigated.
                if !err.is_unauthorized() {
                    gateway.redirect_to_login();
                }
                return Bootstrap::RedirectToLogin;
            }
        },
    };

    let tenant = if user.has_tenant() {
        match TenantService::new(gateway.clone()).current().await {
            Ok(tenant) => Some(tenant),
            Err(err) if err.is_unauthorized() => return Bootstrap::RedirectToLogin,
            Err(err) => {
                tracing::warn!(tenant = ?user.tenant_id(), "failed to load tenant: {err}");
                None
            }
        }
    } else {
        None
    };

    Bootstrap::Ready { user, tenant }
}
