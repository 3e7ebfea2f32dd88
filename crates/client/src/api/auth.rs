//! Sign-in, sign-up and profile endpoints (`/users/...`).

use serde_json::Value;

use ecowiser_auth::UserProfile;
use ecowiser_core::CoreError;

use super::ApiResult;
use crate::gateway::{ApiResponse, Gateway};
use crate::session::redact;
use crate::types::{LoginRequest, LoginTokens, PasswordChange, ProfileUpdate, SignupRequest};

pub const LOGIN_PATH: &str = "/users/login/";
pub const SIGNUP_PATH: &str = "/users/sign-up/";
pub const SELF_PATH: &str = "/users/self/";

/// Result of a successful login.
///
/// `user` is `None` when the token was accepted but the follow-up profile
/// fetch failed; the session is still authenticated in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    gateway: Gateway,
}

impl AuthService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn is_authenticated(&self) -> bool {
        self.gateway.session().is_authenticated()
    }

    pub fn cached_user(&self) -> Option<UserProfile> {
        self.gateway.session().user()
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginOutcome> {
        let response = self
            .gateway
            .post_json(LOGIN_PATH, &LoginRequest { username, password })
            .await?;
        let tokens: LoginTokens = response.data()?;
        let token = tokens.access;

        self.gateway.session().set_session(&token, None)?;
        tracing::info!(username, token = %redact(&token), "signed in");

        let user = match self.fetch_and_cache_user().await {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!("signed in but the profile could not be fetched: {err}");
                None
            }
        };

        Ok(LoginOutcome { token, user })
    }

    /// Register an account. Does not sign in.
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<Option<Value>> {
        let response = self.gateway.post_json(SIGNUP_PATH, request).await?;
        Ok(response.data)
    }

    /// Fetch the signed-in user and refresh the cached profile.
    pub async fn current_user(&self) -> ApiResult<UserProfile> {
        self.fetch_and_cache_user().await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        let response = self.gateway.patch_json(SELF_PATH, update).await?;
        self.cache_from(&response)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> ApiResult<()> {
        if new_password != confirmation {
            return Err(CoreError::validation("New passwords don't match").into());
        }
        self.gateway
            .patch_json(
                SELF_PATH,
                &PasswordChange {
                    current_password,
                    password: new_password,
                },
            )
            .await?;
        Ok(())
    }

    /// Clear the session and go to the login route.
    pub fn logout(&self) {
        tracing::info!("signing out");
        self.gateway.logout();
    }

    /// Like [`current_user`](Self::current_user) but swallows failures.
    pub async fn refresh_user(&self) -> Option<UserProfile> {
        match self.fetch_and_cache_user().await {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!("failed to refresh user data: {err}");
                None
            }
        }
    }

    async fn fetch_and_cache_user(&self) -> ApiResult<UserProfile> {
        let response = self.gateway.get(SELF_PATH).await?;
        self.cache_from(&response)
    }

    fn cache_from(&self, response: &ApiResponse) -> ApiResult<UserProfile> {
        let user: UserProfile = response.data()?;
        self.gateway
            .session()
            .replace_user_if_current(response.sent_token.as_deref(), &user)?;
        Ok(user)
    }
}
