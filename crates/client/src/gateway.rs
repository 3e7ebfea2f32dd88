//! Authenticated request gateway.
//!
//! Every call to the Ecowiser API goes through [`Gateway`]. Call sites never
//! touch tokens or generic error UX themselves:
//!
//! - before dispatch the current session token is read (per request, never
//!   cached) and attached as `Authorization: Bearer <token>`;
//! - successful responses pass through unchanged;
//! - a 401 clears the session and navigates to the login route, once per
//!   failing response;
//! - every failure, 401 included, notifies the user with the server's
//!   message (or a generic fallback) unless the path is a silent probe;
//! - every failure is still returned to the caller after those side effects.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use ecowiser_core::Pagination;

use crate::config::ClientConfig;
use crate::effects::{Navigator, Notifier};
use crate::envelope::{ApiOutcome, Envelope, FALLBACK_MESSAGE, extract_message, parse_envelope};
use crate::request::{ApiRequest, RequestBody, Upload};
use crate::session::{SessionStore, redact};
use crate::types::Page;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The API answered 401. The session has already been cleared.
    #[error("not authorised (HTTP 401)")]
    Unauthorized { message: Option<String> },

    /// Non-2xx status, or a 2xx envelope with `success: false`.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Api { status: u16, message: Option<String> },

    /// No response was received.
    #[error("network error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl GatewayError {
    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Unauthorized { message } | GatewayError::Api { message, .. } => message
                .clone()
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized { .. })
    }

    fn from_send(err: reqwest::Error) -> Self {
        if err.is_builder() {
            GatewayError::InvalidRequest(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Successful response whose body was not interpreted (downloads).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// Token the request was sent with.
    pub sent_token: Option<String>,
}

/// Successful enveloped response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Option<Value>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
    /// Token the request was sent with.
    pub sent_token: Option<String>,
}

impl ApiResponse {
    /// Decode `data`; missing data is an error.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        match self.optional_data()? {
            Some(data) => Ok(data),
            None => Err(GatewayError::Decode("response carries no data".to_string())),
        }
    }

    /// Decode `data` if the server sent any.
    pub fn optional_data<T: DeserializeOwned>(&self) -> Result<Option<T>, GatewayError> {
        match &self.data {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(|e| {
                tracing::warn!("response data does not match the expected shape: {e}");
                GatewayError::Decode(e.to_string())
            }),
        }
    }

    /// Decode a list `data` together with its pagination block.
    pub fn page<T: DeserializeOwned>(&self) -> Result<Page<T>, GatewayError> {
        let items = self.optional_data::<Vec<T>>()?.unwrap_or_default();
        Ok(Page {
            items,
            pagination: self.pagination.clone(),
        })
    }
}

#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    silent_probes: Vec<String>,
}

impl core::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.inner.base_url)
            .field("login_route", &self.inner.login_route)
            .field("silent_probes", &self.inner.silent_probes)
            .finish()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| GatewayError::Client(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn build_http_client(_config: &ClientConfig) -> Result<reqwest::Client, GatewayError> {
    // The browser's fetch owns timeouts.
    Ok(reqwest::Client::new())
}

impl Gateway {
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            inner: Arc::new(Inner {
                http: build_http_client(config)?,
                base_url: config.base_url().to_string(),
                session,
                notifier,
                navigator,
                login_route: config.login_route().to_string(),
                silent_probes: config.silent_probes().to_vec(),
            }),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn login_route(&self) -> &str {
        &self.inner.login_route
    }

    /// Whether failures on `path` skip the user notification.
    pub fn is_silent_probe(&self, path: &str) -> bool {
        self.inner
            .silent_probes
            .iter()
            .any(|probe| !probe.is_empty() && path.contains(probe.as_str()))
    }

    /// Clear the session and leave for the login route (explicit logout).
    pub fn logout(&self) {
        self.inner.session.clear();
        self.redirect_to_login();
    }

    /// Navigate to the login route without touching the session.
    pub fn redirect_to_login(&self) {
        self.inner.navigator.navigate(&self.inner.login_route);
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::post(path).json(body)).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::patch(path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Dispatch a request whose response is an envelope.
    ///
    /// A 2xx envelope with `success: false` is a failure like any 4xx.
    /// An empty 2xx body (e.g. 204) is a success without data.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        let raw = self.execute(&request).await?;

        if raw.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse {
                status: raw.status,
                data: None,
                message: None,
                pagination: None,
                sent_token: raw.sent_token,
            });
        }

        let envelope: Envelope = match parse_envelope(&raw.body) {
            Ok(envelope) => envelope,
            Err(err) => {
                let err = GatewayError::Decode(format!(
                    "{} {}: body is not an API envelope: {err}",
                    request.method, request.path
                ));
                return Err(self.reject(&request.path, err));
            }
        };

        match envelope.into_outcome() {
            ApiOutcome::Ok {
                data,
                message,
                pagination,
            } => Ok(ApiResponse {
                status: raw.status,
                data,
                message,
                pagination,
                sent_token: raw.sent_token,
            }),
            ApiOutcome::Err { message } => {
                let err = GatewayError::Api {
                    status: raw.status,
                    message: message.filter(|m| !m.trim().is_empty()),
                };
                Err(self.reject(&request.path, err))
            }
        }
    }

    /// Dispatch a request and hand back the body as bytes (downloads).
    pub async fn send_raw(&self, request: ApiRequest) -> Result<RawResponse, GatewayError> {
        self.execute(&request).await
    }

    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, GatewayError> {
        let token = self.inner.session.token().filter(|t| !t.is_empty());
        let url = format!("{}{}", self.inner.base_url, request.path);

        let mut builder = self.inner.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            if token.is_some() && name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.multipart(text_form(fields)),
            RequestBody::Multipart(upload) => match upload_form(upload) {
                Ok(form) => builder.multipart(form),
                Err(err) => return Err(self.reject(&request.path, err)),
            },
            RequestBody::Invalid(reason) => {
                let err = GatewayError::InvalidRequest(reason.clone());
                return Err(self.reject(&request.path, err));
            }
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            token = %token.as_deref().map(redact).unwrap_or_default(),
            "dispatching request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return Err(self.reject(&request.path, GatewayError::from_send(err))),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                return Err(self.reject(&request.path, GatewayError::Transport(err.to_string())));
            }
        };

        tracing::debug!(status = status.as_u16(), path = %request.path, "response received");

        if status.is_success() {
            return Ok(RawResponse {
                status: status.as_u16(),
                content_type,
                body,
                sent_token: token,
            });
        }

        let message = extract_message(&body);
        let err = if status == StatusCode::UNAUTHORIZED {
            GatewayError::Unauthorized { message }
        } else {
            GatewayError::Api {
                status: status.as_u16(),
                message,
            }
        };
        Err(self.reject(&request.path, err))
    }

    /// Apply the global failure side effects, then hand the error back.
    fn reject(&self, path: &str, err: GatewayError) -> GatewayError {
        if err.is_unauthorized() {
            self.expire_session(path);
        }
        if self.is_silent_probe(path) {
            tracing::debug!(path, "silent probe failed: {err}");
        } else {
            tracing::warn!(path, "request failed: {err}");
            self.inner.notifier.error(&err.user_message());
        }
        err
    }

    fn expire_session(&self, path: &str) {
        tracing::warn!(path, "API answered 401; clearing session");
        self.inner.session.clear();
        self.redirect_to_login();
    }
}

fn text_form(fields: &[(String, String)]) -> Form {
    fields
        .iter()
        .fold(Form::new(), |form, (name, value)| form.text(name.clone(), value.clone()))
}

fn upload_form(upload: &Upload) -> Result<Form, GatewayError> {
    let mut part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
    if let Some(mime) = &upload.mime {
        part = part
            .mime_str(mime)
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid mime type '{mime}': {e}")))?;
    }
    Ok(text_form(&upload.fields).part(upload.field.clone(), part))
}
