//! `ecowiser-client`
//!
//! **Responsibility:** session lifecycle and authenticated access to the
//! Ecowiser API.
//!
//! This crate provides:
//! - A session store over pluggable key-value persistence
//! - The request gateway (bearer token, 401 handling, failure notifications)
//! - Mount-time session bootstrap
//! - Typed bindings for the dashboard's endpoints
//!
//! The API remains the authority on identity and permissions; the client
//! only caches what it was told.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod effects;
pub mod envelope;
pub mod gateway;
pub mod request;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use api::{ApiError, ApiResult, EcowiserClient};
pub use bootstrap::Bootstrap;
pub use config::{ClientConfig, ConfigError};
pub use effects::{Effect, EffectLog, Navigator, Notifier, TracingNavigator, TracingNotifier};
pub use envelope::{ApiOutcome, Envelope, FALLBACK_MESSAGE};
pub use gateway::{ApiResponse, Gateway, GatewayError, RawResponse};
pub use request::{ApiRequest, RequestBody, Upload};
pub use session::{Session, SessionError, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
