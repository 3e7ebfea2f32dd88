//! The uniform response wrapper of the Ecowiser API.
//!
//! Wire shape: `{ success, data?, message?, pagination? }`. The client trusts
//! only `success` and `message`; `data` and `pagination` are handed on to
//! callers untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ecowiser_core::Pagination;

/// Message shown when a failure carries no usable server message.
pub const FALLBACK_MESSAGE: &str = "An error occurred";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// An envelope with the `success` flag lifted into the type.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Ok {
        data: Option<T>,
        message: Option<String>,
        pagination: Option<Pagination>,
    },
    Err {
        message: Option<String>,
    },
}

impl<T> Envelope<T> {
    pub fn into_outcome(self) -> ApiOutcome<T> {
        if self.success {
            ApiOutcome::Ok {
                data: self.data,
                message: self.message,
                pagination: self.pagination,
            }
        } else {
            ApiOutcome::Err {
                message: self.message,
            }
        }
    }
}

impl<T> ApiOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiOutcome::Ok { .. })
    }
}

/// Just the `message` of an arbitrary (possibly non-envelope) error body.
#[derive(Debug, Deserialize)]
struct MessageOnly {
    #[serde(default)]
    message: Option<Value>,
}

/// Pull a human-readable message out of a response body, if there is one.
///
/// Empty and non-string messages are ignored.
pub fn extract_message(body: &[u8]) -> Option<String> {
    let parsed: MessageOnly = serde_json::from_slice(body).ok()?;
    match parsed.message? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Decode a body as an envelope, if it is one.
pub fn parse_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<Envelope<T>, serde_json::Error> {
    serde_json::from_slice(body)
}
