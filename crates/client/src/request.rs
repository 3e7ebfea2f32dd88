//! Outbound request description.
//!
//! An [`ApiRequest`] is a plain value. It deliberately has no notion of the
//! session: the gateway decides at dispatch time which credential to attach.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// File bytes plus the form fields sent alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl Upload {
    /// Upload under the conventional `file` form field.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: "file".to_string(),
            file_name: file_name.into(),
            bytes,
            mime: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field_name(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Form fields only, sent as multipart (the API expects multipart for
    /// tenant updates even without a file).
    Form(Vec<(String, String)>),
    Multipart(Upload),
    /// A body that could not be serialized; the gateway refuses to send it.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Extra header. An `Authorization` header set here is only used when
    /// the session holds no token.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// JSON body. A value that fails to serialize is kept as
    /// [`RequestBody::Invalid`] and never reaches the wire.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = match serde_json::to_value(body) {
            Ok(value) => RequestBody::Json(value),
            Err(err) => {
                tracing::error!(path = %self.path, "failed to serialize request body: {err}");
                RequestBody::Invalid(format!("request body is not valid JSON: {err}"))
            }
        };
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn multipart(mut self, upload: Upload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }
}
