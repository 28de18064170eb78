//! Response wrapper with lazy JSON decoding.
//!
//! # Design
//! A `Response` owns the `RawResponse` and an optional transform. The JSON
//! decode and the transform each run at most once, on first access, and
//! their results are cached in `OnceLock`s. Nothing here returns `Err` for a
//! bad outcome: transport faults, non-2xx statuses and unparseable bodies all
//! surface as `is_success() == false` with the data still readable.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::http::RawResponse;

/// Reshapes a successfully decoded body, e.g. unwrapping an envelope field.
pub type Transform = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Marker for a body that is not valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response body is not valid JSON (line {line}, column {column}): {message}")]
pub struct DecodeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Why `Response::deserialize` could not produce the requested type.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The body is valid JSON but does not fit the target type.
    #[error("response body does not match the expected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

pub struct Response {
    raw: RawResponse,
    transform: Option<Transform>,
    decoded: OnceLock<Result<Value, DecodeError>>,
    transformed: OnceLock<Value>,
}

impl Response {
    pub fn new(raw: RawResponse, transform: Option<Transform>) -> Self {
        Self {
            raw,
            transform,
            decoded: OnceLock::new(),
            transformed: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.raw.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.raw.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.header(name)
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        self.raw.text()
    }

    pub fn transport_error(&self) -> Option<&str> {
        self.raw.transport_error.as_deref()
    }

    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    pub fn into_raw(self) -> RawResponse {
        self.raw
    }

    /// The decoded body, before any transform.
    ///
    /// An empty or whitespace-only body decodes to `null`.
    pub fn decoded(&self) -> Result<&Value, &DecodeError> {
        self.decoded.get_or_init(|| decode(&self.raw.body)).as_ref()
    }

    /// Transport succeeded, status is 2xx and the body decoded.
    pub fn is_success(&self) -> bool {
        self.raw.transport_ok() && (200..=299).contains(&self.raw.status) && self.decoded().is_ok()
    }

    /// The decoded body with the transform applied, when successful.
    ///
    /// On failure this is the untransformed decode result, so API error
    /// payloads stay readable.
    pub fn value(&self) -> Result<&Value, &DecodeError> {
        let decoded = self.decoded()?;
        match &self.transform {
            Some(transform) if self.is_success() => {
                Ok(self.transformed.get_or_init(|| transform(decoded)))
            }
            _ => Ok(decoded),
        }
    }

    /// Deserialize the effective value into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ContentError> {
        let value = self.value().map_err(Clone::clone)?;
        T::deserialize(value).map_err(ContentError::Shape)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.raw.status)
            .field("transport_error", &self.raw.transport_error)
            .field("has_transform", &self.transform.is_some())
            .field("decoded", &self.decoded.get())
            .finish()
    }
}

fn decode(body: &[u8]) -> Result<Value, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| DecodeError {
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })
}
