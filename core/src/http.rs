//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and wraps `RawResponse` values without ever
//! touching the network itself; a `Transport` (see `transport.rs`) performs
//! the actual round trip.
//!
//! `RawResponse` records transport-level faults as data rather than an
//! `Err`, so a refused connection flows through the same `Response` wrapper
//! as a 500.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ApiError;
use crate::params::{self, Params};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Per-call parameters go into the request body for POST and PUT, and
    /// into the query string for everything else.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    /// Case-insensitive. Anything outside the five supported verbs is a
    /// usage error raised before the transport is involved.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            _ => Err(ApiError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// A wire-ready request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Flat parameters, form-encoded by `to_bytes`.
    Form(Params),
    /// An already JSON-encoded document.
    Json(String),
}

impl Body {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Form(params) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                serializer.extend_pairs(params::to_pairs(params));
                serializer.finish().into_bytes()
            }
            Body::Json(json) => json.clone().into_bytes(),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient::build_request`. Immutable once built; the transport
/// consumes it by reference.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// The unprocessed result of a transport round trip.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Set when the request never produced an HTTP response.
    pub transport_error: Option<String>,
}

impl RawResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            transport_error: None,
        }
    }

    /// A response standing in for a connection, DNS or timeout fault.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            transport_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// True when the transport produced an HTTP response, whatever its status.
    pub fn transport_ok(&self) -> bool {
        self.transport_error.is_none()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
