//! Pluggable authentication strategies.
//!
//! # Design
//! A strategy is anything implementing [`Authenticator`]: it receives the
//! resolved request as an [`AuthContext`] and may rewrite the URL, adjust body
//! parameters or add headers. The client holds one boxed strategy chosen at
//! configuration time and calls it for every request, so a new scheme only
//! needs a new `Authenticator` impl.
//!
//! [`from_config`] maps a strategy name plus a JSON credential payload to a
//! built-in strategy. Unknown names and malformed credentials fail here, at
//! setup time, never at request time.

mod basic;
mod oauth1;
mod oauth2;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub use basic::{BasicAuth, BasicCredentials};
pub use oauth1::{OAuth1Auth, OAuth1Credentials};
pub use oauth2::{OAuth2Auth, TokenPlacement};

use crate::error::{ApiError, ConfigError};
use crate::http::HttpMethod;
use crate::params::Params;
use crate::serializer::BodyFormat;

/// The parts of a request an authentication strategy may inspect or change.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub method: HttpMethod,
    /// Absolute URL including the merged query string.
    pub url: Url,
    /// Merged body parameters, if the request has a body.
    pub body: Option<Params>,
    /// The format the body will be serialized in.
    pub body_format: BodyFormat,
    /// Extra headers to send.
    pub headers: Vec<(String, String)>,
}

impl AuthContext {
    pub fn new(method: HttpMethod, url: Url, body: Option<Params>, body_format: BodyFormat) -> Self {
        Self {
            method,
            url,
            body,
            body_format,
            headers: Vec::new(),
        }
    }

    /// Set a header, replacing any existing header with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

/// Attaches credentials to outgoing requests.
pub trait Authenticator: fmt::Debug + Send + Sync {
    /// Short scheme name, used in logs.
    fn scheme(&self) -> &'static str;

    fn augment(&self, ctx: &mut AuthContext) -> Result<(), ApiError>;
}

/// The identity strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn scheme(&self) -> &'static str {
        "none"
    }

    fn augment(&self, _ctx: &mut AuthContext) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Build a built-in strategy from its name and credential payload.
///
/// Names are case-insensitive: `none`, `basic`, `oauth1` (alias `oauth`) and
/// `oauth2` (alias `bearer`).
pub fn from_config(name: &str, credentials: Value) -> Result<Box<dyn Authenticator>, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "none" => Ok(Box::new(NoAuth)),
        "basic" => {
            let creds: BasicCredentials = credentials_from(credentials, "basic")?;
            Ok(Box::new(BasicAuth::new(creds.username, creds.password)))
        }
        "oauth" | "oauth1" => {
            let creds: OAuth1Credentials = credentials_from(credentials, "oauth1")?;
            Ok(Box::new(OAuth1Auth::new(creds)))
        }
        "oauth2" | "bearer" => Ok(Box::new(OAuth2Auth::from_token_object(credentials)?)),
        _ => Err(ConfigError::UnknownAuthStrategy(name.to_string())),
    }
}

fn credentials_from<T: DeserializeOwned>(
    credentials: Value,
    strategy: &'static str,
) -> Result<T, ConfigError> {
    serde_json::from_value(credentials).map_err(|e| ConfigError::InvalidCredentials {
        strategy,
        reason: e.to_string(),
    })
}
