//! Client configuration.
//!
//! # Design
//! `ClientConfig` is owned by one `ApiClient` and may be changed between
//! requests. Every setter validates its input on the spot, so a bad value
//! never survives until request time. The optional values (body format,
//! transform) are plain `Option`s with explicit `clear_*` resets.
//!
//! `ClientSettings` is the declarative form of the same configuration,
//! deserializable from JSON, for hosts that keep API definitions in files.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::auth::{self, Authenticator, NoAuth};
use crate::error::ConfigError;
use crate::params::Params;
use crate::resolver::BaseUrl;
use crate::response::Transform;
use crate::serializer::BodyFormat;

pub struct ClientConfig {
    base_url: BaseUrl,
    default_body_params: Params,
    body_format: Option<BodyFormat>,
    transform: Option<Transform>,
    auth: Box<dyn Authenticator>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_base(BaseUrl::parse(base_url)?))
    }

    /// The URL-plus-query-map form of `new`.
    pub fn with_query(base_url: Url, query: &Params) -> Result<Self, ConfigError> {
        Ok(Self::from_base(BaseUrl::with_query(base_url, query)?))
    }

    fn from_base(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            default_body_params: Params::new(),
            body_format: None,
            transform: None,
            auth: Box::new(NoAuth),
        }
    }

    pub fn from_settings(settings: ClientSettings) -> Result<Self, ConfigError> {
        let url = Url::parse(&settings.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;
        let mut config = Self::with_query(url, &settings.query)?;
        config.default_body_params = settings.default_body_params;
        config.body_format = settings.body_format;
        if let Some(auth) = settings.auth {
            config.set_auth_strategy(&auth.strategy, auth.credentials)?;
        }
        Ok(config)
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), ConfigError> {
        self.base_url = BaseUrl::parse(base_url)?;
        Ok(())
    }

    pub fn default_body_params(&self) -> &Params {
        &self.default_body_params
    }

    pub fn set_default_body_params(&mut self, params: Params) {
        self.default_body_params = params;
    }

    /// Add or update one default body parameter, keeping the others.
    pub fn set_default_body_param(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.default_body_params.insert(key.into(), value.into());
    }

    pub fn remove_default_body_param(&mut self, key: &str) -> Option<Value> {
        self.default_body_params.remove(key)
    }

    /// The body format in effect; `serialized` unless one was set.
    pub fn body_format(&self) -> BodyFormat {
        self.body_format.unwrap_or_default()
    }

    /// Set the body format by name. Anything other than `serialized` or
    /// `json-encoded` is rejected and leaves the current format in place.
    pub fn set_body_format(&mut self, mode: &str) -> Result<(), ConfigError> {
        self.body_format = Some(mode.parse()?);
        Ok(())
    }

    pub fn with_body_format(mut self, format: BodyFormat) -> Self {
        self.body_format = Some(format);
        self
    }

    pub fn clear_body_format(&mut self) {
        self.body_format = None;
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn set_transform<F>(&mut self, transform: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    pub fn auth(&self) -> &dyn Authenticator {
        self.auth.as_ref()
    }

    pub fn set_auth(&mut self, auth: Box<dyn Authenticator>) {
        self.auth = auth;
    }

    /// Select a built-in strategy by name; see `auth::from_config`.
    pub fn set_auth_strategy(&mut self, name: &str, credentials: Value) -> Result<(), ConfigError> {
        self.auth = auth::from_config(name, credentials)?;
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.to_string())
            .field("default_body_params", &self.default_body_params)
            .field("body_format", &self.body_format)
            .field("has_transform", &self.transform.is_some())
            .field("auth", &self.auth)
            .finish()
    }
}

/// Declarative client settings.
///
/// ```json
/// {
///   "base_url": "https://api.example.com/v1?api_key=k",
///   "query": {"lang": "en"},
///   "default_body_params": {"app": "demo"},
///   "body_format": "json-encoded",
///   "auth": {"strategy": "basic", "credentials": {"username": "u", "password": "p"}}
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    pub base_url: String,
    /// Extra "send on every request" query parameters.
    #[serde(default)]
    pub query: Params,
    #[serde(default)]
    pub default_body_params: Params,
    #[serde(default)]
    pub body_format: Option<BodyFormat>,
    #[serde(default)]
    pub auth: Option<AuthSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    pub strategy: String,
    #[serde(default)]
    pub credentials: Value,
}

impl ClientSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidSettings(e.to_string()))
    }
}
