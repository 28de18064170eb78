//! Error types for the JSON API client.
//!
//! # Design
//! Only configuration and usage mistakes are errors. Everything that can go
//! wrong with an actual request (the connection drops, the server answers
//! 4xx/5xx, the body is not JSON) is carried on the returned `Response`
//! instead, so callers always get to inspect what came back.

use thiserror::Error;

/// Invalid configuration, rejected at the point of assignment or construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL could not be parsed or cannot act as a base for
    /// relative resolution (e.g. `mailto:`).
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Body format mode other than `serialized` or `json-encoded`.
    #[error("unrecognized body format `{0}` (expected `serialized` or `json-encoded`)")]
    InvalidBodyFormat(String),

    #[error("unknown authentication strategy `{0}`")]
    UnknownAuthStrategy(String),

    /// The credential payload does not have the shape the strategy needs.
    #[error("invalid credentials for {strategy} authentication: {reason}")]
    InvalidCredentials {
        strategy: &'static str,
        reason: String,
    },

    /// Declarative settings could not be deserialized.
    #[error("invalid client settings: {0}")]
    InvalidSettings(String),
}

/// Errors returned by `ApiClient` before any network activity happens.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The method is not one of GET, POST, PUT, DELETE or HEAD.
    #[error("HTTP method `{0}` is not implemented")]
    UnsupportedMethod(String),

    /// The path token could not be turned into an absolute URL.
    #[error("cannot resolve request path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The request body could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The authentication strategy could not sign the request.
    #[error("failed to sign request: {0}")]
    Signing(String),
}
