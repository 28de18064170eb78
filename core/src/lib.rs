//! Convenience layer for calling JSON HTTP APIs.
//!
//! # Overview
//! `ApiClient` resolves request paths against a configured base URL, merges
//! default and per-call parameters, serializes bodies as forms or JSON,
//! attaches credentials through a pluggable `Authenticator`, hands the
//! request to a `Transport`, and wraps what comes back in a `Response` that
//! decodes JSON lazily.
//!
//! # Design
//! - The core never opens a socket itself: `Transport::perform` is the only
//!   I/O seam, and `build_request` / `parse_response` let a host drive the
//!   round trip on its own.
//! - Only configuration and usage mistakes are `Err`. Transport faults,
//!   non-2xx statuses and non-JSON bodies are data on `Response`.
//! - Base-URL query parameters are sent on every request, always in the
//!   query string. Per-call parameters go to the query for GET, HEAD and
//!   DELETE and into the body for POST and PUT.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod resolver;
pub mod response;
pub mod serializer;
pub mod transport;

pub use auth::{Authenticator, BasicAuth, NoAuth, OAuth1Auth, OAuth2Auth};
pub use client::ApiClient;
pub use config::{ClientConfig, ClientSettings};
pub use error::{ApiError, ConfigError};
pub use http::{Body, HttpMethod, HttpRequest, RawResponse};
pub use params::Params;
pub use resolver::{BaseUrl, Target};
pub use response::{ContentError, DecodeError, Response, Transform};
pub use serializer::BodyFormat;
pub use transport::{Transport, UreqTransport};
