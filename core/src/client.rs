//! The client facade.
//!
//! # Design
//! `ApiClient` owns a `ClientConfig` and a `Transport`. Every verb goes
//! through the same fixed sequence:
//!
//! 1. resolve the path and parameters against the base URL,
//! 2. let the authentication strategy augment the resolved request,
//! 3. serialize the body,
//! 4. hand the request to the transport,
//! 5. wrap the raw response.
//!
//! Authentication comes after resolution because a signing strategy such as
//! OAuth1 needs the final URL, query and body of the request it signs.
//!
//! Steps 1-3 are exposed as `build_request` and step 5 as `parse_response`,
//! so a host that performs I/O itself can skip the transport entirely.
//! The client holds no locks; concurrent mutation of one instance is the
//! owner's problem.

use tracing::{debug, instrument, Span};

use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, RawResponse};
use crate::params::Params;
use crate::resolver::{self, Target};
use crate::response::Response;
use crate::serializer;
use crate::transport::Transport;

#[derive(Debug)]
pub struct ApiClient<T> {
    config: ClientConfig,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Mutable access for changing configuration between requests.
    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get(
        &self,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Get, target, params)
    }

    pub fn post(
        &self,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Post, target, params)
    }

    pub fn put(
        &self,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Put, target, params)
    }

    pub fn delete(
        &self,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Delete, target, params)
    }

    pub fn head(
        &self,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Head, target, params)
    }

    /// Issue a request with the method given by name. Unsupported methods
    /// fail before anything is resolved or sent.
    pub fn request(
        &self,
        method: &str,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        let method: HttpMethod = method.parse()?;
        self.send(method, target, params)
    }

    /// Build, perform and wrap one request.
    ///
    /// Only configuration and usage problems are `Err`; any outcome of the
    /// round trip itself is reported through the returned `Response`.
    #[instrument(
        name = "api_request",
        skip_all,
        fields(
            http.method = %method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
        )
    )]
    pub fn send(
        &self,
        method: HttpMethod,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<Response, ApiError> {
        let request = self.build_request(method, target, params)?;
        Span::current().record("http.url", request.url.as_str());

        let raw = self.transport.perform(&request);
        Span::current().record("http.status_code", raw.status);
        debug!(
            status = raw.status,
            transport_ok = raw.transport_ok(),
            bytes = raw.body.len(),
            "response received"
        );
        Ok(self.parse_response(raw))
    }

    /// Resolve, authenticate and serialize a request without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        target: impl Into<Target>,
        params: impl Into<Option<Params>>,
    ) -> Result<HttpRequest, ApiError> {
        let target = target.into();
        let params = params.into();
        let spec = resolver::resolve(
            self.config.base_url(),
            self.config.default_body_params(),
            method,
            &target,
            params.as_ref(),
        )?;
        debug!(%method, url = %spec.url, "resolved request");

        let body_format = self.config.body_format();
        let mut ctx = AuthContext::new(spec.method, spec.url, spec.body, body_format);
        let auth = self.config.auth();
        auth.augment(&mut ctx)?;
        debug!(scheme = auth.scheme(), "applied authentication");

        let mut headers = ctx.headers;
        let body = match ctx.body {
            Some(params) => serializer::serialize_body(&params, body_format)?.map(|serialized| {
                headers.push(("Content-Type".to_string(), serialized.content_type.to_string()));
                serialized.body
            }),
            None => None,
        };

        Ok(HttpRequest {
            method: ctx.method,
            url: ctx.url,
            headers,
            body,
        })
    }

    /// Wrap a raw response with the configured default transform.
    pub fn parse_response(&self, raw: RawResponse) -> Response {
        Response::new(raw, self.config.transform().cloned())
    }
}
