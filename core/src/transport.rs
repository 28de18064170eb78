//! The network seam.
//!
//! # Design
//! `Transport` is the only place I/O happens. The core hands it a finished
//! `HttpRequest` and expects a `RawResponse` back; connection pooling,
//! redirects, retries and timeouts are the transport's business.
//!
//! `UreqTransport` is a blocking implementation on top of `ureq`. Any
//! closure `Fn(&HttpRequest) -> RawResponse` is also a transport, which is
//! how hosts that do their own I/O (and the unit tests) plug in.

use tracing::warn;

use crate::http::{HttpMethod, HttpRequest, RawResponse};

pub trait Transport {
    /// Perform one synchronous round trip. Never fails: network faults are
    /// reported through `RawResponse::transport_failure`.
    fn perform(&self, request: &HttpRequest) -> RawResponse;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> RawResponse,
{
    fn perform(&self, request: &HttpRequest) -> RawResponse {
        self(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent is configured so 4xx/5xx statuses come back as responses
/// rather than errors; status interpretation belongs to `Response`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. It should have
    /// `http_status_as_error(false)` set.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn perform(&self, request: &HttpRequest) -> RawResponse {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
            HttpMethod::Head => with_headers(self.agent.head(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            HttpMethod::Post | HttpMethod::Put => {
                let builder = if request.method == HttpMethod::Post {
                    self.agent.post(url)
                } else {
                    self.agent.put(url)
                };
                let builder = with_headers(builder, &request.headers);
                match &request.body {
                    Some(body) => builder.send(&body.to_bytes()[..]),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method, url, error = %e, "transport failure");
                return RawResponse::transport_failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        match response.body_mut().read_to_vec() {
            Ok(body) => RawResponse::new(status, headers, body),
            Err(e) => {
                warn!(method = %request.method, url, status, error = %e, "failed to read response body");
                RawResponse::transport_failure(e.to_string())
            }
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
