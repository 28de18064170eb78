//! OAuth 1.0a request signing with HMAC-SHA1.
//!
//! The signature base string is `METHOD&enc(base URL)&enc(parameters)` where
//! the parameters are the query string, form body parameters (only when the
//! body is form-encoded) and the `oauth_*` protocol parameters, each
//! percent-encoded and sorted. The signing key is
//! `enc(consumer_secret)&enc(token_secret)`.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use ring::hmac;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::{AuthContext, Authenticator};
use crate::error::ApiError;
use crate::params;
use crate::serializer::BodyFormat;

/// Everything except the RFC 3986 unreserved characters.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

#[derive(Clone, Deserialize)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub token_secret: String,
}

#[derive(Clone)]
pub struct OAuth1Auth {
    credentials: OAuth1Credentials,
}

impl std::fmt::Debug for OAuth1Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Auth")
            .field("consumer_key", &self.credentials.consumer_key)
            .finish_non_exhaustive()
    }
}

impl OAuth1Auth {
    pub fn new(credentials: OAuth1Credentials) -> Self {
        Self { credentials }
    }

    /// Produce the `Authorization` header value for `ctx` with a fixed nonce
    /// and timestamp.
    pub fn authorization(&self, ctx: &AuthContext, nonce: &str, timestamp: u64) -> String {
        let mut oauth = self.protocol_params(nonce, timestamp);
        let base = self.signature_base(ctx, &oauth);
        oauth.push(("oauth_signature".to_string(), self.sign(&base)));
        oauth.sort();

        let fields: Vec<String> = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }

    /// The signature base string for `ctx` with a fixed nonce and timestamp.
    pub fn base_string(&self, ctx: &AuthContext, nonce: &str, timestamp: u64) -> String {
        self.signature_base(ctx, &self.protocol_params(nonce, timestamp))
    }

    fn protocol_params(&self, nonce: &str, timestamp: u64) -> Vec<(String, String)> {
        let mut oauth = vec![
            ("oauth_consumer_key".to_string(), self.credentials.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), VERSION.to_string()),
        ];
        if !self.credentials.token.is_empty() {
            oauth.push(("oauth_token".to_string(), self.credentials.token.clone()));
        }
        oauth
    }

    fn signature_base(&self, ctx: &AuthContext, oauth: &[(String, String)]) -> String {
        let mut pairs: Vec<(String, String)> = ctx
            .url
            .query_pairs()
            .map(|(k, v)| (encode(&k), encode(&v)))
            .collect();
        if ctx.body_format == BodyFormat::Serialized {
            if let Some(body) = &ctx.body {
                pairs.extend(
                    params::to_pairs(body)
                        .iter()
                        .map(|(k, v)| (encode(k), encode(v))),
                );
            }
        }
        pairs.extend(oauth.iter().map(|(k, v)| (encode(k), encode(v))));
        pairs.sort();

        let normalized: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!(
            "{}&{}&{}",
            ctx.method.as_str(),
            encode(&base_url(&ctx.url)),
            encode(&normalized.join("&"))
        )
    }

    fn sign(&self, base: &str) -> String {
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.token_secret)
        );
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
        BASE64_STANDARD.encode(hmac::sign(&key, base.as_bytes()).as_ref())
    }
}

impl Authenticator for OAuth1Auth {
    fn scheme(&self) -> &'static str {
        "oauth1"
    }

    fn augment(&self, ctx: &mut AuthContext) -> Result<(), ApiError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Signing(e.to_string()))?
            .as_secs();
        let nonce = Uuid::new_v4().simple().to_string();
        let header = self.authorization(ctx, &nonce, timestamp);
        ctx.set_header("Authorization", header);
        Ok(())
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE).to_string()
}

/// Scheme, host, non-default port and path; no query or fragment.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
        None => format!("{}://{host}{}", url.scheme(), url.path()),
    }
}
