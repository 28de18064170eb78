//! OAuth 2.0 access-token authentication.

use serde::Deserialize;
use serde_json::Value;

use super::{AuthContext, Authenticator};
use crate::error::{ApiError, ConfigError};

/// Where the access token travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPlacement {
    /// `Authorization: <token_type> <token>`.
    #[default]
    Header,
    /// `access_token=<token>` on the query string.
    Query,
}

#[derive(Deserialize)]
struct TokenObject {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    placement: TokenPlacement,
}

#[derive(Clone)]
pub struct OAuth2Auth {
    access_token: String,
    token_type: String,
    placement: TokenPlacement,
}

impl std::fmt::Debug for OAuth2Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Auth")
            .field("token_type", &self.token_type)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

impl OAuth2Auth {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            placement: TokenPlacement::Header,
        }
    }

    pub fn with_placement(mut self, placement: TokenPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Accepts either a bare token string or an object with `access_token`
    /// and optional `token_type` / `placement`.
    pub fn from_token_object(token: Value) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidCredentials {
            strategy: "oauth2",
            reason,
        };
        let object = match token {
            Value::String(access_token) => TokenObject {
                access_token,
                token_type: None,
                placement: TokenPlacement::Header,
            },
            other @ Value::Object(_) => {
                serde_json::from_value(other).map_err(|e| invalid(e.to_string()))?
            }
            _ => return Err(invalid("expected a token string or object".to_string())),
        };
        if object.access_token.is_empty() {
            return Err(invalid("access token is empty".to_string()));
        }
        // Token endpoints commonly answer with a lowercase `bearer`.
        let token_type = match object.token_type.as_deref() {
            None => "Bearer".to_string(),
            Some(t) if t.eq_ignore_ascii_case("bearer") => "Bearer".to_string(),
            Some(t) => t.to_string(),
        };
        Ok(Self {
            access_token: object.access_token,
            token_type,
            placement: object.placement,
        })
    }
}

impl Authenticator for OAuth2Auth {
    fn scheme(&self) -> &'static str {
        "oauth2"
    }

    fn augment(&self, ctx: &mut AuthContext) -> Result<(), ApiError> {
        match self.placement {
            TokenPlacement::Header => {
                ctx.set_header(
                    "Authorization",
                    format!("{} {}", self.token_type, self.access_token),
                );
            }
            TokenPlacement::Query => {
                let kept: Vec<(String, String)> = ctx
                    .url
                    .query_pairs()
                    .into_owned()
                    .filter(|(k, _)| k != "access_token")
                    .collect();
                ctx.url.set_query(None);
                ctx.url
                    .query_pairs_mut()
                    .extend_pairs(&kept)
                    .append_pair("access_token", &self.access_token);
            }
        }
        Ok(())
    }
}
