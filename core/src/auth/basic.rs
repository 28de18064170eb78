//! HTTP Basic authentication.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;

use super::{AuthContext, Authenticator};
use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Sends `Authorization: Basic base64(username:password)`.
#[derive(Clone)]
pub struct BasicAuth {
    header: String,
    username: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let encoded = BASE64_STANDARD.encode(format!("{username}:{}", password.into()));
        Self {
            header: format!("Basic {encoded}"),
            username,
        }
    }
}

// The header embeds the password; keep it out of debug output.
impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Authenticator for BasicAuth {
    fn scheme(&self) -> &'static str {
        "basic"
    }

    fn augment(&self, ctx: &mut AuthContext) -> Result<(), ApiError> {
        ctx.set_header("Authorization", self.header.clone());
        Ok(())
    }
}
