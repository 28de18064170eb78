//! Request body serialization.
//!
//! Two body formats exist: `serialized` hands the flat parameter mapping to
//! the transport as a form body, `json-encoded` turns it into a JSON document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::{ApiError, ConfigError};
use crate::http::Body;
use crate::params::Params;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// How request bodies are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyFormat {
    #[default]
    Serialized,
    JsonEncoded,
}

impl BodyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyFormat::Serialized => "serialized",
            BodyFormat::JsonEncoded => "json-encoded",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            BodyFormat::Serialized => FORM_CONTENT_TYPE,
            BodyFormat::JsonEncoded => JSON_CONTENT_TYPE,
        }
    }
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serialized" => Ok(BodyFormat::Serialized),
            "json-encoded" => Ok(BodyFormat::JsonEncoded),
            other => Err(ConfigError::InvalidBodyFormat(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for BodyFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A body ready for the transport, with the content type it must be sent as.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedBody {
    pub body: Body,
    pub content_type: &'static str,
}

/// Serialize merged body parameters. Returns `None` for an empty mapping,
/// which is sent without a body at all.
pub fn serialize_body(
    params: &Params,
    format: BodyFormat,
) -> Result<Option<SerializedBody>, ApiError> {
    if params.is_empty() {
        return Ok(None);
    }
    let body = match format {
        BodyFormat::Serialized => Body::Form(params.clone()),
        BodyFormat::JsonEncoded => Body::Json(
            serde_json::to_string(params).map_err(|e| ApiError::SerializationError(e.to_string()))?,
        ),
    };
    Ok(Some(SerializedBody {
        body,
        content_type: format.content_type(),
    }))
}
