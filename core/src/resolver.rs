//! Resolution of request paths and parameters into a concrete request.
//!
//! # Design
//! The base URL is kept split in two: the URL itself, normalized so its path
//! ends in `/`, and the query parameters it was configured with. Those query
//! parameters are "send on every request" values and are re-applied to every
//! resolved URL, whatever the verb.
//!
//! Per-call parameters are routed by verb: POST and PUT merge them over the
//! default body parameters, every other verb folds them into the query
//! string, replacing same-named pairs from the path. Base query parameters
//! are applied after that, so they win over both, and they never go into a
//! body.

use std::fmt;

use url::Url;

use crate::error::{ApiError, ConfigError};
use crate::http::HttpMethod;
use crate::params::{self, Params};

/// The root URL every relative request path resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    url: Url,
    query: Vec<(String, String)>,
}

impl BaseUrl {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(input).map_err(|e| ConfigError::InvalidBaseUrl {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url)
    }

    /// Build from an already parsed URL. Its own query string becomes the
    /// base query parameters.
    pub fn from_url(mut url: Url) -> Result<Self, ConfigError> {
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: url.to_string(),
                reason: "URL cannot be a base for relative paths".to_string(),
            });
        }
        let query = url.query_pairs().into_owned().collect();
        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { url, query })
    }

    /// The URL-plus-query-map form: `query` is merged over any query string
    /// already on `url`.
    pub fn with_query(url: Url, query: &Params) -> Result<Self, ConfigError> {
        let mut base = Self::from_url(url)?;
        for (key, value) in query {
            upsert(&mut base.query, key, params::value_strings(value));
        }
        Ok(base)
    }

    /// The normalized URL, without the base query parameters.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        write!(f, "{url}")
    }
}

/// What a request is addressed to: a path (relative or absolute) or a URL
/// the caller already built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Path(String),
    Url(Url),
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        Target::Path(path.to_string())
    }
}

impl From<String> for Target {
    fn from(path: String) -> Self {
        Target::Path(path)
    }
}

impl From<&String> for Target {
    fn from(path: &String) -> Self {
        Target::Path(path.clone())
    }
}

impl From<Url> for Target {
    fn from(url: Url) -> Self {
        Target::Url(url)
    }
}

impl From<&Url> for Target {
    fn from(url: &Url) -> Self {
        Target::Url(url.clone())
    }
}

/// A fully resolved request, before authentication and serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: Url,
    /// Merged body parameters. Only ever `Some` for POST and PUT.
    pub body: Option<Params>,
}

/// Resolve `target` against `base` and route `params` by verb.
pub fn resolve(
    base: &BaseUrl,
    default_body: &Params,
    method: HttpMethod,
    target: &Target,
    params: Option<&Params>,
) -> Result<RequestSpec, ApiError> {
    let mut url = match target {
        Target::Url(url) => url.clone(),
        Target::Path(path) => resolve_path(base, path)?,
    };

    let mut query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    let body = if method.carries_body() {
        Some(params::merge(default_body, params))
    } else {
        for (key, value) in params.into_iter().flatten() {
            upsert(&mut query, key, params::value_strings(value));
        }
        None
    };

    // Base query pairs go on last so nothing above can displace them.
    for key in distinct_keys(&base.query) {
        let values = base
            .query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect();
        upsert(&mut query, key, values);
    }

    url.set_query(None);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(&query);
    }

    Ok(RequestSpec { method, url, body })
}

fn resolve_path(base: &BaseUrl, path: &str) -> Result<Url, ApiError> {
    // A leading `/` means "under the base URL", not "at the host root".
    let relative = match path.strip_prefix('/') {
        Some(rest) => format!("./{rest}"),
        None => path.to_string(),
    };
    let invalid = |e: url::ParseError| ApiError::InvalidPath {
        path: path.to_string(),
        reason: e.to_string(),
    };
    match Url::parse(&relative) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.url.join(&relative).map_err(invalid),
        Err(e) => Err(invalid(e)),
    }
}

/// Replace every pair named `key` with one pair per value, appended last.
fn upsert(pairs: &mut Vec<(String, String)>, key: &str, values: Vec<String>) {
    pairs.retain(|(k, _)| k != key);
    pairs.extend(values.into_iter().map(|v| (key.to_string(), v)));
}

fn distinct_keys(pairs: &[(String, String)]) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::new();
    for (key, _) in pairs {
        if !keys.contains(&key.as_str()) {
            keys.push(key);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn base(url: &str) -> BaseUrl {
        BaseUrl::parse(url).unwrap()
    }

    fn resolve_str(
        base_url: &str,
        method: HttpMethod,
        path: &str,
        call: Option<Value>,
    ) -> RequestSpec {
        let call = call.map(params);
        resolve(&base(base_url), &Params::new(), method, &Target::from(path), call.as_ref()).unwrap()
    }

    #[test]
    fn base_path_gains_one_trailing_slash() {
        assert_eq!(base("https://api.example.com/v1").url().path(), "/v1/");
        assert_eq!(base("https://api.example.com/v1/").url().path(), "/v1/");
        assert_eq!(base("https://api.example.com").url().path(), "/");
    }

    #[test]
    fn base_query_is_split_off() {
        let b = base("https://api.example.com/v1?key=k&fmt=json");
        assert_eq!(b.url().as_str(), "https://api.example.com/v1/");
        assert_eq!(
            b.query(),
            &[
                ("key".to_string(), "k".to_string()),
                ("fmt".to_string(), "json".to_string())
            ]
        );
        assert_eq!(b.to_string(), "https://api.example.com/v1/?key=k&fmt=json");
    }

    #[test]
    fn with_query_merges_the_map() {
        let url = Url::parse("https://api.example.com/v1?key=old").unwrap();
        let b = BaseUrl::with_query(url, &params(json!({"key": "new", "v": 2}))).unwrap();
        assert_eq!(
            b.query(),
            &[
                ("key".to_string(), "new".to_string()),
                ("v".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn non_hierarchical_base_is_rejected() {
        let err = BaseUrl::parse("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
        assert!(BaseUrl::parse("not a url").is_err());
    }

    #[test]
    fn get_params_go_to_the_query() {
        let spec = resolve_str(
            "https://api.example.com/v1",
            HttpMethod::Get,
            "/items",
            Some(json!({"q": "x"})),
        );
        assert_eq!(spec.url.as_str(), "https://api.example.com/v1/items?q=x");
        assert!(spec.body.is_none());
    }

    #[test]
    fn relative_path_without_slash_resolves_under_base() {
        let spec = resolve_str("https://api.example.com/v1", HttpMethod::Get, "items/7", None);
        assert_eq!(spec.url.as_str(), "https://api.example.com/v1/items/7");
    }

    #[test]
    fn absolute_target_is_used_directly() {
        let spec = resolve_str(
            "https://api.example.com/v1?key=k",
            HttpMethod::Get,
            "https://other.example.org/x",
            None,
        );
        assert_eq!(spec.url.as_str(), "https://other.example.org/x?key=k");
    }

    #[test]
    fn prebuilt_url_target_keeps_its_query() {
        let target = Target::from(Url::parse("https://other.example.org/x?page=2").unwrap());
        let spec = resolve(
            &base("https://api.example.com"),
            &Params::new(),
            HttpMethod::Delete,
            &target,
            Some(&params(json!({"force": true}))),
        )
        .unwrap();
        assert_eq!(spec.url.as_str(), "https://other.example.org/x?page=2&force=true");
    }

    #[test]
    fn base_query_survives_every_verb() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Head,
            HttpMethod::Delete,
            HttpMethod::Post,
            HttpMethod::Put,
        ] {
            let spec = resolve_str(
                "https://api.example.com/v1?api_key=secret",
                method,
                "/items",
                Some(json!({"q": "x"})),
            );
            let query: Vec<(String, String)> = spec.url.query_pairs().into_owned().collect();
            assert!(
                query.contains(&("api_key".to_string(), "secret".to_string())),
                "{method}: {query:?}"
            );
        }
    }

    #[test]
    fn base_query_overrides_the_path_query() {
        let spec = resolve_str(
            "https://api.example.com/v1?fmt=json",
            HttpMethod::Get,
            "/items?fmt=xml&page=2",
            None,
        );
        assert_eq!(spec.url.as_str(), "https://api.example.com/v1/items?page=2&fmt=json");
    }

    #[test]
    fn call_params_cannot_displace_base_query() {
        for method in [HttpMethod::Get, HttpMethod::Head, HttpMethod::Delete] {
            let spec = resolve_str(
                "https://api.example.com/v1?api_key=k",
                method,
                "/items",
                Some(json!({"api_key": "x", "q": "y"})),
            );
            assert_eq!(
                spec.url.as_str(),
                "https://api.example.com/v1/items?q=y&api_key=k",
                "{method}"
            );
        }
    }

    #[test]
    fn call_params_override_existing_query_keys() {
        let spec = resolve_str(
            "https://api.example.com/v1",
            HttpMethod::Get,
            "/items?page=1&sort=asc",
            Some(json!({"page": 3})),
        );
        assert_eq!(spec.url.as_str(), "https://api.example.com/v1/items?sort=asc&page=3");
    }

    #[test]
    fn delete_and_head_params_never_reach_a_body() {
        for method in [HttpMethod::Delete, HttpMethod::Head] {
            let spec = resolve_str(
                "https://api.example.com",
                method,
                "/items/1",
                Some(json!({"reason": "dup"})),
            );
            assert_eq!(spec.url.as_str(), "https://api.example.com/items/1?reason=dup");
            assert!(spec.body.is_none());
        }
    }

    #[test]
    fn post_params_merge_over_default_body() {
        let defaults = params(json!({"app": "demo", "name": "default"}));
        let spec = resolve(
            &base("https://api.example.com/v1?api_key=k"),
            &defaults,
            HttpMethod::Post,
            &Target::from("/create"),
            Some(&params(json!({"name": "a"}))),
        )
        .unwrap();
        assert_eq!(spec.url.as_str(), "https://api.example.com/v1/create?api_key=k");
        assert_eq!(spec.body.map(Value::Object), Some(json!({"app": "demo", "name": "a"})));
    }

    #[test]
    fn put_without_params_still_sends_defaults() {
        let defaults = params(json!({"app": "demo"}));
        let spec = resolve(
            &base("https://api.example.com"),
            &defaults,
            HttpMethod::Put,
            &Target::from("/things/1"),
            None,
        )
        .unwrap();
        assert_eq!(spec.body, Some(defaults));
    }

    #[test]
    fn default_body_is_ignored_for_get() {
        let defaults = params(json!({"app": "demo"}));
        let spec = resolve(
            &base("https://api.example.com"),
            &defaults,
            HttpMethod::Get,
            &Target::from("/items"),
            None,
        )
        .unwrap();
        assert_eq!(spec.url.as_str(), "https://api.example.com/items");
        assert!(spec.body.is_none());
    }

    #[test]
    fn array_params_repeat_the_key() {
        let spec = resolve_str(
            "https://api.example.com",
            HttpMethod::Get,
            "/search",
            Some(json!({"tag": ["a", "b"]})),
        );
        assert_eq!(spec.url.as_str(), "https://api.example.com/search?tag=a&tag=b");
    }
}
