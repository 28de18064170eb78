//! Local JSON API used by the client's integration tests.
//!
//! Everything lives under `/v1`:
//! - `/v1/echo` answers any method with a JSON description of the request
//!   it received (method, path, query, content type, authorization, body).
//! - `/v1/items` is a small in-memory collection whose responses are wrapped
//!   in a `{"data": ...}` envelope.
//! - `/v1/plain` returns a non-JSON body.
//! - Anything else is `404 {"error":"not found"}`.
//!
//! Request bodies are accepted both JSON- and form-encoded.

use std::{borrow::Cow, collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListFilter {
    pub name: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

type Failure = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/v1/echo", any(echo))
        .route("/v1/plain", get(plain))
        .route("/v1/items", get(list_items).post(create_item))
        .route("/v1/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .fallback(not_found)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "error": message })))
}

async fn not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, "not found")
}

async fn plain() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "not json")
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let query = uri
        .query()
        .map(|q| pairs_to_map(url::form_urlencoded::parse(q.as_bytes())))
        .unwrap_or_default();
    let body = if body.is_empty() {
        Value::Null
    } else {
        decode_body(&headers, &body)
            .map(Value::Object)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": query,
        "content_type": header_str(&headers, header::CONTENT_TYPE),
        "authorization": header_str(&headers, header::AUTHORIZATION),
        "body": body,
    }))
}

async fn list_items(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Value> {
    let items = db.read().await;
    let mut matching: Vec<&Item> = items
        .values()
        .filter(|item| filter.name.as_ref().is_none_or(|name| &item.name == name))
        .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));
    Json(json!({ "data": matching }))
}

async fn create_item(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let fields = decode_body(&headers, &body)?;
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| failure(StatusCode::UNPROCESSABLE_ENTITY, "name is required"))?;
    let item = Item {
        id: Uuid::new_v4(),
        name: name.to_string(),
        tags: tags_from(&fields),
    };
    debug!(id = %item.id, name = %item.name, "created item");
    db.write().await.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": item }))))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Value>, Failure> {
    let items = db.read().await;
    items
        .get(&id)
        .map(|item| Json(json!({ "data": item })))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "not found"))
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, Failure> {
    let fields = decode_body(&headers, &body)?;
    let mut items = db.write().await;
    let item = items
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "not found"))?;
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        item.name = name.to_string();
    }
    if fields.contains_key("tags") {
        item.tags = tags_from(&fields);
    }
    Ok(Json(json!({ "data": item })))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, Failure> {
    let mut items = db.write().await;
    items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "not found"))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Value {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

/// Decode a JSON object or form body into a field map. An empty body is an
/// empty map.
fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, Failure> {
    if body.is_empty() {
        return Ok(Map::new());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.starts_with("application/json") {
        match serde_json::from_slice(body) {
            Ok(Value::Object(fields)) => Ok(fields),
            _ => Err(failure(StatusCode::BAD_REQUEST, "body must be a JSON object")),
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Ok(pairs_to_map(url::form_urlencoded::parse(body)))
    } else {
        Err(failure(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported content type"))
    }
}

/// Single values become strings, repeated keys become arrays.
fn pairs_to_map<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value.into_owned());
        match map.get_mut(&*key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

fn tags_from(fields: &Map<String, Value>) -> Vec<String> {
    match fields.get("tags") {
        Some(Value::String(tag)) => vec![tag.clone()],
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
