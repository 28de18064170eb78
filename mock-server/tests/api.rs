use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Item};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reports_query_and_headers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/echo?a=1&tag=x&tag=y")
                .header(http::header::AUTHORIZATION, "Bearer t")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/v1/echo");
    assert_eq!(echoed["query"], json!({"a": "1", "tag": ["x", "y"]}));
    assert_eq!(echoed["authorization"], "Bearer t");
    assert_eq!(echoed["body"], Value::Null);
}

#[tokio::test]
async fn echo_decodes_json_and_form_bodies() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/echo", r#"{"n":1}"#))
        .await
        .unwrap();
    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["body"], json!({"n": 1}));
    assert_eq!(echoed["content_type"], "application/json");

    let resp = app()
        .oneshot(form_request("PUT", "/v1/echo", "n=1&s=a+b"))
        .await
        .unwrap();
    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["method"], "PUT");
    assert_eq!(echoed["body"], json!({"n": "1", "s": "a b"}));
}

// --- fixed responses ---

#[tokio::test]
async fn unknown_route_is_json_404() {
    let resp = app().oneshot(empty_request("GET", "/v1/missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"error": "not found"}));
}

#[tokio::test]
async fn plain_is_not_json() {
    let resp = app().oneshot(empty_request("GET", "/v1/plain")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"not json");
}

// --- items ---

#[tokio::test]
async fn create_item_requires_a_name() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/items", r#"{"tags":["x"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn create_item_from_a_form() {
    let resp = app()
        .oneshot(form_request("POST", "/v1/items", "name=Widget&tags=a&tags=b"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    let item: Item = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(item.name, "Widget");
    assert_eq!(item.tags, vec!["a", "b"]);
}

#[tokio::test]
async fn get_item_bad_uuid_returns_400() {
    let resp = app()
        .oneshot(empty_request("GET", "/v1/items/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_item_not_found() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/v1/items/00000000-0000-0000-0000-000000000000",
            r#"{"name":"Nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn item_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/v1/items", r#"{"name":"Bolt","tags":["m4"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    let created: Item = serde_json::from_value(body["data"].clone()).unwrap();
    let id = created.id;

    // a second item so the filter has something to exclude
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/v1/items", r#"{"name":"Nut"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // list with filter
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/v1/items?name=Bolt"))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    let listed: Vec<Item> = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(listed, vec![created.clone()]);

    // update name only; tags unchanged
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", &format!("/v1/items/{id}"), r#"{"name":"Screw"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"]["name"], "Screw");
    assert_eq!(body["data"]["tags"], json!(["m4"]));

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/v1/items/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/v1/items/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
