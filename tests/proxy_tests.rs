//! End-to-end router tests: authentication, listing, forwarding, and the
//! redirect fallback, with wiremock standing in for upstream sources.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use llm_gateway_rust::core::config::{AppConfig, FallbackModel, ServerConfig};
use llm_gateway_rust::core::retry::RetryPolicy;
use llm_gateway_rust::services::registry::ProviderSource;
use llm_gateway_rust::{api, AppState, SourceRegistry};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROXY_SECRET: &str = "secret123";
const UPSTREAM_KEY: &str = "upstream-key";
const REDIRECT_URL: &str = "https://fallback.example.com/";

fn test_state(
    base_url: &str,
    secret: Option<&str>,
    fallback_models: Vec<FallbackModel>,
) -> Arc<AppState> {
    let config = AppConfig {
        upstream_base_urls: vec![base_url.to_string()],
        proxy_auth_key: secret.map(str::to_string),
        redirect_url: REDIRECT_URL.to_string(),
        fallback_models,
        server: ServerConfig::default(),
        request_timeout_secs: 30,
    };
    let registry = SourceRegistry::new(vec![ProviderSource {
        base_url: base_url.to_string(),
        api_key: UPSTREAM_KEY.to_string(),
    }]);
    Arc::new(AppState::new(
        config,
        registry,
        reqwest::Client::new(),
        RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        },
    ))
}

async fn mount_models(server: &MockServer, ids: &[&str]) {
    let data: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": data})))
        .mount(server)
        .await;
}

fn get(path: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, auth: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_value(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_options_bypasses_auth_with_204() {
    let server = MockServer::start().await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/v1/chat/completions")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_missing_proxy_secret_fails_closed() {
    let server = MockServer::start().await;
    let app = api::router(test_state(&server.uri(), None, vec![]));

    let response = app.oneshot(get("/v1/models", Some(PROXY_SECRET))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_wrong_bearer_token_is_401() {
    let server = MockServer::start().await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app.oneshot(get("/v1/models", Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_authorization_header_is_401() {
    let server = MockServer::start().await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app.oneshot(get("/v1/models", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_models_returns_sorted_catalog() {
    let server = MockServer::start().await;
    mount_models(&server, &["zulu", "alpha"]).await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app.oneshot(get("/v1/models", Some(PROXY_SECRET))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // CORS headers are stamped on routed responses too
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let body = body_value(response).await;
    assert_eq!(body["object"], "list");
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["alpha", "zulu"]);
}

#[tokio::test]
async fn test_unknown_model_is_404_with_no_outbound_call() {
    let server = MockServer::start().await;
    mount_models(&server, &["real-model"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app
        .oneshot(post_json(
            "/v1/chat/completions",
            Some(PROXY_SECRET),
            &json!({"model": "ghost-model"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forward_rewrites_path_credentials_and_model() {
    let server = MockServer::start().await;
    mount_models(&server, &["openai"]).await;
    // The upstream must see: the /v1 prefix stripped, its own credential,
    // and the body unchanged except for the model field
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer upstream-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "model": "openai",
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.5
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-upstream-marker", "present")
                .set_body_json(json!({"id": "chatcmpl-1", "object": "chat.completion"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app
        .oneshot(post_json(
            "/v1/chat/completions",
            Some(PROXY_SECRET),
            &json!({
                "model": "openai",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Upstream response headers are relayed
    assert_eq!(response.headers()["x-upstream-marker"], "present");
    let body = body_value(response).await;
    assert_eq!(body["id"], "chatcmpl-1");
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let server = MockServer::start().await;
    mount_models(&server, &["openai"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": "rate limited"})),
        )
        .mount(&server)
        .await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app
        .oneshot(post_json(
            "/v1/chat/completions",
            Some(PROXY_SECRET),
            &json!({"model": "openai"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_value(response).await;
    assert_eq!(body["error"], "rate limited");
}

#[tokio::test]
async fn test_invalid_json_body_is_400() {
    let server = MockServer::start().await;
    mount_models(&server, &["openai"]).await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("authorization", format!("Bearer {}", PROXY_SECRET))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_model_field_is_400() {
    let server = MockServer::start().await;
    mount_models(&server, &["openai"]).await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app
        .oneshot(post_json(
            "/v1/chat/completions",
            Some(PROXY_SECRET),
            &json!({"messages": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unrecognized_path_redirects() {
    let server = MockServer::start().await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app.oneshot(get("/somewhere", Some(PROXY_SECRET))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], REDIRECT_URL);
}

#[tokio::test]
async fn test_unrecognized_path_still_requires_auth() {
    let server = MockServer::start().await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let response = app.oneshot(get("/somewhere", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_first_requests_share_one_bootstrap() {
    let server = MockServer::start().await;
    let data = json!({"data": [{"id": "openai"}]});
    // Exactly one discovery call no matter how many requests race it
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data))
        .expect(1)
        .mount(&server)
        .await;
    let app = api::router(test_state(&server.uri(), Some(PROXY_SECRET), vec![]));

    let requests = (0..8).map(|_| {
        app.clone()
            .oneshot(get("/v1/models", Some(PROXY_SECRET)))
    });
    let responses = futures::future::join_all(requests).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_forwarding_transport_failure_is_500_with_cause() {
    // Unroutable source; the catalog still knows the model via fallback
    let dead_url = "http://127.0.0.1:1";
    let fallback = vec![FallbackModel {
        id: "openai".to_string(),
        source_key: dead_url.to_string(),
    }];
    let app = api::router(test_state(dead_url, Some(PROXY_SECRET), fallback));

    let response = app
        .oneshot(post_json(
            "/v1/chat/completions",
            Some(PROXY_SECRET),
            &json!({"model": "openai"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_value(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(
        message.starts_with("Failed to forward request"),
        "unexpected message: {}",
        message
    );
}
