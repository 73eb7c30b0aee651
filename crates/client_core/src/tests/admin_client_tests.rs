use super::*;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct RecordedRequest {
    route: String,
    session: Option<String>,
    language: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ServerState {
    async fn record(&self, route: impl Into<String>, headers: &HeaderMap, body: Option<Value>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().await.push(RecordedRequest {
            route: route.into(),
            session: header("x-session"),
            language: header("x-language"),
            body,
        });
    }
}

async fn get_node(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    state.record("GET node", &headers, None).await;
    Json(json!({"name": "srv1", "hostname": "srv1.example.org", "enable_signup": true}))
}

async fn put_node(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record("PUT node", &headers, Some(body.clone())).await;
    Json(body)
}

async fn get_contexts(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    state.record("GET contexts", &headers, None).await;
    Json(json!([{"id": 1, "name": "first"}, {"id": 2, "name": "second"}]))
}

async fn put_context(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .record(format!("PUT contexts/{id}"), &headers, Some(body.clone()))
        .await;
    Json(body)
}

async fn get_receivers(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    state.record("GET receivers", &headers, None).await;
    Json(json!([
        {"id": "r-1", "name": "Alice"},
        {"id": "r-2", "name": "Bob", "pgp_key_public": null, "contexts": []}
    ]))
}

async fn put_receiver(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .record(format!("PUT receivers/{id}"), &headers, Some(body.clone()))
        .await;
    Json(body)
}

async fn spawn_admin_server() -> Result<(String, ServerState), Box<dyn std::error::Error>> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/admin/node", get(get_node).put(put_node))
        .route("/api/admin/contexts", get(get_contexts))
        .route("/api/admin/contexts/:id", put(put_context))
        .route("/api/admin/receivers", get(get_receivers))
        .route("/api/admin/receivers/:id", put(put_receiver))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

async fn spawn_failing_server(status: StatusCode, body: &'static str) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(
        "/api/admin/node",
        get(move || async move { (status, body) }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(server_url: &str) -> AdminApiClient {
    let mut config = AdminApiConfig::new(server_url);
    config.session = Some("session-abc".to_string());
    config.language = Some("en".to_string());
    AdminApiClient::new(config).expect("client")
}

#[tokio::test]
async fn fetches_node_with_session_and_language_headers() {
    let (server_url, state) = spawn_admin_server().await.expect("spawn server");
    let client = client_for(&server_url);

    let node = NodeResource::get(&client).await.expect("node");
    assert_eq!(node.name, "srv1");
    assert_eq!(node.hostname(), Some("srv1.example.org"));

    let requests = state.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].route, "GET node");
    assert_eq!(requests[0].session.as_deref(), Some("session-abc"));
    assert_eq!(requests[0].language.as_deref(), Some("en"));
}

#[tokio::test]
async fn node_save_resubmits_unmodeled_fields() {
    let (server_url, state) = spawn_admin_server().await.expect("spawn server");
    let client = client_for(&server_url);

    let mut node = NodeResource::get(&client).await.expect("node");
    node.name = "renamed".to_string();
    let saved = NodeResource::save(&client, &node).await.expect("save");
    assert_eq!(saved.name, "renamed");

    let requests = state.requests.lock().await;
    let body = requests
        .iter()
        .find(|request| request.route == "PUT node")
        .and_then(|request| request.body.clone())
        .expect("put body");
    assert_eq!(body["name"], json!("renamed"));
    assert_eq!(body["enable_signup"], json!(true));
}

#[tokio::test]
async fn contexts_save_puts_each_element_by_id() {
    let (server_url, state) = spawn_admin_server().await.expect("spawn server");
    let client = client_for(&server_url);

    let contexts = ContextsResource::query(&client).await.expect("contexts");
    assert_eq!(contexts.len(), 2);
    let saved = ContextsResource::save(&client, &contexts)
        .await
        .expect("save");
    assert_eq!(saved, contexts);

    let requests = state.requests.lock().await;
    let mut routes: Vec<_> = requests
        .iter()
        .filter(|request| request.route.starts_with("PUT"))
        .map(|request| request.route.clone())
        .collect();
    routes.sort();
    assert_eq!(routes, vec!["PUT contexts/1", "PUT contexts/2"]);
}

#[tokio::test]
async fn receivers_query_decodes_string_ids() {
    let (server_url, _state) = spawn_admin_server().await.expect("spawn server");
    let client = client_for(&server_url);

    let receivers = ReceiversResource::query(&client).await.expect("receivers");
    assert_eq!(receivers.len(), 2);
    assert_eq!(receivers[0].id.to_string(), "r-1");
    assert_eq!(receivers[0].name(), Some("Alice"));
}

#[tokio::test]
async fn receivers_save_puts_each_element_with_null_and_empty_fields() {
    let (server_url, state) = spawn_admin_server().await.expect("spawn server");
    let client = client_for(&server_url);

    let receivers = ReceiversResource::query(&client).await.expect("receivers");
    let saved = ReceiversResource::save(&client, &receivers)
        .await
        .expect("save");
    assert_eq!(saved, receivers);

    let requests = state.requests.lock().await;
    let mut puts: Vec<_> = requests
        .iter()
        .filter(|request| request.route.starts_with("PUT"))
        .collect();
    puts.sort_by(|a, b| a.route.cmp(&b.route));
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].route, "PUT receivers/r-1");
    assert_eq!(puts[1].route, "PUT receivers/r-2");
    assert_eq!(
        puts[1].body,
        Some(json!({"id": "r-2", "name": "Bob", "pgp_key_public": null, "contexts": []}))
    );
}

#[tokio::test]
async fn publishes_events_for_fetch_and_failure() {
    let (server_url, _state) = spawn_admin_server().await.expect("spawn server");
    let client = client_for(&server_url);
    let mut events = client.subscribe_events();

    ContextsResource::query(&client).await.expect("contexts");
    assert_eq!(
        events.recv().await.expect("event"),
        ResourceEvent::Loaded {
            resource: ResourceKind::Contexts,
            items: 2,
        }
    );

    let failing_url = spawn_failing_server(
        StatusCode::UNAUTHORIZED,
        r#"{"error_code": 10, "error_message": "NotAuthenticated"}"#,
    )
    .await;
    let failing = client_for(&failing_url);
    let mut failing_events = failing.subscribe_events();
    let err = NodeResource::get(&failing).await.expect_err("must fail");
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("NotAuthenticated"), "{err}");

    match failing_events.recv().await.expect("event") {
        ResourceEvent::Failed {
            resource,
            operation,
            message,
        } => {
            assert_eq!(resource, ResourceKind::Node);
            assert_eq!(operation, ResourceOperation::Fetch);
            assert!(message.contains("NotAuthenticated"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_reported_as_decode_error() {
    let server_url = spawn_failing_server(StatusCode::OK, "not json").await;
    let client = client_for(&server_url);

    let err = NodeResource::get(&client).await.expect_err("must fail");
    assert!(
        matches!(
            err,
            ResourceError::Decode {
                resource: ResourceKind::Node,
                ..
            }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn rejects_non_http_base_url() {
    let err = AdminApiClient::new(AdminApiConfig::new("ftp://example.org"))
        .err()
        .expect("must fail");
    assert!(matches!(err, ResourceError::InvalidBaseUrl { .. }));
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let client =
        AdminApiClient::new(AdminApiConfig::new("https://example.org/globaleaks/")).expect("client");
    assert_eq!(
        client.endpoint(&["contexts", "a b"]).as_str(),
        "https://example.org/globaleaks/api/admin/contexts/a%20b"
    );
}
