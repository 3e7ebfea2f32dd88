use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{delete, get, post};
use serde_json::{Value, json};
use tokio::sync::Notify;

use ecowiser_auth::Role;
use ecowiser_client::api::resources::UploadMeta;
use ecowiser_client::types::{CsvTableError, Visibility};
use ecowiser_client::{
    ApiError, Bootstrap, ClientConfig, EcowiserClient, EffectLog, FALLBACK_MESSAGE, GatewayError,
    SessionStore, Upload,
};
use ecowiser_core::{ProjectId, ResourceId};

const GOOD_TOKEN: &str = "good";

#[derive(Clone, Default)]
struct MockState {
    /// When set, `/users/self/` waits for a permit before answering.
    gate: Option<Arc<Notify>>,
    /// Signalled when `/users/self/` has received a request.
    arrived: Arc<Notify>,
    /// `/users/self/` answers 500 for a valid token.
    self_fails: bool,
    /// Number of requests `/users/login/` has received.
    login_calls: Arc<AtomicUsize>,
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(state: MockState) -> Self {
        let app = mock_api(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "success": false, "message": message })))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn authorized(headers: &HeaderMap) -> bool {
    bearer(headers) == Some(GOOD_TOKEN)
}

fn user_json() -> Value {
    json!({
        "id": 1,
        "username": "ada",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "role": "Owner",
        "tenant": 7,
    })
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Reply {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["username"] == "ada" && body["password"] == "secret" {
        ok(json!({ "access": GOOD_TOKEN, "refresh": "r" }))
    } else if body["username"] == "ghost" {
        fail(
            StatusCode::UNAUTHORIZED,
            "No active account found with the given credentials",
        )
    } else {
        fail(StatusCode::BAD_REQUEST, "Invalid credentials")
    }
}

async fn current_user(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    state.arrived.notify_one();
    if let Some(gate) = &state.gate {
        gate.notified().await;
    }
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Token is invalid or expired");
    }
    if state.self_fails {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "success": false })));
    }
    ok(user_json())
}

async fn echo_auth(headers: HeaderMap) -> Reply {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ok(json!(auth))
}

async fn projects(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Authentication credentials were not provided.");
    }
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": [
                { "id": page * 10 + 1, "name": "Solar", "description": "Panels", "created_at": "2024-01-02T03:04:05Z" },
                { "id": page * 10 + 2, "name": "Wind", "description": "" },
            ],
            "pagination": {
                "previous": if page > 1 { json!(page - 1) } else { Value::Null },
                "next": if page < 3 { json!(page + 1) } else { Value::Null },
                "current_page": page,
                "total_pages": 3,
            },
        })),
    )
}

async fn tenant(headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    ok(json!({
        "id": 7,
        "name": "Acme",
        "contact_email": "ops@acme.test",
        "subscription_tier": "Pro",
        "logo": null,
    }))
}

async fn remove_member(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if body["user_email"] == "owner@acme.test" {
        return fail(StatusCode::FORBIDDEN, "Cannot remove the tenant owner");
    }
    (StatusCode::OK, Json(json!({ "success": true, "message": "Member removed" })))
}

/// Echoes what the multipart body contained, as far as the tests care.
async fn upload(headers: HeaderMap, body: Bytes) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let text = String::from_utf8_lossy(&body).to_string();
    ok(json!({
        "id": 99,
        "name": "photo",
        "visibility": "Public",
        "file_size": body.len(),
        "uploaded_by": { "id": 1, "first_name": "Ada", "last_name": "Lovelace" },
        "content_type": content_type,
        "raw": text,
    }))
}

async fn download(headers: HeaderMap, Path(id): Path<i64>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let mut out = HeaderMap::new();
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, out, Vec::new());
    }
    out.insert(header::CONTENT_TYPE, "application/octet-stream".parse().unwrap());
    (StatusCode::OK, out, format!("file-{id}").into_bytes())
}

async fn csv_files(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if query.get("project_id").map(String::as_str) != Some("4") {
        return ok(json!([]));
    }
    ok(json!([
        {
            "id": 11,
            "name": "readings",
            "JSONData": {
                "columns": ["site", "kwh"],
                "rows": [{ "site": "North", "kwh": 12 }, { "site": "South" }],
            },
        },
        { "id": 12, "name": "pending", "JSONData": null },
    ]))
}

async fn soft_fail() -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "success": false, "message": "Quota exceeded" })),
    )
}

async fn html_error() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
}

async fn always_unauthorized() -> Reply {
    fail(StatusCode::UNAUTHORIZED, "Token is invalid or expired")
}

fn mock_api(state: MockState) -> Router {
    Router::new()
        .route("/users/login/", post(login))
        .route("/users/self/", get(current_user))
        .route("/echo-auth/", get(echo_auth))
        .route("/projects/", get(projects))
        .route("/tenants/manage/", get(tenant))
        .route("/tenants/members/", delete(remove_member))
        .route("/resources/upload/", post(upload))
        .route("/resources/media/:id/", get(download))
        .route("/resources/csv/", get(csv_files))
        .route("/soft-fail/", get(soft_fail))
        .route("/html-error/", get(html_error))
        .route("/expired/", get(always_unauthorized))
        .with_state(state)
}

struct Harness {
    _srv: TestServer,
    log: EffectLog,
    session: SessionStore,
    client: EcowiserClient,
}

async fn harness(state: MockState) -> Harness {
    let srv = TestServer::spawn(state).await;
    let log = EffectLog::new();
    let session = SessionStore::in_memory();
    let config = ClientConfig::new(&srv.base_url).unwrap();
    let client = EcowiserClient::new(
        &config,
        session.clone(),
        Arc::new(log.clone()),
        Arc::new(log.clone()),
    )
    .unwrap();
    Harness {
        _srv: srv,
        log,
        session,
        client,
    }
}

fn cached_user() -> ecowiser_auth::UserProfile {
    serde_json::from_value(user_json()).unwrap()
}

#[tokio::test]
async fn bearer_token_is_attached_from_the_session() {
    let h = harness(MockState::default()).await;
    h.session.set_session("abc123", None).unwrap();

    let res = h.client.gateway().get("/echo-auth/").await.unwrap();
    assert_eq!(res.data::<String>().unwrap(), "Bearer abc123");
    assert_eq!(res.sent_token.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization() {
    let h = harness(MockState::default()).await;

    let res = h.client.gateway().get("/echo-auth/").await.unwrap();
    assert_eq!(res.optional_data::<String>().unwrap(), None);
    assert_eq!(res.sent_token, None);
}

#[tokio::test]
async fn token_is_reread_for_every_request() {
    let h = harness(MockState::default()).await;
    let gw = h.client.gateway();

    h.session.set_session("first", None).unwrap();
    assert_eq!(gw.get("/echo-auth/").await.unwrap().data::<String>().unwrap(), "Bearer first");

    h.session.set_session("second", None).unwrap();
    assert_eq!(gw.get("/echo-auth/").await.unwrap().data::<String>().unwrap(), "Bearer second");
}

#[tokio::test]
async fn unauthorized_clears_session_and_navigates_once() {
    let h = harness(MockState::default()).await;
    h.session.set_session("stale", Some(&cached_user())).unwrap();

    let err = h.client.projects().list(1).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.session.token(), None);
    assert_eq!(h.session.user(), None);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.log.navigations(), vec!["/login".to_string()]);
    assert_eq!(
        h.log.errors(),
        vec!["Authentication credentials were not provided.".to_string()]
    );
}

#[tokio::test]
async fn unauthorized_silent_probe_navigates_without_notifying() {
    let h = harness(MockState::default()).await;
    h.session.set_session("stale", None).unwrap();

    let err = h.client.auth().current_user().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(h.log.errors().is_empty());
    assert_eq!(h.log.navigations().len(), 1);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn late_success_does_not_resurrect_a_cleared_session() {
    let gate = Arc::new(Notify::new());
    let state = MockState {
        gate: Some(gate.clone()),
        ..MockState::default()
    };
    let arrived = state.arrived.clone();
    let h = harness(state).await;
    h.session.set_session(GOOD_TOKEN, None).unwrap();

    let auth = h.client.auth();
    let pending = tokio::spawn(async move { auth.current_user().await });
    arrived.notified().await;

    let err = h.client.gateway().get("/expired/").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!h.session.is_authenticated());

    gate.notify_one();
    let user = pending.await.unwrap().unwrap();

    assert_eq!(user.username, "ada");
    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.user(), None);
    assert_eq!(h.log.navigations().len(), 1);
}

#[tokio::test]
async fn bad_credentials_notify_and_leave_session_alone() {
    let h = harness(MockState::default()).await;
    h.session.set_session("abc", None).unwrap();

    let err = h.client.auth().login("ada", "wrong").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Gateway(GatewayError::Api {
            status: 400,
            message: Some("Invalid credentials".into()),
        })
    );
    assert_eq!(h.log.errors(), vec!["Invalid credentials".to_string()]);
    assert!(h.log.navigations().is_empty());
    assert_eq!(h.session.token().as_deref(), Some("abc"));
}

#[tokio::test]
async fn unauthorized_login_redirects_once_without_retrying() {
    let state = MockState::default();
    let login_calls = state.login_calls.clone();
    let h = harness(state).await;

    let err = h.client.auth().login("ghost", "whatever").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(login_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.log.navigations(), vec!["/login".to_string()]);
    assert_eq!(
        h.log.errors(),
        vec!["No active account found with the given credentials".to_string()]
    );
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn login_stores_token_and_profile() {
    let h = harness(MockState::default()).await;

    let outcome = h.client.auth().login("ada", "secret").await.unwrap();

    assert_eq!(outcome.token, GOOD_TOKEN);
    assert_eq!(outcome.user.as_ref().map(|u| u.role), Some(Role::Owner));
    assert_eq!(h.session.token().as_deref(), Some(GOOD_TOKEN));
    assert_eq!(h.session.user(), outcome.user);
    assert!(h.log.effects().is_empty());
}

#[tokio::test]
async fn login_survives_a_failed_profile_fetch() {
    let h = harness(MockState {
        self_fails: true,
        ..MockState::default()
    })
    .await;

    let outcome = h.client.auth().login("ada", "secret").await.unwrap();

    assert_eq!(outcome.user, None);
    assert!(h.session.is_authenticated());
    assert_eq!(h.session.user(), None);
    // The profile probe is silent.
    assert!(h.log.errors().is_empty());
}

#[tokio::test]
async fn refresh_user_swallows_failures() {
    let h = harness(MockState::default()).await;
    assert_eq!(h.client.auth().refresh_user().await, None);

    h.session.set_session(GOOD_TOKEN, None).unwrap();
    let user = h.client.auth().refresh_user().await.unwrap();
    assert_eq!(h.session.user(), Some(user));
}

#[tokio::test]
async fn logout_clears_and_navigates() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, Some(&cached_user())).unwrap();

    h.client.auth().logout();
    h.client.auth().logout();

    assert!(!h.session.is_authenticated());
    assert_eq!(h.log.navigations(), vec!["/login".to_string(), "/login".to_string()]);
}

#[tokio::test]
async fn success_false_in_a_2xx_is_a_failure() {
    let h = harness(MockState::default()).await;

    let err = h.client.gateway().get("/soft-fail/").await.unwrap_err();

    assert_eq!(err.status(), Some(200));
    assert_eq!(h.log.errors(), vec!["Quota exceeded".to_string()]);
}

#[tokio::test]
async fn messageless_failures_use_the_fallback() {
    let h = harness(MockState::default()).await;

    let err = h.client.gateway().get("/html-error/").await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(h.log.errors(), vec![FALLBACK_MESSAGE.to_string()]);
}

#[tokio::test]
async fn transport_failures_notify_generically() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let log = EffectLog::new();
    let session = SessionStore::in_memory();
    session.set_session("abc", None).unwrap();
    let config = ClientConfig::new(&format!("http://{addr}")).unwrap();
    let client =
        EcowiserClient::new(&config, session.clone(), Arc::new(log.clone()), Arc::new(log.clone()))
            .unwrap();

    let err = client.gateway().get("/projects/").await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    assert_eq!(log.errors(), vec![FALLBACK_MESSAGE.to_string()]);

    // No response, so nothing says the token is bad.
    assert!(session.is_authenticated());
    assert!(log.navigations().is_empty());

    client.auth().current_user().await.unwrap_err();
    assert_eq!(log.errors().len(), 1);
}

#[tokio::test]
async fn project_listing_is_paged() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, None).unwrap();

    let page = h.client.projects().list(2).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, ProjectId::new(21));
    assert!(page.items[0].created_at.is_some());
    let pagination = page.pagination.unwrap();
    assert_eq!(pagination.current_page, Some(2));
    assert!(pagination.has_previous());
    assert!(pagination.has_next());

    let mut state = ecowiser_core::PageState::new();
    state.observe(Some(pagination));
    assert!(state.next());
    assert_eq!(state.current(), 3);
}

#[tokio::test]
async fn bootstrap_without_session_redirects() {
    let h = harness(MockState::default()).await;

    assert_eq!(h.client.bootstrap().await, Bootstrap::RedirectToLogin);
    assert_eq!(h.log.navigations(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn bootstrap_fetches_profile_and_tenant() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, None).unwrap();

    match h.client.bootstrap().await {
        Bootstrap::Ready { user, tenant } => {
            assert_eq!(user.username, "ada");
            assert_eq!(tenant.map(|t| t.name), Some("Acme".to_string()));
        }
        other => panic!("unexpected bootstrap result: {other:?}"),
    }
    assert!(h.session.user().is_some());
    assert!(h.log.effects().is_empty());
}

#[tokio::test]
async fn bootstrap_with_expired_token_redirects_once() {
    let h = harness(MockState::default()).await;
    h.session.set_session("stale", Some(&cached_user())).unwrap();

    assert_eq!(h.client.bootstrap().await, Bootstrap::RedirectToLogin);
    assert_eq!(h.log.navigations().len(), 1);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn member_removal_sends_a_json_body() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, Some(&cached_user())).unwrap();

    h.client.members().remove("member@acme.test").await.unwrap();

    let err = h.client.members().remove("owner@acme.test").await.unwrap_err();
    assert_eq!(err.user_message(), "Cannot remove the tenant owner");
    assert_eq!(h.log.errors(), vec!["Cannot remove the tenant owner".to_string()]);
}

#[tokio::test]
async fn member_removal_needs_a_managing_role() {
    let h = harness(MockState::default()).await;
    let mut member = cached_user();
    member.role = Role::Member;
    h.session.set_session(GOOD_TOKEN, Some(&member)).unwrap();

    let err = h.client.members().remove("member@acme.test").await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    h.session.set_session(GOOD_TOKEN, None).unwrap();
    let err = h.client.tenants().delete().await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // Refused locally: no request, so no notification or navigation.
    assert!(h.log.effects().is_empty());
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn csv_files_render_as_tables() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, None).unwrap();
    let resources = h.client.resources();

    let table = resources
        .csv_table(ProjectId::new(4), ResourceId::new(11))
        .await
        .unwrap();
    assert_eq!(table.columns, vec!["site", "kwh"]);
    assert_eq!(
        table.cells(),
        vec![
            vec!["North".to_string(), "12".to_string()],
            vec!["South".to_string(), String::new()],
        ]
    );

    let err = resources
        .csv_table(ProjectId::new(4), ResourceId::new(12))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Csv(CsvTableError::Processing));

    let err = resources
        .csv_table(ProjectId::new(4), ResourceId::new(99))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Csv(CsvTableError::NotFound));
    assert!(h.log.effects().is_empty());
}

#[tokio::test]
async fn uploads_are_multipart_with_metadata() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, None).unwrap();

    let meta = UploadMeta::new(ProjectId::new(4), "photo").with_description("roof");
    let file = Upload::new("photo.png", b"PNGDATA".to_vec()).with_mime("image/png");
    let res = h
        .client
        .resources()
        .upload_media(&meta, Visibility::Public, file)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(res.visibility, Visibility::Public);

    // The echoed request body is not part of the DTO; read the raw data.
    let echoed = h
        .client
        .gateway()
        .send(
            ecowiser_client::ApiRequest::post("/resources/upload/").multipart(
                Upload::new("photo.png", b"PNGDATA".to_vec()).text("project", 4),
            ),
        )
        .await
        .unwrap()
        .data::<Value>()
        .unwrap();
    assert!(echoed["content_type"].as_str().unwrap().starts_with("multipart/form-data"));
    let raw = echoed["raw"].as_str().unwrap();
    assert!(raw.contains("name=\"file\"; filename=\"photo.png\""));
    assert!(raw.contains("name=\"project\""));
    assert!(raw.contains("PNGDATA"));
}

#[tokio::test]
async fn downloads_return_raw_bytes() {
    let h = harness(MockState::default()).await;
    h.session.set_session(GOOD_TOKEN, None).unwrap();

    let file = h.client.resources().download(ResourceId::new(5)).await.unwrap();

    assert_eq!(file.body, b"file-5".to_vec());
    assert_eq!(file.content_type.as_deref(), Some("application/octet-stream"));
}
