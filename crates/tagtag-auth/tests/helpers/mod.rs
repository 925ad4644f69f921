//! Mock identity server for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use tagtag_auth::{AuthApi, HttpAuthClient, SessionController, TokenStore};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const CAPTCHA_TOKEN: &str = "captcha-ok";
const PIECE_X: f64 = 120.0;

/// How the server shapes its responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// `{code, message, data}` with the HTTP status mirrored in `code`.
    Envelope,
    /// Business errors as HTTP 200 with the real status only in `code`.
    SoftEnvelope,
    /// Bare JSON payloads.
    Plain,
}

#[derive(Debug)]
struct MockState {
    wire: Wire,
    require_captcha: AtomicBool,
    logout_fails: AtomicBool,
    refresh_delay_ms: AtomicU64,
    next_token: AtomicU64,
    access_tokens: Mutex<HashSet<String>>,
    refresh_tokens: Mutex<HashSet<String>>,
    users: Mutex<HashMap<String, String>>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

/// Handle to a running mock server.
pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl TestServer {
    /// Binds an ephemeral port and starts serving.
    pub async fn start(wire: Wire) -> Self {
        let state = Arc::new(MockState {
            wire,
            require_captcha: AtomicBool::new(false),
            logout_fails: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            next_token: AtomicU64::new(0),
            access_tokens: Mutex::new(HashSet::new()),
            refresh_tokens: Mutex::new(HashSet::new()),
            users: Mutex::new(HashMap::from([(USERNAME.to_string(), PASSWORD.to_string())])),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/register", post(register))
            .route("/api/auth/codes", get(codes))
            .route("/api/auth/me", get(me))
            .route("/api/auth/menu/all", get(menus))
            .route("/api/auth/captcha/translate/init", get(captcha_init))
            .route("/api/auth/captcha/translate/verify", post(captcha_verify))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn client(&self) -> Arc<HttpAuthClient> {
        Arc::new(HttpAuthClient::with_client(reqwest::Client::new(), &self.base_url()))
    }

    /// A controller over this server with the given token store.
    pub fn controller(&self, store: Arc<TokenStore>) -> SessionController {
        let api: Arc<dyn AuthApi> = self.client();
        SessionController::new(api, store, chrono::Duration::seconds(30))
    }

    pub fn require_captcha(&self) {
        self.state.require_captcha.store(true, Ordering::SeqCst);
    }

    pub fn fail_logout(&self) {
        self.state.logout_fails.store(true, Ordering::SeqCst);
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.state
            .refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Server-side expiry of every issued access token.
    pub fn expire_access_tokens(&self) {
        self.state.access_tokens.lock().unwrap().clear();
    }

    /// Server-side revocation of every issued refresh token.
    pub fn revoke_refresh_tokens(&self) {
        self.state.refresh_tokens.lock().unwrap().clear();
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.state.logout_calls.load(Ordering::SeqCst)
    }
}

impl MockState {
    fn issue(&self) -> Value {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        self.access_tokens.lock().unwrap().insert(access.clone());
        self.refresh_tokens.lock().unwrap().insert(refresh.clone());
        json!({
            "accessToken": access,
            "refreshToken": refresh,
            "tokenType": "Bearer",
            "expiresIn": 900,
        })
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| self.access_tokens.lock().unwrap().contains(token))
    }

    fn ok(&self, data: Value) -> Response {
        match self.wire {
            Wire::Plain => Json(data).into_response(),
            Wire::Envelope | Wire::SoftEnvelope => Json(json!({
                "code": 200,
                "message": "success",
                "data": data,
                "timestamp": 1_700_000_000_000_i64,
            }))
            .into_response(),
        }
    }

    fn fail(&self, status: StatusCode, message: &str) -> Response {
        match self.wire {
            Wire::Plain => (status, Json(json!({ "message": message }))).into_response(),
            Wire::Envelope => (
                status,
                Json(json!({ "code": status.as_u16(), "message": message, "data": null })),
            )
                .into_response(),
            Wire::SoftEnvelope => Json(json!({
                "code": status.as_u16(),
                "message": message,
                "data": null,
            }))
            .into_response(),
        }
    }
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if state.require_captcha.load(Ordering::SeqCst)
        && body.get("captchaToken").and_then(Value::as_str) != Some(CAPTCHA_TOKEN)
    {
        return state.fail(StatusCode::BAD_REQUEST, "Captcha verification required");
    }

    let username = body.get("username").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    let valid = state.users.lock().unwrap().get(username).map(String::as_str) == Some(password);
    if !valid {
        return state.fail(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let pair = state.issue();
    state.ok(pair)
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let token = body.get("refreshToken").and_then(Value::as_str).unwrap_or_default();
    // Rotation: a refresh token is good for exactly one use.
    if !state.refresh_tokens.lock().unwrap().remove(token) {
        return state.fail(StatusCode::UNAUTHORIZED, "Refresh token expired");
    }
    let pair = state.issue();
    state.ok(pair)
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.logout_fails.load(Ordering::SeqCst) {
        return state.fail(StatusCode::INTERNAL_SERVER_ERROR, "Logout unavailable");
    }
    state.ok(Value::Null)
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let username = body.get("username").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    let mut users = state.users.lock().unwrap();
    if users.contains_key(username) {
        drop(users);
        return state.fail(StatusCode::CONFLICT, "Username already exists");
    }
    users.insert(username.to_string(), password.to_string());
    drop(users);
    state.ok(Value::Null)
}

async fn codes(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return state.fail(StatusCode::UNAUTHORIZED, "Token expired");
    }
    state.ok(json!(["user:view", "user:edit", "role:view"]))
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return state.fail(StatusCode::UNAUTHORIZED, "Token expired");
    }
    state.ok(json!({
        "id": "1",
        "username": USERNAME,
        "nickname": "Administrator",
        "email": "admin@example.com",
        "roles": ["admin"],
    }))
}

async fn menus(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return state.fail(StatusCode::UNAUTHORIZED, "Token expired");
    }
    state.ok(json!([
        {"id": 2, "parentId": "1", "menuCode": "system:user", "menuName": "Users",
         "path": "/system/user", "component": "system/user/index", "sort": 2, "menuType": 1, "status": 1},
        {"id": 1, "parentId": 0, "menuCode": "system", "menuName": "System",
         "path": "/system", "sort": 1, "menuType": 0, "status": 1},
        {"id": 3, "parentId": 1, "menuCode": "system:role", "menuName": "Roles",
         "path": "/system/role", "component": "/system/role/index", "sort": 1, "menuType": 1, "status": 1},
        {"id": 4, "parentId": 2, "menuCode": "user:add", "menuName": "Add user",
         "sort": 0, "menuType": 2, "status": 1},
        {"id": 5, "parentId": null, "menuCode": "profile", "menuName": "Profile",
         "path": "/profile", "component": "profile/index", "sort": 9, "menuType": 1,
         "status": 1, "hideInMenu": true},
        {"id": 6, "parentId": 99, "menuCode": "stray", "menuName": "Stray",
         "path": "/stray", "sort": 10, "menuType": 1, "status": 1}
    ]))
}

async fn captcha_init(State(state): State<Arc<MockState>>) -> Response {
    state.ok(json!({
        "challengeId": "challenge-1",
        "imageUrl": "/captcha/challenge-1.png",
        "pieceX": PIECE_X,
        "pieceY": 40,
        "diffDistance": 4,
    }))
}

async fn captcha_verify(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let move_x = body.get("moveX").and_then(Value::as_f64).unwrap_or_default();
    if (move_x - PIECE_X).abs() <= 4.0 {
        state.ok(json!({ "passed": true, "captchaToken": CAPTCHA_TOKEN }))
    } else {
        state.ok(json!({ "passed": false }))
    }
}
