//! In-process stub of the task backend for integration tests
//!
//! Serves the same routes as the real backend on an ephemeral port, checks
//! bearer tokens with a shared secret, and records every request it sees so
//! tests can assert on paths, headers and call counts.

#![allow(dead_code)]

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

pub const SECRET: &[u8] = b"stub-backend-secret";
pub const USER_ID: &str = "42";
pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct-horse";
pub const TAKEN_EMAIL: &str = "taken@example.com";
const TIMESTAMP: &str = "2025-01-01T12:00:00";

/// Sign a token for the stub backend
pub fn mint_token(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
        .expect("Failed to create token")
}

/// Token for [`USER_ID`] valid for `ttl` seconds (negative for expired)
pub fn user_token(ttl: i64) -> String {
    mint_token(json!({
        "sub": USER_ID,
        "user_id": USER_ID,
        "email": EMAIL,
        "exp": chrono::Utc::now().timestamp() + ttl,
    }))
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct Inner {
    hits: AtomicUsize,
    requests: Mutex<Vec<Recorded>>,
    tasks: Mutex<Vec<Value>>,
    next_id: AtomicI64,
    fail_logout: AtomicBool,
    empty_toggle: AtomicBool,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    inner: Arc<Inner>,
}

impl StubBackend {
    pub fn new() -> Self {
        let stub = Self::default();
        stub.inner.next_id.store(1, Ordering::SeqCst);
        stub
    }

    /// Serve on an ephemeral port and return the base URL
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("local addr");
        let app = self.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    pub fn hits(&self) -> usize {
        self.inner.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<Recorded> {
        self.inner.requests.lock().last().cloned()
    }

    pub fn fail_logout(&self, fail: bool) {
        self.inner.fail_logout.store(fail, Ordering::SeqCst);
    }

    /// Answer toggles with `204 No Content`
    pub fn empty_toggle(&self, empty: bool) {
        self.inner.empty_toggle.store(empty, Ordering::SeqCst);
    }

    pub fn seed_task(&self, title: &str, completed: bool) -> Value {
        let task = json!({
            "id": self.inner.next_id.fetch_add(1, Ordering::SeqCst),
            "user_id": USER_ID,
            "title": title,
            "description": null,
            "completed": completed,
            "created_at": TIMESTAMP,
            "updated_at": TIMESTAMP,
        });
        self.inner.tasks.lock().push(task.clone());
        task
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/verify", post(verify))
            .route("/api/{user_id}/tasks", get(list_tasks).post(create_task))
            .route(
                "/api/{user_id}/tasks/{id}",
                get(get_task).put(update_task).delete(delete_task),
            )
            .route("/api/{user_id}/tasks/{id}/complete", patch(toggle_task))
            .layer(middleware::from_fn_with_state(self.clone(), record))
            .with_state(self.clone())
    }
}

async fn record(State(stub): State<StubBackend>, req: Request, next: Next) -> Response {
    stub.inner.hits.fetch_add(1, Ordering::SeqCst);
    stub.inner.requests.lock().push(Recorded {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        authorization: req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    next.run(req).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Subject of a valid bearer token
fn subject(headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    let data = decode::<Value>(token, &DecodingKey::from_secret(SECRET), &Validation::default())
        .map_err(|_| detail(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    data.claims
        .get("sub")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Invalid token"))
}

fn authorize(headers: &HeaderMap, user_id: &str) -> Result<(), Response> {
    if subject(headers)? != user_id {
        return Err(detail(StatusCode::FORBIDDEN, "Access forbidden: user_id mismatch"));
    }
    Ok(())
}

fn auth_success(email: &str, username: &str) -> Response {
    Json(json!({
        "success": true,
        "data": {
            "user": { "id": 42, "email": email, "username": username },
            "token": user_token(3600),
        },
        "status": 200,
    }))
    .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == TAKEN_EMAIL {
        return Json(json!({
            "success": false,
            "error": "User with this email already exists",
            "status": 400,
        }))
        .into_response();
    }
    auth_success(email, body["username"].as_str().unwrap_or_default())
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        return auth_success(EMAIL, "ada");
    }
    Json(json!({ "success": false, "error": "Invalid credentials", "status": 401 })).into_response()
}

async fn logout(State(stub): State<StubBackend>) -> Response {
    if stub.inner.fail_logout.load(Ordering::SeqCst) {
        return detail(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable");
    }
    Json(json!({
        "success": true,
        "data": { "message": "Logged out successfully" },
        "status": 200,
    }))
    .into_response()
}

async fn verify(headers: HeaderMap) -> Response {
    match subject(&headers) {
        Ok(user_id) => Json(json!({
            "success": true,
            "data": { "user_id": user_id, "email": EMAIL, "username": "ada" },
            "status": 200,
        }))
        .into_response(),
        Err(_) => Json(json!({ "success": false, "error": "Invalid token", "status": 401 }))
            .into_response(),
    }
}

async fn list_tasks(
    State(stub): State<StubBackend>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&headers, &user_id) {
        return response;
    }
    let tasks: Vec<Value> = stub
        .inner
        .tasks
        .lock()
        .iter()
        .filter(|task| task["user_id"] == user_id.as_str())
        .cloned()
        .collect();
    Json(tasks).into_response()
}

async fn create_task(
    State(stub): State<StubBackend>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&headers, &user_id) {
        return response;
    }
    let title = body["title"].as_str().unwrap_or_default();
    if title == "duplicate" {
        return (StatusCode::CONFLICT, Json(json!({ "error": "X" }))).into_response();
    }

    let task = stub.seed_task(title, body["completed"].as_bool().unwrap_or(false));
    let id = task["id"].clone();
    let mut tasks = stub.inner.tasks.lock();
    let Some(stored) = tasks.iter_mut().find(|t| t["id"] == id) else {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "lost task");
    };
    stored["description"] = body["description"].clone();
    (StatusCode::CREATED, Json(stored.clone())).into_response()
}

async fn get_task(
    State(stub): State<StubBackend>,
    Path((user_id, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&headers, &user_id) {
        return response;
    }
    match stub.inner.tasks.lock().iter().find(|t| t["id"] == id) {
        Some(task) => Json(task.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Task not found"),
    }
}

async fn update_task(
    State(stub): State<StubBackend>,
    Path((user_id, id)): Path<(String, i64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&headers, &user_id) {
        return response;
    }
    let mut tasks = stub.inner.tasks.lock();
    let Some(task) = tasks.iter_mut().find(|t| t["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    };
    for field in ["title", "description", "completed"] {
        if let Some(value) = body.get(field) {
            task[field] = value.clone();
        }
    }
    task["updated_at"] = json!("2025-01-02T08:30:00");
    Json(task.clone()).into_response()
}

async fn toggle_task(
    State(stub): State<StubBackend>,
    Path((user_id, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&headers, &user_id) {
        return response;
    }
    let mut tasks = stub.inner.tasks.lock();
    let Some(task) = tasks.iter_mut().find(|t| t["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    };
    let completed = task["completed"].as_bool().unwrap_or(false);
    task["completed"] = json!(!completed);

    if stub.inner.empty_toggle.load(Ordering::SeqCst) {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(task.clone()).into_response()
}

async fn delete_task(
    State(stub): State<StubBackend>,
    Path((user_id, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&headers, &user_id) {
        return response;
    }
    let mut tasks = stub.inner.tasks.lock();
    let before = tasks.len();
    tasks.retain(|t| t["id"] != id);
    if tasks.len() == before {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    }
    StatusCode::NO_CONTENT.into_response()
}
