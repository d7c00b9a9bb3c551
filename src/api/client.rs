//! HTTP client for the task backend
//!
//! Every request carries the stored bearer token. Task routes are scoped by
//! the user id read from that token, and no public operation returns an
//! error: failures come back as an [`ApiResponse`].

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::models::{
    AuthData, Identity, LoginRequest, Message, NewTask, RegisterRequest, Task, TaskUpdate,
};
use super::response::{handle_error, ApiResponse, RequestFailure};
use crate::auth::claims::{mask_token, ClaimPolicy};
use crate::auth::store::TokenStore;
use crate::config::ApiConfig;

/// A response with a success status and its raw body
struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, RequestFailure> {
        serde_json::from_str(&self.body).map_err(|e| RequestFailure::Decode(e.to_string()))
    }
}

/// Body of `POST /api/auth/logout`; the message may sit at either level
#[derive(Debug, Deserialize)]
struct LogoutBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Message>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}

/// Authenticated client for the task REST API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    claims: ClaimPolicy,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Create a client for `base_url` reading its token from `store`
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            claims: ClaimPolicy::default(),
            timeout: None,
        }
    }

    /// Create a client from the `[api]` config section
    pub fn from_config(config: &ApiConfig, store: Arc<dyn TokenStore>) -> Self {
        Self::new(config.base_url.clone(), store).with_timeout(config.timeout())
    }

    /// Set a per-request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the identity claim precedence for task routes
    pub fn with_claim_policy(mut self, claims: ClaimPolicy) -> Self {
        self.claims = claims;
        self
    }

    /// Backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Store a token, or clear it with `None`
    pub fn set_token(&self, token: Option<&str>) {
        let result = match token {
            Some(token) => self.store.set(token),
            None => self.store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to update stored token: {}", e);
        }
    }

    // Auth

    /// Create an account; a successful response stores its token
    pub async fn register(&self, payload: &RegisterRequest) -> ApiResponse<AuthData> {
        if [&payload.email, &payload.username, &payload.password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return ApiResponse::invalid_input("Email, username and password are required");
        }
        let request = self.request(Method::POST, "/api/auth/register").json(payload);
        self.authenticate(request, "Registration failed").await
    }

    /// Log in; a successful response stores its token
    pub async fn login(&self, payload: &LoginRequest) -> ApiResponse<AuthData> {
        let request = self.request(Method::POST, "/api/auth/login").json(payload);
        self.authenticate(request, "Login failed").await
    }

    /// Log out on the backend; the stored token is cleared only once the
    /// backend confirms.
    pub async fn logout_user(&self) -> ApiResponse<Message> {
        const FALLBACK: &str = "Logout failed";

        let reply = match self.execute(self.request(Method::POST, "/api/auth/logout")).await {
            Ok(reply) => reply,
            Err(failure) => return handle_error(&failure, FALLBACK),
        };
        let body: LogoutBody = match reply.json() {
            Ok(body) => body,
            Err(failure) => return handle_error(&failure, FALLBACK),
        };

        let status = body.status.unwrap_or(reply.status);
        if !body.success {
            return ApiResponse::failure(body.error.unwrap_or_else(|| FALLBACK.to_string()), status);
        }

        self.set_token(None);
        tracing::info!("Logged out");
        let message = body
            .data
            .or_else(|| body.message.map(Message::new))
            .unwrap_or_else(|| Message::new("Logged out successfully"));
        ApiResponse::ok(message, status)
    }

    /// Ask the backend to verify the stored token
    pub async fn verify_token(&self) -> ApiResponse<Identity> {
        const FALLBACK: &str = "Token verification failed";

        if self.store.get().is_none() {
            return ApiResponse::not_authenticated();
        }
        let reply = match self.execute(self.request(Method::POST, "/api/auth/verify")).await {
            Ok(reply) => reply,
            Err(failure) => return handle_error(&failure, FALLBACK),
        };
        match reply.json::<ApiResponse<Identity>>() {
            Ok(envelope) => envelope.normalized(reply.status, FALLBACK),
            Err(failure) => handle_error(&failure, FALLBACK),
        }
    }

    // Tasks

    /// List the current user's tasks
    pub async fn get_tasks(&self) -> ApiResponse<Vec<Task>> {
        let Some(user_id) = self.user_id() else {
            return ApiResponse::not_authenticated();
        };
        let request = self.request(Method::GET, &format!("/api/{}/tasks", user_id));
        self.fetch(request, "Failed to fetch tasks").await
    }

    /// Fetch a single task
    pub async fn get_task(&self, id: i64) -> ApiResponse<Task> {
        let Some(user_id) = self.user_id() else {
            return ApiResponse::not_authenticated();
        };
        let request = self.request(Method::GET, &format!("/api/{}/tasks/{}", user_id, id));
        self.fetch(request, "Failed to fetch task").await
    }

    /// Create a task. A blank title is rejected locally.
    pub async fn create_task(&self, task: &NewTask) -> ApiResponse<Task> {
        let Some(user_id) = self.user_id() else {
            return ApiResponse::not_authenticated();
        };
        if task.title.trim().is_empty() {
            return ApiResponse::invalid_input("Title is required");
        }
        let request = self
            .request(Method::POST, &format!("/api/{}/tasks", user_id))
            .json(task);
        self.fetch(request, "Failed to create task").await
    }

    /// Update the fields set in `update`
    pub async fn update_task(&self, id: i64, update: &TaskUpdate) -> ApiResponse<Task> {
        let Some(user_id) = self.user_id() else {
            return ApiResponse::not_authenticated();
        };
        let request = self
            .request(Method::PUT, &format!("/api/{}/tasks/{}", user_id, id))
            .json(update);
        self.fetch(request, "Failed to update task").await
    }

    /// Flip a task's completion flag.
    ///
    /// When the backend answers without a body, the result is `task` with
    /// `completed` negated.
    pub async fn toggle_task_completion(&self, task: &Task) -> ApiResponse<Task> {
        const FALLBACK: &str = "Failed to update task";

        let Some(user_id) = self.user_id() else {
            return ApiResponse::not_authenticated();
        };
        let path = format!("/api/{}/tasks/{}/complete", user_id, task.id);
        let reply = match self.execute(self.request(Method::PATCH, &path)).await {
            Ok(reply) => reply,
            Err(failure) => return handle_error(&failure, FALLBACK),
        };

        if reply.is_empty() {
            let mut toggled = task.clone();
            toggled.completed = !task.completed;
            return ApiResponse::ok(toggled, reply.status);
        }
        match reply.json() {
            Ok(updated) => ApiResponse::ok(updated, reply.status),
            Err(failure) => handle_error(&failure, FALLBACK),
        }
    }

    /// Delete a task
    pub async fn delete_task(&self, id: i64) -> ApiResponse<Message> {
        const FALLBACK: &str = "Failed to delete task";

        let Some(user_id) = self.user_id() else {
            return ApiResponse::not_authenticated();
        };
        let path = format!("/api/{}/tasks/{}", user_id, id);
        match self.execute(self.request(Method::DELETE, &path)).await {
            Ok(reply) => {
                let message = reply
                    .json::<Message>()
                    .unwrap_or_else(|_| Message::new("Task deleted successfully"));
                ApiResponse::ok(message, reply.status)
            }
            Err(failure) => handle_error(&failure, FALLBACK),
        }
    }

    // Plumbing

    fn user_id(&self) -> Option<String> {
        let token = self.store.get()?;
        self.claims.user_id(&token)
    }

    /// Build a request against the backend with the stored token attached
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        match self.store.get() {
            Some(token) => {
                tracing::trace!("Attaching bearer token {}", mask_token(&token));
                request.bearer_auth(token)
            }
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Reply, RequestFailure> {
        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!("Backend returned {}", status);
            return Err(RequestFailure::Response {
                status: status.as_u16(),
                body: serde_json::from_str(&body).ok(),
            });
        }

        Ok(Reply {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> ApiResponse<T> {
        let result = match self.execute(request).await {
            Ok(reply) => reply.json().map(|data| (data, reply.status)),
            Err(failure) => Err(failure),
        };
        match result {
            Ok((data, status)) => ApiResponse::ok(data, status),
            Err(failure) => handle_error(&failure, fallback),
        }
    }

    /// Register and login share one response shape; a successful one
    /// replaces the stored token.
    async fn authenticate(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> ApiResponse<AuthData> {
        let reply = match self.execute(request).await {
            Ok(reply) => reply,
            Err(failure) => return handle_error(&failure, fallback),
        };
        let envelope = match reply.json::<ApiResponse<AuthData>>() {
            Ok(envelope) => envelope.normalized(reply.status, fallback),
            Err(failure) => return handle_error(&failure, fallback),
        };

        if !envelope.success {
            return envelope;
        }
        let Some(data) = &envelope.data else {
            return ApiResponse::failure(fallback, 500);
        };
        self.set_token(Some(&data.token));
        tracing::info!("Authenticated as {}", data.user.email);
        envelope
    }
}
