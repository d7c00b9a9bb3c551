//! Uniform result envelope and failure normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message returned when no identity can be resolved locally
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Result of every API client operation.
///
/// `success` implies `error` is `None`; failure implies `data` is `None`
/// and `error` holds a readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub status: u16,
}

impl<T> ApiResponse<T> {
    /// Successful result
    pub fn ok(data: T, status: u16) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status,
        }
    }

    /// Failed result with a readable message
    pub fn failure(error: impl Into<String>, status: u16) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            status,
        }
    }

    /// Local 401, issued without touching the network
    pub fn not_authenticated() -> Self {
        Self::failure(NOT_AUTHENTICATED, 401)
    }

    /// Local 400 for input rejected before sending
    pub fn invalid_input(error: impl Into<String>) -> Self {
        Self::failure(error, 400)
    }

    /// Transform the payload, keeping status and error
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            status: self.status,
        }
    }

    /// Split into the payload or the error message
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.error.unwrap_or_default())
        }
    }

    /// Repair an envelope decoded from a backend body
    pub(crate) fn normalized(mut self, http_status: u16, fallback: &str) -> Self {
        if self.status == 0 {
            self.status = http_status;
        }
        if self.success {
            self.error = None;
        } else {
            self.data = None;
            if self.error.as_deref().map_or(true, str::is_empty) {
                self.error = Some(fallback.to_string());
            }
        }
        self
    }
}

/// Why a request produced no usable result
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFailure {
    /// The backend answered with a non-success status
    Response { status: u16, body: Option<Value> },
    /// No response arrived (connection refused, DNS, timeout)
    Transport(String),
    /// A response arrived but its body could not be decoded
    Decode(String),
}

/// Turn a failed request into an envelope.
///
/// Message precedence: backend `error`, backend `detail`, the generic
/// status message, then `fallback`. Status is the response status, or 500
/// when no response is available.
pub fn handle_error<T>(failure: &RequestFailure, fallback: &str) -> ApiResponse<T> {
    match failure {
        RequestFailure::Response { status, body } => {
            let message = body
                .as_ref()
                .and_then(backend_message)
                .unwrap_or_else(|| format!("Request failed with status code {}", status));
            ApiResponse::failure(message, *status)
        }
        RequestFailure::Transport(reason) | RequestFailure::Decode(reason) => {
            tracing::debug!("{}: {}", fallback, reason);
            ApiResponse::failure(fallback, 500)
        }
    }
}

fn backend_message(body: &Value) -> Option<String> {
    non_empty_str(body.get("error")).or_else(|| match body.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        // Validation errors arrive as a list of {loc, msg, type}
        Value::Array(items) => items
            .iter()
            .find_map(|item| non_empty_str(item.get("msg"))),
        _ => None,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
