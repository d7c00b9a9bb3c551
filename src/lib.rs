//! Taskflow - task management client
//!
//! Library interface for the Taskflow client: a session manager that reads
//! identity and expiry from the stored bearer token, and an API client that
//! talks to the task backend and reports every outcome as an [`ApiResponse`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod tasks;

pub use api::{ApiClient, ApiResponse, Task};
pub use auth::{Session, SessionManager, TokenStore};
pub use config::Config;
pub use error::Error;
