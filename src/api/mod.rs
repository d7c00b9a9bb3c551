//! Task backend API client

pub mod client;
pub mod models;
pub mod response;

pub use client::ApiClient;
pub use models::{
    AuthData, Identity, LoginRequest, Message, NewTask, RegisterRequest, Task, TaskUpdate, User,
};
pub use response::{handle_error, ApiResponse, RequestFailure, NOT_AUTHENTICATED};
