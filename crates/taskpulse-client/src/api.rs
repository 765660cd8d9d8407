//! REST client for the task backend.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use taskpulse_core::{AuthSession, Error, NewTask, Result, Task, User};

use crate::config::ClientConfig;

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Login response; both fields are checked before building an [`AuthSession`].
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    user: Option<User>,
}

/// Authenticated JSON client for `/api/users` and `/api/tasks`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new client. No token is set until [`ApiClient::set_token`].
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        debug!(api_url = %config.api_url, "Initializing API client");

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a token and user. Does not store the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .request(Method::POST, "/api/users/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = check(response, "Login failed").await?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse login response: {}", e)))?;

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("No authentication token received".to_string()))?;
        let user = body.user.ok_or_else(|| {
            Error::Unauthorized("User information missing from login response.".to_string())
        })?;

        info!(username = %user.username, "Logged in");
        Ok(AuthSession { token, user })
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let response = self
            .request(Method::POST, "/api/users/register")
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?;
        check(response, "Registration failed").await?;
        info!(username, "Registered user");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let response = self.authed(Method::GET, "/api/users")?.send().await?;
        let response = check(response, "Failed to fetch users").await?;
        Ok(response.json().await?)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let response = self.authed(Method::GET, "/api/tasks")?.send().await?;
        let response = check(response, "Failed to fetch tasks").await?;
        Ok(response.json().await?)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<()> {
        let response = self
            .authed(Method::POST, "/api/tasks")?
            .json(task)
            .send()
            .await?;
        check(response, "Failed to create task").await?;
        debug!(title = %task.title, assigned_to = %task.assigned_to, "Task created");
        Ok(())
    }

    pub async fn update_task(&self, task_id: &str, task: &NewTask) -> Result<()> {
        let response = self
            .authed(Method::PUT, &format!("/api/tasks/{}", task_id))?
            .json(task)
            .send()
            .await?;
        check(response, "Failed to update task").await?;
        debug!(task_id, "Task updated");
        Ok(())
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        let response = self
            .authed(Method::DELETE, &format!("/api/tasks/{}", task_id))?
            .send()
            .await?;
        check(response, "Failed to delete task").await?;
        debug!(task_id, "Task deleted");
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("No authentication token found".to_string()))?;
        Ok(self.request(method, path).bearer_auth(token))
    }
}

/// Pass successful responses through; turn failures into typed errors using
/// the body's `message` when present.
async fn check(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| fallback.to_string());

    warn!(status = status.as_u16(), error = %message, "Backend request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
        StatusCode::FORBIDDEN => Error::Forbidden(message),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        _ => Error::Request(message),
    })
}
