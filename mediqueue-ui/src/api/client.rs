//! HTTP API Client
//!
//! Functions for communicating with the MediQueue REST API.

use gloo_net::http::Request;

use crate::state::global::Notification;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8085/api/v1";

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item("mediqueue_api_url").ok().flatten())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    url.trim_end_matches('/').to_string()
}

/// Live-view endpoint for an API base; browsers pass the token in the query
pub fn ws_url(api_base: &str, token: &str) -> String {
    let base = api_base
        .replacen("http://", "ws://", 1)
        .replacen("https://", "wss://", 1);
    let token = String::from(js_sys::encode_uri_component(token));
    format!("{}/ws?token={}", base, token)
}

// ============ Response Types ============

#[derive(Debug, Clone, serde::Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LogoutOutcome {
    pub notification: Notification,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, serde::Deserialize)]
struct ApiError {
    error: ErrorBody,
}

async fn error_message(response: gloo_net::http::Response) -> String {
    response
        .json::<ApiError>()
        .await
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("Request failed ({})", response.status()))
}

// ============ API Functions ============

/// Log in with email and password
pub async fn login(email: &str, password: &str) -> Result<LoginResponse, String> {
    #[derive(serde::Serialize)]
    struct LoginRequest<'a> {
        email: &'a str,
        password: &'a str,
    }

    let response = Request::post(&format!("{}/auth/login", get_api_base()))
        .json(&LoginRequest { email, password })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }

    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

/// Whether the server still accepts a token; `None` when it cannot be reached
pub async fn session_valid(token: &str) -> Option<bool> {
    let response = Request::get(&format!("{}/auth/me", get_api_base()))
        .header("Authorization", &format!("Bearer {}", token))
        .send()
        .await
        .ok()?;

    match response.status() {
        401 => Some(false),
        _ => Some(response.ok()),
    }
}

/// End the session; the outcome carries the toast to show either way
pub async fn logout(token: &str) -> LogoutOutcome {
    let failed = || LogoutOutcome {
        notification: Notification {
            title: "Error".to_string(),
            description: "Failed to log out".to_string(),
            variant: "destructive".to_string(),
        },
        redirect: None,
    };

    let response = Request::post(&format!("{}/auth/logout", get_api_base()))
        .header("Authorization", &format!("Bearer {}", token))
        .send()
        .await;

    match response {
        // The server no longer knows this session: nothing left to end
        Ok(response) if response.status() == 401 => LogoutOutcome {
            notification: Notification {
                title: "Logged out".to_string(),
                description: "You have been logged out successfully".to_string(),
                variant: "default".to_string(),
            },
            redirect: Some("/login".to_string()),
        },
        Ok(response) => response.json().await.unwrap_or_else(|_| failed()),
        Err(e) => {
            web_sys::console::error_1(&format!("Logout failed: {}", e).into());
            failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_outcome_shape() {
        let outcome: LogoutOutcome = serde_json::from_str(
            r#"{"notification":{"title":"Logged out","description":"You have been logged out successfully","variant":"default"},"redirect":"/login"}"#,
        )
        .unwrap();
        assert!(!outcome.notification.is_error());
        assert_eq!(outcome.redirect.as_deref(), Some("/login"));
    }
}
