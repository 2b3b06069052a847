//! Response status and body handling shared by the list endpoints.

use crate::error::{InsightsError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Returns the response unchanged on success.
///
/// Azure DevOps answers an unauthenticated request with `203` and an HTML
/// sign-in page, so that status is treated like `401`/`403`.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status == StatusCode::NON_AUTHORITATIVE_INFORMATION
    {
        return Err(InsightsError::Unauthorized { status: status.as_u16() });
    }
    if !status.is_success() {
        return Err(InsightsError::Api {
            status: status.as_u16(),
            message: error_message(resp.text().await.unwrap_or_default()),
        });
    }
    Ok(resp)
}

pub async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| InsightsError::Parse(format!("unexpected response body: {e}")))
}

// Error bodies are usually `{"message": "...", "typeKey": "..."}`.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body)
}
