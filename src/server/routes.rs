//! API routes and error mapping for the chat server.
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::llm::{ChatMessage, LlmError};
use crate::server::service::{self, ChatResponse};
use crate::server::state::AppState;

/// Build the `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

/// Request body of `POST /api/chat`: the full conversation so far.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Errors a request can surface, mapped to HTTP statuses with a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (no user message, empty question) → 400.
    BadRequest(String),
    /// The LLM endpoint failed or answered garbage → 502.
    Upstream(LlmError),
    /// Anything wrong on our side (store, embedder) → 500.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(e) => {
                error!("LLM provider error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Internal(msg) => {
                error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// POST /api/chat — the single chat route.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = service::answer_chat(&state, &request.messages).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_deserializes() {
        let body = r#"{"messages":[{"role":"user","content":"hello"}]}"#;
        let request: ChatRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "hello");
    }

    #[test]
    fn test_chat_request_rejects_bad_role() {
        let body = r#"{"messages":[{"role":"wizard","content":"hello"}]}"#;
        assert!(serde_json::from_str::<ChatRequest>(body).is_err());
    }

    #[test]
    fn test_api_error_statuses() {
        let resp = ApiError::BadRequest("no user message".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = ApiError::Upstream(LlmError::BadResponse {
            endpoint: "http://localhost/v1/chat/completions".to_string(),
            detail: "HTTP 500".to_string(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
