//! The `/v1/prompt` route.

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lumod_driver::AskError;

use crate::server::AppState;

/// Applied when the request carries no timeout (or a zero one).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Upper bound on client-requested timeouts.
pub const MAX_TIMEOUT_SECS: u64 = 3600;
/// Longest accepted prompt, in bytes.
pub const MAX_PROMPT_BYTES: usize = 4096;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub web_search: bool,
    /// Seconds to wait for the answer.
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptResponse {
    fn answer(text: String) -> Self {
        Self {
            answer: Some(text),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            answer: None,
            error: Some(message.into()),
        }
    }
}

pub async fn prompt_handler(
    State(state): State<AppState>,
    Json(req): Json<PromptRequest>,
) -> Response {
    if req.prompt.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "prompt must not be empty");
    }
    if req.prompt.len() > MAX_PROMPT_BYTES {
        return reject(
            StatusCode::BAD_REQUEST,
            format!("prompt exceeds {MAX_PROMPT_BYTES} bytes"),
        );
    }

    let timeout = resolve_timeout(req.timeout);
    match state.prompts.ask(&req.prompt, req.web_search, timeout).await {
        Ok(answer) => (StatusCode::OK, Json(PromptResponse::answer(answer))).into_response(),
        Err(err) => {
            warn!(error = %err, "prompt failed");
            reject(status_for(&err), err.to_string())
        },
    }
}

fn reject(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(PromptResponse::error(message))).into_response()
}

fn status_for(err: &AskError) -> StatusCode {
    match err {
        AskError::Busy => StatusCode::SERVICE_UNAVAILABLE,
        AskError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        AskError::Submission(_) => StatusCode::BAD_GATEWAY,
    }
}

fn resolve_timeout(requested: Option<u64>) -> Duration {
    let secs = requested
        .filter(|&t| t > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .min(MAX_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::server::build_app;
    use crate::service::PromptService;

    enum StubBehavior {
        Answer(String),
        Busy,
        Timeout,
        Submission(String),
    }

    struct StubService {
        behavior: StubBehavior,
        calls: Mutex<Vec<(String, bool, Duration)>>,
    }

    #[async_trait]
    impl PromptService for StubService {
        async fn ask(
            &self,
            prompt: &str,
            web_search: bool,
            timeout: Duration,
        ) -> Result<String, AskError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_owned(), web_search, timeout));
            match &self.behavior {
                StubBehavior::Answer(text) => Ok(text.clone()),
                StubBehavior::Busy => Err(AskError::Busy),
                StubBehavior::Timeout => Err(AskError::Timeout),
                StubBehavior::Submission(msg) => Err(AskError::Submission(msg.clone())),
            }
        }
    }

    fn app(behavior: StubBehavior) -> (Router, Arc<StubService>) {
        let stub = Arc::new(StubService {
            behavior,
            calls: Mutex::new(Vec::new()),
        });
        let state = AppState {
            prompts: stub.clone(),
        };
        (build_app(state), stub)
    }

    async fn post_prompt(app: Router, body: serde_json::Value) -> (StatusCode, PromptResponse) {
        let response = app
            .oneshot(
                Request::post("/v1/prompt")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn answer_round_trips_with_defaults() {
        let (app, stub) = app(StubBehavior::Answer("the answer".to_owned()));

        let (status, body) = post_prompt(app, serde_json::json!({"prompt": "hello"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.answer.as_deref(), Some("the answer"));
        assert!(body.error.is_none());

        let calls = stub.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "hello".to_owned(),
                false,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            )]
        );
    }

    #[tokio::test]
    async fn web_search_and_timeout_are_forwarded() {
        let (app, stub) = app(StubBehavior::Answer("ok".to_owned()));

        let (status, _) = post_prompt(
            app,
            serde_json::json!({"prompt": "q", "webSearch": true, "timeout": 120}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let calls = stub.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("q".to_owned(), true, Duration::from_secs(120))]
        );
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_without_reaching_the_driver() {
        let (app, stub) = app(StubBehavior::Answer("never".to_owned()));

        let (status, body) = post_prompt(app, serde_json::json!({"prompt": ""})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.unwrap().contains("empty"));
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_prompt_is_rejected() {
        let (app, stub) = app(StubBehavior::Answer("never".to_owned()));
        let long = "x".repeat(MAX_PROMPT_BYTES + 1);

        let (status, body) = post_prompt(app, serde_json::json!({"prompt": long})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.unwrap().contains("4096"));
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_at_the_limit_is_accepted() {
        let (app, _) = app(StubBehavior::Answer("ok".to_owned()));
        let exact = "x".repeat(MAX_PROMPT_BYTES);

        let (status, _) = post_prompt(app, serde_json::json!({"prompt": exact})).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn busy_maps_to_service_unavailable() {
        let (app, _) = app(StubBehavior::Busy);

        let (status, body) = post_prompt(app, serde_json::json!({"prompt": "hi"})).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.unwrap().contains("in flight"));
    }

    #[tokio::test]
    async fn timeout_maps_to_gateway_timeout() {
        let (app, _) = app(StubBehavior::Timeout);

        let (status, body) = post_prompt(app, serde_json::json!({"prompt": "hi"})).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body.error.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn submission_failure_maps_to_bad_gateway() {
        let (app, _) = app(StubBehavior::Submission("typing failed".to_owned()));

        let (status, body) = post_prompt(app, serde_json::json!({"prompt": "hi"})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.unwrap().contains("typing failed"));
    }

    #[test]
    fn zero_and_missing_timeouts_fall_back_to_the_default() {
        assert_eq!(
            resolve_timeout(None),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert_eq!(
            resolve_timeout(Some(0)),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn oversized_timeouts_are_capped() {
        assert_eq!(
            resolve_timeout(Some(86_400)),
            Duration::from_secs(MAX_TIMEOUT_SECS)
        );
    }
}
