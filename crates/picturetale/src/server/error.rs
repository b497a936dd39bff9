//! Mapping of pipeline failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use picturetale_core::PipelineError;
use serde_json::json;

/// Error returned by API handlers, rendered as `{ "error", "kind" }`.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    BadRequest(String),
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(PipelineError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::ModelUnavailable { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(PipelineError::Synthesis(_)) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Pipeline(e) => e.kind(),
            ApiError::BadRequest(_) => "invalid_input",
            ApiError::NotFound(_) => "not_found",
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Pipeline(e) => write!(f, "{e}"),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("{self}");
        } else {
            tracing::debug!("Rejected request: {self}");
        }
        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picturetale_core::Stage;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(PipelineError::InvalidInput("empty".into())),
                StatusCode::BAD_REQUEST,
                "invalid_input",
            ),
            (
                ApiError::from(PipelineError::unavailable(Stage::Story, "timed out")),
                StatusCode::BAD_GATEWAY,
                "model_unavailable",
            ),
            (
                ApiError::from(PipelineError::Synthesis("no audio".into())),
                StatusCode::BAD_GATEWAY,
                "synthesis_error",
            ),
            (
                ApiError::NotFound("no audio yet".into()),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
        ];

        for (error, status, kind) in cases {
            assert_eq!(error.status(), status);
            assert_eq!(error.kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_response_body() {
        let response =
            ApiError::from(PipelineError::unavailable(Stage::Caption, "503 loading"))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "model_unavailable");
        assert_eq!(body["error"], "caption model unavailable: 503 loading");
    }
}
