use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// The three independent choices composed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Generator,
    Formatter,
    Delivery,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Generator => "report type",
            Axis::Formatter => "output format",
            Axis::Delivery => "delivery method",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the pipeline core. None of them are retried; they reach the caller as-is.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown {axis}: {name}")]
    UnknownType { name: String, axis: Axis },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Missing email recipient")]
    MissingRecipient,

    #[error("Missing cloud destination URL")]
    MissingDestination,

    #[error("Delivery via {channel} failed: {source}")]
    DeliveryFailed {
        channel: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn unknown(name: impl Into<String>, axis: Axis) -> Self {
        PipelineError::UnknownType {
            name: name.into(),
            axis,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        PipelineError::MalformedPayload(msg.into())
    }

    /// Stable tag for logs, metrics and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnknownType { .. } => "unknown_type",
            PipelineError::MalformedPayload(_) => "malformed_payload",
            PipelineError::InvalidContent(_) => "invalid_content",
            PipelineError::MissingRecipient => "missing_recipient",
            PipelineError::MissingDestination => "missing_destination",
            PipelineError::DeliveryFailed { .. } => "delivery_failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::Pipeline(e @ PipelineError::DeliveryFailed { .. }) => {
                (StatusCode::BAD_GATEWAY, e.kind())
            }
            AppError::Pipeline(e) => (StatusCode::BAD_REQUEST, e.kind()),
        }
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let error_message = match &self {
            AppError::Pipeline(e @ PipelineError::DeliveryFailed { .. }) => {
                tracing::error!(error = %e, kind = kind, "Delivery error");
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "kind": kind,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "kind": kind,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_message() {
        let error = PipelineError::unknown("xml", Axis::Formatter);
        assert_eq!(error.to_string(), "Unknown output format: xml");
        assert_eq!(error.kind(), "unknown_type");
    }

    #[test]
    fn test_malformed_payload_message() {
        let error = PipelineError::malformed("'sales' must be a list");
        assert_eq!(error.to_string(), "Malformed payload: 'sales' must be a list");
    }

    #[test]
    fn test_delivery_failed_keeps_cause() {
        let error = PipelineError::DeliveryFailed {
            channel: "cloud".to_string(),
            source: anyhow::anyhow!("503 service unavailable"),
        };
        assert_eq!(
            error.to_string(),
            "Delivery via cloud failed: 503 service unavailable"
        );
        let source = std::error::Error::source(&error).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("503 service unavailable"));
    }

    #[test]
    fn test_pipeline_error_is_transparent() {
        let error = AppError::from(PipelineError::MissingRecipient);
        assert_eq!(error.to_string(), "Missing email recipient");
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (
                AppError::Validation("test".to_string()),
                StatusCode::BAD_REQUEST,
                "validation",
            ),
            (
                AppError::Pipeline(PipelineError::unknown("x", Axis::Generator)),
                StatusCode::BAD_REQUEST,
                "unknown_type",
            ),
            (
                AppError::Pipeline(PipelineError::MissingDestination),
                StatusCode::BAD_REQUEST,
                "missing_destination",
            ),
            (
                AppError::Pipeline(PipelineError::DeliveryFailed {
                    channel: "email".to_string(),
                    source: anyhow::anyhow!("relay down"),
                }),
                StatusCode::BAD_GATEWAY,
                "delivery_failed",
            ),
        ];

        for (error, expected_status, expected_kind) in test_cases {
            let (status, kind) = error.status_and_kind();
            assert_eq!(status, expected_status);
            assert_eq!(kind, expected_kind);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Pipeline(PipelineError::MissingRecipient).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
