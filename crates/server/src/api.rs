use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use concierge_core::{
    ConsumerOutcome, DialogEngine, DialogResponse, InterfaceError, QueueConsumer, RequestSummary,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::health::{self, HealthState};

#[derive(Clone)]
pub struct ApiState {
    pub dialog: DialogEngine,
    pub consumer: QueueConsumer,
}

#[derive(Debug, Serialize)]
pub struct ProcessOnceResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RequestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessOnceError>,
}

#[derive(Debug, Serialize)]
pub struct ProcessOnceError {
    pub error_class: &'static str,
    pub kind: &'static str,
    pub message: &'static str,
    pub correlation_id: String,
}

pub fn router(state: ApiState, health_state: HealthState) -> Router {
    Router::new()
        .route("/fulfillment", post(fulfillment))
        .route("/consumer/process-once", post(process_once))
        .with_state(state)
        .merge(health::router(health_state))
}

/// Dialog webhook. Always answers 200; unreadable bodies become a failed close.
pub async fn fulfillment(State(state): State<ApiState>, body: Bytes) -> Json<DialogResponse> {
    let event = serde_json::from_slice::<Value>(&body).unwrap_or_else(|error| {
        warn!(
            event_name = "dialog.invalid_json",
            error = %error,
            "fulfillment body is not valid JSON"
        );
        Value::Null
    });

    Json(state.dialog.handle_event(&event).await.response)
}

pub async fn process_once(
    State(state): State<ApiState>,
) -> (StatusCode, Json<ProcessOnceResponse>) {
    let outcome = state.consumer.process_once().await;
    let label = outcome.label();

    match outcome {
        ConsumerOutcome::Idle => (
            StatusCode::OK,
            Json(ProcessOnceResponse { outcome: label, summary: None, error: None }),
        ),
        ConsumerOutcome::Processed(summary) => (
            StatusCode::OK,
            Json(ProcessOnceResponse { outcome: label, summary: Some(summary), error: None }),
        ),
        ConsumerOutcome::Error(error) => {
            let error_class = error.class();
            let correlation_id = error
                .message_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let interface = error.into_interface(correlation_id);

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProcessOnceResponse {
                    outcome: label,
                    summary: None,
                    error: Some(ProcessOnceError {
                        error_class,
                        kind: interface_kind(&interface),
                        message: interface.user_message(),
                        correlation_id: interface.correlation_id().to_string(),
                    }),
                }),
            )
        }
    }
}

fn interface_kind(error: &InterfaceError) -> &'static str {
    match error {
        InterfaceError::BadRequest { .. } => "bad_request",
        InterfaceError::ServiceUnavailable { .. } => "service_unavailable",
        InterfaceError::Internal { .. } => "internal",
    }
}
