use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::collaborators::{CollaboratorError, MessageId, MessageQueue};
use crate::domain::request::QueuedRequest;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTicket {
    pub message_id: MessageId,
    pub fingerprint: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("request could not be serialized: {0}")]
    Serialization(String),
    #[error("request could not be enqueued: {0}")]
    Enqueue(#[from] CollaboratorError),
}

/// Hands completed requests to the outbound queue.
///
/// No idempotency key is attached: a front end that retries a fulfillment call
/// can enqueue the same request twice.
#[derive(Clone)]
pub struct RequestSubmitter {
    queue: Arc<dyn MessageQueue>,
}

impl RequestSubmitter {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    pub async fn submit(
        &self,
        request: &QueuedRequest,
    ) -> Result<SubmissionTicket, SubmissionError> {
        let fingerprint = request.fingerprint();
        let body = request
            .to_message_body()
            .map_err(|error| SubmissionError::Serialization(error.to_string()))?;

        match self.queue.send(body).await {
            Ok(message_id) => {
                info!(
                    event_name = "submitter.request_enqueued",
                    message_id = %message_id,
                    fingerprint = %fingerprint,
                    cuisine = %request.cuisine,
                    "dining request enqueued"
                );
                Ok(SubmissionTicket { message_id, fingerprint })
            }
            Err(error) => {
                warn!(
                    event_name = "submitter.enqueue_failed",
                    fingerprint = %fingerprint,
                    error = %error,
                    "dining request could not be enqueued"
                );
                Err(SubmissionError::Enqueue(error))
            }
        }
    }
}
