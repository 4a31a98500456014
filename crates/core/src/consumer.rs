use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collaborators::{
    CollaboratorError, EmailMessageId, MessageId, MessageQueue, ReceivedMessage,
};
use crate::config::NotificationFailurePolicy;
use crate::domain::request::{QueuedRequest, RequestError};
use crate::notifier::{NotificationError, NotificationTemplate, Notifier};
use crate::resolver::{RecommendationResolver, ResolutionError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub wait: Duration,
    pub on_notification_failure: NotificationFailurePolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            on_notification_failure: NotificationFailurePolicy::Retain,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub message_id: MessageId,
    pub fingerprint: String,
    pub cuisine: String,
    pub restaurants: usize,
    pub template: NotificationTemplate,
    pub notification_id: EmailMessageId,
    pub receive_count: u32,
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("queue receive failed: {0}")]
    Receive(#[source] CollaboratorError),
    #[error("message `{message_id}` is not a valid request: {source}")]
    Parse { message_id: MessageId, source: RequestError },
    #[error("message `{message_id}` could not be resolved: {source}")]
    Resolution { message_id: MessageId, source: ResolutionError },
    #[error("message `{message_id}` notification failed (deleted: {deleted}): {source}")]
    Notification { message_id: MessageId, deleted: bool, source: NotificationError },
    #[error("message `{message_id}` was notified but not deleted: {source}")]
    Acknowledge { message_id: MessageId, source: CollaboratorError },
}

impl ConsumerError {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Receive(_) => "receive",
            Self::Parse { .. } => "parse",
            Self::Resolution { .. } => "resolution",
            Self::Notification { .. } => "notification",
            Self::Acknowledge { .. } => "acknowledge",
        }
    }

    /// The queue message the failure belongs to; `None` when nothing was received.
    pub fn message_id(&self) -> Option<&MessageId> {
        match self {
            Self::Receive(_) => None,
            Self::Parse { message_id, .. }
            | Self::Resolution { message_id, .. }
            | Self::Notification { message_id, .. }
            | Self::Acknowledge { message_id, .. } => Some(message_id),
        }
    }
}

#[derive(Debug)]
pub enum ConsumerOutcome {
    Idle,
    Processed(RequestSummary),
    Error(ConsumerError),
}

impl ConsumerOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processed(_) => "processed",
            Self::Error(_) => "error",
        }
    }
}

/// Pulls one queued dining request per invocation and drives it through the
/// resolver and notifier. A message is deleted only once its email went out.
#[derive(Clone)]
pub struct QueueConsumer {
    queue: Arc<dyn MessageQueue>,
    resolver: RecommendationResolver,
    notifier: Notifier,
    config: ConsumerConfig,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        resolver: RecommendationResolver,
        notifier: Notifier,
        config: ConsumerConfig,
    ) -> Self {
        Self { queue, resolver, notifier, config }
    }

    pub async fn process_once(&self) -> ConsumerOutcome {
        let message = match self.queue.receive(self.config.wait).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(event_name = "consumer.idle", "no pending requests");
                return ConsumerOutcome::Idle;
            }
            Err(error) => {
                warn!(event_name = "consumer.receive_failed", error = %error, "queue receive failed");
                return ConsumerOutcome::Error(ConsumerError::Receive(error));
            }
        };

        match self.process_message(message).await {
            Ok(summary) => ConsumerOutcome::Processed(summary),
            Err(error) => {
                warn!(
                    event_name = "consumer.message_failed",
                    error_class = error.class(),
                    error = %error,
                    "queued request was not processed"
                );
                ConsumerOutcome::Error(error)
            }
        }
    }

    async fn process_message(
        &self,
        message: ReceivedMessage,
    ) -> Result<RequestSummary, ConsumerError> {
        let message_id = message.message_id.clone();
        info!(
            event_name = "consumer.message_received",
            correlation_id = %message_id,
            receive_count = message.receive_count,
            "queued request received"
        );

        let request = QueuedRequest::from_message_body(&message.body)
            .map_err(|source| ConsumerError::Parse { message_id: message_id.clone(), source })?;
        let fingerprint = request.fingerprint();

        let restaurants = self
            .resolver
            .resolve(&request.cuisine)
            .await
            .map_err(|source| ConsumerError::Resolution { message_id: message_id.clone(), source })?;

        let receipt = match self.notifier.notify(&request, &restaurants).await {
            Ok(receipt) => receipt,
            Err(source) => {
                let deleted = match self.config.on_notification_failure {
                    NotificationFailurePolicy::Retain => false,
                    NotificationFailurePolicy::Delete => {
                        match self.queue.delete(&message.receipt_handle).await {
                            Ok(()) => true,
                            Err(error) => {
                                warn!(
                                    event_name = "consumer.acknowledge_failed",
                                    correlation_id = %message_id,
                                    error_class = error.class(),
                                    error = %error,
                                    "could not delete message after failed notification"
                                );
                                false
                            }
                        }
                    }
                };
                info!(
                    event_name = "consumer.notification_failure_policy",
                    correlation_id = %message_id,
                    policy = self.config.on_notification_failure.as_str(),
                    deleted,
                    "applied notification failure policy"
                );
                return Err(ConsumerError::Notification { message_id, deleted, source });
            }
        };

        self.queue.delete(&message.receipt_handle).await.map_err(|source| {
            ConsumerError::Acknowledge { message_id: message_id.clone(), source }
        })?;

        let summary = RequestSummary {
            message_id,
            fingerprint,
            cuisine: request.cuisine,
            restaurants: restaurants.len(),
            template: receipt.template,
            notification_id: receipt.message_id,
            receive_count: message.receive_count,
        };
        info!(
            event_name = "consumer.message_processed",
            correlation_id = %summary.message_id,
            fingerprint = %summary.fingerprint,
            restaurants = summary.restaurants,
            template = summary.template.as_str(),
            "queued request processed"
        );
        Ok(summary)
    }
}
