//! Contracts for the external services the pipeline talks to.
//!
//! The queue, search index, detail store and email sender are owned by other
//! systems. Components receive them as trait objects so deployments can plug in
//! SQLite, HTTP or in-memory implementations.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::restaurant::{Restaurant, RestaurantId};

pub mod memory;

pub use memory::{
    InMemoryDetailStore, InMemoryMessageQueue, InMemorySearchIndex, RecordingEmailSender,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
    #[error("collaborator returned a malformed response: {0}")]
    Malformed(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl CollaboratorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Rejected(_) => "rejected",
            Self::Malformed(_) => "malformed",
            Self::NotFound(_) => "not_found",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptHandle(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailMessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EmailMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: MessageId,
    pub receipt_handle: ReceiptHandle,
    pub body: String,
    pub receive_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEmail {
    pub source: String,
    pub destination: Vec<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Durable queue with visibility-timeout semantics.
///
/// A received message stays invisible to other consumers until it is deleted or
/// its visibility timeout expires, after which it can be received again.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, body: String) -> Result<MessageId, CollaboratorError>;

    /// Waits up to `wait` for one message.
    async fn receive(&self, wait: Duration) -> Result<Option<ReceivedMessage>, CollaboratorError>;

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Returns up to `size` identifiers ranked by the index's own relevance.
    /// An empty result is `Ok`; only genuine failures are errors.
    async fn search_by_cuisine(
        &self,
        cuisine: &str,
        size: usize,
    ) -> Result<Vec<RestaurantId>, CollaboratorError>;
}

#[async_trait]
pub trait DetailStore: Send + Sync {
    async fn get(&self, id: &RestaurantId) -> Result<Option<Restaurant>, CollaboratorError>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<EmailMessageId, CollaboratorError>;
}
