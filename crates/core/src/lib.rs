pub mod collaborators;
pub mod config;
pub mod consumer;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod notifier;
pub mod resolver;
pub mod retry;
pub mod submitter;

pub use collaborators::{
    CollaboratorError, DetailStore, EmailMessageId, EmailSender, MessageId, MessageQueue,
    OutgoingEmail, ReceiptHandle, ReceivedMessage, SearchIndex,
};
pub use consumer::{ConsumerConfig, ConsumerError, ConsumerOutcome, QueueConsumer, RequestSummary};
pub use dialog::{DialogEngine, DialogResponse, DialogTurn};
pub use domain::request::{QueuedRequest, RequestError};
pub use domain::restaurant::{Restaurant, RestaurantId};
pub use domain::slots::{SlotName, SlotSet};
pub use errors::InterfaceError;
pub use notifier::{NotificationError, NotificationReceipt, NotificationTemplate, Notifier};
pub use resolver::{RecommendationResolver, ResolutionError};
pub use retry::RetryPolicy;
pub use submitter::{RequestSubmitter, SubmissionError, SubmissionTicket};
