use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::consumer::ConsumerError;
use crate::notifier::NotificationError;

/// Error shape exposed at the HTTP boundary; internal detail stays in `message`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The queued request could not be processed. It will not succeed on retry."
            }
            Self::ServiceUnavailable { .. } => {
                "A downstream service is temporarily unavailable. The request will be retried."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ConsumerError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::Parse { .. } => InterfaceError::BadRequest { message, correlation_id },
            Self::Notification { source: NotificationError::Template(_), .. } => {
                InterfaceError::Internal { message, correlation_id }
            }
            Self::Notification {
                source: NotificationError::Delivery(CollaboratorError::Rejected(_)),
                ..
            } => InterfaceError::BadRequest { message, correlation_id },
            Self::Receive(_)
            | Self::Resolution { .. }
            | Self::Notification { .. }
            | Self::Acknowledge { .. } => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::collaborators::{CollaboratorError, MessageId};
    use crate::consumer::ConsumerError;
    use crate::domain::request::RequestError;
    use crate::errors::InterfaceError;
    use crate::notifier::NotificationError;
    use crate::resolver::ResolutionError;

    fn message_id() -> MessageId {
        MessageId("m-1".to_owned())
    }

    #[test]
    fn parse_error_maps_to_bad_request() {
        let interface = ConsumerError::Parse {
            message_id: message_id(),
            source: RequestError::Decode("expected value".to_owned()),
        }
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, .. } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The queued request could not be processed. It will not succeed on retry."
        );
    }

    #[test]
    fn search_outage_maps_to_service_unavailable() {
        let interface = ConsumerError::Resolution {
            message_id: message_id(),
            source: ResolutionError::Search(CollaboratorError::Unavailable("503".to_owned())),
        }
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn rejected_email_is_not_reported_as_transient() {
        let interface = ConsumerError::Notification {
            message_id: message_id(),
            deleted: false,
            source: NotificationError::Delivery(CollaboratorError::Rejected(
                "unverified".to_owned(),
            )),
        }
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
    }

    #[test]
    fn template_failure_maps_to_internal() {
        let interface = ConsumerError::Notification {
            message_id: message_id(),
            deleted: false,
            source: NotificationError::Template("unknown variable".to_owned()),
        }
        .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
