use serde_json::Value;
use tracing::{info, warn};

use crate::dialog::request::DialogRequest;
use crate::dialog::states::{
    DialogResponse, DialogState, DialogTurn, FulfillmentState, Intent, RejectionReason,
    CONFIRMATION_MESSAGE, GREETING_MESSAGE, NOT_UNDERSTOOD_MESSAGE, SUBMISSION_FAILED_MESSAGE,
    THANK_YOU_MESSAGE,
};
use crate::dialog::validator::validate;
use crate::domain::request::QueuedRequest;
use crate::submitter::RequestSubmitter;

/// What a single invocation should do, decided without side effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogDecision {
    Respond(DialogTurn),
    Submit(QueuedRequest),
}

pub fn decide(request: &DialogRequest) -> DialogDecision {
    match &request.intent {
        Intent::Greeting => DialogDecision::Respond(DialogTurn {
            state: DialogState::Greeting,
            response: DialogResponse::close(FulfillmentState::Fulfilled, GREETING_MESSAGE),
        }),
        Intent::ThankYou => DialogDecision::Respond(DialogTurn {
            state: DialogState::ThankYou,
            response: DialogResponse::close(FulfillmentState::Fulfilled, THANK_YOU_MESSAGE),
        }),
        Intent::DiningSuggestions => {
            if let Some(slot) = validate(&request.slots).first_missing {
                return DialogDecision::Respond(DialogTurn {
                    state: DialogState::CollectingSlots,
                    response: DialogResponse::elicit(
                        request.intent.name(),
                        request.slots.clone(),
                        slot,
                    ),
                });
            }

            match QueuedRequest::from_slots(&request.slots) {
                Ok(queued) => DialogDecision::Submit(queued),
                Err(error) => DialogDecision::Respond(DialogTurn {
                    state: DialogState::Failed,
                    response: DialogResponse::close(FulfillmentState::Failed, error.to_string()),
                }),
            }
        }
        Intent::Unknown(name) => DialogDecision::Respond(DialogTurn {
            state: DialogState::Rejected(RejectionReason::UnknownIntent(name.clone())),
            response: DialogResponse::close(FulfillmentState::Failed, NOT_UNDERSTOOD_MESSAGE),
        }),
    }
}

/// Fulfillment handler for the dining conversation.
#[derive(Clone)]
pub struct DialogEngine {
    submitter: RequestSubmitter,
}

impl DialogEngine {
    pub fn new(submitter: RequestSubmitter) -> Self {
        Self { submitter }
    }

    /// Handles a raw fulfillment event; malformed events become a failed close.
    pub async fn handle_event(&self, event: &Value) -> DialogTurn {
        match DialogRequest::from_event(event) {
            Ok(request) => self.handle(request).await,
            Err(error) => {
                warn!(
                    event_name = "dialog.malformed_input",
                    key = %error.key,
                    "fulfillment event is missing a required key"
                );
                DialogTurn {
                    state: DialogState::Failed,
                    response: DialogResponse::close(FulfillmentState::Failed, error.user_message()),
                }
            }
        }
    }

    pub async fn handle(&self, request: DialogRequest) -> DialogTurn {
        let turn = match decide(&request) {
            DialogDecision::Respond(turn) => turn,
            DialogDecision::Submit(queued) => match self.submitter.submit(&queued).await {
                Ok(_) => DialogTurn {
                    state: DialogState::Fulfilled,
                    response: DialogResponse::close(
                        FulfillmentState::Fulfilled,
                        CONFIRMATION_MESSAGE,
                    ),
                },
                Err(_) => DialogTurn {
                    state: DialogState::Failed,
                    response: DialogResponse::close(
                        FulfillmentState::Failed,
                        SUBMISSION_FAILED_MESSAGE,
                    ),
                },
            },
        };

        info!(
            event_name = "dialog.turn_completed",
            intent = request.intent.name(),
            state = ?turn.state,
            "dialog turn completed"
        );
        turn
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{decide, DialogDecision, DialogEngine};
    use crate::collaborators::{CollaboratorError, InMemoryMessageQueue};
    use crate::dialog::request::DialogRequest;
    use crate::dialog::states::{
        DialogAction, DialogState, FulfillmentState, Intent, RejectionReason,
        CONFIRMATION_MESSAGE, GREETING_MESSAGE, NOT_UNDERSTOOD_MESSAGE,
        SUBMISSION_FAILED_MESSAGE, THANK_YOU_MESSAGE,
    };
    use crate::domain::slots::{SlotName, SlotSet};
    use crate::submitter::RequestSubmitter;

    fn engine(queue: &InMemoryMessageQueue) -> DialogEngine {
        DialogEngine::new(RequestSubmitter::new(Arc::new(queue.clone())))
    }

    fn complete_slots() -> SlotSet {
        SlotSet::default()
            .with(SlotName::Location, "NYC")
            .with(SlotName::Cuisine, "Mexican")
            .with(SlotName::DiningTime, "7pm")
            .with(SlotName::NumberOfPeople, "4")
            .with(SlotName::Email, "a@b.com")
    }

    fn close_of(action: &DialogAction) -> (FulfillmentState, &str) {
        match action {
            DialogAction::Close { fulfillment_state, message } => {
                (*fulfillment_state, message.content.as_str())
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn greeting_and_thanks_are_pure_functions_of_the_intent() {
        for (intent, state, expected) in [
            (Intent::Greeting, DialogState::Greeting, GREETING_MESSAGE),
            (Intent::ThankYou, DialogState::ThankYou, THANK_YOU_MESSAGE),
        ] {
            let request = DialogRequest::new(intent, complete_slots());
            let first = decide(&request);
            let second = decide(&DialogRequest::new(request.intent.clone(), SlotSet::default()));
            assert_eq!(first, second);

            let DialogDecision::Respond(turn) = first else {
                panic!("greeting intents never submit");
            };
            assert_eq!(turn.state, state);
            assert_eq!(
                close_of(&turn.response.dialog_action),
                (FulfillmentState::Fulfilled, expected)
            );
        }
    }

    #[test]
    fn unknown_intent_is_rejected_without_elicitation() {
        let request =
            DialogRequest::new(Intent::Unknown("BookFlight".to_owned()), SlotSet::default());
        let DialogDecision::Respond(turn) = decide(&request) else {
            panic!("unknown intents never submit");
        };

        assert_eq!(
            turn.state,
            DialogState::Rejected(RejectionReason::UnknownIntent("BookFlight".to_owned()))
        );
        assert_eq!(
            close_of(&turn.response.dialog_action),
            (FulfillmentState::Failed, NOT_UNDERSTOOD_MESSAGE)
        );
    }

    #[test]
    fn complete_booking_decides_to_submit() {
        let request = DialogRequest::new(Intent::DiningSuggestions, complete_slots());
        assert!(matches!(decide(&request), DialogDecision::Submit(queued) if queued.cuisine == "Mexican"));
    }

    #[tokio::test]
    async fn blank_cuisine_elicits_cuisine() {
        let queue = InMemoryMessageQueue::default();
        let turn = engine(&queue)
            .handle_event(&json!({
                "currentIntent": {
                    "name": "DiningSuggestionsIntent",
                    "slots": {
                        "Location": "NYC",
                        "Cuisine": "",
                        "DiningTime": "7pm",
                        "NumberOfPeople": "4",
                        "Email": "a@b.com"
                    }
                }
            }))
            .await;

        assert_eq!(turn.state, DialogState::CollectingSlots);
        match turn.response.dialog_action {
            DialogAction::ElicitSlot { intent_name, slots, slot_to_elicit, message } => {
                assert_eq!(intent_name, "DiningSuggestionsIntent");
                assert_eq!(slot_to_elicit, SlotName::Cuisine);
                assert_eq!(message.content, "Please provide the cuisine.");
                assert_eq!(slots.get(SlotName::Location), Some("NYC"));
            }
            other => panic!("expected elicitation, got {other:?}"),
        }
        assert!(queue.is_empty(), "elicitation must not enqueue");
    }

    #[tokio::test]
    async fn whitespace_cuisine_is_elicited_instead_of_enqueued() {
        let queue = InMemoryMessageQueue::default();
        let turn = engine(&queue)
            .handle(DialogRequest::new(
                Intent::DiningSuggestions,
                complete_slots().with(SlotName::Cuisine, "  "),
            ))
            .await;

        assert_eq!(turn.state, DialogState::CollectingSlots);
        assert!(matches!(
            turn.response.dialog_action,
            DialogAction::ElicitSlot { slot_to_elicit: SlotName::Cuisine, .. }
        ));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn complete_booking_is_enqueued_and_confirmed() {
        let queue = InMemoryMessageQueue::default();
        let turn = engine(&queue)
            .handle(DialogRequest::new(Intent::DiningSuggestions, complete_slots()))
            .await;

        assert_eq!(turn.state, DialogState::Fulfilled);
        assert_eq!(
            close_of(&turn.response.dialog_action),
            (FulfillmentState::Fulfilled, CONFIRMATION_MESSAGE)
        );
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn submission_failure_closes_as_failed() {
        let queue = InMemoryMessageQueue::default();
        queue.fail_sends_with(CollaboratorError::Unavailable("offline".to_owned()));

        let turn = engine(&queue)
            .handle(DialogRequest::new(Intent::DiningSuggestions, complete_slots()))
            .await;

        assert_eq!(turn.state, DialogState::Failed);
        assert_eq!(
            close_of(&turn.response.dialog_action),
            (FulfillmentState::Failed, SUBMISSION_FAILED_MESSAGE)
        );
    }

    #[tokio::test]
    async fn malformed_event_fails_with_offending_key() {
        let queue = InMemoryMessageQueue::default();
        let turn = engine(&queue).handle_event(&json!({ "inputTranscript": "hi" })).await;

        assert_eq!(turn.state, DialogState::Failed);
        assert_eq!(
            close_of(&turn.response.dialog_action),
            (
                FulfillmentState::Failed,
                "An error occurred: 'currentIntent'. Please check the event structure."
            )
        );
    }
}
