use serde::{Deserialize, Serialize};

use crate::domain::slots::{SlotName, SlotSet};

pub const GREETING_INTENT: &str = "GreetingIntent";
pub const THANK_YOU_INTENT: &str = "ThankYouIntent";
pub const DINING_SUGGESTIONS_INTENT: &str = "DiningSuggestionsIntent";

pub const GREETING_MESSAGE: &str = "Hi there, how can I help?";
pub const THANK_YOU_MESSAGE: &str = "You're welcome!";
pub const CONFIRMATION_MESSAGE: &str =
    "Thank you! We have received your request and will notify you via email with restaurant suggestions.";
pub const NOT_UNDERSTOOD_MESSAGE: &str = "Sorry, I didn't understand that.";
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "Sorry, we could not submit your request right now. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Greeting,
    ThankYou,
    DiningSuggestions,
    Unknown(String),
}

impl Intent {
    pub fn from_name(name: &str) -> Self {
        match name {
            GREETING_INTENT => Self::Greeting,
            THANK_YOU_INTENT => Self::ThankYou,
            DINING_SUGGESTIONS_INTENT => Self::DiningSuggestions,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Greeting => GREETING_INTENT,
            Self::ThankYou => THANK_YOU_INTENT,
            Self::DiningSuggestions => DINING_SUGGESTIONS_INTENT,
            Self::Unknown(name) => name,
        }
    }
}

/// The branch a turn ended in. Greeting and ThankYou close as fulfilled;
/// CollectingSlots ends the turn but not the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    Greeting,
    ThankYou,
    CollectingSlots,
    Fulfilled,
    Failed,
    Rejected(RejectionReason),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    UnknownIntent(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogMessage {
    pub content_type: ContentType,
    pub content: String,
}

impl DialogMessage {
    pub fn plain(content: impl Into<String>) -> Self {
        Self { content_type: ContentType::PlainText, content: content.into() }
    }
}

/// Directive returned to the conversational front end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DialogAction {
    ElicitSlot {
        #[serde(rename = "intentName")]
        intent_name: String,
        slots: SlotSet,
        #[serde(rename = "slotToElicit")]
        slot_to_elicit: SlotName,
        message: DialogMessage,
    },
    Close {
        #[serde(rename = "fulfillmentState")]
        fulfillment_state: FulfillmentState,
        message: DialogMessage,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    pub dialog_action: DialogAction,
}

impl DialogResponse {
    pub fn close(fulfillment_state: FulfillmentState, content: impl Into<String>) -> Self {
        Self {
            dialog_action: DialogAction::Close {
                fulfillment_state,
                message: DialogMessage::plain(content),
            },
        }
    }

    pub fn elicit(intent_name: impl Into<String>, slots: SlotSet, slot: SlotName) -> Self {
        Self {
            dialog_action: DialogAction::ElicitSlot {
                intent_name: intent_name.into(),
                slots,
                slot_to_elicit: slot,
                message: DialogMessage::plain(elicitation_prompt(slot)),
            },
        }
    }

    pub fn message(&self) -> &DialogMessage {
        match &self.dialog_action {
            DialogAction::ElicitSlot { message, .. } | DialogAction::Close { message, .. } => {
                message
            }
        }
    }
}

pub fn elicitation_prompt(slot: SlotName) -> String {
    format!("Please provide the {}.", slot.as_str().to_lowercase())
}

/// Result of one fulfillment invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogTurn {
    pub state: DialogState,
    pub response: DialogResponse,
}
