use serde_json::{Map, Value};
use thiserror::Error;

use crate::dialog::states::Intent;
use crate::domain::slots::{SlotName, SlotSet};

/// The invocation is missing a structural key (not merely an unfilled slot).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("malformed fulfillment event: missing key '{key}'")]
pub struct MalformedInput {
    pub key: String,
}

impl MalformedInput {
    fn key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Message surfaced to the front end, naming the offending key.
    pub fn user_message(&self) -> String {
        format!("An error occurred: '{}'. Please check the event structure.", self.key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogRequest {
    pub intent: Intent,
    pub slots: SlotSet,
}

impl DialogRequest {
    pub fn new(intent: Intent, slots: SlotSet) -> Self {
        Self { intent, slots }
    }

    /// Parses a fulfillment event.
    ///
    /// Accepts the front end's `{"currentIntent": {"name", "slots"}}` shape and the
    /// flat `{"intentName", "slots"}` shape. Slots are only structurally required
    /// for the booking intent, where each of the five slot keys must be present
    /// (its value may be `null`).
    pub fn from_event(event: &Value) -> Result<Self, MalformedInput> {
        let (intent_name, slots) = match event.get("currentIntent") {
            Some(current) => {
                let name = current
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| MalformedInput::key("name"))?;
                (name, current.get("slots"))
            }
            None => {
                let name = event
                    .get("intentName")
                    .and_then(Value::as_str)
                    .ok_or_else(|| MalformedInput::key("currentIntent"))?;
                (name, event.get("slots"))
            }
        };

        let intent = Intent::from_name(intent_name);
        let slots = match intent {
            Intent::DiningSuggestions => {
                let object = slots
                    .and_then(Value::as_object)
                    .ok_or_else(|| MalformedInput::key("slots"))?;
                parse_slots(object)?
            }
            _ => slots
                .and_then(Value::as_object)
                .and_then(|object| parse_slots(object).ok())
                .unwrap_or_default(),
        };

        Ok(Self { intent, slots })
    }
}

fn parse_slots(object: &Map<String, Value>) -> Result<SlotSet, MalformedInput> {
    let mut slots = SlotSet::default();
    for slot in SlotName::ALL {
        let value = match object.get(slot.as_str()) {
            None => return Err(MalformedInput::key(slot.as_str())),
            Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(Value::Number(value)) => Some(value.to_string()),
            Some(_) => return Err(MalformedInput::key(slot.as_str())),
        };
        slots.set(slot, value);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DialogRequest, MalformedInput};
    use crate::dialog::states::Intent;
    use crate::domain::slots::SlotName;

    fn booking_slots() -> serde_json::Value {
        json!({
            "Location": "NYC",
            "Cuisine": null,
            "DiningTime": "7pm",
            "NumberOfPeople": 4,
            "Email": "a@b.com"
        })
    }

    #[test]
    fn parses_current_intent_shape() {
        let request = DialogRequest::from_event(&json!({
            "currentIntent": { "name": "DiningSuggestionsIntent", "slots": booking_slots() }
        }))
        .expect("well-formed event");

        assert_eq!(request.intent, Intent::DiningSuggestions);
        assert_eq!(request.slots.get(SlotName::Location), Some("NYC"));
        assert_eq!(request.slots.get(SlotName::Cuisine), None);
        assert_eq!(request.slots.get(SlotName::NumberOfPeople), Some("4"));
    }

    #[test]
    fn parses_flat_shape() {
        let request = DialogRequest::from_event(&json!({
            "intentName": "DiningSuggestionsIntent",
            "slots": booking_slots()
        }))
        .expect("well-formed event");

        assert_eq!(request.intent, Intent::DiningSuggestions);
        assert_eq!(request.slots.get(SlotName::Email), Some("a@b.com"));
    }

    #[test]
    fn greeting_does_not_require_slots() {
        let request =
            DialogRequest::from_event(&json!({ "currentIntent": { "name": "GreetingIntent" } }))
                .expect("greeting needs only a name");
        assert_eq!(request.intent, Intent::Greeting);
    }

    #[test]
    fn missing_structural_keys_are_named() {
        let cases = [
            (json!({}), "currentIntent"),
            (json!({ "currentIntent": {} }), "name"),
            (json!({ "currentIntent": { "name": "DiningSuggestionsIntent" } }), "slots"),
            (
                json!({
                    "currentIntent": {
                        "name": "DiningSuggestionsIntent",
                        "slots": { "Location": "NYC", "Cuisine": "Thai", "DiningTime": null, "Email": null }
                    }
                }),
                "NumberOfPeople",
            ),
        ];

        for (event, key) in cases {
            let error = DialogRequest::from_event(&event).expect_err("event is malformed");
            assert_eq!(error, MalformedInput { key: key.to_owned() });
        }
    }

    #[test]
    fn user_message_names_the_key() {
        let error = MalformedInput { key: "slots".to_owned() };
        assert_eq!(
            error.user_message(),
            "An error occurred: 'slots'. Please check the event structure."
        );
    }
}
