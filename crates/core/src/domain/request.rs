use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::slots::{SlotName, SlotSet};

/// A completed dining request as carried on the queue. Every field is non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueuedRequest {
    pub location: String,
    pub cuisine: String,
    pub dining_time: String,
    pub number_of_people: String,
    pub email: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("slot `{0}` is missing or empty")]
    MissingSlot(SlotName),
    #[error("queue message body is not a valid request: {0}")]
    Decode(String),
}

impl QueuedRequest {
    pub fn from_slots(slots: &SlotSet) -> Result<Self, RequestError> {
        let take = |slot: SlotName| {
            slots.filled(slot).map(str::to_owned)
                .ok_or(RequestError::MissingSlot(slot))
        };

        Ok(Self {
            location: take(SlotName::Location)?,
            cuisine: take(SlotName::Cuisine)?,
            dining_time: take(SlotName::DiningTime)?,
            number_of_people: take(SlotName::NumberOfPeople)?,
            email: take(SlotName::Email)?,
        })
    }

    /// Decodes a queue message body. Fields beyond the five slots are ignored.
    pub fn from_message_body(body: &str) -> Result<Self, RequestError> {
        let slots: SlotSet =
            serde_json::from_str(body).map_err(|error| RequestError::Decode(error.to_string()))?;
        Self::from_slots(&slots)
    }

    pub fn to_message_body(&self) -> Result<String, RequestError> {
        serde_json::to_string(self).map_err(|error| RequestError::Decode(error.to_string()))
    }

    /// Stable digest of the slot tuple, usable as an idempotency key.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for value in [
            &self.location,
            &self.cuisine,
            &self.dining_time,
            &self.number_of_people,
            &self.email,
        ] {
            hasher.update(value.as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{QueuedRequest, RequestError};
    use crate::domain::slots::{SlotName, SlotSet};

    fn complete_slots() -> SlotSet {
        SlotSet::default()
            .with(SlotName::Location, "NYC")
            .with(SlotName::Cuisine, "Mexican")
            .with(SlotName::DiningTime, "7pm")
            .with(SlotName::NumberOfPeople, "4")
            .with(SlotName::Email, "a@b.com")
    }

    #[test]
    fn builds_from_complete_slots() {
        let request = QueuedRequest::from_slots(&complete_slots()).expect("complete");
        assert_eq!(request.cuisine, "Mexican");
        assert_eq!(request.number_of_people, "4");
    }

    #[test]
    fn rejects_slots_with_empty_value() {
        let slots = complete_slots().with(SlotName::DiningTime, "");
        assert_eq!(
            QueuedRequest::from_slots(&slots),
            Err(RequestError::MissingSlot(SlotName::DiningTime))
        );
    }

    #[test]
    fn whitespace_cuisine_is_not_a_complete_request() {
        let slots = complete_slots().with(SlotName::Cuisine, "   ");
        assert_eq!(
            QueuedRequest::from_slots(&slots),
            Err(RequestError::MissingSlot(SlotName::Cuisine))
        );
    }

    #[test]
    fn message_body_uses_exactly_the_five_slot_keys() {
        let request = QueuedRequest::from_slots(&complete_slots()).expect("complete");
        let body = request.to_message_body().expect("encode");
        let value: serde_json::Value = serde_json::from_str(&body).expect("json");
        let object = value.as_object().expect("object body");

        assert_eq!(object.len(), 5);
        for slot in SlotName::ALL {
            assert!(object.contains_key(slot.as_str()), "missing key {slot}");
        }
    }

    #[test]
    fn decoding_rejects_non_json_and_incomplete_bodies() {
        assert!(matches!(
            QueuedRequest::from_message_body("not json"),
            Err(RequestError::Decode(_))
        ));
        assert_eq!(
            QueuedRequest::from_message_body(r#"{"Location":"NYC","Cuisine":"Thai"}"#),
            Err(RequestError::MissingSlot(SlotName::DiningTime))
        );
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive_to_every_slot() {
        let request = QueuedRequest::from_slots(&complete_slots()).expect("complete");
        let same = QueuedRequest::from_slots(&complete_slots()).expect("complete");
        let mut other = request.clone();
        other.email = "c@d.com".to_owned();

        assert_eq!(request.fingerprint(), same.fingerprint());
        assert_ne!(request.fingerprint(), other.fingerprint());
        assert_eq!(request.fingerprint().len(), 64);
    }
}
