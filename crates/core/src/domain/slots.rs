use std::fmt;

use serde::{Deserialize, Serialize};

/// Fields of a dining request. Declaration order is elicitation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotName {
    Location,
    Cuisine,
    DiningTime,
    NumberOfPeople,
    Email,
}

impl SlotName {
    pub const ALL: [SlotName; 5] =
        [Self::Location, Self::Cuisine, Self::DiningTime, Self::NumberOfPeople, Self::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::Cuisine => "Cuisine",
            Self::DiningTime => "DiningTime",
            Self::NumberOfPeople => "NumberOfPeople",
            Self::Email => "Email",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.as_str() == value)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot values collected so far for a dining request.
///
/// Serializes with the front-end's PascalCase keys; unset slots serialize as `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlotSet {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub dining_time: Option<String>,
    #[serde(default)]
    pub number_of_people: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SlotSet {
    pub fn get(&self, slot: SlotName) -> Option<&str> {
        let value = match slot {
            SlotName::Location => &self.location,
            SlotName::Cuisine => &self.cuisine,
            SlotName::DiningTime => &self.dining_time,
            SlotName::NumberOfPeople => &self.number_of_people,
            SlotName::Email => &self.email,
        };
        value.as_deref()
    }

    pub fn set(&mut self, slot: SlotName, value: Option<String>) {
        let target = match slot {
            SlotName::Location => &mut self.location,
            SlotName::Cuisine => &mut self.cuisine,
            SlotName::DiningTime => &mut self.dining_time,
            SlotName::NumberOfPeople => &mut self.number_of_people,
            SlotName::Email => &mut self.email,
        };
        *target = value;
    }

    pub fn with(mut self, slot: SlotName, value: impl Into<String>) -> Self {
        self.set(slot, Some(value.into()));
        self
    }

    /// The slot value when it holds something other than whitespace.
    pub fn filled(&self, slot: SlotName) -> Option<&str> {
        self.get(slot).filter(|value| !value.trim().is_empty())
    }

    /// A slot is missing when absent or blank.
    pub fn is_missing(&self, slot: SlotName) -> bool {
        self.filled(slot).is_none()
    }

    pub fn missing(&self) -> impl Iterator<Item = SlotName> + '_ {
        SlotName::ALL.into_iter().filter(|slot| self.is_missing(*slot))
    }
}

#[cfg(test)]
mod tests {
    use super::{SlotName, SlotSet};

    #[test]
    fn slot_names_parse_from_wire_names() {
        for slot in SlotName::ALL {
            assert_eq!(SlotName::parse(slot.as_str()), Some(slot));
        }
        assert_eq!(SlotName::parse("location"), None);
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let slots = SlotSet::default().with(SlotName::Location, "").with(SlotName::Cuisine, "Thai");

        assert!(slots.is_missing(SlotName::Location));
        assert!(!slots.is_missing(SlotName::Cuisine));
        assert_eq!(
            slots.missing().collect::<Vec<_>>(),
            vec![
                SlotName::Location,
                SlotName::DiningTime,
                SlotName::NumberOfPeople,
                SlotName::Email
            ]
        );
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let slots = SlotSet::default().with(SlotName::Cuisine, "  \t");

        assert!(slots.is_missing(SlotName::Cuisine));
        assert_eq!(slots.filled(SlotName::Cuisine), None);
    }

    #[test]
    fn serializes_with_front_end_keys_and_nulls() {
        let slots = SlotSet::default().with(SlotName::NumberOfPeople, "4");
        let value = serde_json::to_value(&slots).expect("serialize");

        assert_eq!(value["NumberOfPeople"], "4");
        assert!(value["DiningTime"].is_null());
        assert_eq!(value.as_object().map(|map| map.len()), Some(5));
    }
}
