use serde::{Deserialize, Serialize};

use crate::domain::slots::{SlotName, SlotSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValidation {
    pub complete: bool,
    pub first_missing: Option<SlotName>,
}

/// Checks a slot set against the fixed schema. The first missing slot is picked
/// in declaration order so prompts are always sequenced the same way.
pub fn validate(slots: &SlotSet) -> SlotValidation {
    let first_missing = slots.missing().next();
    SlotValidation { complete: first_missing.is_none(), first_missing }
}
