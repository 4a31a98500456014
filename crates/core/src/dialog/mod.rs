pub mod engine;
pub mod request;
pub mod states;
pub mod validator;

pub use engine::{decide, DialogDecision, DialogEngine};
pub use request::{DialogRequest, MalformedInput};
pub use states::{
    DialogAction, DialogMessage, DialogResponse, DialogState, DialogTurn, FulfillmentState, Intent,
    RejectionReason,
};
pub use validator::{validate, SlotValidation};
