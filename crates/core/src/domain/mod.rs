pub mod request;
pub mod restaurant;
pub mod slots;
