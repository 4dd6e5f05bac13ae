pub mod action;
pub mod complaint;
pub mod status;

pub use action::{controls_for, ActionControl, ActionPayload};
pub use complaint::{Complaint, Coordinates, NewComplaint, Reporter};
pub use status::{check_transition, Actor, Status, Transition};
