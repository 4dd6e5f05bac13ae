// src/domain/action.rs

use crate::domain::status::Status;
use crate::errors::ComplaintError;

const STATUS_ACTION: &str = "status";

/// Transition request carried by an action control as `action:status:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPayload {
    pub target: Status,
    pub complaint_id: i64,
}

impl ActionPayload {
    pub fn new(target: Status, complaint_id: i64) -> Self {
        Self {
            target,
            complaint_id,
        }
    }

    pub fn encode(&self) -> String {
        format!("{STATUS_ACTION}:{}:{}", self.target.as_str(), self.complaint_id)
    }

    pub fn parse(raw: &str) -> Result<Self, ComplaintError> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [action, status, id] = parts.as_slice() else {
            return Err(ComplaintError::Validation(format!(
                "malformed action payload '{raw}'"
            )));
        };

        if *action != STATUS_ACTION {
            return Err(ComplaintError::Validation(format!(
                "unrecognized action '{action}'"
            )));
        }

        let complaint_id = id
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ComplaintError::Validation(format!("invalid complaint id '{id}'")))?;

        Ok(Self {
            target: status.parse()?,
            complaint_id,
        })
    }
}

/// An inline control placed under a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionControl {
    pub label: String,
    pub payload: ActionPayload,
}

/// The two controls every announcement carries.
pub fn controls_for(complaint_id: i64) -> Vec<ActionControl> {
    vec![
        ActionControl {
            label: "✅ Process".into(),
            payload: ActionPayload::new(Status::Processing, complaint_id),
        },
        ActionControl {
            label: "🏁 Complete".into(),
            payload: ActionPayload::new(Status::Completed, complaint_id),
        },
    ]
}
