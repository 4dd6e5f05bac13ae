// src/domain/status.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::ComplaintError;

/// Lifecycle of a complaint.
///
/// ```text
/// Received -> Processing -> Completed
///     \            \
///      `-----------`-----> Rejected
/// ```
///
/// `Completed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Received,
    Processing,
    Completed,
    Rejected,
}

/// Who is asking for a status change. The two writers of a complaint
/// are allowed different targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// Staff on the administrative web surface.
    Admin,
    /// Staff pressing an action control on a channel notification.
    ChannelAction,
}

/// Outcome of checking a requested status against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status moves and `status_updated_at`/`revision` must be bumped.
    Change { from: Status, to: Status },
    /// Target equals the current status; nothing to write.
    Reapply(Status),
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Received,
        Status::Processing,
        Status::Completed,
        Status::Rejected,
    ];

    /// Targets the channel action controls may request.
    pub const CHANNEL_TARGETS: [Status; 2] = [Status::Processing, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Received => "Received",
            Status::Processing => "Processing",
            Status::Completed => "Completed",
            Status::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Rejected)
    }

    /// Direct edges of the workflow.
    fn successors(&self) -> &'static [Status] {
        match self {
            Status::Received => &[Status::Processing, Status::Rejected],
            Status::Processing => &[Status::Completed, Status::Rejected],
            Status::Completed | Status::Rejected => &[],
        }
    }

    /// True when `target` lies on some forward path from `self`.
    pub fn can_reach(&self, target: Status) -> bool {
        self.successors()
            .iter()
            .any(|next| *next == target || next.can_reach(target))
    }

    /// States an administrator could pick next, in workflow order.
    pub fn reachable(&self) -> Vec<Status> {
        Status::ALL
            .into_iter()
            .filter(|s| self.can_reach(*s))
            .collect()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ComplaintError;

    /// Case-insensitive, so `processing` and `PROCESSING` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ComplaintError::Validation(format!("unknown status '{wanted}'")))
    }
}

/// Decide whether `actor` may move a complaint from `current` to `target`.
pub fn check_transition(
    current: Status,
    target: Status,
    actor: Actor,
) -> Result<Transition, ComplaintError> {
    if actor == Actor::ChannelAction && !Status::CHANNEL_TARGETS.contains(&target) {
        return Err(ComplaintError::Validation(format!(
            "status {target} cannot be set from the channel"
        )));
    }

    if current == target {
        return Ok(Transition::Reapply(current));
    }

    if current.can_reach(target) {
        Ok(Transition::Change {
            from: current,
            to: target,
        })
    } else {
        Err(ComplaintError::IllegalTransition {
            from: current,
            to: target,
        })
    }
}
