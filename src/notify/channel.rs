// src/notify/channel.rs
//
// The messaging channel as seen by the notifier. `TelegramChannel` is the
// production implementation; tests use `RecordingChannel`.
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::ActionControl;
use crate::media::MediaKind;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Attachment unreadable: {0}")]
    Attachment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// A notification ready to go out. `text` is Telegram-flavoured HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub text: String,
    pub attachment: Option<Attachment>,
    pub controls: Vec<ActionControl>,
}

/// Where a delivered message lives, enough to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
    /// Media messages are edited through their caption.
    pub has_media: bool,
}

/// The message an action control was pressed on, as the channel reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredMessage {
    pub reference: MessageRef,
    /// Plain text (or caption) with formatting already stripped.
    pub body: String,
}

/// Someone pressed an action control.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    /// Cursor of the event in the channel's update stream.
    pub update_id: i64,
    /// Id used to acknowledge the press.
    pub interaction_id: String,
    pub payload: Option<String>,
    pub message: Option<DeliveredMessage>,
}

/// One poll's worth of events. `last_update_id` also covers updates that
/// were not action presses, so the cursor moves past them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionBatch {
    pub events: Vec<ActionEvent>,
    pub last_update_id: Option<i64>,
}

pub trait Channel {
    /// Send a notification. Returns only once the channel confirmed it.
    fn send(&self, message: &OutboundMessage) -> Result<MessageRef, DeliveryError>;

    /// Replace the text (or caption) of a delivered message. `controls`
    /// replaces its action controls; an empty slice removes them.
    fn edit(
        &self,
        target: &MessageRef,
        text: &str,
        controls: &[ActionControl],
    ) -> Result<(), DeliveryError>;

    /// Answer an action press. `alert` is shown as a blocking popup.
    fn acknowledge(
        &self,
        interaction_id: &str,
        notice: &str,
        alert: bool,
    ) -> Result<(), DeliveryError>;

    /// Wait up to `wait` for action events after `offset`.
    fn poll_actions(
        &self,
        offset: Option<i64>,
        wait: Duration,
    ) -> Result<ActionBatch, DeliveryError>;
}

#[cfg(test)]
pub use recording::{Ack, Edit, RecordingChannel};

#[cfg(test)]
mod recording {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Edit {
        pub target: MessageRef,
        pub text: String,
        pub controls: Vec<ActionControl>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Ack {
        pub interaction_id: String,
        pub notice: String,
        pub alert: bool,
    }

    /// In-memory channel that records everything and can be told to fail.
    #[derive(Default)]
    pub struct RecordingChannel {
        pub sent: RefCell<Vec<OutboundMessage>>,
        pub edits: RefCell<Vec<Edit>>,
        pub acks: RefCell<Vec<Ack>>,
        pub inbox: RefCell<VecDeque<ActionEvent>>,
        pub polls: RefCell<Vec<Option<i64>>>,
        /// Fail sends whose text contains any of these strings.
        pub fail_when_text_contains: RefCell<Vec<String>>,
        pub fail_edits: Cell<bool>,
        next_message_id: Cell<i64>,
    }

    impl RecordingChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_sends_containing(&self, needle: &str) {
            self.fail_when_text_contains.borrow_mut().push(needle.to_string());
        }

        pub fn heal(&self) {
            self.fail_when_text_contains.borrow_mut().clear();
        }

        pub fn push_event(&self, event: ActionEvent) {
            self.inbox.borrow_mut().push_back(event);
        }
    }

    impl Channel for RecordingChannel {
        fn send(&self, message: &OutboundMessage) -> Result<MessageRef, DeliveryError> {
            if self
                .fail_when_text_contains
                .borrow()
                .iter()
                .any(|needle| message.text.contains(needle.as_str()))
            {
                return Err(DeliveryError::RequestFailed("simulated outage".into()));
            }
            let id = self.next_message_id.get() + 1;
            self.next_message_id.set(id);
            self.sent.borrow_mut().push(message.clone());
            Ok(MessageRef {
                chat_id: -100,
                message_id: id,
                has_media: message.attachment.is_some(),
            })
        }

        fn edit(
            &self,
            target: &MessageRef,
            text: &str,
            controls: &[ActionControl],
        ) -> Result<(), DeliveryError> {
            if self.fail_edits.get() {
                return Err(DeliveryError::ApiError("simulated edit failure".into()));
            }
            self.edits.borrow_mut().push(Edit {
                target: *target,
                text: text.to_string(),
                controls: controls.to_vec(),
            });
            Ok(())
        }

        fn acknowledge(
            &self,
            interaction_id: &str,
            notice: &str,
            alert: bool,
        ) -> Result<(), DeliveryError> {
            self.acks.borrow_mut().push(Ack {
                interaction_id: interaction_id.to_string(),
                notice: notice.to_string(),
                alert,
            });
            Ok(())
        }

        fn poll_actions(
            &self,
            offset: Option<i64>,
            _wait: Duration,
        ) -> Result<ActionBatch, DeliveryError> {
            self.polls.borrow_mut().push(offset);
            let events: Vec<ActionEvent> = self
                .inbox
                .borrow_mut()
                .drain(..)
                .filter(|e| offset.map_or(true, |o| e.update_id >= o))
                .collect();
            let last_update_id = events.iter().map(|e| e.update_id).max();
            Ok(ActionBatch {
                events,
                last_update_id,
            })
        }
    }
}
