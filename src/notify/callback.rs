// src/notify/callback.rs
use tracing::{info, warn};

use crate::db::complaints::{apply_status, get_complaint, StatusChange};
use crate::db::Database;
use crate::domain::{check_transition, controls_for, ActionPayload, Actor, Complaint};
use crate::errors::ComplaintError;
use crate::notify::channel::{ActionEvent, Channel};
use crate::notify::dispatcher::reporter_card;
use crate::notify::render::{self, Body, ReporterCard};

/// Handles button presses coming back from the channel.
pub struct CallbackHandler<'a, C: Channel> {
    db: &'a Database,
    channel: &'a C,
}

impl<'a, C: Channel> CallbackHandler<'a, C> {
    pub fn new(db: &'a Database, channel: &'a C) -> Self {
        Self { db, channel }
    }

    /// Validate and apply one action event.
    ///
    /// The press is always acknowledged: with an alert when it was rejected,
    /// with a short toast otherwise. A rejected press changes nothing.
    pub fn handle(&self, event: &ActionEvent, now: i64) -> Result<StatusChange, ComplaintError> {
        match self.apply(event, now) {
            Ok(change) => {
                let notice = if change.changed() {
                    format!("Status set to {}", change.status())
                } else {
                    format!("Already {}", change.status())
                };
                self.acknowledge(event, &notice, false);
                Ok(change)
            }
            Err(e) => {
                warn!(
                    interaction = %event.interaction_id,
                    payload = event.payload.as_deref().unwrap_or(""),
                    error = %e,
                    "action rejected"
                );
                self.acknowledge(event, &format!("Error: {e}"), true);
                Err(e)
            }
        }
    }

    fn acknowledge(&self, event: &ActionEvent, notice: &str, alert: bool) {
        if let Err(e) = self.channel.acknowledge(&event.interaction_id, notice, alert) {
            warn!(interaction = %event.interaction_id, error = %e, "acknowledge failed");
        }
    }

    fn apply(&self, event: &ActionEvent, now: i64) -> Result<StatusChange, ComplaintError> {
        let raw = event
            .payload
            .as_deref()
            .ok_or_else(|| ComplaintError::Validation("action without payload".into()))?;
        let payload = ActionPayload::parse(raw)?;
        let id = payload.complaint_id;

        let complaint = self
            .db
            .with_conn(|conn| get_complaint(conn, id))?
            .ok_or(ComplaintError::NotFound(id))?;

        // Fail fast before taking the write lock; apply_status checks again
        // against whatever is current at commit time.
        check_transition(complaint.status, payload.target, Actor::ChannelAction)?;

        let change = self.db.with_conn(|conn| {
            apply_status(conn, id, payload.target, Actor::ChannelAction, None, now)
        })?;

        if change.changed() {
            info!(complaint = id, status = %change.status(), revision = change.revision, "status changed from channel");
            self.reflect(event, &complaint, &change);
        }
        Ok(change)
    }

    /// Rebuild the message the button sits on from the stored complaint,
    /// keeping earlier status lines and adding the new one. The status is
    /// already committed, so a failure here is only logged.
    fn reflect(&self, event: &ActionEvent, complaint: &Complaint, change: &StatusChange) {
        let Some(message) = &event.message else {
            warn!(complaint = change.id, "action event without message, nothing to edit");
            return;
        };

        let reporter = reporter_card(self.db, complaint).unwrap_or_else(|e| {
            warn!(complaint = change.id, error = %e, "reporter lookup failed");
            ReporterCard::unknown()
        });

        let status = change.status();
        let mut history = render::status_history(&message.body);
        history.push(status);

        let mut body = Body::new(complaint, &reporter).with_history(history);
        if let Some(notice) = render::notice_in(&message.body) {
            body = body.with_notice(notice);
        }
        let limit = if message.reference.has_media {
            render::CAPTION_LIMIT
        } else {
            render::TEXT_LIMIT
        };
        let text = body
            .render_within(limit)
            .unwrap_or_else(|| render::brief(complaint, body.history()));

        let controls = if status.is_terminal() {
            Vec::new()
        } else {
            controls_for(change.id)
        };

        if let Err(e) = self.channel.edit(&message.reference, &text, &controls) {
            warn!(complaint = change.id, error = %e, "could not edit notification");
        }
    }
}
