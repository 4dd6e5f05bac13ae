// src/notify/dispatcher.rs
use tracing::{error, info, warn};

use crate::db::accounts::find_account;
use crate::db::complaints::{list_unannounced, mark_announced};
use crate::db::Database;
use crate::domain::{controls_for, Complaint, Reporter};
use crate::errors::ComplaintError;
use crate::media::{self, MediaStore};
use crate::notify::channel::{Attachment, Channel, OutboundMessage};
use crate::notify::render::{self, Body, ReporterCard};

/// What one dispatcher cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub announced: Vec<i64>,
    pub failed: Vec<i64>,
}

pub struct Dispatcher<'a, C: Channel> {
    db: &'a Database,
    channel: &'a C,
    media: &'a MediaStore,
}

impl<'a, C: Channel> Dispatcher<'a, C> {
    pub fn new(db: &'a Database, channel: &'a C, media: &'a MediaStore) -> Self {
        Self { db, channel, media }
    }

    /// Announce every unannounced complaint, one at a time.
    ///
    /// Only the initial query can fail the cycle. A failure on one complaint
    /// is logged and leaves it unannounced for the next cycle.
    pub fn run_cycle(&self) -> Result<CycleReport, ComplaintError> {
        let pending = self.db.with_conn(|conn| list_unannounced(conn))?;
        let mut report = CycleReport::default();

        for complaint in &pending {
            match self.announce(complaint) {
                Ok(()) => report.announced.push(complaint.id),
                Err(e) => {
                    error!(complaint = complaint.id, error = %e, "announcement failed, will retry next cycle");
                    report.failed.push(complaint.id);
                }
            }
        }

        if !pending.is_empty() {
            info!(
                announced = report.announced.len(),
                failed = report.failed.len(),
                "dispatcher cycle finished"
            );
        }
        Ok(report)
    }

    fn message_for(&self, complaint: &Complaint, reporter: &ReporterCard) -> OutboundMessage {
        let body = Body::new(complaint, reporter);

        let Some(name) = complaint.media_ref.as_deref() else {
            return text_message(complaint, &body);
        };

        let Some(path) = self.media.resolve(name) else {
            warn!(complaint = complaint.id, media = %name, "attachment missing, sending text only");
            return text_message(complaint, &body.with_notice(render::MISSING_ATTACHMENT_NOTICE));
        };

        match body.render_within(render::CAPTION_LIMIT) {
            Some(caption) => OutboundMessage {
                text: caption,
                attachment: Some(Attachment {
                    path,
                    kind: media::kind_of(name),
                }),
                controls: controls_for(complaint.id),
            },
            None => {
                warn!(complaint = complaint.id, media = %name, "announcement too long for a caption, sending text only");
                text_message(complaint, &body.with_notice(render::CAPTION_OVERFLOW_NOTICE))
            }
        }
    }

    /// Send, then commit. The flag is never set before the channel confirmed.
    fn announce(&self, complaint: &Complaint) -> Result<(), ComplaintError> {
        let reporter = reporter_card(self.db, complaint)?;
        let message = self.message_for(complaint, &reporter);

        let sent = self
            .channel
            .send(&message)
            .map_err(|e| ComplaintError::Delivery(e.to_string()))?;

        let first = self
            .db
            .with_conn(|conn| mark_announced(conn, complaint.id))?;
        if !first {
            warn!(complaint = complaint.id, "complaint was already announced, duplicate message sent");
        }

        info!(
            complaint = complaint.id,
            message = sent.message_id,
            "complaint announced"
        );
        Ok(())
    }
}

/// Reporter as shown in the chat: the account's username and email, or the
/// anonymous name and contact, with a placeholder when either is missing.
pub(crate) fn reporter_card(
    db: &Database,
    complaint: &Complaint,
) -> Result<ReporterCard, ComplaintError> {
    match &complaint.reporter {
        Reporter::Account(user_id) => {
            let account = db.with_conn(|conn| find_account(conn, *user_id))?;
            Ok(account
                .map(|a| ReporterCard {
                    label: a.username,
                    contact: a.email,
                })
                .unwrap_or_else(ReporterCard::unknown))
        }
        Reporter::Anonymous { name, contact } => Ok(ReporterCard {
            label: name
                .clone()
                .unwrap_or_else(|| render::UNKNOWN_REPORTER.to_string()),
            contact: contact.clone(),
        }),
    }
}

fn text_message(complaint: &Complaint, body: &Body<'_>) -> OutboundMessage {
    OutboundMessage {
        text: body
            .render_within(render::TEXT_LIMIT)
            .unwrap_or_else(|| render::brief(complaint, body.history())),
        attachment: None,
        controls: controls_for(complaint.id),
    }
}
