// src/intake.rs
use tracing::info;

use crate::db::accounts::find_account;
use crate::db::complaints::insert_complaint;
use crate::db::Database;
use crate::domain::{NewComplaint, Reporter};
use crate::errors::ComplaintError;

/// Validate and persist a new complaint, returning its id.
///
/// Nothing is sent to the channel here; the notifier picks the row up on
/// its next cycle.
pub fn submit_complaint(
    db: &Database,
    request: NewComplaint,
    now: i64,
) -> Result<i64, ComplaintError> {
    let complaint = request.validated()?;

    db.with_conn(|conn| {
        if let Reporter::Account(user_id) = complaint.reporter {
            if find_account(conn, user_id)?.is_none() {
                return Err(ComplaintError::Validation(format!(
                    "unknown reporter account {user_id}"
                )));
            }
        }

        let id = insert_complaint(conn, &complaint, now)?;
        info!(complaint = id, title = %complaint.title, "complaint received");
        Ok(id)
    })
}
