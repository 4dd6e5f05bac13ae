// src/admin.rs
//
// Staff edits coming from the web surface. Unlike channel actions these
// carry the revision the page was rendered with.
use tracing::info;

use crate::db::complaints::{apply_admin_edit, get_complaint, AdminEdit};
use crate::db::Database;
use crate::domain::{Complaint, Status};
use crate::errors::ComplaintError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminUpdate {
    pub status: Option<Status>,
    /// Outer `None` leaves the response alone, `Some(None)` clears it.
    pub admin_response: Option<Option<String>>,
    /// Revision the admin saw. When present, a concurrent change is a conflict.
    pub revision: Option<i64>,
}

/// Apply an administrator's edit and return the complaint as it now stands.
pub fn update_complaint(
    db: &Database,
    id: i64,
    update: &AdminUpdate,
    now: i64,
) -> Result<Complaint, ComplaintError> {
    let edit = AdminEdit {
        status: update.status,
        admin_response: update.admin_response.as_ref().map(|r| r.as_deref()),
        expected_revision: update.revision,
    };

    db.with_conn(|conn| {
        let change = apply_admin_edit(conn, id, &edit, now)?;
        if let Some(change) = change.filter(|c| c.changed()) {
            info!(complaint = id, status = %change.status(), revision = change.revision, "status changed by admin");
        }
        get_complaint(conn, id)?.ok_or(ComplaintError::NotFound(id))
    })
}
