// src/db/complaints.rs
//
// The complaint table is the only state shared by the web process and the
// notifier. Every write here is a single statement or a short immediate
// transaction; there is no other coordination between the two processes.
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::debug;

use crate::domain::{check_transition, Actor, Complaint, Coordinates, NewComplaint, Reporter, Status, Transition};
use crate::errors::ComplaintError;

const COLUMNS: &str = "id, user_id, reporter_name, reporter_contact, title, description, \
     location, latitude, longitude, media_ref, status, admin_response, created_at, \
     status_updated_at, revision, announced";

fn complaint_from_row(r: &Row<'_>) -> rusqlite::Result<Complaint> {
    let user_id: Option<i64> = r.get(1)?;
    let reporter = match user_id {
        Some(id) => Reporter::Account(id),
        None => Reporter::Anonymous {
            name: r.get(2)?,
            contact: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
        },
    };

    let coordinates = match (r.get::<_, Option<f64>>(7)?, r.get::<_, Option<f64>>(8)?) {
        (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
        _ => None,
    };

    let status: String = r.get(10)?;
    let status = status
        .parse::<Status>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(Complaint {
        id: r.get(0)?,
        reporter,
        title: r.get(4)?,
        description: r.get(5)?,
        location: r.get(6)?,
        coordinates,
        media_ref: r.get(9)?,
        status,
        admin_response: r.get(11)?,
        created_at: r.get(12)?,
        status_updated_at: r.get(13)?,
        revision: r.get(14)?,
        announced: r.get(15)?,
    })
}

/// Insert a validated complaint. Always starts `Received` and unannounced.
pub fn insert_complaint(
    conn: &Connection,
    c: &NewComplaint,
    now: i64,
) -> Result<i64, ComplaintError> {
    let (user_id, name, contact) = match &c.reporter {
        Reporter::Account(id) => (Some(*id), None, None),
        Reporter::Anonymous { name, contact } => (None, name.as_deref(), Some(contact.as_str())),
    };

    conn.execute(
        r#"
        insert into complaints (
          user_id, reporter_name, reporter_contact,
          title, description, location, latitude, longitude, media_ref,
          status, created_at, status_updated_at, revision, announced
        )
        values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0)
        "#,
        params![
            user_id,
            name,
            contact,
            c.title,
            c.description,
            c.location,
            c.coordinates.map(|p| p.lat),
            c.coordinates.map(|p| p.lon),
            c.media_ref,
            Status::Received.as_str(),
            now,
            now,
        ],
    )
    .map_err(|e| ComplaintError::Storage(format!("insert complaint failed: {e}")))?;

    Ok(conn.last_insert_rowid())
}

pub fn get_complaint(conn: &Connection, id: i64) -> Result<Option<Complaint>, ComplaintError> {
    conn.query_row(
        &format!("select {COLUMNS} from complaints where id = ?"),
        params![id],
        complaint_from_row,
    )
    .optional()
    .map_err(|e| ComplaintError::Storage(format!("select complaint failed: {e}")))
}

/// The outbox: everything not yet announced, oldest first.
pub fn list_unannounced(conn: &Connection) -> Result<Vec<Complaint>, ComplaintError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {COLUMNS} from complaints where announced = 0 order by created_at, id"
        ))
        .map_err(|e| ComplaintError::Storage(format!("prepare unannounced failed: {e}")))?;

    let rows = stmt
        .query_map([], complaint_from_row)
        .map_err(|e| ComplaintError::Storage(format!("query unannounced failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ComplaintError::Storage(format!("read complaint failed: {e}")))?);
    }
    Ok(out)
}

/// Flip `announced` to true. Returns false if it already was, which means
/// some earlier pass got there first and this send was a duplicate.
pub fn mark_announced(conn: &Connection, id: i64) -> Result<bool, ComplaintError> {
    let updated = conn
        .execute(
            "update complaints set announced = 1 where id = ? and announced = 0",
            params![id],
        )
        .map_err(|e| ComplaintError::Storage(format!("mark announced failed: {e}")))?;
    Ok(updated == 1)
}

/// Result of `apply_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub id: i64,
    pub transition: Transition,
    /// Revision after the call.
    pub revision: i64,
    pub status_updated_at: i64,
}

impl StatusChange {
    pub fn status(&self) -> Status {
        match self.transition {
            Transition::Change { to, .. } => to,
            Transition::Reapply(s) => s,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self.transition, Transition::Change { .. })
    }
}

/// Row state read under the write lock.
struct Locked {
    status: Status,
    revision: i64,
    created_at: i64,
    status_updated_at: i64,
}

fn lock_row(tx: &Transaction<'_>, id: i64) -> Result<Locked, ComplaintError> {
    let row: Option<(String, i64, i64, i64)> = tx
        .query_row(
            "select status, revision, created_at, status_updated_at from complaints where id = ?",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()
        .map_err(|e| ComplaintError::Storage(format!("select status in tx failed: {e}")))?;

    let Some((status, revision, created_at, status_updated_at)) = row else {
        return Err(ComplaintError::NotFound(id));
    };
    Ok(Locked {
        status: status.parse()?,
        revision,
        created_at,
        status_updated_at,
    })
}

fn check_revision(expected: Option<i64>, actual: i64) -> Result<(), ComplaintError> {
    match expected {
        Some(expected) if expected != actual => Err(ComplaintError::Conflict { expected, actual }),
        _ => Ok(()),
    }
}

fn begin(conn: &mut Connection) -> Result<Transaction<'_>, ComplaintError> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| ComplaintError::Storage(format!("begin tx failed: {e}")))
}

fn commit(tx: Transaction<'_>) -> Result<(), ComplaintError> {
    tx.commit()
        .map_err(|e| ComplaintError::Storage(format!("commit tx failed: {e}")))
}

/// Move a complaint to `target` through the state machine.
///
/// With `expected_revision = Some(r)` the write only happens if the row is
/// still at revision `r`; `None` means last writer wins.
pub fn apply_status(
    conn: &mut Connection,
    id: i64,
    target: Status,
    actor: Actor,
    expected_revision: Option<i64>,
    now: i64,
) -> Result<StatusChange, ComplaintError> {
    let tx = begin(conn)?;
    let row = lock_row(&tx, id)?;
    check_revision(expected_revision, row.revision)?;

    let transition = check_transition(row.status, target, actor)?;
    let Transition::Change { to, .. } = transition else {
        debug!(complaint = id, status = %target, "status re-applied, nothing to write");
        return Ok(StatusChange {
            id,
            transition,
            revision: row.revision,
            status_updated_at: row.status_updated_at,
        });
    };

    let stamp = now.max(row.created_at);
    let written = tx
        .execute(
            "update complaints
             set status = ?, status_updated_at = ?, revision = revision + 1
             where id = ? and revision = ?",
            params![to.as_str(), stamp, id, row.revision],
        )
        .map_err(|e| ComplaintError::Storage(format!("update status failed: {e}")))?;

    if written != 1 {
        return Err(ComplaintError::Conflict {
            expected: row.revision,
            actual: row.revision + 1,
        });
    }
    commit(tx)?;

    Ok(StatusChange {
        id,
        transition,
        revision: row.revision + 1,
        status_updated_at: stamp,
    })
}

/// A staff edit: optional status target, optional response.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdminEdit<'a> {
    pub status: Option<Status>,
    /// Outer `None` leaves the response alone, `Some(None)` clears it.
    pub admin_response: Option<Option<&'a str>>,
    pub expected_revision: Option<i64>,
}

/// Apply a staff edit as one guarded `UPDATE` inside an immediate
/// transaction. Either the status and the response both land or neither
/// does. Only a status change bumps the revision.
///
/// Returns the status outcome when a status was requested.
pub fn apply_admin_edit(
    conn: &mut Connection,
    id: i64,
    edit: &AdminEdit<'_>,
    now: i64,
) -> Result<Option<StatusChange>, ComplaintError> {
    let tx = begin(conn)?;
    let row = lock_row(&tx, id)?;
    check_revision(edit.expected_revision, row.revision)?;

    let transition = edit
        .status
        .map(|target| check_transition(row.status, target, Actor::Admin))
        .transpose()?;

    let (status, stamp, revision) = match transition {
        Some(Transition::Change { to, .. }) => (to, now.max(row.created_at), row.revision + 1),
        _ => (row.status, row.status_updated_at, row.revision),
    };

    let outcome = transition.map(|transition| StatusChange {
        id,
        transition,
        revision,
        status_updated_at: stamp,
    });

    if revision == row.revision && edit.admin_response.is_none() {
        debug!(complaint = id, "admin edit carries no change");
        return Ok(outcome);
    }

    let (set_response, response) = match edit.admin_response {
        Some(r) => (true, r),
        None => (false, None),
    };
    let written = tx
        .execute(
            "update complaints
             set status = ?1, status_updated_at = ?2, revision = ?3,
                 admin_response = case when ?4 then ?5 else admin_response end
             where id = ?6 and revision = ?7",
            params![status.as_str(), stamp, revision, set_response, response, id, row.revision],
        )
        .map_err(|e| ComplaintError::Storage(format!("admin edit failed: {e}")))?;

    if written != 1 {
        return Err(ComplaintError::Conflict {
            expected: row.revision,
            actual: row.revision + 1,
        });
    }
    commit(tx)?;

    Ok(outcome)
}
