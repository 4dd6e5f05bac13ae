// src/db/accounts.rs
//
// Accounts are owned by the authentication surface; this core only reads them.
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Citizen,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub(crate) fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    let role: String = r.get(3)?;
    Ok(Account {
        id: r.get(0)?,
        username: r.get(1)?,
        email: r.get(2)?,
        role: if role == "admin" { Role::Admin } else { Role::Citizen },
    })
}

pub fn find_account(conn: &Connection, id: i64) -> Result<Option<Account>, ServerError> {
    conn.query_row(
        "select id, username, email, role from users where id = ?",
        params![id],
        account_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select account failed: {e}")))
}

/// Used by tests and seeding; production accounts come from the auth surface.
pub fn insert_account(
    conn: &Connection,
    username: &str,
    email: &str,
    role: Role,
    now: i64,
) -> Result<i64, ServerError> {
    let role = match role {
        Role::Admin => "admin",
        Role::Citizen => "citizen",
    };
    conn.execute(
        "insert into users (username, email, role, created_at) values (?, ?, ?, ?)",
        params![username, email, role, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert account failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}
