use crate::auth::create_session;
use crate::db::accounts::{insert_account, Role};
use crate::db::connection::{init_db, Database};
use crate::errors::ServerError;
use crate::media::MediaStore;
use crate::now_unix;
use crate::router::AppState;
use astra::{Body, Response};
use std::io::Read;
use tempfile::TempDir;

/// Initialize a fresh test DB using the production schema.
/// Keep the directory alive for as long as the database is used.
pub fn init_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::new(dir.path().join("test.sqlite3"));

    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    (dir, db)
}

pub fn init_test_app() -> (TempDir, AppState) {
    let (dir, db) = init_test_db();
    let media = MediaStore::new(dir.path().join("uploads"));
    (dir, AppState { db, media })
}

/// Create an account and a live session for it, returning the cookie header value.
pub fn signed_in(db: &Database, username: &str, role: Role) -> (i64, String) {
    let now = now_unix();
    let email = format!("{username}@example.com");
    let (id, token) = db
        .with_conn(|conn| -> Result<(i64, String), ServerError> {
            let id = insert_account(conn, username, &email, role, now)?;
            Ok((id, create_session(conn, id, now)?))
        })
        .expect("Failed to create session");
    (id, format!("session={token}"))
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body()
        .reader()
        .read_to_string(&mut body)
        .unwrap();
    body
}

pub fn form_body(pairs: &[(&str, &str)]) -> Body {
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Body::from(encoded.into_bytes())
}
