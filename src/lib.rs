//! Complaint lifecycle for a small administrative office.
//!
//! Two processes share one SQLite file: the web process (`complaint-desk`)
//! takes complaints in and lets staff change their status, and the notifier
//! (`complaint-notifier`) announces new complaints to a Telegram chat and
//! applies the status buttons pressed there.

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod intake;
pub mod media;
pub mod notify;
pub mod responses;
pub mod router;
pub mod templates;

#[cfg(test)]
mod tests;

/// Current time as unix seconds, the unit every stored timestamp uses.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
