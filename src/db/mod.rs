pub mod accounts;
pub mod complaints;
pub mod connection;

pub use connection::{init_db, Database};
