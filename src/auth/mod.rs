pub mod sessions;
pub mod token;

pub use sessions::{create_session, load_account_from_session, session_cookie};
