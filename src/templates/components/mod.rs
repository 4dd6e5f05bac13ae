use maud::{html, Markup};

pub mod card;
pub mod error;

pub use card::card;
pub use error::error_page;

pub fn status_badge(status: crate::domain::Status) -> Markup {
    html! {
        span class=(format!("badge badge-{}", status.as_str().to_ascii_lowercase())) { (status.as_str()) }
    }
}
