use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn submitted_page(id: i64) -> Markup {
    desktop_layout(
        "Complaint received",
        false,
        html! {
            main class="container narrow" {
                h1 { "Thank you, your complaint was received" }
                p {
                    "Your complaint number is " strong { "#" (id) } ". "
                    "Staff have been notified and will pick it up shortly."
                }
                p { a href=(format!("/complaints/{id}")) { "Follow its status" } }
            }
        },
    )
}
