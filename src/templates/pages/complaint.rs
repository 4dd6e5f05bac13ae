use crate::domain::Complaint;
use crate::templates::components::status_badge;
use crate::templates::desktop_layout;
use chrono::{DateTime, Utc};
use maud::{html, Markup};

fn when(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Public status page. Staff also get the form to move the complaint on.
pub fn complaint_page(c: &Complaint, is_admin: bool) -> Markup {
    desktop_layout(
        &format!("Complaint #{}", c.id),
        is_admin,
        html! {
            main class="container narrow" {
                h1 { "Complaint #" (c.id) ": " (c.title) }

                dl {
                    dt { "Location" } dd { (c.location) }
                    dt { "Status" } dd { (status_badge(c.status)) }
                    dt { "Received" } dd { (when(c.created_at_utc())) }
                    dt { "Last status change" } dd { (when(c.status_updated_at_utc())) }
                    dt { "Response from staff" }
                    dd {
                        @match &c.admin_response {
                            Some(text) => (text),
                            None => { span class="muted" { "No response yet" } }
                        }
                    }
                }

                @if is_admin {
                    div class="card" {
                        h3 { "Update complaint" }
                        form action=(format!("/admin/complaints/{}/status", c.id)) method="post" {
                            input type="hidden" name="revision" value=(c.revision);
                            label {
                                "Status"
                                select name="status" {
                                    option value="" selected { "(keep " (c.status.as_str()) ")" }
                                    @for next in c.status.reachable() {
                                        option value=(next.as_str()) { (next.as_str()) }
                                    }
                                }
                            }
                            label {
                                "Response"
                                textarea name="admin_response" { (c.admin_response.as_deref().unwrap_or("")) }
                            }
                            button type="submit" class="btn" { "Save" }
                        }
                    }
                }
            }
        },
    )
}
