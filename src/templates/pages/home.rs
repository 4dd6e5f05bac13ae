// templates/pages/home.rs

use crate::db::accounts::Account;
use crate::templates::{card, desktop_layout};
use maud::{html, Markup};

/// Intake form. Signed-in citizens are not asked for contact details.
pub fn home_page(account: Option<&Account>) -> Markup {
    desktop_layout(
        "File a complaint",
        account.is_some_and(Account::is_admin),
        html! {
            main class="container narrow" {
                h1 { "File a complaint" }

                (card("Upload evidence first (optional)", html! {
                    p {
                        "Send the photo or video to " code { "POST /media?name=<file name>" }
                        " and paste the returned name below."
                    }
                }))

                form action="/complaints" method="post" {
                    label { "Title" input type="text" name="title" minlength="5" maxlength="100" required; }
                    label { "What happened?" textarea name="description" minlength="10" required {} }
                    label { "Location" input type="text" name="location" minlength="5" maxlength="200" required; }
                    div class="row" {
                        label { "Latitude" input type="text" name="latitude" inputmode="decimal"; }
                        label { "Longitude" input type="text" name="longitude" inputmode="decimal"; }
                    }
                    label { "Evidence file name" input type="text" name="media_ref"; }

                    @match account {
                        Some(a) => {
                            p class="muted" { "Reporting as " strong { (a.username) } }
                        }
                        None => {
                            label { "Your name (optional)" input type="text" name="reporter_name"; }
                            label { "Phone or email" input type="text" name="reporter_contact" required; }
                        }
                    }

                    button type="submit" class="btn" { "Send complaint" }
                }
            }
        },
    )
}
