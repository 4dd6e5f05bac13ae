use maud::{html, Markup, DOCTYPE};

pub fn desktop_layout(title: &str, is_admin: bool, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · Complaint Desk" }
                link rel="stylesheet" href="/static/main.css";
            }
            body {
              header class="flex items-center justify-between px-6 py-3 shadow" {
                  h3 { "Complaint Desk" }
                  nav {
                      ul {
                          li { a href="/" { "File a complaint" } }
                          @if is_admin {
                              li { span class="badge" { "Staff" } }
                          }
                      }
                  }
              }
                (content)
            }
        }
    }
}
