// src/notify/render.rs
//
// Message bodies use Telegram's HTML parse mode. maud does the escaping of
// everything that came from a citizen.
use maud::{html, Markup};
use url::Url;

use crate::domain::{Complaint, Coordinates, Status};

const MAPS_SEARCH: &str = "https://www.google.com/maps/search/";
pub const UNKNOWN_REPORTER: &str = "Unknown";
pub const MISSING_ATTACHMENT_NOTICE: &str =
    "(Warning: the attached evidence file was not found on the server)";
pub const CAPTION_OVERFLOW_NOTICE: &str =
    "(Evidence file not attached: the details are too long for a caption)";

/// Who to show as the reporter, resolved by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterCard {
    pub label: String,
    pub contact: String,
}

impl ReporterCard {
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_REPORTER.into(),
            contact: "-".into(),
        }
    }
}

pub fn map_link(at: Coordinates) -> Option<Url> {
    Url::parse_with_params(
        MAPS_SEARCH,
        &[("api", "1".to_string()), ("query", format!("{},{}", at.lat, at.lon))],
    )
    .ok()
}

/// Telegram's limit on `sendMessage`/`editMessageText` text.
pub const TEXT_LIMIT: usize = 4096;
/// Telegram's limit on media captions.
pub const CAPTION_LIMIT: usize = 1024;
const TRUNCATED: &str = "…(truncated)";
const STATUS_LABEL: &str = "Status updated:";

/// Length as Telegram counts it: visible text after entity parsing, in
/// UTF-16 code units. Only understands the tags and entities maud emits.
pub fn visible_len(html: &str) -> usize {
    let mut len = 0;
    let mut chars = html.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
            }
            '&' => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
                len += 1;
            }
            c => len += c.len_utf16(),
        }
    }
    len
}

/// An announcement body: the complaint, an optional bold notice, and the
/// status changes made from the channel so far.
#[derive(Debug, Clone)]
pub struct Body<'a> {
    complaint: &'a Complaint,
    reporter: &'a ReporterCard,
    notice: Option<&'a str>,
    history: Vec<Status>,
}

impl<'a> Body<'a> {
    pub fn new(complaint: &'a Complaint, reporter: &'a ReporterCard) -> Self {
        Self {
            complaint,
            reporter,
            notice: None,
            history: Vec::new(),
        }
    }

    pub fn with_notice(mut self, notice: &'a str) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn with_history(mut self, history: Vec<Status>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &[Status] {
        &self.history
    }

    fn markup(&self, description: &str) -> Markup {
        let c = self.complaint;
        let map = c.coordinates.and_then(map_link);
        html! {
            "🔔 " b { "New complaint received!" } "\n\n"
            b { "ID:" } " " code { (c.id) } "\n"
            b { "Title:" } " " (c.title) "\n"
            b { "Reporter:" } " " (self.reporter.label) "\n"
            b { "Contact:" } " " (self.reporter.contact) "\n"
            b { "Location:" } " " (c.location)
            @if let Some(url) = map {
                "\n" b { "GPS:" } " " a href=(url.as_str()) { "View on map" }
            }
            "\n\n" i { (description) }
            @if let Some(notice) = self.notice {
                "\n\n" b { (notice) }
            }
            (status_lines(&self.history))
        }
    }

    /// The body with the full description.
    pub fn render(&self) -> String {
        self.markup(&self.complaint.description).into_string()
    }

    /// The body cut down to `limit` by shortening the description. `None`
    /// when even an empty description does not fit.
    pub fn render_within(&self, limit: usize) -> Option<String> {
        let full: Vec<char> = self.complaint.description.chars().collect();
        let mut keep = full.len();
        loop {
            let text = if keep == full.len() {
                self.render()
            } else {
                let mut cut: String = full[..keep].iter().collect();
                cut.push_str(TRUNCATED);
                self.markup(&cut).into_string()
            };

            let len = visible_len(&text);
            if len <= limit {
                return Some(text);
            }
            if keep == 0 {
                return None;
            }
            keep = keep.saturating_sub(len - limit);
        }
    }
}

fn status_lines(history: &[Status]) -> Markup {
    html! {
        @for status in history {
            "\n\n" b { (STATUS_LABEL) } " " code { (status.as_str()) }
        }
    }
}

/// Last resort when nothing else fits: id, title and status changes.
pub fn brief(c: &Complaint, history: &[Status]) -> String {
    html! {
        "🔔 " b { "New complaint received!" } "\n\n"
        b { "ID:" } " " code { (c.id) } "\n"
        b { "Title:" } " " (c.title)
        (status_lines(history))
    }
    .into_string()
}

/// Status changes recorded at the end of a delivered plain-text body.
pub fn status_history(body: &str) -> Vec<Status> {
    let mut history: Vec<Status> = body
        .lines()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .map_while(|line| line.strip_prefix(STATUS_LABEL)?.trim().parse().ok())
        .collect();
    history.reverse();
    history
}

/// Which notice, if any, a delivered body carries.
pub fn notice_in(body: &str) -> Option<&'static str> {
    [MISSING_ATTACHMENT_NOTICE, CAPTION_OVERFLOW_NOTICE]
        .into_iter()
        .find(|notice| body.contains(notice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reporter;

    fn complaint() -> Complaint {
        Complaint {
            id: 42,
            reporter: Reporter::Anonymous {
                name: Some("Jane".into()),
                contact: "555-0100".into(),
            },
            title: "Pothole <big>".into(),
            description: "Deep & dangerous".into(),
            location: "Main Street 10".into(),
            coordinates: None,
            media_ref: None,
            status: Status::Received,
            admin_response: None,
            created_at: 1,
            status_updated_at: 1,
            revision: 0,
            announced: false,
        }
    }

    fn jane() -> ReporterCard {
        ReporterCard {
            label: "Jane".into(),
            contact: "555-0100".into(),
        }
    }

    fn render(c: &Complaint) -> String {
        Body::new(c, &jane()).render()
    }

    #[test]
    fn announcement_escapes_citizen_text() {
        let text = render(&complaint());
        assert!(text.contains("<b>ID:</b> <code>42</code>"));
        assert!(text.contains("Pothole &lt;big&gt;"));
        assert!(text.contains("<i>Deep &amp; dangerous</i>"));
        assert!(text.contains("<b>Reporter:</b> Jane"));
        assert!(!text.contains("GPS"));
    }

    #[test]
    fn map_link_is_added_for_coordinates() {
        let mut c = complaint();
        c.coordinates = Some(Coordinates { lat: -6.2, lon: 106.8 });
        let text = render(&c);
        assert!(text.contains(
            "href=\"https://www.google.com/maps/search/?api=1&amp;query=-6.2%2C106.8\""
        ));
    }

    #[test]
    fn notice_is_appended() {
        let c = complaint();
        let reporter = jane();
        let text = Body::new(&c, &reporter)
            .with_notice(MISSING_ATTACHMENT_NOTICE)
            .render();
        assert!(text.ends_with(&format!("<b>{MISSING_ATTACHMENT_NOTICE}</b>")));
    }

    #[test]
    fn visible_len_skips_tags_and_counts_entities_once() {
        assert_eq!(visible_len("<b>ID:</b> <code>42</code>"), 6);
        assert_eq!(visible_len("a &amp; b"), 5);
        assert_eq!(visible_len("🔔"), 2);
    }

    #[test]
    fn long_description_is_truncated_to_the_limit() {
        let mut c = complaint();
        c.description = "&".repeat(2_000);
        let reporter = jane();
        let body = Body::new(&c, &reporter);

        let caption = body.render_within(CAPTION_LIMIT).unwrap();
        assert!(visible_len(&caption) <= CAPTION_LIMIT);
        assert!(caption.contains(TRUNCATED));
        assert!(caption.contains("<b>Title:</b> Pothole &lt;big&gt;"));

        let text = body.render_within(TEXT_LIMIT).unwrap();
        assert!(!text.contains(TRUNCATED));
    }

    #[test]
    fn header_too_long_for_limit_does_not_fit() {
        let mut c = complaint();
        c.title = "t".repeat(1_100);
        assert_eq!(Body::new(&c, &jane()).render_within(CAPTION_LIMIT), None);
        assert!(visible_len(&brief(&c, &[Status::Processing])) < TEXT_LIMIT);
    }

    #[test]
    fn status_history_is_appended_in_order() {
        let c = complaint();
        let reporter = jane();
        let text = Body::new(&c, &reporter)
            .with_history(vec![Status::Processing, Status::Completed])
            .render();
        assert!(text.ends_with(
            "<b>Status updated:</b> <code>Processing</code>\n\n\
             <b>Status updated:</b> <code>Completed</code>"
        ));
    }

    #[test]
    fn status_history_is_read_from_the_body_tail() {
        let body = "New complaint received!\n\nID: 42\n\nStatus updated: Foo\nlast words\n\n\
                    Status updated: Processing\n\nStatus updated: Completed";
        assert_eq!(
            status_history(body),
            vec![Status::Processing, Status::Completed]
        );
        assert!(status_history("New complaint received!").is_empty());
    }

    #[test]
    fn notice_is_found_in_delivered_body() {
        let body = format!("ID: 1\n\n{CAPTION_OVERFLOW_NOTICE}");
        assert_eq!(notice_in(&body), Some(CAPTION_OVERFLOW_NOTICE));
        assert_eq!(notice_in("ID: 1"), None);
    }
}
