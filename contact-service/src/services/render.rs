use crate::models::Submission;
use askama::Template;
use chrono::{DateTime, Utc};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

struct Field<'a> {
    label: &'static str,
    value: &'a str,
}

/// HTML body of the notification. Values are HTML-escaped by the template.
#[derive(Template)]
#[template(path = "contact_notification.html")]
struct NotificationTemplate<'a> {
    site_name: &'a str,
    received_at: String,
    fields: Vec<Field<'a>>,
    message: Option<&'a str>,
}

pub fn render_notification(
    submission: &Submission,
    received_at: DateTime<Utc>,
    site_name: &str,
) -> Result<String, askama::Error> {
    let fields = submission
        .labeled_fields()
        .into_iter()
        .map(|(label, value)| Field { label, value })
        .collect();

    NotificationTemplate {
        site_name,
        received_at: received_at.format(TIMESTAMP_FORMAT).to_string(),
        fields,
        message: submission.message.as_deref(),
    }
    .render()
}
