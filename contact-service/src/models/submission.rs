use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// A contact-form payload. Every field is optional; blank strings are
/// treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Submission {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 256, message = "Name is too long"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 256, message = "Company is too long"))]
    pub company: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        email(message = "Invalid email address"),
        length(max = 320, message = "Email is too long")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 64, message = "Phone is too long"))]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none_untrimmed")]
    #[validate(length(max = 10000, message = "Message is too long"))]
    pub message: Option<String>,

    /// Where on the site the form was submitted from (e.g. "hero-button").
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 256, message = "Source is too long"))]
    pub source: Option<String>,
}

impl Submission {
    /// Present detail fields as `(label, value)` pairs in display order.
    /// The free-text message is rendered separately.
    pub fn labeled_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Name", &self.name),
            ("Company", &self.company),
            ("Email", &self.email),
            ("Phone", &self.phone),
            ("Source", &self.source),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Free text keeps its surrounding whitespace; it is only dropped when blank.
fn blank_as_none_untrimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}
