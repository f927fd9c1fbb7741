use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::warn;

const END_OF_DAY_SUFFIX: &str = "T23:59:59Z";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Due {
    /// `YYYY-MM-DD`, or a full RFC 3339 timestamp when a time is attached.
    /// For recurring tasks, the date of the current iteration.
    pub date: String,
    #[serde(default)]
    pub timezone: Option<String>,
    /// Human-readable form in the user's timezone.
    #[serde(default)]
    pub string: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub is_recurring: bool,
}

impl Due {
    /// Resolves the due date to an instant. A date without a time component
    /// is due at the end of that day (UTC).
    pub fn deadline(&self) -> Option<OffsetDateTime> {
        let raw = if self.date.contains('T') {
            self.date.clone()
        } else {
            format!("{}{}", self.date, END_OF_DAY_SUFFIX)
        };
        match OffsetDateTime::parse(&raw, &Rfc3339) {
            Ok(deadline) => Some(deadline),
            Err(err) => {
                warn!(date = %self.date, error = %err, "could not parse due date");
                None
            }
        }
    }
}

/// Checks a due value supplied by a caller: either a calendar date or an
/// RFC 3339 timestamp.
pub(crate) fn validate_due_input(value: &str) -> Result<(), String> {
    if value.contains('T') {
        return OffsetDateTime::parse(value, &Rfc3339)
            .map(|_| ())
            .map_err(|err| format!("due '{}' is not RFC 3339: {}", value, err));
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|_| ())
        .map_err(|err| format!("due '{}' is not a YYYY-MM-DD date: {}", value, err))
}
