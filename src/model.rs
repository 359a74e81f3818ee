use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// Longest task text accepted, counted in characters after trimming.
pub const MAX_TEXT_LEN: usize = 100;

/// Time of day used when a due date is given without a time.
pub const DEFAULT_DUE_TIME: &str = "23:59";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis"
    )]
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task text cannot be empty")]
    Empty,
    #[error("task text cannot exceed 100 characters")]
    TooLong,
}

impl Task {
    pub fn new(id: TaskId, text: String, due_at: Option<DateTime<Utc>>) -> Self {
        Task {
            id,
            text,
            completed: false,
            due_at,
        }
    }
}

/// Trims `raw` and checks it against the text rules shared by add and edit.
pub fn validate_text(raw: &str) -> Result<&str, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong);
    }
    Ok(text)
}

/// Builds a due instant from a `YYYY-MM-DD` date and an optional `HH:MM`
/// time in the local time zone.
///
/// Returns `None` when no date is given or when the pair does not name a
/// real local instant; callers create the task without a due date then.
pub fn parse_due(date: Option<&str>, time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = date.map(str::trim).filter(|d| !d.is_empty())?;
    let time = time
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_DUE_TIME);
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Local
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// ISO-8601 with millisecond precision and a `Z` suffix, the shape
/// browsers write for `Date#toISOString`. Any RFC 3339 string is read.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
