use chrono::prelude::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::todo::timestamp;

pub const TITLE_MAX_CHARS: usize = 200;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn title(value: &str) -> Result<(), FieldError> {
    match value.chars().count() {
        0 => Err(FieldError::new("title", "Title must not be empty")),
        n if n > TITLE_MAX_CHARS => Err(FieldError::new(
            "title",
            format!("Title must be at most {} characters", TITLE_MAX_CHARS),
        )),
        _ => Ok(()),
    }
}

/// Only UTC timestamps with a `Z` suffix are accepted.
pub fn due_date(value: &str) -> Result<DateTime<Utc>, FieldError> {
    let invalid = || FieldError::new("dueDate", "Due date must be an ISO-8601 UTC datetime");
    if !value.ends_with('Z') {
        return Err(invalid());
    }
    timestamp::parse(value).map_err(|_| invalid())
}

/// For optional request fields: a missing key stays `None` through
/// `#[serde(default)]`, an explicit `null` is a type error.
pub fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
