use chrono::prelude::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "whole_number"
    )]
    pub order: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Todo {
    /// Builds a fresh, not yet completed todo stamped with `now`.
    pub fn new(id: String, fields: NewTodo, now: DateTime<Utc>) -> Self {
        Todo {
            id,
            title: fields.title,
            completed: false,
            created_at: now,
            updated_at: now,
            order: fields.order,
            due_date: fields.due_date,
            notes: fields.notes,
            tags: fields.tags,
        }
    }

    /// Refreshes `updated_at`, never letting it fall behind `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn apply(&mut self, patch: TodoPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(tags) = patch.tags {
            self.tags = Some(tags);
        }
        if let Some(order) = patch.order {
            self.order = Some(order);
        }
        self.touch(now);
    }
}

/// Validated input for creating a todo. The store assigns everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub order: Option<f64>,
}

/// Validated partial update. `None` leaves the stored field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub order: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub id: String,
    pub order: f64,
}

/// Writes integral orders as JSON integers (`3`, not `3.0`).
fn whole_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    match value {
        Some(order) if order.fract() == 0.0 && order.abs() <= MAX_SAFE_INTEGER => {
            serializer.serialize_some(&(*order as i64))
        }
        Some(order) => serializer.serialize_some(order),
        None => serializer.serialize_none(),
    }
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix, so the
/// serialized form sorts the same way the values do.
///
/// Values the store holds are cut to whole milliseconds, so the in-memory
/// value always equals its serialized form.
pub mod timestamp {
    use chrono::{DateTime, ParseError, SecondsFormat, Timelike, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// The current time at millisecond precision.
    pub fn now() -> DateTime<Utc> {
        truncate(Utc::now())
    }

    pub fn truncate(value: DateTime<Utc>) -> DateTime<Utc> {
        value
            .with_nanosecond(value.timestamp_subsec_millis() * 1_000_000)
            .unwrap_or(value)
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(value: &str) -> Result<DateTime<Utc>, ParseError> {
        DateTime::parse_from_rfc3339(value).map(|parsed| truncate(parsed.with_timezone(&Utc)))
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&super::format(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}
