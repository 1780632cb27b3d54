use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::prelude::{DateTime, Utc};
use chrono::Duration;

use crate::models::todo::{timestamp, NewTodo, Todo};

/// Where the store gets its initial records from, on start and on reset.
#[derive(Debug, Clone, Default)]
pub struct SeedSource {
    path: Option<PathBuf>,
}

impl SeedSource {
    /// Reads `path` when it exists and parses, the sample set otherwise.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SeedSource {
            path: Some(path.into()),
        }
    }

    /// Always the built-in sample set.
    pub fn builtin() -> Self {
        SeedSource { path: None }
    }

    pub fn load(&self) -> Vec<Todo> {
        let Some(path) = self.path.as_deref() else {
            return default_todos(timestamp::now());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no seed file, using sample todos");
            return default_todos(timestamp::now());
        }
        match read_seed_file(path) {
            Ok(todos) => {
                tracing::info!(path = %path.display(), count = todos.len(), "loaded seed todos");
                todos
            }
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    error = ?err,
                    "error loading seed data, using sample todos"
                );
                default_todos(timestamp::now())
            }
        }
    }
}

fn read_seed_file(path: &Path) -> anyhow::Result<Vec<Todo>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

struct Sample {
    title: &'static str,
    completed: bool,
    notes: Option<&'static str>,
    tags: &'static [&'static str],
    due_in_days: Option<i64>,
}

const SAMPLES: [Sample; 7] = [
    Sample {
        title: "Setup development environment",
        completed: true,
        notes: Some("Install the toolchain and bootstrap the project"),
        tags: &["setup", "dev"],
        due_in_days: None,
    },
    Sample {
        title: "Create API documentation",
        completed: false,
        notes: Some("Document all API endpoints with examples"),
        tags: &["documentation"],
        due_in_days: Some(7),
    },
    Sample {
        title: "Implement authentication",
        completed: false,
        notes: None,
        tags: &["feature", "security"],
        due_in_days: None,
    },
    Sample {
        title: "Write unit tests",
        completed: false,
        notes: Some("Cover all API endpoints with tests"),
        tags: &["testing"],
        due_in_days: Some(3),
    },
    Sample {
        title: "Setup CI/CD pipeline",
        completed: false,
        notes: None,
        tags: &["devops", "automation"],
        due_in_days: None,
    },
    Sample {
        title: "Optimize database queries",
        completed: true,
        notes: Some("Review and optimize slow queries"),
        tags: &["performance", "database"],
        due_in_days: None,
    },
    Sample {
        title: "Add rate limiting",
        completed: false,
        notes: None,
        tags: &["security", "feature"],
        due_in_days: Some(14),
    },
];

/// The sample list used when no seed file is available: seven todos, two of
/// them completed, ordered 1 through 7.
pub fn default_todos(now: DateTime<Utc>) -> Vec<Todo> {
    SAMPLES
        .iter()
        .zip(1u8..)
        .map(|(sample, order)| {
            let fields = NewTodo {
                title: sample.title.to_string(),
                notes: sample.notes.map(str::to_string),
                due_date: sample.due_in_days.map(|days| now + Duration::days(days)),
                tags: Some(sample.tags.iter().map(|tag| tag.to_string()).collect()),
                order: Some(f64::from(order)),
            };
            let mut todo = Todo::new(uuid::Uuid::new_v4().to_string(), fields, now);
            todo.completed = sample.completed;
            todo
        })
        .collect()
}
