use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::todo::Todo;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    fn matches(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Order,
    DueDate,
    #[default]
    CreatedAt,
    UpdatedAt,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    }
}

/// Query string of `GET /todos`: filter by status, then search, then sort.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_dir: SortDir,
}

impl TodoQuery {
    pub fn apply(&self, todos: Vec<Todo>) -> Vec<Todo> {
        let needle = self
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|needle| !needle.is_empty());

        let mut todos: Vec<Todo> = todos
            .into_iter()
            .filter(|todo| self.status.matches(todo))
            .filter(|todo| needle.as_deref().map_or(true, |needle| contains_text(todo, needle)))
            .collect();
        todos.sort_by(|a, b| self.compare(a, b));
        todos
    }

    fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        let dir = self.sort_dir;
        match self.sort_by {
            SortBy::Order => {
                let (a, b) = (a.order.unwrap_or(0.0), b.order.unwrap_or(0.0));
                dir.apply(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
            }
            // undated todos trail the dated ones in either direction
            SortBy::DueDate => match (a.due_date, b.due_date) {
                (Some(a), Some(b)) => dir.apply(a.cmp(&b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortBy::CreatedAt => dir.apply(a.created_at.cmp(&b.created_at)),
            SortBy::UpdatedAt => dir.apply(a.updated_at.cmp(&b.updated_at)),
        }
    }
}

fn contains_text(todo: &Todo, needle: &str) -> bool {
    todo.title.to_lowercase().contains(needle)
        || todo
            .notes
            .as_deref()
            .is_some_and(|notes| notes.to_lowercase().contains(needle))
}
