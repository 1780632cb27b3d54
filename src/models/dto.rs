use serde::{Deserialize, Serialize};

use crate::models::todo::{NewTodo, OrderUpdate, Todo, TodoPatch};
use crate::models::validation::{self, non_null, FieldError};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoDto {
    pub title: String,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoDto {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum BulkActionDto {
    CompleteAll { completed: bool },
    ClearCompleted {},
    Reorder { orders: Vec<OrderUpdate> },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsData {
    pub items: Vec<Todo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountData {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedData {
    pub id: String,
}

fn collect_errors(results: impl IntoIterator<Item = Option<FieldError>>) -> Vec<FieldError> {
    results.into_iter().flatten().collect()
}

impl TryFrom<CreateTodoDto> for NewTodo {
    type Error = Vec<FieldError>;

    fn try_from(value: CreateTodoDto) -> Result<Self, Self::Error> {
        let title = validation::title(&value.title);
        let due_date = value.due_date.as_deref().map(validation::due_date).transpose();
        match (title, due_date) {
            (Ok(()), Ok(due_date)) => Ok(NewTodo {
                title: value.title,
                notes: value.notes,
                due_date,
                tags: value.tags,
                order: value.order,
            }),
            (title, due_date) => Err(collect_errors([title.err(), due_date.err()])),
        }
    }
}

impl TryFrom<UpdateTodoDto> for TodoPatch {
    type Error = Vec<FieldError>;

    fn try_from(value: UpdateTodoDto) -> Result<Self, Self::Error> {
        let title = value.title.as_deref().map(validation::title).transpose();
        let due_date = value.due_date.as_deref().map(validation::due_date).transpose();
        match (title, due_date) {
            (Ok(_), Ok(due_date)) => Ok(TodoPatch {
                title: value.title,
                notes: value.notes,
                completed: value.completed,
                due_date,
                tags: value.tags,
                order: value.order,
            }),
            (title, due_date) => Err(collect_errors([title.err(), due_date.err()])),
        }
    }
}
