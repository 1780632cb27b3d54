use actix_web::{delete, get, guard, middleware, patch, post, web, HttpRequest, HttpResponse};
use actix_web::error::{JsonPayloadError, QueryPayloadError};

use crate::api::response::{self, ApiError};
use crate::config::Config;
use crate::models::dto::{
    BulkActionDto, CountData, CreateTodoDto, DeletedData, ItemsData, UpdateTodoDto,
};
use crate::models::query::TodoQuery;
use crate::models::todo::{NewTodo, TodoPatch};
use crate::repository::database::Database;

/// Runs a store call on the blocking pool. A panic inside the store comes
/// back as a 500 instead of a dropped connection.
async fn run<F, R>(db: &web::Data<Database>, call: F) -> Result<R, ApiError>
where
    F: FnOnce(&Database) -> R + Send + 'static,
    R: Send + 'static,
{
    let db = db.clone();
    web::block(move || call(&db))
        .await
        .map_err(|err| ApiError::Internal(anyhow::anyhow!("store call failed: {}", err)))
}

#[get("/todos")]
pub async fn get_todos(
    db: web::Data<Database>,
    query: web::Query<TodoQuery>,
) -> Result<HttpResponse, ApiError> {
    let todos = run(&db, Database::get_todos).await?;
    let items = query.apply(todos);
    Ok(response::ok(ItemsData { items }))
}

#[post("/todos")]
pub async fn create_todo(
    db: web::Data<Database>,
    new_todo: web::Json<CreateTodoDto>,
) -> Result<HttpResponse, ApiError> {
    let fields = NewTodo::try_from(new_todo.into_inner()).map_err(ApiError::invalid_fields)?;
    let todo = run(&db, move |db| db.create_todo(fields)).await?;
    Ok(response::created(todo))
}

#[patch("/todos/bulk")]
pub async fn bulk_update(
    db: web::Data<Database>,
    action: web::Json<BulkActionDto>,
) -> Result<HttpResponse, ApiError> {
    let response = match action.into_inner() {
        BulkActionDto::CompleteAll { completed } => {
            let count = run(&db, move |db| db.complete_all(completed)).await?;
            response::ok(CountData { count })
        }
        BulkActionDto::ClearCompleted {} => {
            let count = run(&db, Database::clear_completed).await?;
            response::ok(CountData { count })
        }
        BulkActionDto::Reorder { orders } => {
            let items = run(&db, move |db| db.reorder(&orders)).await?;
            response::ok(ItemsData { items })
        }
    };
    Ok(response)
}

#[post("/todos/reset")]
pub async fn reset_todos(
    db: web::Data<Database>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    if !config.demo_routes {
        return Err(ApiError::NotFound("Resource"));
    }
    run(&db, Database::reset).await?;
    let items = run(&db, Database::get_todos).await?;
    Ok(response::ok(ItemsData { items }))
}

#[get("/todos/{id}")]
pub async fn get_todo_by_id(
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let todo = run(&db, move |db| db.get_todo_by_id(&id)).await?;
    todo.map(response::ok).ok_or(ApiError::NotFound("Todo"))
}

#[patch("/todos/{id}")]
pub async fn update_todo_by_id(
    db: web::Data<Database>,
    id: web::Path<String>,
    updated_todo: web::Json<UpdateTodoDto>,
) -> Result<HttpResponse, ApiError> {
    let patch = TodoPatch::try_from(updated_todo.into_inner()).map_err(ApiError::invalid_fields)?;
    let id = id.into_inner();
    let todo = run(&db, move |db| db.update_todo_by_id(&id, patch)).await?;
    todo.map(response::ok).ok_or(ApiError::NotFound("Todo"))
}

#[delete("/todos/{id}")]
pub async fn delete_todo_by_id(
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let lookup = id.clone();
    if run(&db, move |db| db.delete_todo_by_id(&lookup)).await? {
        Ok(response::ok(DeletedData { id }))
    } else {
        Err(ApiError::NotFound("Todo"))
    }
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::invalid_input(err).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::invalid_input(err).into()
}

/// CORS headers added to every response.
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS, PATCH"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .add(("Access-Control-Max-Age", "86400"))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .service(
                web::resource(["/todos", "/todos/bulk", "/todos/{id}"])
                    .guard(guard::Options())
                    .to(preflight),
            )
            // the literal bulk/reset paths have to come before /todos/{id}
            .service(get_todos)
            .service(create_todo)
            .service(bulk_update)
            .service(reset_todos)
            .service(get_todo_by_id)
            .service(update_todo_by_id)
            .service(delete_todo_by_id),
    );
}
