use actix_web::{get, middleware, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};

use crate::api::response::ApiError;
use crate::config::Config;
use crate::repository::database::Database;
use crate::repository::seed::SeedSource;
use crate::repository::snapshot::{JsonFileSink, NoopSink, SnapshotSink};

mod api;
mod config;
mod models;
mod repository;
mod telemetry;

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

#[get("/health")]
async fn healthcheck() -> impl Responder {
    let response = Response {
        message: "Everything is working fine".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("Resource"))
}

fn setup(config: &Config) -> anyhow::Result<web::Data<Database>> {
    let seed = match &config.seed_path {
        Some(path) => SeedSource::file(path),
        None => SeedSource::builtin(),
    };
    let sink: Box<dyn SnapshotSink> = if config.persist {
        tracing::info!(path = %config.data_path.display(), "mirroring todos to disk");
        Box::new(JsonFileSink::spawn(&config.data_path)?)
    } else {
        Box::new(NoopSink)
    };
    Ok(web::Data::new(Database::new(seed, sink)))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_subscriber(&config.app_name)?;

    let todo_db = setup(&config)?;
    let config_data = web::Data::new(config.clone());

    tracing::info!(host = %config.host, port = config.port, "starting {}", config.app_name);
    HttpServer::new(move || {
        App::new()
            .app_data(todo_db.clone())
            .app_data(config_data.clone())
            .configure(api::api::config)
            .service(healthcheck)
            .default_service(web::route().to(not_found))
            .wrap(api::api::cors_headers())
            .wrap(middleware::Logger::default())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
