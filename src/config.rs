use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// `None` skips the seed file and starts from the sample todos.
    pub seed_path: Option<PathBuf>,
    pub data_path: PathBuf,
    pub persist: bool,
    pub demo_routes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "todo-api".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            seed_path: Some(PathBuf::from("data/todos.seed.json")),
            data_path: PathBuf::from("data/todos.json"),
            persist: false,
            demo_routes: false,
        }
    }
}

impl Config {
    /// Loads `.env` if there is one, then reads the `TODO_*` variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let port = match lookup("TODO_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("TODO_PORT must be a port number, got {:?}", raw))?,
            None => defaults.port,
        };
        let seed_path = match lookup("TODO_SEED_PATH") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw)),
            None => defaults.seed_path,
        };
        Ok(Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            host: lookup("TODO_HOST").unwrap_or(defaults.host),
            port,
            seed_path,
            data_path: lookup("TODO_DATA_PATH").map(PathBuf::from).unwrap_or(defaults.data_path),
            persist: flag(lookup("TODO_PERSIST"), "TODO_PERSIST")?.unwrap_or(defaults.persist),
            demo_routes: flag(lookup("TODO_DEMO_ROUTES"), "TODO_DEMO_ROUTES")?
                .unwrap_or(defaults.demo_routes),
        })
    }
}

fn flag(value: Option<String>, key: &str) -> anyhow::Result<Option<bool>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
        other => anyhow::bail!("{} must be a boolean, got {:?}", key, other),
    }
}
