use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::Context;

use crate::models::todo::Todo;

/// Receives the full todo list after every mutation.
///
/// Implementations must not block on I/O: `submit` is called while the store
/// holds its lock.
pub trait SnapshotSink: Send + Sync {
    fn submit(&self, todos: &[Todo]) -> anyhow::Result<()>;
}

/// Persistence switched off.
pub struct NoopSink;

impl SnapshotSink for NoopSink {
    fn submit(&self, _todos: &[Todo]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Mirrors the list into a JSON file from a background writer thread.
///
/// Snapshots queue up in submission order; the writer skips to the newest one
/// whenever it falls behind.
pub struct JsonFileSink {
    path: PathBuf,
    sender: Sender<Vec<Todo>>,
}

impl JsonFileSink {
    pub fn spawn(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let (sender, receiver) = mpsc::channel::<Vec<Todo>>();
        let target = path.clone();
        thread::Builder::new()
            .name("todo-snapshot".to_string())
            .spawn(move || {
                while let Ok(mut snapshot) = receiver.recv() {
                    while let Ok(newer) = receiver.try_recv() {
                        snapshot = newer;
                    }
                    match write_snapshot(&target, &snapshot) {
                        Ok(()) => tracing::debug!(
                            path = %target.display(),
                            count = snapshot.len(),
                            "persisted todos"
                        ),
                        Err(err) => tracing::error!(
                            path = %target.display(),
                            error = ?err,
                            "failed to persist todos"
                        ),
                    }
                }
            })
            .context("failed to spawn snapshot writer thread")?;
        Ok(JsonFileSink { path, sender })
    }
}

impl SnapshotSink for JsonFileSink {
    fn submit(&self, todos: &[Todo]) -> anyhow::Result<()> {
        self.sender
            .send(todos.to_vec())
            .with_context(|| format!("snapshot writer for {} has stopped", self.path.display()))
    }
}

/// Rewrites `path` with the whole list. Goes through a temporary sibling so a
/// crash mid-write never leaves a truncated file behind.
pub fn write_snapshot(path: &Path, todos: &[Todo]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(todos).context("failed to serialize todos")?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to move snapshot into {}", path.display()))?;
    Ok(())
}
