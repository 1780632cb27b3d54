use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::todo::{timestamp, NewTodo, OrderUpdate, Todo, TodoPatch};
use crate::repository::seed::SeedSource;
use crate::repository::snapshot::SnapshotSink;

/// In-memory todo store. Every operation runs under one lock, so each call is
/// atomic from the caller's point of view. Reads hand out clones.
pub struct Database {
    todos: Mutex<Vec<Todo>>,
    seed: SeedSource,
    sink: Box<dyn SnapshotSink>,
}

impl Database {
    pub fn new(seed: SeedSource, sink: Box<dyn SnapshotSink>) -> Self {
        let todos = seed.load();
        tracing::info!(count = todos.len(), "todo store ready");
        Database {
            todos: Mutex::new(todos),
            seed,
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Todo>> {
        self.todos.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands the list to the sink. Failures are logged and otherwise ignored.
    fn mirror(&self, todos: &[Todo]) {
        if let Err(err) = self.sink.submit(todos) {
            tracing::error!(error = ?err, "error persisting todos");
        }
    }

    pub fn get_todos(&self) -> Vec<Todo> {
        let todos = self.lock();
        todos.clone()
    }

    pub fn get_todo_by_id(&self, id: &str) -> Option<Todo> {
        let todos = self.lock();
        todos.iter().find(|todo| todo.id == id).cloned()
    }

    pub fn create_todo(&self, fields: NewTodo) -> Todo {
        let mut todos = self.lock();
        let todo = Todo::new(uuid::Uuid::new_v4().to_string(), fields, timestamp::now());
        todos.push(todo.clone());
        self.mirror(&todos);
        tracing::debug!(id = %todo.id, "created todo");
        todo
    }

    pub fn update_todo_by_id(&self, id: &str, patch: TodoPatch) -> Option<Todo> {
        let mut todos = self.lock();
        let index = todos.iter().position(|todo| todo.id == id)?;
        todos[index].apply(patch, timestamp::now());
        let updated = todos[index].clone();
        self.mirror(&todos);
        tracing::debug!(id, "updated todo");
        Some(updated)
    }

    pub fn delete_todo_by_id(&self, id: &str) -> bool {
        let mut todos = self.lock();
        let before = todos.len();
        todos.retain(|todo| todo.id != id);
        self.mirror(&todos);
        let deleted = todos.len() < before;
        tracing::debug!(id, deleted, "delete todo");
        deleted
    }

    /// Sets `completed` on every todo that differs. Returns how many changed.
    pub fn complete_all(&self, completed: bool) -> usize {
        let mut todos = self.lock();
        let now = timestamp::now();
        let mut count = 0;
        for todo in todos.iter_mut().filter(|todo| todo.completed != completed) {
            todo.completed = completed;
            todo.touch(now);
            count += 1;
        }
        self.mirror(&todos);
        tracing::debug!(completed, count, "complete all");
        count
    }

    pub fn clear_completed(&self) -> usize {
        let mut todos = self.lock();
        let before = todos.len();
        todos.retain(|todo| !todo.completed);
        self.mirror(&todos);
        let count = before - todos.len();
        tracing::debug!(count, "cleared completed todos");
        count
    }

    /// Applies the requested orders, skipping unknown ids. Returns every stored
    /// todo named in `orders`, changed or not, in store order.
    pub fn reorder(&self, orders: &[OrderUpdate]) -> Vec<Todo> {
        let requested: HashMap<&str, f64> = orders
            .iter()
            .map(|update| (update.id.as_str(), update.order))
            .collect();

        let mut todos = self.lock();
        let now = timestamp::now();
        let mut changed = 0;
        for todo in todos.iter_mut() {
            match requested.get(todo.id.as_str()) {
                Some(&order) if todo.order != Some(order) => {
                    todo.order = Some(order);
                    todo.touch(now);
                    changed += 1;
                }
                _ => {}
            }
        }
        self.mirror(&todos);
        tracing::debug!(requested = orders.len(), changed, "reordered todos");
        todos
            .iter()
            .filter(|todo| requested.contains_key(todo.id.as_str()))
            .cloned()
            .collect()
    }

    /// Throws away the current list and reloads the seed.
    pub fn reset(&self) {
        let mut todos = self.lock();
        *todos = self.seed.load();
        self.mirror(&todos);
        tracing::info!(count = todos.len(), "todo store reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::snapshot::NoopSink;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// Keeps every snapshot it receives.
    #[derive(Clone, Default)]
    struct RecordingSink {
        snapshots: Arc<Mutex<Vec<Vec<Todo>>>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.snapshots.lock().unwrap().len()
        }

        fn last(&self) -> Option<Vec<Todo>> {
            self.snapshots.lock().unwrap().last().cloned()
        }
    }

    impl SnapshotSink for RecordingSink {
        fn submit(&self, todos: &[Todo]) -> anyhow::Result<()> {
            self.snapshots.lock().unwrap().push(todos.to_vec());
            Ok(())
        }
    }

    struct FailingSink;

    impl SnapshotSink for FailingSink {
        fn submit(&self, _todos: &[Todo]) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn seeded() -> Database {
        Database::new(SeedSource::builtin(), Box::new(NoopSink))
    }

    fn new_todo(title: &str) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            ..NewTodo::default()
        }
    }

    fn tick() {
        thread::sleep(Duration::from_millis(5));
    }

    #[test]
    fn create_then_get_returns_equal_todo() {
        let db = seeded();
        let created = db.create_todo(NewTodo {
            title: "Buy milk".to_string(),
            notes: Some("2 litres".to_string()),
            tags: Some(vec!["errand".to_string()]),
            order: Some(8.0),
            due_date: None,
        });
        assert!(!created.completed);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(db.get_todo_by_id(&created.id), Some(created.clone()));
        assert_eq!(db.get_todos().last(), Some(&created));
        assert_eq!(db.get_todos().len(), 8);
    }

    #[test]
    fn get_missing_id_is_none() {
        assert_eq!(seeded().get_todo_by_id("nope"), None);
    }

    #[test]
    fn snapshots_do_not_alias_store() {
        let db = seeded();
        let mut snapshot = db.get_todos();
        snapshot[0].title = "changed outside".to_string();
        snapshot.clear();
        assert_eq!(db.get_todos().len(), 7);
        assert_ne!(db.get_todos()[0].title, "changed outside");
    }

    #[test]
    fn update_merges_fields_and_refreshes_updated_at() {
        let db = seeded();
        let original = db.create_todo(new_todo("Draft"));
        tick();
        let updated = db
            .update_todo_by_id(
                &original.id,
                TodoPatch {
                    title: Some("Final".to_string()),
                    completed: Some(true),
                    ..TodoPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.title, "Final");
        assert!(updated.completed);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);
        assert_eq!(db.get_todo_by_id(&original.id), Some(updated));
    }

    #[test]
    fn stored_timestamps_match_their_serialized_form() {
        let db = seeded();
        let created = db.create_todo(new_todo("precise"));
        let updated = db
            .update_todo_by_id(
                &created.id,
                TodoPatch {
                    completed: Some(true),
                    ..TodoPatch::default()
                },
            )
            .unwrap();
        for todo in db.get_todos() {
            let json = serde_json::to_string(&todo).unwrap();
            assert_eq!(serde_json::from_str::<Todo>(&json).unwrap(), todo);
        }
        assert_eq!(updated.updated_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn update_missing_id_leaves_store_untouched() {
        let db = seeded();
        let result = db.update_todo_by_id(
            "missing",
            TodoPatch {
                title: Some("x".to_string()),
                ..TodoPatch::default()
            },
        );
        assert_eq!(result, None);
        assert_eq!(db.get_todos().len(), 7);
    }

    #[test]
    fn delete_twice_reports_true_then_false() {
        let db = seeded();
        let id = db.get_todos()[0].id.clone();
        assert!(db.delete_todo_by_id(&id));
        assert!(!db.delete_todo_by_id(&id));
        assert_eq!(db.get_todos().len(), 6);
    }

    #[test]
    fn complete_all_is_idempotent() {
        let db = seeded();
        assert_eq!(db.complete_all(true), 5);
        assert_eq!(db.complete_all(true), 0);
        assert!(db.get_todos().iter().all(|todo| todo.completed));
        assert_eq!(db.complete_all(false), 7);
    }

    #[test]
    fn complete_all_only_touches_changed_todos() {
        let db = seeded();
        let before = db.get_todos();
        tick();
        db.complete_all(true);
        for (old, new) in before.iter().zip(db.get_todos()) {
            if old.completed {
                assert_eq!(old.updated_at, new.updated_at);
            } else {
                assert!(new.updated_at > old.updated_at);
            }
        }
    }

    #[test]
    fn clear_completed_removes_exactly_the_completed() {
        let db = seeded();
        let before = db.get_todos().len();
        let count = db.clear_completed();
        let after = db.get_todos();
        assert_eq!(count, 2);
        assert_eq!(before - after.len(), count);
        assert!(after.iter().all(|todo| !todo.completed));
        assert_eq!(db.clear_completed(), 0);
    }

    #[test]
    fn reorder_changes_order_and_updated_at() {
        let db = seeded();
        let target = db.get_todos()[0].clone();
        tick();
        let items = db.reorder(&[OrderUpdate {
            id: target.id.clone(),
            order: 5.0,
        }]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order, Some(5.0));
        assert!(items[0].updated_at > target.updated_at);
    }

    #[test]
    fn reorder_to_same_value_keeps_updated_at() {
        let db = seeded();
        let target = db.get_todos()[2].clone();
        tick();
        let items = db.reorder(&[OrderUpdate {
            id: target.id.clone(),
            order: target.order.unwrap(),
        }]);
        assert_eq!(items, vec![target]);
    }

    #[test]
    fn reorder_skips_unknown_ids_and_returns_store_order() {
        let db = seeded();
        let todos = db.get_todos();
        let items = db.reorder(&[
            OrderUpdate {
                id: todos[4].id.clone(),
                order: 1.0,
            },
            OrderUpdate {
                id: "ghost".to_string(),
                order: 2.0,
            },
            OrderUpdate {
                id: todos[1].id.clone(),
                order: 9.0,
            },
        ]);
        let ids: Vec<_> = items.iter().map(|todo| todo.id.as_str()).collect();
        assert_eq!(ids, vec![todos[1].id.as_str(), todos[4].id.as_str()]);
        assert_eq!(db.get_todos().len(), 7);
    }

    #[test]
    fn reset_restores_seed() {
        let db = seeded();
        db.clear_completed();
        db.create_todo(new_todo("extra"));
        db.reset();
        let todos = db.get_todos();
        assert_eq!(todos.len(), 7);
        assert_eq!(todos.iter().filter(|todo| todo.completed).count(), 2);
    }

    #[test]
    fn every_mutation_is_mirrored() {
        let sink = RecordingSink::default();
        let db = Database::new(SeedSource::builtin(), Box::new(sink.clone()));
        let created = db.create_todo(new_todo("mirrored"));
        db.update_todo_by_id(&created.id, TodoPatch::default());
        db.complete_all(true);
        db.reorder(&[]);
        db.clear_completed();
        db.delete_todo_by_id("missing");
        db.reset();
        assert_eq!(sink.count(), 7);
        assert_eq!(sink.last().unwrap().len(), 7);
        db.get_todos();
        db.get_todo_by_id(&created.id);
        assert_eq!(sink.count(), 7);
    }

    #[test]
    fn sink_failures_do_not_fail_operations() {
        let db = Database::new(SeedSource::builtin(), Box::new(FailingSink));
        let created = db.create_todo(new_todo("still works"));
        assert_eq!(db.get_todo_by_id(&created.id), Some(created));
        assert_eq!(db.clear_completed(), 2);
    }

    #[test]
    fn concurrent_creates_keep_every_todo() {
        let db = Arc::new(seeded());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..25 {
                        db.create_todo(new_todo(&format!("w{}-{}", worker, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let todos = db.get_todos();
        assert_eq!(todos.len(), 7 + 200);
        let mut ids: Vec<_> = todos.iter().map(|todo| todo.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 207);
    }
}
