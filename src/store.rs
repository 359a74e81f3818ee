use crate::model::{parse_due, validate_text, Task, TaskId, ValidationError};
use crate::storage::{
    load_collection, save_collection, KeyValueStore, StorageError, ACTIVE_KEY, ARCHIVED_KEY,
};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, warn};

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&Snapshot<'_>)>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Read-only view of both collections at one point in time.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub active: &'a [Task],
    pub archived: &'a [Task],
}

#[derive(Clone, Copy)]
enum Touched {
    Active,
    Archived,
    Both,
}

/// Owns the active and archived collections and writes them back to the
/// key-value store after every change.
pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    active: Vec<Task>,
    archived: Vec<Task>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Creates a store over `storage` and loads both collections from it.
    pub fn open(storage: S) -> Self {
        let mut store = TaskStore {
            storage,
            active: Vec::new(),
            archived: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        };
        store.load();
        store
    }

    /// Replaces in-memory state with what the backing store holds. Never
    /// fails: unreadable collections load as empty.
    pub fn load(&mut self) {
        let active = load_collection(&mut self.storage, ACTIVE_KEY);
        let archived = load_collection(&mut self.storage, ARCHIVED_KEY);

        let (active, invalid_active) = drop_invalid_text(active);
        let (archived, invalid_archived) = drop_invalid_text(archived);
        let invalid = invalid_active + invalid_archived;
        if invalid > 0 {
            warn!(invalid, "ignored tasks with empty or oversized text");
        }

        let mut seen = HashSet::new();
        let before = active.len() + archived.len();
        self.active = active.into_iter().filter(|t| seen.insert(t.id)).collect();
        self.archived = archived.into_iter().filter(|t| seen.insert(t.id)).collect();
        let dropped = before - self.active.len() - self.archived.len();
        if dropped > 0 {
            warn!(dropped, "ignored tasks with duplicate ids");
        }
        debug!(
            active = self.active.len(),
            archived = self.archived.len(),
            "loaded tasks"
        );
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            active: &self.active,
            archived: &self.archived,
        }
    }

    pub fn active(&self) -> &[Task] {
        &self.active
    }

    pub fn archived(&self) -> &[Task] {
        &self.archived
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.active.iter().find(|t| t.id == id)
    }

    pub fn find_archived(&self, id: TaskId) -> Option<&Task> {
        self.archived.iter().find(|t| t.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Registers `listener` to receive a snapshot after each change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Snapshot<'_>) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Appends a new task. A due date that does not parse is dropped and
    /// the task is still created.
    pub fn add(
        &mut self,
        raw_text: &str,
        due_date: Option<&str>,
        due_time: Option<&str>,
    ) -> Result<TaskId, StoreError> {
        let text = validate_text(raw_text)?.to_string();
        let due_at = parse_due(due_date, due_time);
        if due_at.is_none() && due_date.is_some_and(|d| !d.trim().is_empty()) {
            debug!(?due_date, ?due_time, "dropping unparsable due date");
        }
        let id = self.next_id();
        self.active.push(Task::new(id, text, due_at));
        debug!(id, "added task");
        self.changed(Touched::Active)?;
        Ok(id)
    }

    /// Flips completion of an active task. Returns whether it was found.
    pub fn toggle(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let Some(task) = self.active.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.completed = !task.completed;
        debug!(id, completed = task.completed, "toggled task");
        self.changed(Touched::Active)?;
        Ok(true)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let before = self.active.len();
        self.active.retain(|t| t.id != id);
        if self.active.len() == before {
            return Ok(false);
        }
        debug!(id, "deleted task");
        self.changed(Touched::Active)?;
        Ok(true)
    }

    /// Replaces the text of an active task under the same rules as `add`.
    pub fn edit_text(&mut self, id: TaskId, raw_text: &str) -> Result<bool, StoreError> {
        let text = validate_text(raw_text)?;
        let Some(task) = self.active.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.text = text.to_string();
        debug!(id, "edited task");
        self.changed(Touched::Active)?;
        Ok(true)
    }

    /// Moves every completed task to the archive, keeping their order.
    /// Returns how many were moved.
    pub fn clear_completed(&mut self) -> Result<usize, StoreError> {
        let (done, remaining): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut self.active)
                .into_iter()
                .partition(|t| t.completed);
        self.active = remaining;
        if done.is_empty() {
            return Ok(0);
        }
        let moved = done.len();
        self.archived.extend(done);
        debug!(moved, "archived completed tasks");
        self.changed(Touched::Both)?;
        Ok(moved)
    }

    /// Moves an archived task back to the end of the active list as
    /// incomplete.
    pub fn restore_archived(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let Some(idx) = self.archived.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let mut task = self.archived.remove(idx);
        task.completed = false;
        self.active.push(task);
        debug!(id, "restored task");
        self.changed(Touched::Both)?;
        Ok(true)
    }

    pub fn delete_archived(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let before = self.archived.len();
        self.archived.retain(|t| t.id != id);
        if self.archived.len() == before {
            return Ok(false);
        }
        debug!(id, "deleted archived task");
        self.changed(Touched::Archived)?;
        Ok(true)
    }

    // Creation time in epoch milliseconds, bumped past every known id so
    // tasks created within the same millisecond stay distinct. When the
    // largest id is TaskId::MAX, the first free id from `now` upward
    // (wrapping to 0) is used instead.
    fn next_id(&self) -> TaskId {
        let now = Utc::now().timestamp_millis();
        let ids = || self.active.iter().chain(self.archived.iter()).map(|t| t.id);
        let Some(max) = ids().max() else {
            return now;
        };
        if let Some(next) = max.checked_add(1) {
            return now.max(next);
        }
        let used: HashSet<TaskId> = ids().collect();
        (now..=TaskId::MAX)
            .chain(0..now)
            .find(|id| !used.contains(id))
            .unwrap_or(now)
    }

    fn changed(&mut self, touched: Touched) -> Result<(), StoreError> {
        let result = self.persist(touched);
        let snapshot = Snapshot {
            active: &self.active,
            archived: &self.archived,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
        result
    }

    fn persist(&mut self, touched: Touched) -> Result<(), StoreError> {
        if matches!(touched, Touched::Active | Touched::Both) {
            save_collection(&mut self.storage, ACTIVE_KEY, &self.active)?;
        }
        if matches!(touched, Touched::Archived | Touched::Both) {
            save_collection(&mut self.storage, ARCHIVED_KEY, &self.archived)?;
        }
        Ok(())
    }
}

// Splits off tasks whose stored text breaks the add/edit rules.
fn drop_invalid_text(tasks: Vec<Task>) -> (Vec<Task>, usize) {
    let before = tasks.len();
    let kept: Vec<Task> = tasks
        .into_iter()
        .filter(|t| validate_text(&t.text).is_ok())
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::view::remaining_count;
    use chrono::{Local, TimeZone};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn empty_store() -> TaskStore<MemoryStore> {
        TaskStore::open(MemoryStore::new())
    }

    fn persisted(store: &TaskStore<MemoryStore>, key: &str) -> Vec<Task> {
        let raw = store.storage().get(key).unwrap().unwrap_or_else(|| b"[]".to_vec());
        serde_json::from_slice(&raw).unwrap()
    }

    #[test]
    fn add_appends_trimmed_task_and_persists() {
        let mut store = empty_store();
        let id = store.add("  Buy milk  ", None, None).unwrap();
        assert_eq!(store.active().len(), 1);
        let task = &store.active()[0];
        assert_eq!(task.id, id);
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.due_at, None);
        assert_eq!(persisted(&store, ACTIVE_KEY), store.active());
    }

    #[test]
    fn invalid_text_never_mutates() {
        let mut store = empty_store();
        let long = "x".repeat(101);
        for raw in ["", "   ", long.as_str()] {
            assert!(matches!(
                store.add(raw, None, None),
                Err(StoreError::Validation(_))
            ));
        }
        assert!(store.active().is_empty());
        assert_eq!(store.storage().get(ACTIVE_KEY).unwrap(), None);
    }

    #[test]
    fn bad_due_date_still_creates_task() {
        let mut store = empty_store();
        store.add("Pay rent", Some("2099-13-40"), Some("10:00")).unwrap();
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.active()[0].due_at, None);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut store = empty_store();
        let ids: Vec<TaskId> = (0..50)
            .map(|i| store.add(&format!("task {i}"), None, None).unwrap())
            .collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut store = empty_store();
        let id = store.add("Walk dog", None, None).unwrap();
        assert!(store.toggle(id).unwrap());
        assert!(store.find(id).unwrap().completed);
        assert!(store.toggle(id).unwrap());
        assert!(!store.find(id).unwrap().completed);
    }

    #[test]
    fn missing_ids_are_no_ops() {
        let mut store = empty_store();
        store.add("Walk dog", None, None).unwrap();
        let before = store.active().to_vec();
        assert!(!store.toggle(42).unwrap());
        assert!(!store.delete(42).unwrap());
        assert!(!store.edit_text(42, "new").unwrap());
        assert!(!store.restore_archived(42).unwrap());
        assert!(!store.delete_archived(42).unwrap());
        assert_eq!(store.active(), before.as_slice());
        assert_eq!(store.storage().get(ARCHIVED_KEY).unwrap(), None);
    }

    #[test]
    fn delete_removes_from_active() {
        let mut store = empty_store();
        let a = store.add("a", None, None).unwrap();
        let b = store.add("b", None, None).unwrap();
        assert!(store.delete(a).unwrap());
        assert_eq!(store.active().iter().map(|t| t.id).collect::<Vec<_>>(), [b]);
        assert_eq!(persisted(&store, ACTIVE_KEY).len(), 1);
    }

    #[test]
    fn edit_text_validates_and_trims() {
        let mut store = empty_store();
        let id = store.add("old", None, None).unwrap();
        assert!(matches!(
            store.edit_text(id, " "),
            Err(StoreError::Validation(ValidationError::Empty))
        ));
        assert_eq!(store.find(id).unwrap().text, "old");
        assert!(store.edit_text(id, "  new  ").unwrap());
        assert_eq!(store.find(id).unwrap().text, "new");
        assert_eq!(persisted(&store, ACTIVE_KEY)[0].text, "new");
    }

    #[test]
    fn clear_completed_archives_in_order() {
        let mut store = empty_store();
        let a = store.add("a", None, None).unwrap();
        let b = store.add("b", None, None).unwrap();
        let c = store.add("c", None, None).unwrap();
        store.toggle(c).unwrap();
        store.toggle(a).unwrap();

        assert_eq!(store.clear_completed().unwrap(), 2);
        assert_eq!(store.active().iter().map(|t| t.id).collect::<Vec<_>>(), [b]);
        assert_eq!(
            store.archived().iter().map(|t| t.id).collect::<Vec<_>>(),
            [a, c]
        );
        assert!(store.archived().iter().all(|t| t.completed));
        assert_eq!(persisted(&store, ARCHIVED_KEY), store.archived());
        assert_eq!(persisted(&store, ACTIVE_KEY), store.active());
    }

    #[test]
    fn clear_completed_without_completed_tasks_writes_nothing() {
        let mut store = empty_store();
        store.add("a", None, None).unwrap();
        assert_eq!(store.clear_completed().unwrap(), 0);
        assert_eq!(store.storage().get(ARCHIVED_KEY).unwrap(), None);
    }

    #[test]
    fn archive_then_restore_round_trip() {
        let mut store = empty_store();
        let id = store.add("Read book", None, None).unwrap();
        store.add("Other", None, None).unwrap();
        store.toggle(id).unwrap();
        store.clear_completed().unwrap();
        assert!(store.find(id).is_none());
        assert!(store.find_archived(id).is_some());

        assert!(store.restore_archived(id).unwrap());
        let restored = store.active().last().unwrap();
        assert_eq!(restored.id, id);
        assert_eq!(restored.text, "Read book");
        assert!(!restored.completed);
        assert!(store.archived().is_empty());
        assert!(persisted(&store, ARCHIVED_KEY).is_empty());
        assert_eq!(persisted(&store, ACTIVE_KEY), store.active());
    }

    #[test]
    fn delete_archived_removes_permanently() {
        let mut store = empty_store();
        let id = store.add("gone", None, None).unwrap();
        store.toggle(id).unwrap();
        store.clear_completed().unwrap();
        assert!(store.delete_archived(id).unwrap());
        assert!(store.archived().is_empty());
        assert!(store.active().is_empty());
        assert!(persisted(&store, ARCHIVED_KEY).is_empty());
    }

    #[test]
    fn buy_milk_walkthrough() {
        let mut store = empty_store();
        let first = store.add("Buy milk", None, None).unwrap();
        assert_eq!(store.active()[0].text, "Buy milk");
        assert!(!store.active()[0].completed);

        store.add("Buy milk", Some("2099-01-01"), Some("10:00")).unwrap();
        let expected = Local
            .with_ymd_and_hms(2099, 1, 1, 10, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(store.active()[1].due_at, Some(expected));

        store.toggle(first).unwrap();
        assert_eq!(remaining_count(store.active()), 1);

        store.clear_completed().unwrap();
        assert_eq!(store.archived().len(), 1);
        assert_eq!(store.archived()[0].id, first);
        assert!(store.archived()[0].completed);
    }

    #[test]
    fn single_completed_task_leaves_active_empty() {
        let mut store = empty_store();
        let id = store.add("Buy milk", None, None).unwrap();
        store.toggle(id).unwrap();
        store.clear_completed().unwrap();
        assert!(store.active().is_empty());
        assert_eq!(store.archived().len(), 1);
    }

    #[test]
    fn reopen_restores_both_collections() {
        let mut store = empty_store();
        let a = store.add("a", Some("2099-06-01"), None).unwrap();
        store.add("b", None, None).unwrap();
        store.toggle(a).unwrap();
        store.clear_completed().unwrap();
        let active = store.active().to_vec();
        let archived = store.archived().to_vec();

        let reopened = TaskStore::open(store.storage().clone());
        assert_eq!(reopened.active(), active.as_slice());
        assert_eq!(reopened.archived(), archived.as_slice());
    }

    #[test]
    fn load_tolerates_corrupt_entries() {
        let mut backing = MemoryStore::new();
        backing.set(ACTIVE_KEY, b"garbage").unwrap();
        backing
            .set(ARCHIVED_KEY, br#"[{"id":1,"text":"kept","completed":true}]"#)
            .unwrap();
        let store = TaskStore::open(backing);
        assert!(store.active().is_empty());
        assert_eq!(store.archived().len(), 1);
    }

    #[test]
    fn load_drops_duplicate_ids() {
        let mut backing = MemoryStore::new();
        backing
            .set(
                ACTIVE_KEY,
                br#"[{"id":1,"text":"a","completed":false},{"id":1,"text":"dup","completed":false}]"#,
            )
            .unwrap();
        backing
            .set(ARCHIVED_KEY, br#"[{"id":1,"text":"old","completed":true}]"#)
            .unwrap();
        let store = TaskStore::open(backing);
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.active()[0].text, "a");
        assert!(store.archived().is_empty());
    }

    #[test]
    fn new_ids_exceed_loaded_ids() {
        let mut backing = MemoryStore::new();
        let far_future = i64::MAX / 2;
        backing
            .set(
                ARCHIVED_KEY,
                format!(r#"[{{"id":{far_future},"text":"a","completed":true}}]"#).as_bytes(),
            )
            .unwrap();
        let mut store = TaskStore::open(backing);
        let id = store.add("b", None, None).unwrap();
        assert_eq!(id, far_future + 1);
    }

    #[test]
    fn new_ids_stay_unique_when_max_id_is_taken() {
        let mut backing = MemoryStore::new();
        backing
            .set(
                ACTIVE_KEY,
                format!(r#"[{{"id":{},"text":"a","completed":false}}]"#, i64::MAX).as_bytes(),
            )
            .unwrap();
        let mut store = TaskStore::open(backing);
        let b = store.add("b", None, None).unwrap();
        let c = store.add("c", None, None).unwrap();
        let ids: HashSet<TaskId> = store.active().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(b, i64::MAX);
        assert_ne!(c, i64::MAX);
        assert_ne!(b, c);
    }

    #[test]
    fn load_drops_invalid_text() {
        let mut backing = MemoryStore::new();
        let long = "x".repeat(300);
        backing
            .set(
                ACTIVE_KEY,
                format!(
                    r#"[{{"id":1,"text":"","completed":false}},{{"id":2,"text":"{long}","completed":false}},{{"id":3,"text":"ok","completed":false}}]"#
                )
                .as_bytes(),
            )
            .unwrap();
        backing
            .set(ARCHIVED_KEY, br#"[{"id":4,"text":"   ","completed":true}]"#)
            .unwrap();
        let store = TaskStore::open(backing);
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.active()[0].text, "ok");
        assert!(store.archived().is_empty());
    }

    #[test]
    fn subscribers_see_each_change() {
        let mut store = empty_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |snap| {
            sink.borrow_mut()
                .push((snap.active.len(), snap.archived.len()));
        });

        let id = store.add("a", None, None).unwrap();
        store.toggle(id).unwrap();
        store.toggle(999).unwrap();
        store.clear_completed().unwrap();
        assert_eq!(*seen.borrow(), vec![(1, 0), (1, 0), (0, 1)]);

        assert!(store.unsubscribe(sub));
        store.restore_archived(id).unwrap();
        assert_eq!(seen.borrow().len(), 3);
        assert!(!store.unsubscribe(sub));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Toggle(usize),
        ClearCompleted,
        Restore(usize),
        Delete(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => "[a-z]{1,8}".prop_map(Op::Add),
            2 => any::<usize>().prop_map(Op::Toggle),
            1 => Just(Op::ClearCompleted),
            1 => any::<usize>().prop_map(Op::Restore),
            1 => any::<usize>().prop_map(Op::Delete),
        ]
    }

    fn pick(tasks: &[Task], idx: usize) -> Option<TaskId> {
        (!tasks.is_empty()).then(|| tasks[idx % tasks.len()].id)
    }

    proptest! {
        #[test]
        fn ids_unique_across_collections(ops in prop::collection::vec(op(), 1..40)) {
            let mut store = empty_store();
            for op in ops {
                match op {
                    Op::Add(text) => { store.add(&text, None, None).unwrap(); }
                    Op::Toggle(i) => if let Some(id) = pick(store.active(), i) {
                        store.toggle(id).unwrap();
                    },
                    Op::ClearCompleted => { store.clear_completed().unwrap(); }
                    Op::Restore(i) => if let Some(id) = pick(store.archived(), i) {
                        store.restore_archived(id).unwrap();
                        prop_assert!(!store.find(id).unwrap().completed);
                    },
                    Op::Delete(i) => if let Some(id) = pick(store.active(), i) {
                        store.delete(id).unwrap();
                    },
                }
                let ids: Vec<TaskId> = store
                    .active()
                    .iter()
                    .chain(store.archived())
                    .map(|t| t.id)
                    .collect();
                let unique: HashSet<_> = ids.iter().collect();
                prop_assert_eq!(unique.len(), ids.len());
            }
        }
    }
}
