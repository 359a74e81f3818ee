use crate::edit::EditSession;
use crate::model::{Task, TaskId};
use crate::storage::FileStore;
use crate::store::TaskStore;
use crate::ui;
use crate::view::{filter_counts, filtered_view, is_overdue, remaining_count, Filter};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use std::path::Path;

pub fn add(data_dir: &Path, text: String, date: Option<String>, time: Option<String>) -> Result<()> {
    let mut store = open_store(data_dir);
    let id = store
        .add(&text, date.as_deref(), time.as_deref())
        .context("adding task")?;
    match store.find(id).and_then(|t| t.due_at) {
        Some(due) => println!("Added task {} (due {})", id, format_due(&due)),
        None if date.is_some() => {
            println!("Added task {} (due date not understood, ignored)", id)
        }
        None => println!("Added task {}", id),
    }
    Ok(())
}

pub fn list(data_dir: &Path, filter: Filter) -> Result<()> {
    let store = open_store(data_dir);
    let tasks = store.active();
    let counts = filter_counts(tasks);
    println!(
        "All ({})  Active ({})  Completed ({})",
        counts.all, counts.active, counts.completed
    );
    if tasks.is_empty() {
        println!("  No tasks yet. Add one with `todos add`.");
        return Ok(());
    }
    let now = Utc::now();
    let visible = filtered_view(tasks, filter);
    if visible.is_empty() {
        println!("  (nothing {})", filter);
    }
    for task in visible {
        print_task(task, now);
    }
    println!("{} tasks remaining", remaining_count(tasks));
    Ok(())
}

pub fn toggle(data_dir: &Path, id: TaskId) -> Result<()> {
    let mut store = open_store(data_dir);
    if !store.toggle(id).context("toggling task")? {
        bail!("task {} not found", id);
    }
    let done = store.find(id).is_some_and(|t| t.completed);
    println!(
        "Marked task {} as {}",
        id,
        if done { "done" } else { "not done" }
    );
    Ok(())
}

pub fn edit(data_dir: &Path, id: TaskId, text: String) -> Result<()> {
    let mut store = open_store(data_dir);
    let current = match store.find(id) {
        Some(task) => task.text.clone(),
        None => bail!("task {} not found", id),
    };
    let mut session = EditSession::new();
    session.begin(id, &current);
    session.set_draft(text);
    session.commit(&mut store).context("editing task")?;
    println!("Updated task {}", id);
    Ok(())
}

pub fn delete(data_dir: &Path, id: TaskId) -> Result<()> {
    let mut store = open_store(data_dir);
    if !store.delete(id).context("deleting task")? {
        bail!("task {} not found", id);
    }
    println!("Deleted task {}", id);
    Ok(())
}

pub fn clear_completed(data_dir: &Path) -> Result<()> {
    let mut store = open_store(data_dir);
    let moved = store.clear_completed().context("archiving tasks")?;
    if moved == 0 {
        println!("No completed tasks to archive");
    } else {
        println!("Archived {} completed task(s)", moved);
    }
    Ok(())
}

pub fn archived(data_dir: &Path) -> Result<()> {
    let store = open_store(data_dir);
    let tasks = store.archived();
    println!("Archived ({})", tasks.len());
    if tasks.is_empty() {
        println!("  (empty)");
    }
    let now = Utc::now();
    for task in tasks {
        print_task(task, now);
    }
    Ok(())
}

pub fn restore(data_dir: &Path, id: TaskId) -> Result<()> {
    let mut store = open_store(data_dir);
    if !store.restore_archived(id).context("restoring task")? {
        bail!("archived task {} not found", id);
    }
    println!("Restored task {}", id);
    Ok(())
}

pub fn purge(data_dir: &Path, id: TaskId) -> Result<()> {
    let mut store = open_store(data_dir);
    if !store.delete_archived(id).context("deleting archived task")? {
        bail!("archived task {} not found", id);
    }
    println!("Deleted archived task {}", id);
    Ok(())
}

pub fn tui(data_dir: &Path) -> Result<()> {
    ui::run(open_store(data_dir))
}

fn open_store(data_dir: &Path) -> TaskStore<FileStore> {
    TaskStore::open(FileStore::new(data_dir))
}

pub(crate) fn format_due(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn print_task(task: &Task, now: DateTime<Utc>) {
    let check = if task.completed { "x" } else { " " };
    println!("  [{}] {}: {}", check, task.id, task.text);
    if let Some(due) = task.due_at {
        let marker = if is_overdue(task, now) { " ! overdue" } else { "" };
        println!("      due: {}{}", format_due(&due), marker);
    }
}
