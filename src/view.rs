use crate::model::Task;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

impl FilterCounts {
    pub fn get(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.all,
            Filter::Active => self.active,
            Filter::Completed => self.completed,
        }
    }
}

/// Tasks visible under `filter`, in collection order.
pub fn filtered_view(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

pub fn remaining_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| !t.completed).count()
}

pub fn filter_counts(tasks: &[Task]) -> FilterCounts {
    let active = remaining_count(tasks);
    FilterCounts {
        all: tasks.len(),
        active,
        completed: tasks.len() - active,
    }
}

/// An incomplete task whose due instant lies before `now`.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.completed && task.due_at.is_some_and(|due| due < now)
}
