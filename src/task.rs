//! Task records and the canonical in-memory task collection.
//!
//! The collection is seeded once from a [`crate::source::TaskSource`] and
//! then mutated in place for the life of the view. Nothing is written back.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single task as delivered by the backend list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub content: String,
    #[serde(default)]
    pub done: bool,
    #[serde(rename = "done_time", default)]
    pub done_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            done: false,
            done_at: None,
        }
    }
}

/// Which task a save targets: a fresh one or an existing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    New,
    Existing(u64),
}

/// Result of a successful [`TaskList::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    Created(u64),
    Updated(u64),
}

impl Saved {
    pub fn id(self) -> u64 {
        match self {
            Saved::Created(id) | Saved::Updated(id) => id,
        }
    }
}

/// Canonical task collection, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the collection from a fetched list, enforcing id uniqueness and
    /// the `done_at` present-iff-done rule.
    pub fn from_fetched(fetched: Vec<Task>) -> Self {
        Self::from_fetched_at(fetched, Utc::now())
    }

    pub fn from_fetched_at(fetched: Vec<Task>, now: DateTime<Utc>) -> Self {
        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(fetched.len());
        for mut task in fetched {
            if !seen.insert(task.id) {
                tracing::warn!(id = task.id, "dropping task with duplicate id");
                continue;
            }
            match (task.done, task.done_at) {
                (false, Some(_)) => task.done_at = None,
                (true, None) => {
                    tracing::debug!(id = task.id, "stamping done task without done_time");
                    task.done_at = Some(now);
                }
                _ => {}
            }
            tasks.push(task);
        }
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn max_id(&self) -> Option<u64> {
        self.tasks.iter().map(|task| task.id).max()
    }

    /// Id for the next created task: one past the current maximum, or 1.
    /// `None` once the id space is exhausted.
    pub fn next_id(&self) -> Option<u64> {
        match self.max_id() {
            Some(id) => id.checked_add(1),
            None => Some(1),
        }
    }

    /// Unified add/edit. Returns `None` when the trimmed content is empty,
    /// the edit target does not exist, or no id is left for a new task.
    pub fn save(&mut self, content: &str, target: SaveTarget) -> Option<Saved> {
        if content.trim().is_empty() {
            return None;
        }
        match target {
            SaveTarget::New => {
                let id = self.next_id()?;
                self.tasks.push(Task::new(id, content));
                Some(Saved::Created(id))
            }
            SaveTarget::Existing(id) => {
                let task = self.tasks.iter_mut().find(|task| task.id == id)?;
                task.content = content.to_string();
                Some(Saved::Updated(id))
            }
        }
    }

    /// Flip the done flag of `id`. Returns the new flag, or `None` for an
    /// unknown id.
    pub fn toggle_done(&mut self, id: u64) -> Option<bool> {
        self.toggle_done_at(id, Utc::now())
    }

    pub fn toggle_done_at(&mut self, id: u64, now: DateTime<Utc>) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.done = !task.done;
        task.done_at = if task.done { Some(now) } else { None };
        Some(task.done)
    }

    /// Remove `id`, returning the removed task.
    pub fn delete(&mut self, id: u64) -> Option<Task> {
        let pos = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(pos))
    }
}
