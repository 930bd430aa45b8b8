//! Inbound task data.
//!
//! The view consumes exactly one read: the full task list. How that list is
//! produced is up to the [`TaskSource`] implementation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::task::Task;

pub trait TaskSource: Send {
    /// Human-readable origin, for status lines and logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<Task>>;
}

/// Reads the backend list shape (a JSON array of tasks) from a file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<Task>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::SourceNotFound(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        let tasks: Vec<Task> = serde_json::from_str(&content).map_err(|err| {
            Error::SourceFormat(format!("{}: {err}", self.path.display()))
        })?;
        tracing::info!(path = %self.path.display(), count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }
}

/// Fixed in-memory list; handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    tasks: Vec<Task>,
}

impl StaticSource {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl TaskSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    fn fetch(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }
}
