#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_tasks(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file("tasks.json", contents)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".tasktable.toml", contents)
    }

    /// Binary invocation rooted in this directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = tasktable_cmd();
        cmd.current_dir(self.path());
        cmd
    }
}

pub fn tasktable_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tasktable").expect("binary");
    cmd.env_remove("TASKTABLE_SOURCE");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// `count` tasks with content "task N"; every third one is done.
pub fn numbered_tasks_json(count: u64) -> String {
    let tasks: Vec<serde_json::Value> = (1..=count)
        .map(|id| {
            let done = id % 3 == 0;
            serde_json::json!({
                "id": id,
                "content": format!("task {id}"),
                "done": done,
                "done_time": if done {
                    serde_json::Value::String(format!("2024-01-{:02}T10:00:00Z", (id % 28) + 1))
                } else {
                    serde_json::Value::Null
                },
            })
        })
        .collect();
    serde_json::Value::Array(tasks).to_string()
}
