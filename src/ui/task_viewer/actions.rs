use crate::task::{SaveTarget, Saved, TaskList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub changed: bool,
    pub message: String,
    pub task_id: Option<u64>,
}

impl ActionOutcome {
    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            changed: false,
            message: message.into(),
            task_id: None,
        }
    }
}

/// Unified add/edit. `target` of `None` creates a task.
pub fn save_task(list: &mut TaskList, content: &str, target: Option<u64>) -> ActionOutcome {
    let save_target = match target {
        Some(id) => SaveTarget::Existing(id),
        None => SaveTarget::New,
    };
    match list.save(content, save_target) {
        Some(Saved::Created(id)) => {
            tracing::debug!(id, "task created");
            ActionOutcome {
                changed: true,
                message: format!("added task {id}"),
                task_id: Some(id),
            }
        }
        Some(Saved::Updated(id)) => {
            tracing::debug!(id, "task updated");
            ActionOutcome {
                changed: true,
                message: format!("updated task {id}"),
                task_id: Some(id),
            }
        }
        None => ActionOutcome::unchanged("nothing saved"),
    }
}

pub fn toggle_done(list: &mut TaskList, id: u64) -> ActionOutcome {
    match list.toggle_done(id) {
        Some(done) => {
            tracing::debug!(id, done, "task toggled");
            let state = if done { "done" } else { "pending" };
            ActionOutcome {
                changed: true,
                message: format!("marked task {id} {state}"),
                task_id: Some(id),
            }
        }
        None => ActionOutcome::unchanged(format!("no task {id}")),
    }
}

pub fn delete_task(list: &mut TaskList, id: u64) -> ActionOutcome {
    match list.delete(id) {
        Some(task) => {
            tracing::debug!(id, "task deleted");
            ActionOutcome {
                changed: true,
                message: format!("deleted task {}", task.id),
                task_id: Some(task.id),
            }
        }
        None => ActionOutcome::unchanged(format!("no task {id}")),
    }
}
