use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    NewTask,
    EditTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSubmit {
    pub content: String,
    pub target: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Cancel,
    Submit(EditorSubmit),
}

/// Add/edit form with a single content field.
#[derive(Debug, Clone)]
pub struct EditorState {
    kind: EditorKind,
    content: String,
    cursor: usize,
    error: Option<String>,
    task_id: Option<u64>,
}

impl EditorState {
    pub fn new_task() -> Self {
        Self {
            kind: EditorKind::NewTask,
            content: String::new(),
            cursor: 0,
            error: None,
            task_id: None,
        }
    }

    pub fn edit_task(task: &Task) -> Self {
        Self {
            kind: EditorKind::EditTask,
            content: task.content.clone(),
            cursor: task.content.chars().count(),
            error: None,
            task_id: Some(task.id),
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<u64> {
        self.task_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            EditorKind::NewTask => "Add New Task",
            EditorKind::EditTask => "Update Task",
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match self.kind {
            EditorKind::NewTask => "Add",
            EditorKind::EditTask => "Update",
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u') {
            self.content.clear();
            self.cursor = 0;
            self.error = None;
            return EditorAction::None;
        }

        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Enter => return self.attempt_confirm(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_char_at(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    self.remove_char_at(self.cursor);
                }
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return EditorAction::None;
                }
                if !ch.is_control() {
                    let at = self.byte_offset(self.cursor);
                    self.content.insert(at, ch);
                    self.cursor += 1;
                }
            }
            _ => {}
        }

        self.error = None;
        EditorAction::None
    }

    fn attempt_confirm(&mut self) -> EditorAction {
        if self.content.trim().is_empty() {
            self.error = Some("content is required".to_string());
            return EditorAction::None;
        }
        EditorAction::Submit(EditorSubmit {
            content: self.content.clone(),
            target: self.task_id,
        })
    }

    fn len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map(|(idx, _)| idx)
            .unwrap_or(self.content.len())
    }

    fn remove_char_at(&mut self, char_idx: usize) {
        let at = self.byte_offset(char_idx);
        if at < self.content.len() {
            self.content.remove(at);
        }
    }
}
