use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Handle;

use crate::config::ViewConfig;
use crate::error::Result;
use crate::pipeline::{derive_view, DisplayMode, DisplayTasks, SortDirection, SortKey, ViewState};
use crate::scroll::{LoadMoreTimer, LoadTicket, ScrollLoader, ScrollMetrics};
use crate::source::TaskSource;
use crate::task::{Task, TaskList};

use super::actions::{self, ActionOutcome};
use super::editor::{EditorAction, EditorState};
use super::view;

const EVENT_POLL_MS: u64 = 120;
// Rows taken by the tab bar, footer and list borders.
const CHROME_ROWS: u16 = 6;

pub(crate) enum UiMsg {
    DataLoaded(Vec<Task>),
    LoadError(String),
    MoreLoaded(LoadTicket),
}

#[derive(Clone, Copy)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

pub(crate) struct DeleteConfirmState {
    pub(crate) task_id: u64,
    pub(crate) content: String,
}

/// Startup options for the viewer.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub page_size: usize,
    pub scroll_threshold: usize,
    pub load_more_delay: Duration,
    pub sort_key: SortKey,
    pub mode: DisplayMode,
}

impl ViewSettings {
    pub fn from_config(config: &ViewConfig) -> Result<Self> {
        Ok(Self {
            page_size: config.page_size,
            scroll_threshold: config.scroll_threshold,
            load_more_delay: config.load_more_delay(),
            sort_key: config.sort_key()?,
            mode: config.display_mode()?,
        })
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default()).unwrap_or(Self {
            page_size: crate::pipeline::DEFAULT_PAGE_SIZE,
            scroll_threshold: crate::scroll::DEFAULT_SCROLL_THRESHOLD,
            load_more_delay: crate::scroll::DEFAULT_LOAD_MORE_DELAY,
            sort_key: SortKey::Id,
            mode: DisplayMode::Paged,
        })
    }
}

pub struct AppState {
    pub(crate) tasks: TaskList,
    pub(crate) view_state: ViewState,
    pub(crate) display: DisplayTasks,
    pub(crate) cursor: usize,
    pub(crate) filter_input: bool,
    pub(crate) editor: Option<EditorState>,
    pub(crate) delete_confirm: Option<DeleteConfirmState>,
    pub(crate) show_help: bool,
    pub(crate) loaded: bool,
    pub(crate) source_label: String,
    /// Rows the list area showed on the last draw.
    pub(crate) list_height: usize,
    loader: ScrollLoader,
    timer: LoadMoreTimer<UiMsg>,
    scroll_threshold: usize,
    status_message: Option<String>,
    info_message: Option<String>,
}

impl AppState {
    fn new(
        settings: &ViewSettings,
        source_label: String,
        handle: Handle,
        ui_tx: Sender<UiMsg>,
    ) -> Self {
        let view_state = ViewState::new(settings.page_size)
            .with_sort(settings.sort_key, SortDirection::Ascending)
            .with_mode(settings.mode);
        let tasks = TaskList::new();
        let display = derive_view(tasks.tasks(), &view_state);
        Self {
            tasks,
            view_state,
            display,
            cursor: 0,
            filter_input: false,
            editor: None,
            delete_confirm: None,
            show_help: false,
            loaded: false,
            source_label,
            list_height: 0,
            loader: ScrollLoader::new(),
            timer: LoadMoreTimer::new(handle, settings.load_more_delay, ui_tx),
            scroll_threshold: settings.scroll_threshold,
            status_message: None,
            info_message: None,
        }
    }

    /// Rough list height until the next draw measures the real one.
    fn update_viewport(&mut self, height: u16) {
        self.list_height = height.saturating_sub(CHROME_ROWS) as usize;
    }

    pub(crate) fn is_loading_more(&self) -> bool {
        self.loader.is_loading()
    }

    pub(crate) fn selected_task(&self) -> Option<&Task> {
        let idx = self.display.indices.get(self.cursor)?;
        self.tasks.tasks().get(*idx)
    }

    fn selected_id(&self) -> Option<u64> {
        self.selected_task().map(|task| task.id)
    }

    /// Re-derive the display slice, keeping the cursor on `keep` when it is
    /// still visible.
    fn refresh(&mut self, keep: Option<u64>) {
        self.display = derive_view(self.tasks.tasks(), &self.view_state);
        if self.view_state.mode == DisplayMode::Paged {
            self.view_state.page = self.display.page;
        }
        let tasks = self.tasks.tasks();
        let found = keep.and_then(|id| {
            self.display
                .indices
                .iter()
                .position(|idx| tasks.get(*idx).map(|task| task.id) == Some(id))
        });
        self.cursor = match found {
            Some(pos) => pos,
            None => self.cursor.min(self.display.len().saturating_sub(1)),
        };
    }

    pub(crate) fn status_line(&self) -> Option<(String, StatusKind)> {
        if let Some(message) = self.status_message.as_ref() {
            return Some((message.clone(), StatusKind::Error));
        }
        if let Some(info) = self.info_message.as_ref() {
            return Some((info.clone(), StatusKind::Info));
        }
        None
    }

    pub(crate) fn footer_hint(&self) -> String {
        if self.delete_confirm.is_some() {
            return "y/enter confirm delete  esc cancel".to_string();
        }
        if let Some(editor) = self.editor.as_ref() {
            return format!(
                "enter {}  ctrl+u clear  esc cancel",
                editor.confirm_label().to_ascii_lowercase()
            );
        }
        if self.filter_input {
            return "type filter  backspace delete  enter done  esc clear".to_string();
        }
        match self.view_state.mode {
            DisplayMode::Paged => {
                "j/k move  h/l page  1-4 sort  / filter  n new  m mode  ? help  q quit".to_string()
            }
            DisplayMode::Scrolling => {
                "j/k scroll  1-4 sort  / filter  n new  m mode  ? help  q quit".to_string()
            }
        }
    }

    pub(crate) fn task_count_summary(&self) -> String {
        let total = self.tasks.len();
        let done = self.tasks.tasks().iter().filter(|task| task.done).count();
        let pending = total - done;
        let mut summary = format!("tasks: {total}  done: {done}  pending: {pending}");
        if self.view_state.filter_active() {
            summary.push_str(&format!("  matches: {}", self.display.matched));
        }
        match self.view_state.mode {
            DisplayMode::Paged => summary.push_str(&format!(
                "  page: {}/{}",
                self.display.page,
                self.display.page_count.max(1)
            )),
            DisplayMode::Scrolling => summary.push_str(&format!(
                "  showing: {}/{}",
                self.display.len(),
                self.display.matched
            )),
        }
        summary
    }

    fn set_error(&mut self, message: String) {
        self.status_message = Some(message);
        self.info_message = None;
    }

    fn set_info(&mut self, message: String) {
        self.info_message = Some(message);
        self.status_message = None;
    }

    fn apply_outcome(&mut self, outcome: ActionOutcome) {
        let keep = outcome.task_id.or(self.selected_id());
        if outcome.changed {
            self.refresh(keep);
        }
        self.set_info(outcome.message);
    }

    fn set_filter(&mut self, filter: String) {
        if filter == self.view_state.filter {
            return;
        }
        let keep = self.selected_id();
        self.cancel_load_more();
        self.view_state.set_filter(filter);
        self.refresh(keep);
    }

    fn toggle_mode(&mut self) {
        self.cancel_load_more();
        self.view_state.toggle_mode();
        self.cursor = 0;
        self.refresh(None);
        self.set_info(format!("{} mode", self.view_state.mode.as_str()));
    }

    fn toggle_sort(&mut self, key: SortKey) {
        let keep = self.selected_id();
        self.view_state.toggle_sort(key);
        self.refresh(keep);
    }

    fn change_page(&mut self, delta: isize) -> bool {
        if self.view_state.mode != DisplayMode::Paged {
            return false;
        }
        let target = self.view_state.page as isize + delta;
        if target < 1 {
            return false;
        }
        if !self.view_state.set_page(target as usize, self.display.matched) {
            return false;
        }
        self.cursor = 0;
        self.refresh(None);
        true
    }

    fn move_selection(&mut self, delta: isize) {
        if self.display.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.display.len().saturating_sub(1) as isize;
        let next = self.cursor as isize + delta;
        if self.view_state.mode == DisplayMode::Paged {
            if next > max && self.change_page(1) {
                return;
            }
            if next < 0 && self.change_page(-1) {
                self.cursor = self.display.len().saturating_sub(1);
                return;
            }
        }
        self.cursor = next.clamp(0, max) as usize;
        self.check_scroll_trigger();
    }

    fn list_jump(&self) -> isize {
        (self.list_height / 2).max(1) as isize
    }

    pub(crate) fn scroll_metrics(&self) -> ScrollMetrics {
        let total = self.display.len();
        let (start, end) = view::list_window(total, Some(self.cursor), self.list_height);
        ScrollMetrics {
            scroll_top: start,
            client_height: end - start,
            scroll_height: total,
        }
    }

    fn check_scroll_trigger(&mut self) {
        let metrics = self.scroll_metrics();
        if let Some(ticket) = self.loader.begin(
            &self.view_state,
            metrics,
            self.display.matched,
            self.scroll_threshold,
        ) {
            self.timer.schedule(ticket, UiMsg::MoreLoaded);
        }
    }

    fn cancel_load_more(&mut self) {
        self.timer.cancel();
        self.loader.invalidate();
    }

    fn teardown(&mut self) {
        self.cancel_load_more();
        tracing::debug!("task viewer closed");
    }
}

pub fn run(source: Box<dyn TaskSource>, settings: ViewSettings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .thread_name("tasktable-timer")
        .build()?;
    let (ui_tx, ui_rx) = mpsc::channel();
    let source_label = source.describe();

    spawn_loader(source, ui_tx.clone());

    let mut app = AppState::new(&settings, source_label, runtime.handle().clone(), ui_tx);
    let result = run_terminal(&mut app, ui_rx);
    app.teardown();
    result
}

fn run_terminal(app: &mut AppState, ui_rx: Receiver<UiMsg>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    app.update_viewport(size.height);

    let result = run_loop(&mut terminal, app, ui_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    ui_rx: Receiver<UiMsg>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        while let Ok(msg) = ui_rx.try_recv() {
            handle_ui_msg(app, msg);
            dirty = true;
        }

        if dirty {
            terminal.draw(|frame| {
                app.update_viewport(frame.size().height);
                view::render(frame, app);
            })?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(app, key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(_, height) => {
                    app.update_viewport(height);
                    dirty = true;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn handle_ui_msg(app: &mut AppState, msg: UiMsg) {
    match msg {
        UiMsg::DataLoaded(tasks) => {
            app.tasks = TaskList::from_fetched(tasks);
            app.loaded = true;
            app.cursor = 0;
            app.refresh(None);
            app.set_info(format!(
                "loaded {} tasks from {}",
                app.tasks.len(),
                app.source_label
            ));
        }
        UiMsg::LoadError(err) => {
            app.loaded = true;
            app.set_error(format!("load error: {err}"));
        }
        UiMsg::MoreLoaded(ticket) => {
            let keep = app.selected_id();
            if app.loader.complete(ticket, &mut app.view_state) {
                app.refresh(keep);
                tracing::debug!(shown = app.display.len(), "load more applied");
            }
        }
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if let Some(confirm) = app.delete_confirm.take() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let outcome = actions::delete_task(&mut app.tasks, confirm.task_id);
                app.apply_outcome(outcome);
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                app.set_info("cancelled".to_string());
            }
            _ => {
                app.delete_confirm = Some(confirm);
            }
        }
        return false;
    }

    if let Some(mut editor) = app.editor.take() {
        match editor.handle_key(key) {
            EditorAction::None => {
                app.editor = Some(editor);
            }
            EditorAction::Cancel => {
                app.set_info("cancelled".to_string());
            }
            EditorAction::Submit(submit) => {
                let outcome = actions::save_task(&mut app.tasks, &submit.content, submit.target);
                app.apply_outcome(outcome);
            }
        }
        return false;
    }

    if app.filter_input {
        let mut filter = app.view_state.filter.clone();
        match key.code {
            KeyCode::Esc => {
                filter.clear();
                app.filter_input = false;
            }
            KeyCode::Enter => app.filter_input = false,
            KeyCode::Backspace => {
                filter.pop();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return false;
                }
                if !ch.is_control() {
                    filter.push(ch);
                }
            }
            _ => {}
        }
        app.set_filter(filter);
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.move_selection(app.list_jump());
            false
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.move_selection(-app.list_jump());
            false
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_selection(1);
            false
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_selection(-1);
            false
        }
        KeyCode::Char('l') | KeyCode::Right => {
            app.change_page(1);
            false
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.change_page(-1);
            false
        }
        KeyCode::Char('/') => {
            app.filter_input = true;
            false
        }
        KeyCode::Char(ch @ '1'..='4') => {
            let idx = (ch as usize) - ('1' as usize);
            app.toggle_sort(SortKey::ALL[idx]);
            false
        }
        KeyCode::Char('m') => {
            app.toggle_mode();
            false
        }
        KeyCode::Char('n') => {
            app.editor = Some(EditorState::new_task());
            false
        }
        KeyCode::Char('e') => {
            let Some(task) = app.selected_task() else {
                app.set_error("no task selected".to_string());
                return false;
            };
            app.editor = Some(EditorState::edit_task(task));
            false
        }
        KeyCode::Char(' ') | KeyCode::Char('x') => {
            let Some(id) = app.selected_id() else {
                app.set_error("no task selected".to_string());
                return false;
            };
            let outcome = actions::toggle_done(&mut app.tasks, id);
            app.apply_outcome(outcome);
            false
        }
        KeyCode::Char('D') => {
            let Some(id) = app.selected_id() else {
                app.set_error("no task selected".to_string());
                return false;
            };
            let outcome = actions::delete_task(&mut app.tasks, id);
            app.apply_outcome(outcome);
            false
        }
        KeyCode::Char('d') => {
            let Some(task) = app.selected_task() else {
                app.set_error("no task selected".to_string());
                return false;
            };
            app.delete_confirm = Some(DeleteConfirmState {
                task_id: task.id,
                content: task.content.clone(),
            });
            false
        }
        KeyCode::Char('?') => {
            app.show_help = !app.show_help;
            false
        }
        _ => false,
    }
}

fn spawn_loader(source: Box<dyn TaskSource>, ui_tx: Sender<UiMsg>) {
    thread::spawn(move || match source.fetch() {
        Ok(tasks) => {
            let _ = ui_tx.send(UiMsg::DataLoaded(tasks));
        }
        Err(err) => {
            tracing::warn!(source = %source.describe(), error = %err, "task fetch failed");
            let _ = ui_tx.send(UiMsg::LoadError(err.to_string()));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn numbered(count: u64) -> Vec<Task> {
        (1..=count)
            .map(|id| Task::new(id, format!("task {id}")))
            .collect()
    }

    fn app_with(tasks: Vec<Task>, settings: ViewSettings) -> (AppState, Receiver<UiMsg>) {
        let (tx, rx) = mpsc::channel();
        let mut app = AppState::new(&settings, "test".to_string(), Handle::current(), tx);
        app.list_height = 20;
        handle_ui_msg(&mut app, UiMsg::DataLoaded(tasks));
        (app, rx)
    }

    fn shown_ids(app: &AppState) -> Vec<u64> {
        app.display
            .tasks(app.tasks.tasks())
            .map(|task| task.id)
            .collect()
    }

    #[tokio::test]
    async fn paged_navigation_moves_between_pages() {
        let (mut app, _rx) = app_with(numbered(15), ViewSettings::default());
        assert_eq!(shown_ids(&app), (1..=10).collect::<Vec<_>>());

        handle_key(&mut app, key(KeyCode::Char('l')));
        assert_eq!(shown_ids(&app), (11..=15).collect::<Vec<_>>());
        handle_key(&mut app, key(KeyCode::Char('l')));
        assert_eq!(app.view_state.page, 2);

        handle_key(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.view_state.page, 1);
        assert_eq!(app.selected_task().map(|task| task.id), Some(10));
    }

    #[tokio::test]
    async fn filter_input_narrows_rows() {
        let mut tasks = numbered(3);
        tasks[1].content = "Buy milk".to_string();
        let (mut app, _rx) = app_with(tasks, ViewSettings::default());

        handle_key(&mut app, key(KeyCode::Char('/')));
        for ch in "MILK".chars() {
            handle_key(&mut app, key(KeyCode::Char(ch)));
        }
        assert_eq!(shown_ids(&app), vec![2]);

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.filter_input);
        assert_eq!(shown_ids(&app), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn add_edit_toggle_delete_through_keys() {
        let (mut app, _rx) = app_with(Vec::new(), ViewSettings::default());

        handle_key(&mut app, key(KeyCode::Char('n')));
        for ch in "write report".chars() {
            handle_key(&mut app, key(KeyCode::Char(ch)));
        }
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.editor.is_none());
        assert_eq!(app.tasks.get(1).map(|task| task.content.as_str()), Some("write report"));

        handle_key(&mut app, key(KeyCode::Char('e')));
        handle_key(&mut app, key(KeyCode::Char('!')));
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.tasks.get(1).map(|task| task.content.as_str()), Some("write report!"));

        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert!(app.tasks.get(1).is_some_and(|task| task.done && task.done_at.is_some()));

        handle_key(&mut app, key(KeyCode::Char('d')));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.tasks.len(), 1);
        handle_key(&mut app, key(KeyCode::Char('d')));
        handle_key(&mut app, key(KeyCode::Char('y')));
        assert!(app.tasks.is_empty());
    }

    #[tokio::test]
    async fn shift_d_deletes_without_confirmation() {
        let (mut app, _rx) = app_with(numbered(3), ViewSettings::default());
        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT));
        assert!(app.delete_confirm.is_none());
        assert_eq!(shown_ids(&app), vec![1, 3]);
        assert!(app.tasks.get(2).is_none());
    }

    #[tokio::test]
    async fn sort_keys_toggle_direction() {
        let (mut app, _rx) = app_with(numbered(3), ViewSettings::default());
        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(shown_ids(&app), vec![3, 2, 1]);
        handle_key(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.view_state.sort_key, SortKey::Content);
        assert_eq!(shown_ids(&app), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn scrolling_appends_chunk_after_delay() {
        let settings = ViewSettings {
            load_more_delay: Duration::from_millis(10),
            mode: DisplayMode::Scrolling,
            ..ViewSettings::default()
        };
        let (mut app, rx) = app_with(numbered(25), settings);
        assert_eq!(app.display.len(), 10);

        handle_key(&mut app, key(KeyCode::Char('j')));
        assert!(app.is_loading_more());

        let msg = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
            .await
            .expect("join")
            .expect("load more message");
        handle_ui_msg(&mut app, msg);
        assert!(!app.is_loading_more());
        assert_eq!(app.display.len(), 20);
        assert_eq!(app.view_state.page, 2);
    }

    #[tokio::test]
    async fn mode_switch_cancels_pending_load() {
        let settings = ViewSettings {
            load_more_delay: Duration::from_millis(20),
            mode: DisplayMode::Scrolling,
            ..ViewSettings::default()
        };
        let (mut app, rx) = app_with(numbered(25), settings);
        handle_key(&mut app, key(KeyCode::Char('j')));
        assert!(app.is_loading_more());

        handle_key(&mut app, key(KeyCode::Char('m')));
        assert!(!app.is_loading_more());
        assert_eq!(app.view_state.mode, DisplayMode::Paged);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(shown_ids(&app), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn load_error_is_reported() {
        let (tx, _rx) = mpsc::channel();
        let mut app = AppState::new(&ViewSettings::default(), "x".to_string(), Handle::current(), tx);
        handle_ui_msg(&mut app, UiMsg::LoadError("boom".to_string()));
        assert!(app.tasks.is_empty());
        assert!(matches!(app.status_line(), Some((message, StatusKind::Error)) if message.contains("boom")));
    }
}
