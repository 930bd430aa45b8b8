//! View derivation: filter, sort and window the canonical task list.
//!
//! Everything here is a pure function of the task slice and a [`ViewState`],
//! so any front end can call [`derive_view`] on every read. Results are
//! indices into the canonical slice; the slice itself is never reordered.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use feruca::Collator;

use crate::error::{Error, Result};
use crate::task::Task;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Content,
    Done,
    DoneAt,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Id, SortKey::Content, SortKey::Done, SortKey::DoneAt];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Content => "content",
            SortKey::Done => "done",
            SortKey::DoneAt => "done_time",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "id" => Ok(SortKey::Id),
            "content" => Ok(SortKey::Content),
            "done" | "status" => Ok(SortKey::Done),
            "done_time" | "done_at" | "doneat" => Ok(SortKey::DoneAt),
            other => Err(Error::InvalidArgument(format!(
                "unknown sort key '{other}' (expected id|content|done|done_time)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Paged,
    Scrolling,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Paged => "paged",
            DisplayMode::Scrolling => "scrolling",
        }
    }
}

impl FromStr for DisplayMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paged" | "pagination" => Ok(DisplayMode::Paged),
            "scrolling" | "scroll" | "infinite" => Ok(DisplayMode::Scrolling),
            other => Err(Error::InvalidArgument(format!(
                "unknown display mode '{other}' (expected paged|scrolling)"
            ))),
        }
    }
}

/// Inputs of the derivation. Never authoritative: rebuilding it from scratch
/// loses nothing but presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub filter: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub mode: DisplayMode,
    /// 1-based.
    pub page: usize,
    /// Rows accumulated in scrolling mode.
    pub scroll_loaded: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            filter: String::new(),
            sort_key: SortKey::Id,
            sort_direction: SortDirection::Ascending,
            mode: DisplayMode::Paged,
            page: 1,
            scroll_loaded: page_size,
            page_size,
        }
    }

    pub fn with_sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.sort_direction = direction;
        self
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        if mode != self.mode {
            self.toggle_mode();
        }
        self
    }

    /// Replace the filter text. Returns to the first page and the first
    /// scroll chunk.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 1;
        self.scroll_loaded = self.page_size;
    }

    /// Header click: same key flips direction, a new key sorts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_key = key;
            self.sort_direction = SortDirection::Ascending;
        }
    }

    /// Select a page offered by the pagination control. Pages outside
    /// `1..=page_count` are ignored.
    pub fn set_page(&mut self, page: usize, matched: usize) -> bool {
        let pages = page_count(matched, self.page_size);
        if page == 0 || page > pages || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Switch between paged and scrolling display. Either direction starts
    /// over at page 1 with a single chunk.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            DisplayMode::Paged => DisplayMode::Scrolling,
            DisplayMode::Scrolling => DisplayMode::Paged,
        };
        self.page = 1;
        self.scroll_loaded = self.page_size;
    }

    pub fn filter_active(&self) -> bool {
        !self.filter.is_empty()
    }
}

/// Derived display slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTasks {
    /// Indices into the canonical slice, in display order.
    pub indices: Vec<usize>,
    /// Tasks that passed the filter.
    pub matched: usize,
    /// Effective page after clamping (paged mode).
    pub page: usize,
    pub page_count: usize,
    /// Scrolling mode has further rows it could append.
    pub has_more: bool,
}

impl DisplayTasks {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn tasks<'a>(&'a self, tasks: &'a [Task]) -> impl Iterator<Item = &'a Task> + 'a {
        self.indices.iter().filter_map(move |idx| tasks.get(*idx))
    }
}

fn normalize_text(value: &str) -> String {
    value.to_lowercase()
}

/// Case-insensitive substring filter on content, order preserving.
pub fn filter_task_indices(tasks: &[Task], filter: &str) -> Vec<usize> {
    if filter.is_empty() {
        return (0..tasks.len()).collect();
    }
    let needle = normalize_text(filter);
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| normalize_text(&task.content).contains(&needle))
        .map(|(idx, _)| idx)
        .collect()
}

/// Unicode collation (CLDR root order) of two strings.
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    Collator::default().collate(left, right)
}

fn compare_ascending(
    collator: &mut Collator,
    left: &Task,
    right: &Task,
    key: SortKey,
) -> Ordering {
    match key {
        SortKey::Id => left.id.cmp(&right.id),
        SortKey::Content => collator.collate(left.content.as_str(), right.content.as_str()),
        SortKey::Done => left.done.cmp(&right.done),
        // Option orders None before Some.
        SortKey::DoneAt => left.done_at.cmp(&right.done_at),
    }
}

/// Stable sort of `indices` by `key`. Descending reverses the comparator, so
/// equal keys keep their filtered order in both directions.
pub fn sort_task_indices(
    tasks: &[Task],
    indices: &mut [usize],
    key: SortKey,
    direction: SortDirection,
) {
    let mut collator = Collator::default();
    indices.sort_by(|left, right| {
        let ordering = compare_ascending(&mut collator, &tasks[*left], &tasks[*right], key);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Page numbers the pagination control offers; empty when everything fits on
/// one page.
pub fn page_buttons(total: usize, page_size: usize) -> Vec<usize> {
    let pages = page_count(total, page_size);
    if pages <= 1 {
        return Vec::new();
    }
    (1..=pages).collect()
}

pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Filter, sort and window `tasks` according to `state`.
pub fn derive_view(tasks: &[Task], state: &ViewState) -> DisplayTasks {
    let mut indices = filter_task_indices(tasks, &state.filter);
    sort_task_indices(tasks, &mut indices, state.sort_key, state.sort_direction);
    let matched = indices.len();
    let pages = page_count(matched, state.page_size);

    match state.mode {
        DisplayMode::Paged => {
            let page = state.page.clamp(1, pages.max(1));
            let indices = page_slice(&indices, page, state.page_size).to_vec();
            DisplayTasks {
                indices,
                matched,
                page,
                page_count: pages,
                has_more: false,
            }
        }
        DisplayMode::Scrolling => {
            let window = state.scroll_loaded.min(matched);
            indices.truncate(window);
            DisplayTasks {
                indices,
                matched,
                page: state.page,
                page_count: pages,
                // A filtered view never grows.
                has_more: !state.filter_active() && window < matched,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    fn task(id: u64, content: &str, done_at: Option<i64>) -> Task {
        Task {
            id,
            content: content.to_string(),
            done: done_at.is_some(),
            done_at: done_at.map(ts),
        }
    }

    fn ids(tasks: &[Task], indices: &[usize]) -> Vec<u64> {
        indices.iter().map(|idx| tasks[*idx].id).collect()
    }

    fn numbered(count: u64) -> Vec<Task> {
        (1..=count)
            .map(|id| task(id, &format!("task {id}"), None))
            .collect()
    }

    #[test]
    fn filter_matches_case_insensitive_substring() {
        let tasks = vec![
            task(1, "Buy Milk", None),
            task(2, "walk dog", None),
            task(3, "milkshake", Some(1)),
        ];
        assert_eq!(ids(&tasks, &filter_task_indices(&tasks, "MILK")), vec![1, 3]);
        assert_eq!(ids(&tasks, &filter_task_indices(&tasks, "")), vec![1, 2, 3]);
        assert!(filter_task_indices(&tasks, "zebra").is_empty());
    }

    #[test]
    fn filter_scenario_from_two_tasks() {
        let tasks = vec![task(1, "a", None), task(2, "b", Some(10))];
        let view = derive_view(&tasks, &{
            let mut state = ViewState::default();
            state.set_filter("a");
            state
        });
        assert_eq!(ids(&tasks, &view.indices), vec![1]);
    }

    #[test]
    fn filtered_items_all_contain_filter_and_excluded_do_not() {
        let tasks = vec![
            task(1, "Alpha", None),
            task(2, "beta", None),
            task(3, "ALPHABET", None),
            task(4, "gamma", None),
        ];
        for filter in ["al", "A", "bet", "x", "ALPHA"] {
            let kept = filter_task_indices(&tasks, filter);
            let needle = filter.to_lowercase();
            for (idx, task) in tasks.iter().enumerate() {
                let contains = task.content.to_lowercase().contains(&needle);
                assert_eq!(kept.contains(&idx), contains, "filter {filter} task {}", task.id);
            }
        }
    }

    #[test]
    fn id_descending_is_reverse_of_ascending() {
        let tasks = vec![
            task(4, "d", None),
            task(1, "a", None),
            task(9, "z", Some(3)),
            task(2, "b", None),
        ];
        let mut asc: Vec<usize> = (0..tasks.len()).collect();
        sort_task_indices(&tasks, &mut asc, SortKey::Id, SortDirection::Ascending);
        let mut desc = asc.clone();
        sort_task_indices(&tasks, &mut desc, SortKey::Id, SortDirection::Descending);
        let mut reversed = ids(&tasks, &asc);
        reversed.reverse();
        assert_eq!(ids(&tasks, &desc), reversed);
        assert_eq!(ids(&tasks, &asc), vec![1, 2, 4, 9]);
    }

    #[test]
    fn done_at_ascending_puts_absent_first_and_descending_last() {
        let tasks = vec![
            task(1, "a", Some(30)),
            task(2, "b", None),
            task(3, "c", Some(10)),
            task(4, "d", None),
        ];
        let mut indices: Vec<usize> = (0..tasks.len()).collect();
        sort_task_indices(&tasks, &mut indices, SortKey::DoneAt, SortDirection::Ascending);
        assert_eq!(ids(&tasks, &indices), vec![2, 4, 3, 1]);

        sort_task_indices(&tasks, &mut indices, SortKey::DoneAt, SortDirection::Descending);
        assert_eq!(ids(&tasks, &indices), vec![1, 3, 2, 4]);
    }

    #[test]
    fn done_sort_is_stable_for_equal_flags() {
        let tasks = vec![
            task(1, "a", Some(5)),
            task(2, "b", None),
            task(3, "c", Some(1)),
            task(4, "d", None),
        ];
        let mut indices: Vec<usize> = (0..tasks.len()).collect();
        sort_task_indices(&tasks, &mut indices, SortKey::Done, SortDirection::Ascending);
        assert_eq!(ids(&tasks, &indices), vec![2, 4, 1, 3]);
        let mut indices: Vec<usize> = (0..tasks.len()).collect();
        sort_task_indices(&tasks, &mut indices, SortKey::Done, SortDirection::Descending);
        assert_eq!(ids(&tasks, &indices), vec![1, 3, 2, 4]);
    }

    #[test]
    fn content_sort_folds_case() {
        let tasks = vec![
            task(1, "banana", None),
            task(2, "Apple", None),
            task(3, "cherry", None),
            task(4, "apple", None),
        ];
        let mut indices: Vec<usize> = (0..tasks.len()).collect();
        sort_task_indices(&tasks, &mut indices, SortKey::Content, SortDirection::Ascending);
        assert_eq!(ids(&tasks, &indices), vec![4, 2, 1, 3]);
    }

    #[test]
    fn toggle_sort_flips_or_resets_direction() {
        let mut state = ViewState::default();
        state.toggle_sort(SortKey::Id);
        assert_eq!(state.sort_direction, SortDirection::Descending);
        state.toggle_sort(SortKey::Content);
        assert_eq!(state.sort_key, SortKey::Content);
        assert_eq!(state.sort_direction, SortDirection::Ascending);
        state.toggle_sort(SortKey::Content);
        assert_eq!(state.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn pages_concatenate_to_full_sorted_collection() {
        let tasks = numbered(23);
        let mut state = ViewState::default().with_sort(SortKey::Id, SortDirection::Descending);
        let first = derive_view(&tasks, &state);
        assert_eq!(first.page_count, 3);

        let mut seen = Vec::new();
        for page in 1..=first.page_count {
            state.page = page;
            seen.extend(derive_view(&tasks, &state).indices);
        }
        let mut expected = filter_task_indices(&tasks, "");
        sort_task_indices(&tasks, &mut expected, SortKey::Id, SortDirection::Descending);
        assert_eq!(seen, expected);
    }

    #[test]
    fn pagination_control_hidden_for_single_page() {
        assert!(page_buttons(0, 10).is_empty());
        assert!(page_buttons(10, 10).is_empty());
        assert_eq!(page_buttons(11, 10), vec![1, 2]);
        assert_eq!(page_count(21, 10), 3);
    }

    #[test]
    fn set_page_rejects_out_of_range() {
        let mut state = ViewState::default();
        assert!(!state.set_page(0, 25));
        assert!(!state.set_page(4, 25));
        assert!(state.set_page(3, 25));
        assert_eq!(state.page, 3);
    }

    #[test]
    fn filter_change_resets_page() {
        let mut state = ViewState::default();
        state.set_page(2, 30);
        state.set_filter("x");
        assert_eq!(state.page, 1);
    }

    #[test]
    fn stale_page_is_clamped_after_deletes() {
        let tasks = numbered(12);
        let mut state = ViewState::default();
        state.page = 2;
        let view = derive_view(&tasks[..8], &state);
        assert_eq!(view.page, 1);
        assert_eq!(view.len(), 8);
        let view = derive_view(&tasks, &state);
        assert_eq!(ids(&tasks, &view.indices), vec![11, 12]);
    }

    #[test]
    fn entering_scrolling_mode_shows_first_chunk() {
        let tasks = numbered(25);
        let mut state = ViewState::default();
        state.set_page(3, tasks.len());
        state.toggle_mode();
        assert_eq!(state.mode, DisplayMode::Scrolling);
        assert_eq!(state.page, 1);
        let view = derive_view(&tasks, &state);
        assert_eq!(view.len(), DEFAULT_PAGE_SIZE);
        assert!(view.has_more);
    }

    #[test]
    fn filtered_scrolling_view_keeps_first_chunk_without_more() {
        let mut tasks = numbered(30);
        tasks[25].content = "special".to_string();
        let mut state = ViewState::default().with_mode(DisplayMode::Scrolling);
        state.set_filter("task");
        let view = derive_view(&tasks, &state);
        assert_eq!(view.matched, 29);
        assert_eq!(ids(&tasks, &view.indices), (1..=10).collect::<Vec<_>>());
        assert!(!view.has_more);
    }

    #[test]
    fn switching_to_scrolling_with_filter_truncates_to_first_chunk() {
        let tasks = numbered(25);
        let mut state = ViewState::default();
        state.set_filter("task");
        assert_eq!(derive_view(&tasks, &state).len(), DEFAULT_PAGE_SIZE);
        state.toggle_mode();
        let view = derive_view(&tasks, &state);
        assert_eq!(view.len(), DEFAULT_PAGE_SIZE);
        assert_eq!(view.matched, 25);
        assert!(!view.has_more);
    }

    #[test]
    fn content_sort_uses_collation_for_accents() {
        let tasks = vec![
            task(1, "zebra", None),
            task(2, "éclair", None),
            task(3, "fig", None),
            task(4, "Eagle", None),
        ];
        let mut indices: Vec<usize> = (0..tasks.len()).collect();
        sort_task_indices(&tasks, &mut indices, SortKey::Content, SortDirection::Ascending);
        assert_eq!(ids(&tasks, &indices), vec![4, 2, 3, 1]);
        assert_eq!(locale_compare("éclair", "fig"), Ordering::Less);
    }

    #[test]
    fn leaving_scrolling_mode_returns_to_first_page() {
        let tasks = numbered(25);
        let mut state = ViewState::default().with_mode(DisplayMode::Scrolling);
        state.scroll_loaded = 20;
        state.page = 2;
        state.toggle_mode();
        let view = derive_view(&tasks, &state);
        assert_eq!(view.page, 1);
        assert_eq!(ids(&tasks, &view.indices), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn sort_key_parses_aliases() {
        assert_eq!("done-time".parse::<SortKey>().ok(), Some(SortKey::DoneAt));
        assert_eq!("Content".parse::<SortKey>().ok(), Some(SortKey::Content));
        assert!("priority".parse::<SortKey>().is_err());
        assert_eq!("scroll".parse::<DisplayMode>().ok(), Some(DisplayMode::Scrolling));
    }
}
