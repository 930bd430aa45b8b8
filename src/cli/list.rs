//! tasktable list command implementation
//!
//! Runs the same filter, sort and page derivation as the interactive view
//! and prints the result once.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{emit_success, OutputOptions, TextReport};
use crate::pipeline::{derive_view, DisplayMode, SortDirection, SortKey, ViewState};
use crate::source::{JsonFileSource, TaskSource};
use crate::task::{Task, TaskList};

use super::Context;

pub(crate) struct ListOptions {
    pub(crate) ctx: Context,
    pub(crate) filter: Option<String>,
    pub(crate) sort: Option<String>,
    pub(crate) desc: bool,
    pub(crate) page: Option<usize>,
    pub(crate) all: bool,
    pub(crate) json: bool,
    pub(crate) quiet: bool,
}

#[derive(Serialize)]
struct ListReport {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    sort: &'static str,
    direction: &'static str,
    total: usize,
    matched: usize,
    page: usize,
    page_count: usize,
    page_size: usize,
    tasks: Vec<Task>,
}

pub(crate) fn run(options: ListOptions) -> Result<()> {
    let view_config = &options.ctx.config.view;
    let sort_key = match options.sort.as_deref() {
        Some(value) => value.parse::<SortKey>()?,
        None => view_config.sort_key()?,
    };
    let direction = if options.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    if options.page == Some(0) {
        return Err(Error::InvalidArgument(
            "--page is 1-based; page 0 does not exist".to_string(),
        ));
    }

    let source = JsonFileSource::new(options.ctx.source.clone());
    let tasks = TaskList::from_fetched(source.fetch()?);

    let mut state = ViewState::new(view_config.page_size)
        .with_sort(sort_key, direction)
        .with_mode(DisplayMode::Paged);
    if let Some(filter) = options.filter.clone() {
        state.set_filter(filter);
    }
    let requested_page = options.page.unwrap_or(1);
    state.page = requested_page;
    if options.all {
        state.page_size = tasks.len().max(1);
    }

    let view = derive_view(tasks.tasks(), &state);
    let shown: Vec<Task> = view.tasks(tasks.tasks()).cloned().collect();
    tracing::debug!(
        matched = view.matched,
        page = view.page,
        shown = shown.len(),
        "list derived"
    );

    let mut report = TextReport::new("Tasks");
    report.fact("Source", source.describe());
    if let Some(filter) = options.filter.as_deref() {
        report.fact("Filter", filter);
    }
    report.fact(
        "Sort",
        format!("{} {}", sort_key.as_str(), direction_label(direction)),
    );
    report.fact("Matches", format!("{} of {}", view.matched, tasks.len()));
    if !options.all {
        report.fact(
            "Page",
            format!("{}/{}", view.page, view.page_count.max(1)),
        );
    }
    if view.is_empty() {
        report.row(if state.filter_active() {
            "No matches"
        } else {
            "No tasks"
        });
    }
    for task in &shown {
        report.row(format_row(task));
    }
    if !options.all && requested_page != view.page {
        report.warn(format!(
            "page {requested_page} is past the last page; showing page {}",
            view.page
        ));
    }
    if !options.all && view.page < view.page_count {
        report.next_step(format!("tasktable list --page {}", view.page + 1));
    }

    let data = ListReport {
        source: source.describe(),
        filter: options.filter,
        sort: sort_key.as_str(),
        direction: direction_label(direction),
        total: tasks.len(),
        matched: view.matched,
        page: view.page,
        page_count: view.page_count,
        page_size: state.page_size,
        tasks: shown,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &data,
        &report,
    )
}

fn direction_label(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    }
}

fn format_row(task: &Task) -> String {
    let mark = if task.done { "x" } else { " " };
    let mut row = format!("{:>4}  [{mark}] {}", task.id, task.content);
    if let Some(done_at) = task.done_at {
        row.push_str(&format!("  (done {})", format_timestamp(done_at)));
    }
    row
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}
