use chrono::{DateTime, Local, Utc};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::pipeline::{page_buttons, DisplayMode, DisplayTasks, SortDirection, SortKey, ViewState};
use crate::task::Task;

use super::app::{AppState, DeleteConfirmState, StatusKind};
use super::editor::EditorState;

const ID_WIDTH: usize = 6;
const STATUS_WIDTH: usize = 8;
const TIME_WIDTH: usize = 16;
const HELP_KEY_WIDTH: usize = 14;
const LOADING_TEXT: &str = "Loading more items...";
const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_BG_MUTED: Color = Color::Rgb(52, 56, 60);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_BORDER_LIST: Color = Color::Rgb(92, 126, 166);
const COLOR_BORDER_MODAL: Color = Color::Rgb(180, 156, 92);

pub fn render(frame: &mut Frame, app: &mut AppState) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    render_tabs(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    if let Some(editor) = app.editor.as_ref() {
        render_editor_modal(frame, area, editor);
    }
    if let Some(state) = app.delete_confirm.as_ref() {
        render_delete_confirm_modal(frame, area, state);
    }
}

fn render_tabs(frame: &mut Frame, app: &AppState, area: Rect) {
    let tabs = [
        ("Paged", DisplayMode::Paged, COLOR_INFO),
        ("Scrolling", DisplayMode::Scrolling, COLOR_ACCENT),
    ];

    let mut spans = Vec::new();
    for (idx, (label, mode, color)) in tabs.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default().fg(COLOR_MUTED_DARK)));
        }
        let style = if app.view_state.mode == mode {
            Style::default()
                .fg(color)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        spans.push(Span::styled(label, style));
    }
    spans.push(Span::styled(
        format!("    {}", app.source_label),
        Style::default().fg(COLOR_MUTED_DARK),
    ));

    let widget = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(COLOR_BG_MUTED)),
    );
    frame.render_widget(widget, area);
}

fn render_list(frame: &mut Frame, app: &mut AppState, area: Rect) {
    let mut lines = Vec::new();
    let content_width = area.width.saturating_sub(2) as usize;
    let help_lines = if app.show_help {
        build_list_help_lines(content_width)
    } else {
        Vec::new()
    };
    let help_reserved = if help_lines.is_empty() {
        0
    } else {
        help_lines.len() + 1
    };

    if app.filter_input || app.view_state.filter_active() {
        let filter_label = if app.filter_input && app.view_state.filter.is_empty() {
            "filter: _".to_string()
        } else {
            format!("filter: {}", app.view_state.filter)
        };
        lines.push(Line::from(Span::styled(
            filter_label,
            Style::default().fg(COLOR_INFO),
        )));
        lines.push(Line::from(""));
    }

    lines.push(build_header_line(&app.view_state, content_width));

    let footer_lines = build_list_footer(app, content_width);
    let footer_reserved = if footer_lines.is_empty() {
        0
    } else {
        footer_lines.len() + 1
    };
    let list_height = (area.height.saturating_sub(2) as usize)
        .saturating_sub(lines.len())
        .saturating_sub(footer_reserved)
        .saturating_sub(help_reserved);
    app.list_height = list_height;

    if !app.loaded {
        lines.push(Line::from(Span::styled(
            "Loading tasks...",
            Style::default().fg(COLOR_MUTED),
        )));
    } else if app.display.is_empty() {
        let empty = if app.view_state.filter_active() {
            "No matches"
        } else {
            "No tasks"
        };
        lines.push(Line::from(empty));
    } else {
        let (start, end) = list_window(app.display.len(), Some(app.cursor), list_height);
        let tasks = app.tasks.tasks();
        for pos in start..end {
            let Some(task) = app.display.indices.get(pos).and_then(|idx| tasks.get(*idx)) else {
                continue;
            };
            lines.push(render_task_row(task, pos == app.cursor, content_width));
        }
    }

    if !footer_lines.is_empty() {
        lines.push(Line::from(""));
        lines.extend(footer_lines);
    }

    if !help_lines.is_empty() {
        lines.push(Line::from(""));
        lines.extend(help_lines);
    }

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tasks")
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

/// Pagination bar in paged mode, loading indicator in scrolling mode.
fn build_list_footer(app: &AppState, width: usize) -> Vec<Line<'static>> {
    match app.view_state.mode {
        DisplayMode::Paged => {
            build_pagination_line(&app.display, app.view_state.page_size, width)
                .into_iter()
                .collect()
        }
        DisplayMode::Scrolling => {
            if app.is_loading_more() {
                vec![Line::from(Span::styled(
                    LOADING_TEXT,
                    Style::default()
                        .fg(COLOR_WARNING)
                        .add_modifier(Modifier::ITALIC),
                ))]
            } else {
                Vec::new()
            }
        }
    }
}

fn build_pagination_line(
    display: &DisplayTasks,
    page_size: usize,
    width: usize,
) -> Option<Line<'static>> {
    let buttons = page_buttons(display.matched, page_size);
    if buttons.is_empty() {
        return None;
    }
    let visible = (width / 5).max(3);
    let (start, end) = list_window(buttons.len(), Some(display.page.saturating_sub(1)), visible);

    let mut spans = vec![Span::styled("h ‹ ", Style::default().fg(COLOR_MUTED_DARK))];
    if start > 0 {
        spans.push(Span::styled("… ", Style::default().fg(COLOR_MUTED_DARK)));
    }
    for page in &buttons[start..end] {
        let style = if *page == display.page {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        spans.push(Span::styled(format!(" {page} "), style));
        spans.push(Span::raw(" "));
    }
    if end < buttons.len() {
        spans.push(Span::styled("… ", Style::default().fg(COLOR_MUTED_DARK)));
    }
    spans.push(Span::styled("› l", Style::default().fg(COLOR_MUTED_DARK)));
    Some(Line::from(spans).alignment(Alignment::Center))
}

fn build_header_line(state: &ViewState, width: usize) -> Line<'static> {
    let content_width = content_column_width(width);
    let columns = [
        (SortKey::Id, "1 ID", ID_WIDTH),
        (SortKey::Content, "2 Content", content_width),
        (SortKey::Done, "3 Status", STATUS_WIDTH),
        (SortKey::DoneAt, "4 Done Time", TIME_WIDTH),
    ];
    let mut spans = vec![Span::raw(" ")];
    for (idx, (key, label, column_width)) in columns.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        let text = match sort_indicator(state, key) {
            Some(arrow) => format!("{label} {arrow}"),
            None => label.to_string(),
        };
        let style = if state.sort_key == key {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(COLOR_MUTED)
                .add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(pad_text(&text, column_width), style));
    }
    Line::from(spans)
}

fn sort_indicator(state: &ViewState, key: SortKey) -> Option<&'static str> {
    if state.sort_key != key {
        return None;
    }
    Some(match state.sort_direction {
        SortDirection::Ascending => "▲",
        SortDirection::Descending => "▼",
    })
}

fn content_column_width(width: usize) -> usize {
    width.saturating_sub(ID_WIDTH + STATUS_WIDTH + TIME_WIDTH + 4)
}

fn render_task_row(task: &Task, selected: bool, width: usize) -> Line<'static> {
    let content_width = content_column_width(width);
    let id_text = pad_text(&task.id.to_string(), ID_WIDTH);
    let content_text = pad_text(&task.content, content_width);
    let content_style = if task.done {
        Style::default()
            .fg(COLOR_MUTED)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(COLOR_TEXT)
    };
    let (status_label, status_color) = if task.done {
        ("Done", COLOR_SUCCESS)
    } else {
        ("Pending", COLOR_WARNING)
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(id_text, id_style()),
        Span::raw(" "),
        Span::styled(content_text, content_style),
        Span::raw(" "),
        Span::styled(
            pad_text(status_label, STATUS_WIDTH),
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            pad_text(&format_done_time(task.done_at), TIME_WIDTH),
            Style::default().fg(COLOR_MUTED),
        ),
    ];

    if selected {
        for span in &mut spans {
            span.style = span.style.add_modifier(Modifier::REVERSED);
        }
    }

    Line::from(spans)
}

fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let hint = app.footer_hint();
    let hint_span = Span::styled(hint, Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = app.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status, status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let counts_line = Line::from(Span::styled(
        app.task_count_summary(),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        );
    frame.render_widget(widget, area);
}

fn render_editor_modal(frame: &mut Frame, area: Rect, editor: &EditorState) {
    let content_width = area.width.saturating_sub(8).min(72);
    let height = 8u16.min(area.height.saturating_sub(2));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let inner_width = (content_width as usize).saturating_sub(2);
    let label = "Content ";
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut field = vec![Span::styled(label, Style::default().fg(COLOR_MUTED_DARK))];
    field.extend(value_with_caret_spans(
        editor.content(),
        editor.cursor(),
        inner_width.saturating_sub(label.len()),
        Style::default().fg(COLOR_TEXT),
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(field));
    lines.push(Line::from(""));
    if let Some(error) = editor.error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        format!(
            "enter {}  esc cancel",
            editor.confirm_label().to_ascii_lowercase()
        ),
        Style::default().fg(COLOR_MUTED_DARK),
    )));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(editor.title())
            .border_style(Style::default().fg(COLOR_BORDER_MODAL)),
    );
    frame.render_widget(widget, modal);
}

fn render_delete_confirm_modal(frame: &mut Frame, area: Rect, state: &DeleteConfirmState) {
    let content_width = area.width.saturating_sub(8).min(64);
    let height = 8u16.min(area.height.saturating_sub(6).max(7));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let text_width = (content_width as usize).saturating_sub(12);
    let mut lines: Vec<Line<'static>> = Vec::new();
    lines.push(Line::from(Span::styled(
        "Delete task?",
        Style::default()
            .fg(COLOR_ERROR)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("ID: ", Style::default().fg(COLOR_MUTED_DARK)),
        Span::styled(state.task_id.to_string(), id_style()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Content: ", Style::default().fg(COLOR_MUTED_DARK)),
        Span::styled(
            truncate_text(&state.content, text_width),
            Style::default().fg(COLOR_TEXT),
        ),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "y/enter confirm  esc/n cancel",
        Style::default().fg(COLOR_MUTED_DARK),
    )));

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Delete Task"))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

fn build_list_help_lines(width: usize) -> Vec<Line<'static>> {
    vec![
        help_header("More commands"),
        help_line("j/k or up/down", "move selection", width),
        help_line("ctrl+d/u", "jump down/up", width),
        help_line("h/l or ←/→", "previous/next page", width),
        help_line("1/2/3/4", "sort by id/content/status/done time", width),
        help_line("/", "filter by content", width),
        help_line("n", "new task", width),
        help_line("e", "edit task", width),
        help_line("space/x", "toggle done", width),
        help_line("d", "delete task (confirm)", width),
        help_line("D", "delete task now", width),
        help_line("m", "toggle paged/scrolling", width),
        help_line("q/esc", "quit", width),
        help_line("?", "hide help", width),
    ]
}

fn help_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, desc: &str, width: usize) -> Line<'static> {
    let key_text = pad_text(keys, HELP_KEY_WIDTH.min(width));
    let desc_width = width.saturating_sub(HELP_KEY_WIDTH + 1);
    let desc_text = truncate_text(desc, desc_width);
    Line::from(vec![
        Span::styled(
            key_text,
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(desc_text, Style::default().fg(COLOR_MUTED)),
    ])
}

fn value_with_caret_spans(
    value: &str,
    cursor: usize,
    width: usize,
    style: Style,
) -> Vec<Span<'static>> {
    if width == 0 {
        return vec![Span::raw("")];
    }
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    let cursor = cursor.min(len);
    if len == 0 {
        return vec![Span::styled(
            " ".to_string(),
            style.add_modifier(Modifier::REVERSED),
        )];
    }

    let caret_at_end = cursor == len;
    let available = if caret_at_end {
        width.saturating_sub(1)
    } else {
        width
    };
    let mut start = 0usize;
    if len > available {
        if cursor > available {
            start = cursor.saturating_sub(available);
        }
        if start + available > len {
            start = len.saturating_sub(available);
        }
    }
    let end = (start + available).min(len);
    let window = &chars[start..end];

    if caret_at_end {
        let text: String = window.iter().collect();
        let mut spans = Vec::new();
        if !text.is_empty() {
            spans.push(Span::styled(text, style));
        }
        spans.push(Span::styled(
            " ".to_string(),
            style.add_modifier(Modifier::REVERSED),
        ));
        return spans;
    }

    let caret_index = cursor.saturating_sub(start);
    let before: String = window[..caret_index].iter().collect();
    let caret_char = window.get(caret_index).copied().unwrap_or(' ');
    let after: String = window[caret_index.saturating_add(1)..].iter().collect();

    let mut spans = Vec::new();
    if !before.is_empty() {
        spans.push(Span::styled(before, style));
    }
    spans.push(Span::styled(
        caret_char.to_string(),
        style.add_modifier(Modifier::REVERSED),
    ));
    if !after.is_empty() {
        spans.push(Span::styled(after, style));
    }
    spans
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Visible `[start, end)` of a list of `total` rows, keeping `selected`
/// roughly centred.
pub(crate) fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn pad_text(value: &str, width: usize) -> String {
    let text = truncate_text(value, width);
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}

fn format_done_time(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(value) => value
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "N/A".to_string(),
    }
}

fn id_style() -> Style {
    Style::default()
        .fg(COLOR_MUTED)
        .add_modifier(Modifier::BOLD)
}
