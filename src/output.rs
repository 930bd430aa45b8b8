//! Result rendering for one-shot commands.
//!
//! `--json` wraps the command's data in a versioned envelope on stdout;
//! otherwise a [`TextReport`] is printed as an aligned block of facts followed
//! by table rows. Errors go through the same envelope, or to stderr as text.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "tasktable.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    next_steps: &'a [String],
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

/// Plain-text rendering of a command result.
#[derive(Debug, Clone, Default)]
pub struct TextReport {
    title: String,
    facts: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl TextReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn fact(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.facts.push((key.into(), value.into()));
    }

    pub fn row(&mut self, line: impl Into<String>) {
        self.rows.push(line.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn next_step(&mut self, command: impl Into<String>) {
        self.next_steps.push(command.into());
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.title.clone()];

        let width = self.facts.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in &self.facts {
            lines.push(format!("  {key:<width$}  {value}").trim_end().to_string());
        }
        if !self.rows.is_empty() {
            lines.push(String::new());
            lines.extend(self.rows.iter().cloned());
        }
        if !self.warnings.is_empty() || !self.next_steps.is_empty() {
            lines.push(String::new());
        }
        lines.extend(self.warnings.iter().map(|warning| format!("warning: {warning}")));
        lines.extend(self.next_steps.iter().map(|step| format!("next: {step}")));

        lines.join("\n")
    }
}

/// Print `data` as JSON, or `report` as text unless quiet.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: &TextReport,
) -> Result<()> {
    if options.json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings: &report.warnings,
            next_steps: &report.next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if !options.quiet {
        println!("{}", report.render());
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        let envelope: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            data: None,
            error: Some(JsonError::from(err)),
            warnings: &[],
            next_steps: &[],
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = err.hint() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}
