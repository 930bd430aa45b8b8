//! tasktable tui command implementation

use crate::error::{Error, Result};
use crate::source::JsonFileSource;
use crate::ui::task_viewer::{self, ViewSettings};

use super::Context;

pub(crate) struct TuiOptions {
    pub(crate) ctx: Context,
    pub(crate) json: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn run(options: TuiOptions) -> Result<()> {
    if options.json {
        return Err(Error::InvalidArgument(
            "task TUI does not support --json".to_string(),
        ));
    }
    if options.quiet {
        return Err(Error::InvalidArgument(
            "task TUI does not support --quiet".to_string(),
        ));
    }
    let settings = ViewSettings::from_config(&options.ctx.config.view)?;
    let source = JsonFileSource::new(options.ctx.source);
    task_viewer::run(Box::new(source), settings)
}
