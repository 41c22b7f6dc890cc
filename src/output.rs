use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CategoriesResult, ListResult};
use crate::detail::DetailState;
use crate::domain::Theme;
use crate::view::{RenderSink, ViewModel};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Serialize)]
struct ThemeResult {
    theme: Theme,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_categories(result: &CategoriesResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_detail(state: &DetailState) -> io::Result<()> {
        Self::print_json(state)
    }

    pub fn print_theme(theme: Theme) -> io::Result<()> {
        Self::print_json(&ThemeResult { theme })
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}

impl RenderSink for JsonOutput {
    fn render(&self, model: &ViewModel) {
        if let Err(err) = Self::print_json(model) {
            tracing::warn!(error = %err, "failed to write view model");
        }
    }
}
