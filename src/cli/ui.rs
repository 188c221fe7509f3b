use crate::core::currency::CurrencyRecord;
use crate::core::presenter::Presenter;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Creates a new `indicatif` spinner with standard styling.
pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Formats a converted amount the way it is displayed, e.g. `EUR 9.18`.
pub fn format_result(to_currency: &str, value: f64) -> String {
    format!("{to_currency} {value:.2}")
}

/// Renders presenter events on the terminal, above an in-progress spinner.
pub struct ConsolePresenter {
    spinner: ProgressBar,
}

impl ConsolePresenter {
    pub fn new(message: &str) -> Self {
        Self {
            spinner: new_spinner(message),
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    fn print(&self, line: String) {
        self.spinner.suspend(|| println!("{line}"));
    }
}

impl Presenter for ConsolePresenter {
    fn result(&self, to_currency: &str, value: f64) {
        self.print(style_text(
            &format_result(to_currency, value),
            StyleType::Result,
        ));
    }

    fn status_message(&self, text: &str) {
        self.print(style_text(text, StyleType::Subtle));
    }

    fn offline_failure(&self, text: &str) {
        self.print(style_text(text, StyleType::Error));
    }

    fn currencies(&self, currencies: &[CurrencyRecord], from_network: bool) {
        if !from_network {
            self.print(style_text("Cached currencies:", StyleType::Subtle));
        }
        self.print(super::currencies::display_as_table(currencies));
    }
}

impl Drop for ConsolePresenter {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
