//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use shiptrack_core::DisplayStyle;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Paint `text` with the terminal color closest to a display color token.
pub fn paint(text: &str, style: DisplayStyle, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match style.color {
        "green" => text.green().to_string(),
        "blue" | "indigo" => text.blue().to_string(),
        "cyan" | "teal" => text.cyan().to_string(),
        "red" => text.red().to_string(),
        "amber" | "orange" => text.yellow().to_string(),
        "purple" => text.magenta().to_string(),
        "gray" | "slate" => text.dimmed().to_string(),
        _ => text.to_owned(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&plain_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single item. Table output uses `detail_fn`, since detail
/// views are key/value blocks rather than tables.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        id: &'static str,
        n: u32,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: "a", n: 1 }, Item { id: "b", n: 2 }]
    }

    #[test]
    fn list_formats() {
        let data = items();
        let row = |i: &Item| Row { id: i.id.into() };
        let plain = |i: &Item| i.id.to_owned();

        let table = render_list(OutputFormat::Table, &data, row, plain).unwrap();
        assert!(table.contains("ID") && table.contains('b'));

        let compact = render_list(OutputFormat::JsonCompact, &data, row, plain).unwrap();
        assert_eq!(compact, r#"[{"id":"a","n":1},{"id":"b","n":2}]"#);

        let lines = render_list(OutputFormat::Plain, &data, row, plain).unwrap();
        assert_eq!(lines, "a\nb");

        let yaml = render_list(OutputFormat::Yaml, &data, row, plain).unwrap();
        assert!(yaml.contains("id: a"));
    }

    #[test]
    fn paint_is_identity_without_color() {
        let style = DisplayStyle::UNKNOWN;
        assert_eq!(paint("Delivered", style, false), "Delivered");
        assert_ne!(paint("Delivered", style, true), "");
    }
}
