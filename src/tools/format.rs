//! Text rendering for query results.
//!
//! `run_query` answers with pretty JSON by default; callers can ask for an
//! ASCII table (bq CLI style) or a markdown table instead.

use crate::models::{ColumnMetadata, ResultSet, Row};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of row objects (default)
    #[default]
    Json,
    /// ASCII table
    Table,
    /// Markdown table
    Markdown,
}

/// Render a cell for the table formats. NULL is spelled out.
pub fn format_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(_) | JsonValue::Number(_) => value.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

fn cell<'a>(row: &'a Row, column: &ColumnMetadata) -> &'a JsonValue {
    row.get(&column.name).unwrap_or(&JsonValue::Null)
}

/// ASCII table with a `N rows in set (S sec)` footer.
pub fn format_as_table(result: &ResultSet, elapsed_ms: u64) -> String {
    let ResultSet { columns, rows } = result;
    if columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.name.width()).collect();
    for row in rows {
        for (width, column) in widths.iter_mut().zip(columns) {
            *width = (*width).max(format_cell(cell(row, column)).width());
        }
    }

    let separator = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    let mut output = separator.clone();
    for (column, width) in columns.iter().zip(&widths) {
        output.push_str("| ");
        output.push_str(&pad(&column.name, *width, Align::Center));
        output.push(' ');
    }
    output.push_str("|\n");
    output.push_str(&separator);

    for row in rows {
        for (column, width) in columns.iter().zip(&widths) {
            let value = cell(row, column);
            let align = if value.is_number() {
                Align::Right
            } else {
                Align::Left
            };
            output.push_str("| ");
            output.push_str(&pad(&format_cell(value), *width, align));
            output.push(' ');
        }
        output.push_str("|\n");
    }
    output.push_str(&separator);

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        rows.len(),
        noun,
        elapsed_ms as f64 / 1000.0
    ));
    output
}

/// Markdown table followed by an italic row count.
pub fn format_as_markdown(result: &ResultSet) -> String {
    let ResultSet { columns, rows } = result;
    if columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();
    for column in columns {
        output.push_str(&format!("| {} ", escape_markdown(&column.name)));
    }
    output.push_str("|\n");
    output.push_str(&"|---".repeat(columns.len()));
    output.push_str("|\n");

    for row in rows {
        for column in columns {
            let text = escape_markdown(&format_cell(cell(row, column)));
            output.push_str(&format!("| {text} "));
        }
        output.push_str("|\n");
    }

    output.push_str(&format!("\n*{} rows*", rows.len()));
    output
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
    Center,
}

/// Pad by display width so CJK and emoji cells line up.
fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(text.width());
    match align {
        Align::Left => format!("{text}{}", " ".repeat(fill)),
        Align::Right => format!("{}{text}", " ".repeat(fill)),
        Align::Center => {
            let left = fill / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(fill - left))
        }
    }
}
