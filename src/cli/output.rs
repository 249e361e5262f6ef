//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Borderless table with bold headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| {
            Cell::new(h.to_uppercase())
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Left)
        }));
    table
}

/// Two-column key/value table for summaries.
pub fn summary_table(rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    table
}

pub fn level(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_table_uppercases_headers() {
        let mut table = list_table(&["trial", "level"]);
        table.add_row(vec!["1", "40.00"]);
        let rendered = table.to_string();
        assert!(rendered.contains("TRIAL"));
        assert!(rendered.contains("40.00"));
    }

    #[test]
    fn test_summary_table_keeps_row_order() {
        let rendered = summary_table(&[("Threshold", level(22.666)), ("Trials", "16".into())])
            .to_string();
        let threshold = rendered.find("Threshold").unwrap();
        let trials = rendered.find("Trials").unwrap();
        assert!(threshold < trials);
        assert!(rendered.contains("22.67"));
    }
}
