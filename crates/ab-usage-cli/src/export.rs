//! Report export to JSON and CSV files.
//!
//! CSV rows are flattened: the header is the sorted union of keys across
//! all rows, nested values are JSON-encoded into their cell, and cells
//! are quoted per RFC 4180. The corpus ships no CSV dependency, so the
//! quoting lives here.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;

use ab_usage_core::Prompt;

/// Offer to export `rows`, asking for format and filename.
///
/// # Errors
///
/// Returns an I/O error when the console is closed; file write failures
/// are reported to the operator and swallowed.
pub fn prompt_export(prompt: &mut dyn Prompt, rows: &[Value], label: &str) -> io::Result<()> {
    let choice = prompt.ask(&format!("\nExport {label}? (y/N): "))?;
    if !choice.trim().eq_ignore_ascii_case("y") {
        return Ok(());
    }
    if rows.is_empty() {
        prompt.say("No data to export");
        return Ok(());
    }

    prompt.say("Export format:");
    prompt.say("  1. CSV (tabular data) [default]");
    prompt.say("  2. JSON (complete data)");
    let format = prompt.ask("Select format (1-2 or press Enter for CSV): ")?;
    let as_json = matches!(format.trim(), "2");

    let typed = prompt.ask("Enter filename (or press Enter for auto-generated): ")?;
    let path = resolve_filename(typed.trim(), if as_json { "json" } else { "csv" });

    let result = if as_json {
        write_json(&path, rows)
    } else {
        write_csv(&path, rows)
    };
    match result {
        Ok(()) => {
            let shown = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            prompt.say(&format!("Data exported to: {}", shown.display()));
        }
        Err(e) => prompt.say(&format!("Export failed: {e}")),
    }
    Ok(())
}

/// Pick the output path: the typed name with the extension ensured, or a
/// timestamped default.
fn resolve_filename(typed: &str, extension: &str) -> PathBuf {
    let name = if typed.is_empty() {
        format!(
            "usage_data_{}.{extension}",
            Local::now().format("%Y%m%d_%H%M%S")
        )
    } else if typed.ends_with(&format!(".{extension}")) {
        typed.to_string()
    } else {
        format!("{typed}.{extension}")
    };
    PathBuf::from(name)
}

/// Write rows as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an I/O error when the file cannot be written.
pub fn write_json(path: &Path, rows: &[Value]) -> io::Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, rows).map_err(io::Error::other)
}

/// Write rows as CSV with a sorted union-of-keys header.
///
/// # Errors
///
/// Returns an I/O error when the file cannot be written.
pub fn write_csv(path: &Path, rows: &[Value]) -> io::Result<()> {
    let columns: BTreeSet<String> = rows
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|row| row.keys().cloned())
        .collect();

    let mut file = BufWriter::new(File::create(path)?);
    let header: Vec<String> = columns.iter().map(|c| escape(c)).collect();
    writeln!(file, "{}", header.join(","))?;

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| escape(&cell(row, column)))
            .collect();
        writeln!(file, "{}", cells.join(","))?;
    }
    file.flush()
}

/// Render one cell: scalars literally, nested structures JSON-encoded.
fn cell(row: &Value, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(nested @ (Value::Object(_) | Value::Array(_))) => nested.to_string(),
        Some(other) => other.to_string(),
    }
}

/// RFC 4180 quoting: fields containing commas, quotes or newlines are
/// wrapped in quotes with inner quotes doubled.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({
                "service": "ai.chat",
                "quantity": 1500,
                "note": "says \"hi\", twice",
                "meters": [{ "meterId": "chat.requests" }]
            }),
            json!({
                "service": "storage",
                "quantity": 2.5
            }),
        ]
    }

    #[test]
    fn csv_has_sorted_union_header_and_quoted_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &rows()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "meters,note,quantity,service");

        let first = lines.next().unwrap();
        assert!(first.contains("\"says \"\"hi\"\", twice\""));
        assert!(first.contains("1500"));

        let second = lines.next().unwrap();
        // Absent columns become empty cells.
        assert_eq!(second, ",,2.5,storage");
    }

    #[test]
    fn nested_values_are_json_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &rows()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"[{\"\"meterId\"\":\"\"chat.requests\"\"}]\""));
    }

    #[test]
    fn json_export_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &rows()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, rows());
    }

    #[test]
    fn filenames_get_extensions_and_defaults() {
        assert_eq!(resolve_filename("report", "csv"), PathBuf::from("report.csv"));
        assert_eq!(
            resolve_filename("report.csv", "csv"),
            PathBuf::from("report.csv")
        );
        let auto = resolve_filename("", "json");
        let name = auto.to_string_lossy();
        assert!(name.starts_with("usage_data_"));
        assert!(name.ends_with(".json"));
    }
}
