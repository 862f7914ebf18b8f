use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Nesting depth searched for tables under `result`.
const MAX_TABLE_DEPTH: usize = 4;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(rows)) => {
                let _ = write_array_csv(&mut wtr, rows);
            }
            Some(Value::Object(result)) => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
            _ => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        },
        Value::Array(arr) => {
            let _ = write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Write every array of records found under the result as `<path>.csv`
/// in `dir`, naming files by their JSON path joined with `_`.
pub fn write_tables(dir: &str, value: &Value) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let root = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    let dir = Path::new(dir);
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;

    let mut tables = Vec::new();
    collect_tables("result", root, 0, &mut tables);

    let mut written = Vec::with_capacity(tables.len());
    for (name, rows) in tables {
        let path = dir.join(format!("{name}.csv"));
        let mut wtr = csv::Writer::from_path(&path)
            .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
        write_array_csv(&mut wtr, rows)?;
        wtr.flush()?;
        written.push(path);
    }
    Ok(written)
}

fn collect_tables<'a>(name: &str, value: &'a Value, depth: usize, out: &mut Vec<(String, &'a [Value])>) {
    match value {
        Value::Array(rows) if rows.first().map(Value::is_object).unwrap_or(false) => {
            out.push((name.to_string(), rows));
        }
        Value::Object(map) if depth < MAX_TABLE_DEPTH => {
            for (key, child) in map {
                let child_name = if depth == 0 { key.clone() } else { format!("{name}_{key}") };
                collect_tables(&child_name, child, depth + 1, out);
            }
        }
        _ => {}
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    if arr.is_empty() {
        return Ok(());
    }

    if arr.iter().all(Value::is_object) {
        // Union of keys, in first-seen order.
        let mut headers: Vec<&str> = Vec::new();
        for item in arr {
            if let Value::Object(map) = item {
                for k in map.keys() {
                    if !headers.contains(&k.as_str()) {
                        headers.push(k.as_str());
                    }
                }
            }
        }
        wtr.write_record(&headers)?;

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
    } else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
