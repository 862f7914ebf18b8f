use serde_json::{Map, Value};

/// Print a one-line headline for the result.
///
/// Known result shapes get their key figure; anything else falls back to
/// the first field, or a row count for bare arrays.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => println!("{}", headline(map)),
        Value::Array(rows) => println!("{} rows", rows.len()),
        other => println!("{}", scalar(other)),
    }
}

fn headline(map: &Map<String, Value>) -> String {
    if let Some(passed) = map.get("passed").and_then(Value::as_bool) {
        let count = |k: &str| map.get(k).and_then(Value::as_u64).unwrap_or(0);
        return format!(
            "{} ({} errors, {} warnings)",
            if passed { "PASSED" } else { "FAILED" },
            count("errors"),
            count("warnings")
        );
    }
    if let Some(weighted) = map.get("probability_weighted_ecl").filter(|v| !v.is_null()) {
        return scalar(weighted);
    }
    if let Some(Value::Array(rows)) = map.get("comparison") {
        return rows
            .iter()
            .map(|r| {
                format!(
                    "{}={}",
                    r.get("scenario").map(scalar).unwrap_or_default(),
                    r.get("total_monthly_ecl").map(scalar).unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
    }
    for key in ["total_ecl", "payment"] {
        if let Some(v) = map.get(key) {
            return scalar(v);
        }
    }
    if let Some(Value::Array(rows)) = map.get("panel") {
        return format!("{} rows", rows.len());
    }
    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, scalar(val)),
        None => String::new(),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(rows) => format!("[{} items]", rows.len()),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
