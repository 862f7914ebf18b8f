use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Rows shown per nested table before truncating.
const MAX_ROWS: usize = 20;

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into one Field/Value table; each array of
/// records gets its own table, truncated to the first rows.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope(map);
            } else {
                print_result(value);
            }
        }
        Value::Array(arr) => print_array_table("", arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    match result {
        Value::Object(res_map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            let mut nested = Vec::new();
            let mut scalars = 0;
            for (key, val) in res_map {
                match val {
                    Value::Array(rows) if rows.first().map(Value::is_object).unwrap_or(false) => {
                        nested.push((key.as_str(), rows));
                    }
                    _ => {
                        builder.push_record([key.as_str(), &format_value(val)]);
                        scalars += 1;
                    }
                }
            }
            if scalars > 0 {
                println!("{}", Table::from(builder));
            }
            for (key, rows) in nested {
                print_array_table(key, rows);
            }
        }
        Value::Array(arr) => print_array_table("", arr),
        other => println!("{}", format_value(other)),
    }
}

fn print_envelope(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(title: &str, arr: &[Value]) {
    if !title.is_empty() {
        println!("\n{} ({} rows)", title, arr.len());
    }
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr.iter().take(MAX_ROWS) {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
        if arr.len() > MAX_ROWS {
            println!("... {} more rows", arr.len() - MAX_ROWS);
        }
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
