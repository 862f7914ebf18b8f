use serde_json::Value;
use std::io::{self, Read};

/// Read a piped document from stdin.
///
/// Accepts a single JSON value or JSON Lines, one record per line; the
/// latter is returned as an array. Returns None when stdin is a TTY.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    parse_document(trimmed).map(Some)
}

fn parse_document(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(whole) => {
            let mut rows = Vec::new();
            for (n, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let row: Value = serde_json::from_str(line)
                    .map_err(|e| format!("stdin is neither JSON ({whole}) nor JSON Lines (line {}: {e})", n + 1))?;
                rows.push(row);
            }
            Ok(Value::Array(rows))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_lines_become_array() {
        let v = parse_document("{\"loan_id\": 1}\n\n{\"loan_id\": 2}\n").unwrap();
        assert_eq!(v, json!([{"loan_id": 1}, {"loan_id": 2}]));
    }

    #[test]
    fn test_single_document_passes_through() {
        let v = parse_document("{\"panel\": []}").unwrap();
        assert_eq!(v, json!({"panel": []}));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_document("{\"a\": 1}\nnot json").is_err());
    }
}
