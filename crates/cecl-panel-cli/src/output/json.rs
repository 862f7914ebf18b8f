use serde_json::Value;
use std::io::{self, Write};

/// Stream pretty JSON to stdout; panels can run to millions of rows.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|_| writeln!(out))
        .and_then(|_| out.flush());
    if let Err(e) = written {
        eprintln!("JSON output error: {}", e);
    }
}
