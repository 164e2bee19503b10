use serde_json::{Map, Value};
use std::io;

use super::{flatten_scalars, result_of, ROW_FIELDS};

/// Write output as CSV to stdout. Row-shaped results (batch rows, curve or
/// profile points) become one record per row; anything else is written as
/// field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(map) => match primary_rows(map) {
            Some(rows) => write_array_csv(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten_scalars(map) {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(&val)]);
                }
            }
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

/// Batch results and curve/profile points are the whole answer; a single
/// bond's cash flows are secondary to its scalar fields.
fn primary_rows(map: &Map<String, Value>) -> Option<&[Value]> {
    ROW_FIELDS
        .iter()
        .filter(|f| **f != "cash_flows" && **f != "forward_rates")
        .find_map(|f| map.get(*f).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
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
