use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_scalars, ROW_FIELDS};

/// Format output as tables using the tabled crate: one Field/Value table for
/// the scalar part of the result, then one table per row-shaped field.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_tables(result, map);
            } else {
                print_field_table(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        print_field_table(res_map);

        for field in ROW_FIELDS {
            if let Some(Value::Array(rows)) = res_map.get(field) {
                println!("\n{}:", heading(field));
                print_array_table(rows);
            }
        }
    } else {
        print_field_table(envelope);
    }

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

fn print_field_table(map: &Map<String, Value>) {
    let fields = flatten_scalars(map);
    if fields.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &fields {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn heading(field: &str) -> String {
    let mut chars = field.replace('_', " ");
    if let Some(first) = chars.get(..1) {
        let upper = first.to_uppercase();
        chars.replace_range(..1, &upper);
    }
    chars
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.6}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
